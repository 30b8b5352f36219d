//! Shared application state for the web server.

use std::sync::Arc;

use entex_config::Settings;
use entex_ner::NerModel;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    NotReady,
    Ready,
}

/// Shared state injected into every Axum handler.
///
/// The model slot starts empty and is filled exactly once, after the model
/// has loaded and warmed up. It is never cleared.
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,
    model: OnceCell<Arc<NerModel>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            model: OnceCell::new(),
        }
    }

    /// Store the loaded model. Returns `false` if one was already set.
    pub fn mark_ready(&self, model: NerModel) -> bool {
        self.model.set(Arc::new(model)).is_ok()
    }

    pub fn model(&self) -> Option<Arc<NerModel>> {
        self.model.get().cloned()
    }

    pub fn readiness(&self) -> Readiness {
        if self.model.initialized() {
            Readiness::Ready
        } else {
            Readiness::NotReady
        }
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use entex_test_utils::scripted_model;

    use super::*;

    #[test]
    fn test_ready_transition_happens_once() {
        let state = AppState::new(Settings::default());
        assert_eq!(state.readiness(), Readiness::NotReady);
        assert!(state.model().is_none());

        let (first, _) = scripted_model(vec![]);
        assert!(state.mark_ready(first));
        assert_eq!(state.readiness(), Readiness::Ready);

        let (second, _) = scripted_model(vec![]);
        assert!(!state.mark_ready(second));
        assert_eq!(state.readiness(), Readiness::Ready);
    }
}
