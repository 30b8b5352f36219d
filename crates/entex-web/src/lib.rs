//! entex-web — HTTP front end for entity extraction.
//!
//!   - `GET /`         service metadata
//!   - `GET /docs`     endpoint listing with example payloads
//!   - `POST /predict` `"<text> => <label>"` strings for the submitted text
//!   - `GET /health`   readiness snapshot

pub mod error;
pub mod handlers;
pub mod router;
pub mod schemas;
pub mod state;
