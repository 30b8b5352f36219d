//! BERT token classification with Candle.
//!
//! Any Hugging Face checkpoint with a BERT encoder, a linear `classifier`
//! head and an `id2label` table in `config.json` works (BIO or plain tags).
//! Inference runs on the CPU.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context};
use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use serde::Serialize;
use serde_json::Value;
use tokenizers::models::wordpiece::WordPieceBuilder;
use tokenizers::normalizers::bert::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::{EntityPredictor, LabelMap};

const MAX_LENGTH: usize = 512;

/// Request labels each native tag also answers to, on top of its own name
/// and its `LabelMap` name. Covers the CoNLL and OntoNotes tag sets.
const LABEL_ALIASES: &[(&str, &[&str])] = &[
    ("PER", &["person", "people"]),
    ("ORG", &["organization", "organisation", "team", "teams", "company"]),
    ("LOC", &["location", "place", "country", "city"]),
    ("GPE", &["location", "country", "city"]),
    ("MISC", &["miscellaneous", "other"]),
    ("NORP", &["nationality"]),
    ("EVENT", &["competition", "competitions"]),
];

/// A span in the model's own label vocabulary.
///
/// Offsets count characters, not bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeSpan {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

pub struct BertTokenClassifier {
    model: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    id2label: HashMap<usize, String>,
    label_map: LabelMap,
    device: Device,
}

struct ModelFiles {
    config: Config,
    id2label: HashMap<usize, String>,
    tokenizer: Tokenizer,
    weights: PathBuf,
}

impl BertTokenClassifier {
    /// Fetch `model_id` from the hub and load it.
    ///
    /// `label_map` is only used to match requested labels against the
    /// public names of native labels; it does not rename anything.
    /// Requested labels also match through `LABEL_ALIASES`, so
    /// `["person", "team"]` keeps `PER` and `ORG` spans.
    pub async fn load(model_id: &str, label_map: LabelMap) -> anyhow::Result<Self> {
        let start = Instant::now();
        let device = Device::Cpu;

        let repo_id = model_id.to_string();
        let files = tokio::task::spawn_blocking(move || Self::download(&repo_id))
            .await
            .context("model download task panicked")??;

        info!("Loading model weights from {:?}", files.weights);
        let vb = if files.weights.extension().is_some_and(|e| e == "safetensors") {
            unsafe { VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)? }
        } else {
            VarBuilder::from_pth(&files.weights, DType::F32, &device)?
        };

        let model = BertModel::load(vb.pp("bert"), &files.config)
            .or_else(|_| BertModel::load(vb.clone(), &files.config))
            .context("loading BERT encoder")?;

        let num_labels = files.id2label.len().max(1);
        let classifier = candle_nn::linear(files.config.hidden_size, num_labels, vb.pp("classifier"))
            .context("loading classifier head")?;

        info!(
            "Token classifier ready: {} labels, loaded in {:.2}s",
            num_labels,
            start.elapsed().as_secs_f32()
        );

        Ok(Self {
            model,
            classifier,
            tokenizer: files.tokenizer,
            id2label: files.id2label,
            label_map,
            device,
        })
    }

    fn download(model_id: &str) -> anyhow::Result<ModelFiles> {
        let api = Api::new().context("initializing hub client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json").context("fetching config.json")?;
        let raw = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&raw).context("parsing config.json")?;
        let id2label = parse_id2label(&serde_json::from_str(&raw)?)?;

        let tokenizer = if let Ok(path) = repo.get("tokenizer.json") {
            debug!("Loading tokenizer from {:?}", path);
            Tokenizer::from_file(&path).map_err(|e| anyhow!("tokenizer.json: {}", e))?
        } else {
            let path = repo.get("vocab.txt").context("no tokenizer.json or vocab.txt")?;
            debug!("Building WordPiece tokenizer from {:?}", path);
            wordpiece_from_vocab(&path)?
        };

        let weights = repo
            .get("model.safetensors")
            .or_else(|_| repo.get("pytorch_model.bin"))
            .context("fetching model weights")?;

        Ok(ModelFiles { config, id2label, tokenizer, weights })
    }

    /// Run the model and merge tagged tokens into spans.
    pub fn extract(&self, text: &str) -> anyhow::Result<Vec<NativeSpan>> {
        let start = Instant::now();
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("tokenization failed: {}", e))?;

        let total = encoding.get_ids().len();
        if total > MAX_LENGTH {
            warn!(
                "Input is {} tokens, entities after token {} are dropped",
                total, MAX_LENGTH
            );
        }
        let len = total.min(MAX_LENGTH);
        if len == 0 {
            return Ok(Vec::new());
        }

        let input_ids = Tensor::new(&encoding.get_ids()[..len], &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = input_ids.ones_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let logits = self.classifier.forward(&hidden)?.squeeze(0)?;
        let probs = candle_nn::ops::softmax(&logits, 1)?.to_vec2::<f32>()?;

        let tags: Vec<Option<(usize, f32)>> = probs
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if encoding.get_special_tokens_mask().get(i).copied().unwrap_or(0) == 1 {
                    return None;
                }
                argmax(row)
            })
            .collect();

        let spans = merge_spans(
            text,
            &self.id2label,
            encoding.get_offsets(),
            encoding.get_word_ids(),
            &tags,
        );
        debug!("Extracted {} spans in {:?}", spans.len(), start.elapsed());
        Ok(spans)
    }
}

impl EntityPredictor for BertTokenClassifier {
    fn predict_entities(&self, text: &str, labels: &[String]) -> anyhow::Result<Vec<Value>> {
        self.extract(text)?
            .into_iter()
            .filter(|span| wants(labels, &span.label, &self.label_map))
            .map(|span| serde_json::to_value(span).map_err(Into::into))
            .collect()
    }
}

/// Merge per-token tags into spans.
///
/// `tags` is `None` for special tokens. Sub-word pieces follow the tag of
/// their word's first piece, and an `I-` tag continues an open span of the
/// same label. Anything else closes the open span.
fn merge_spans(
    text: &str,
    id2label: &HashMap<usize, String>,
    offsets: &[(usize, usize)],
    word_ids: &[Option<u32>],
    tags: &[Option<(usize, f32)>],
) -> Vec<NativeSpan> {
    let mut spans = Vec::new();
    // (label, byte start, byte end, scores)
    let mut current: Option<(String, usize, usize, Vec<f32>)> = None;

    for (i, tag) in tags.iter().enumerate() {
        let Some((id, score)) = *tag else { continue };
        let (tok_start, tok_end) = offsets[i];
        let raw = id2label.get(&id).map(String::as_str).unwrap_or("O");
        let (prefix, label) = split_bio(raw);
        let continues_word = i > 0 && word_ids[i].is_some() && word_ids[i] == word_ids[i - 1];

        match current.as_mut() {
            Some((_, _, end, scores)) if continues_word => {
                *end = tok_end;
                scores.push(score);
                continue;
            }
            Some((cur, _, end, scores)) if prefix == Some('I') && cur.as_str() == label => {
                *end = tok_end;
                scores.push(score);
                continue;
            }
            None if continues_word => continue,
            _ => {}
        }

        if let Some(done) = current.take() {
            spans.push(finish_span(text, done));
        }
        if label != "O" {
            current = Some((label.to_string(), tok_start, tok_end, vec![score]));
        }
    }

    if let Some(done) = current {
        spans.push(finish_span(text, done));
    }
    spans
}

/// Whether a span tagged `native` answers to any of the requested labels.
fn wants(labels: &[String], native: &str, label_map: &LabelMap) -> bool {
    let aliases = LABEL_ALIASES
        .iter()
        .find(|(tag, _)| tag.eq_ignore_ascii_case(native))
        .map(|(_, aliases)| *aliases)
        .unwrap_or_default();

    labels.is_empty()
        || labels.iter().any(|requested| {
            requested.eq_ignore_ascii_case(native)
                || requested.eq_ignore_ascii_case(label_map.remap(native))
                || aliases.iter().any(|alias| requested.eq_ignore_ascii_case(alias))
        })
}

fn parse_id2label(config: &Value) -> anyhow::Result<HashMap<usize, String>> {
    let table = config
        .get("id2label")
        .and_then(Value::as_object)
        .ok_or_else(|| anyhow!("config.json has no id2label table"))?;

    Ok(table
        .iter()
        .filter_map(|(k, v)| Some((k.parse().ok()?, v.as_str()?.to_string())))
        .collect())
}

fn wordpiece_from_vocab(path: &Path) -> anyhow::Result<Tokenizer> {
    let tokens: Vec<String> = std::fs::read_to_string(path)?
        .lines()
        .map(String::from)
        .collect();
    let id_of = |special: &str| {
        tokens
            .iter()
            .position(|t| t == special)
            .map(|i| (special.to_string(), i as u32))
            .ok_or_else(|| anyhow!("vocab.txt has no {} token", special))
    };
    let (sep, cls) = (id_of("[SEP]")?, id_of("[CLS]")?);

    let vocab: tokenizers::models::bpe::Vocab = tokens
        .iter()
        .enumerate()
        .map(|(i, token)| (token.clone(), i as u32))
        .collect();

    let wordpiece = WordPieceBuilder::new()
        .vocab(vocab)
        .continuing_subword_prefix("##".to_string())
        .max_input_chars_per_word(100)
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| anyhow!("WordPiece: {}", e))?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(Some(BertNormalizer::new(true, true, None, false)));
    tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
    tokenizer.with_post_processor(Some(BertProcessing::new(sep, cls)));
    Ok(tokenizer)
}

fn argmax(row: &[f32]) -> Option<(usize, f32)> {
    row.iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// `B-PER` → (Some('B'), "PER"), `O` → (None, "O").
fn split_bio(tag: &str) -> (Option<char>, &str) {
    match tag.split_once('-') {
        Some((p, rest)) if p == "B" || p == "I" => (p.chars().next(), rest),
        _ => (None, tag),
    }
}

fn finish_span(text: &str, (label, start, end, scores): (String, usize, usize, Vec<f32>)) -> NativeSpan {
    let score = scores.iter().sum::<f32>() / scores.len().max(1) as f32;
    NativeSpan {
        text: text.get(start..end).unwrap_or_default().to_string(),
        label,
        start: char_offset(text, start),
        end: char_offset(text, end),
        score,
    }
}

fn char_offset(text: &str, byte: usize) -> usize {
    text.get(..byte).map(|s| s.chars().count()).unwrap_or(byte)
}
