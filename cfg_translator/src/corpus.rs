use std::collections::BTreeSet;

use log::warn;
use serde::Serialize;

/// One row of the parallel corpus: `source id, source sentence, target id, reference`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CorpusEntry {
    pub source_id: String,
    pub source: String,
    pub target_id: String,
    pub reference: String,
    pub tokens: Vec<String>,
}

impl CorpusEntry {
    pub fn new<S: Into<String>>(source: S, reference: S) -> Self {
        let source = source.into();
        CorpusEntry {
            source_id: String::new(),
            tokens: tokenize(&source),
            source,
            target_id: String::new(),
            reference: reference.into(),
        }
    }
}

/// Lowercases and splits on whitespace.
pub fn tokenize(sentence: &str) -> Vec<String> {
    sentence
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect()
}

/// Reads the tab separated corpus. Rows with fewer than two fields are skipped with a warning;
/// missing trailing fields are left empty.
pub fn parse_corpus(text: &str) -> Vec<CorpusEntry> {
    let mut entries = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (source_id, source) = match (fields.next(), fields.next()) {
            (Some(id), Some(source)) => (id, source),
            _ => {
                warn!("skipping corpus line {}: expected tab separated fields", index + 1);
                continue;
            }
        };
        let target_id = fields.next().unwrap_or_default();
        let reference = fields.next().unwrap_or_default();

        entries.push(CorpusEntry {
            source_id: source_id.to_string(),
            source: source.to_string(),
            target_id: target_id.to_string(),
            reference: reference.to_string(),
            tokens: tokenize(source),
        });
    }
    entries
}

/// Every distinct token of the corpus, sorted.
pub fn vocabulary<'a, I: IntoIterator<Item = &'a CorpusEntry>>(entries: I) -> BTreeSet<String> {
    entries
        .into_iter()
        .flat_map(|entry| entry.tokens.iter().cloned())
        .collect()
}
