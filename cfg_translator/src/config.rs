use std::path::{Path, PathBuf};

use anyhow::Context;
use chartparse::grammar::DEFAULT_FALLBACK_CATEGORY;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rewrite::{RewriteRules, RewriteRulesError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid rewrite rules: {0}")]
    Rewrite(#[from] RewriteRulesError),
}

/// Resource locations and pipeline settings. Every field has a default, so a configuration file
/// only needs the fields it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub grammar: PathBuf,
    pub lexicon: PathBuf,
    pub dictionary: PathBuf,
    pub corpus: PathBuf,
    /// Where the JSON Lines report is written.
    pub output: PathBuf,
    /// Category given to corpus tokens that no lexical production covers.
    pub fallback_category: String,
    /// Fail when a nonterminal is used but never defined.
    pub strict: bool,
    pub rewrite: RewriteRules,
    /// How many unparsed and parsed sentences the console report shows.
    pub examples: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            grammar: PathBuf::from("Appendix_Methodology_Resource_Grammar_Tagalog_CFG.cfg"),
            lexicon: PathBuf::from("Appendix_B_Resource_Lexicon_Tagalog_POS.tsv"),
            dictionary: PathBuf::from("Appendix_C_Resource_Dictionary_Tagalog_English.json"),
            corpus: PathBuf::from("Appendix_A_Parallel_Corpus_Tagalog_English.tsv"),
            output: PathBuf::from("translation_analysis_output.jsonl"),
            fallback_category: DEFAULT_FALLBACK_CATEGORY.to_string(),
            strict: false,
            rewrite: RewriteRules::default(),
            examples: 10,
        }
    }
}

impl TranslatorConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.rewrite.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config `{}`", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("failed to parse config `{}`", path.display()))
    }
}
