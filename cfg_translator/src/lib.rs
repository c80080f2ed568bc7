//! Tagalog to English translation by parsing, reordering and word-for-word lookup.
//!
//! A sentence is tokenized, parsed with a [`chartparse::ChartParser`], rewritten from predicate
//! first to subject first order by [`RewriteRules`], and translated leaf by leaf against a
//! [`Dictionary`].

pub mod config;
pub mod corpus;
pub mod dedup;
pub mod lexical;
pub mod lexicon;
pub mod pipeline;
pub mod report;
pub mod resources;
pub mod rewrite;
pub mod visualization;

pub use crate::config::{ConfigError, TranslatorConfig};
pub use crate::corpus::{parse_corpus, tokenize, CorpusEntry};
pub use crate::dedup::{dedup_json, dedup_lines, DedupError};
pub use crate::lexical::{translate, Dictionary, DictionaryError, NOT_AVAILABLE};
pub use crate::lexicon::{parse_lexicon, LexiconEntry};
pub use crate::pipeline::{CoverageSummary, SentenceResult, Translator};
pub use crate::report::{console_report, report_rows, write_jsonl, ReportRow};
pub use crate::resources::Resources;
pub use crate::rewrite::{rewrite, RewriteRules, RewriteRulesError};
pub use crate::visualization::{render_dot, write_rendering};
