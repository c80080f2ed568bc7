use std::path::Path;

use anyhow::Context;
use chartparse::grammar::read_grammar;
use chartparse::{ContextFreeGrammar, GrammarBuilder};
use log::info;

use crate::config::TranslatorConfig;
use crate::corpus::{parse_corpus, vocabulary, CorpusEntry};
use crate::lexical::Dictionary;
use crate::lexicon::{parse_lexicon, LexiconEntry};

fn read_file(path: &Path, what: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {} `{}`", what, path.display()))
}

pub fn load_grammar_rules<P: AsRef<Path>>(path: P) -> anyhow::Result<GrammarBuilder> {
    let path = path.as_ref();
    let text = read_file(path, "grammar")?;
    let builder = read_grammar(&text)
        .with_context(|| format!("failed to parse grammar `{}`", path.display()))?;
    info!("loaded grammar rules from {}", path.display());
    Ok(builder)
}

pub fn load_lexicon<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<LexiconEntry>> {
    let path = path.as_ref();
    let entries = parse_lexicon(&read_file(path, "lexicon")?);
    info!("loaded {} lexicon entries from {}", entries.len(), path.display());
    Ok(entries)
}

pub fn load_dictionary<P: AsRef<Path>>(path: P) -> anyhow::Result<Dictionary> {
    let path = path.as_ref();
    let dictionary = Dictionary::from_json_str(&read_file(path, "dictionary")?)
        .with_context(|| format!("failed to parse dictionary `{}`", path.display()))?;
    info!("loaded {} dictionary entries from {}", dictionary.len(), path.display());
    Ok(dictionary)
}

pub fn load_corpus<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<CorpusEntry>> {
    let path = path.as_ref();
    let entries = parse_corpus(&read_file(path, "corpus")?);
    info!("loaded {} corpus sentences from {}", entries.len(), path.display());
    Ok(entries)
}

/// Everything the pipeline reads from disk.
pub struct Resources {
    pub grammar: ContextFreeGrammar,
    pub dictionary: Dictionary,
    pub corpus: Vec<CorpusEntry>,
}

impl Resources {
    /// Loads every resource named by `config` and builds the grammar, giving corpus tokens the
    /// lexicon does not cover a fallback production.
    pub fn load(config: &TranslatorConfig) -> anyhow::Result<Self> {
        let corpus = load_corpus(&config.corpus)?;
        let lexicon = load_lexicon(&config.lexicon)?;
        let grammar = build_grammar(
            load_grammar_rules(&config.grammar)?,
            &lexicon,
            &corpus,
            config,
        )?;
        let dictionary = load_dictionary(&config.dictionary)?;
        Ok(Resources {
            grammar,
            dictionary,
            corpus,
        })
    }

    /// Loads the grammar and dictionary only. Without a corpus there are no fallback tokens.
    pub fn load_without_corpus(config: &TranslatorConfig) -> anyhow::Result<Self> {
        let lexicon = load_lexicon(&config.lexicon)?;
        let grammar = build_grammar(
            load_grammar_rules(&config.grammar)?,
            &lexicon,
            &[],
            config,
        )?;
        let dictionary = load_dictionary(&config.dictionary)?;
        Ok(Resources {
            grammar,
            dictionary,
            corpus: Vec::new(),
        })
    }
}

pub fn build_grammar(
    rules: GrammarBuilder,
    lexicon: &[LexiconEntry],
    corpus: &[CorpusEntry],
    config: &TranslatorConfig,
) -> anyhow::Result<ContextFreeGrammar> {
    rules
        .lexicon(lexicon.iter().map(LexiconEntry::as_pair))
        .fallback_tokens(vocabulary(corpus))
        .fallback_category(config.fallback_category.as_str())
        .strict(config.strict)
        .build()
        .context("failed to build grammar")
}
