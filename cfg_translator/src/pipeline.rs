use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chartparse::{ChartParser, ContextFreeGrammar, NoParseReason, ParseOutcome, Tree};
use log::{debug, info};
use rayon::prelude::*;

use crate::lexical::{translate, Dictionary};
use crate::rewrite::RewriteRules;

/// Everything produced for one sentence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentenceResult {
    pub tokens: Vec<String>,
    pub outcome: ParseOutcome,
    /// The rewritten tree, present iff the sentence parsed.
    pub rewritten: Option<Tree>,
    pub translation: String,
    /// Wall time spent in the parser, pre-checks included.
    pub parse_time: Duration,
}

impl SentenceResult {
    pub fn is_parsed(&self) -> bool {
        self.outcome.is_parsed()
    }

    /// The leaves of the rewritten tree, joined with spaces.
    pub fn rewritten_text(&self) -> Option<String> {
        self.rewritten.as_ref().map(|tree| tree.leaves().join(" "))
    }
}

/// Parses, rewrites and translates sentences against a shared grammar and dictionary. Nothing
/// here is mutated per sentence, so one translator serves any number of threads.
pub struct Translator<'a> {
    parser: ChartParser<'a>,
    dictionary: &'a Dictionary,
    rules: RewriteRules,
}

impl<'a> Translator<'a> {
    pub fn new(grammar: &'a ContextFreeGrammar, dictionary: &'a Dictionary) -> Self {
        Self::with_rules(grammar, dictionary, RewriteRules::default())
    }

    pub fn with_rules(
        grammar: &'a ContextFreeGrammar,
        dictionary: &'a Dictionary,
        rules: RewriteRules,
    ) -> Self {
        Translator {
            parser: ChartParser::from_grammar(grammar),
            dictionary,
            rules,
        }
    }

    pub fn parser(&self) -> &ChartParser<'a> {
        &self.parser
    }

    pub fn grammar(&self) -> &'a ContextFreeGrammar {
        self.parser.grammar()
    }

    /// Runs one sentence through the pipeline. Sentences that do not parse are translated from
    /// their raw tokens, skipping the rewrite.
    pub fn translate_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> SentenceResult {
        let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        let start = Instant::now();
        let outcome = self.parser.parse(&tokens);
        let parse_time = start.elapsed();
        let rewritten = outcome.tree().map(|tree| self.rules.rewrite(tree));
        let translation = match &rewritten {
            Some(tree) => translate(&tree.leaves(), self.dictionary),
            None => translate(&tokens, self.dictionary),
        };
        debug!("{:?} -> {:?}", tokens, translation);

        SentenceResult {
            tokens,
            outcome,
            rewritten,
            translation,
            parse_time,
        }
    }

    /// Translates every sentence in parallel. Results are in input order.
    pub fn translate_corpus<S: AsRef<str> + Sync>(&self, sentences: &[Vec<S>]) -> Vec<SentenceResult> {
        let results: Vec<SentenceResult> = sentences
            .par_iter()
            .map(|tokens| self.translate_tokens(tokens))
            .collect();
        info!(
            "translated {} sentences, {} parsed",
            results.len(),
            results.iter().filter(|r| r.is_parsed()).count()
        );
        results
    }
}

/// Parse coverage counts over a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub total: usize,
    pub parsed: usize,
    pub empty: usize,
    pub unknown_token: usize,
    pub no_derivation: usize,
    /// How many sentences each unknown token blocked.
    pub unknown_tokens: BTreeMap<String, usize>,
    /// Sentences that reached the chart, parsed or not.
    pub attempted: usize,
    /// Parse time summed over the attempted sentences.
    pub parse_time: Duration,
}

impl CoverageSummary {
    pub fn from_results<'r, I: IntoIterator<Item = &'r SentenceResult>>(results: I) -> Self {
        let mut summary = CoverageSummary::default();
        for result in results {
            summary.total += 1;
            match &result.outcome {
                ParseOutcome::Parsed(_) => {
                    summary.parsed += 1;
                    summary.attempted += 1;
                    summary.parse_time += result.parse_time;
                }
                ParseOutcome::NoParse(NoParseReason::EmptyInput) => summary.empty += 1,
                ParseOutcome::NoParse(NoParseReason::NoDerivation) => {
                    summary.no_derivation += 1;
                    summary.attempted += 1;
                    summary.parse_time += result.parse_time;
                }
                ParseOutcome::NoParse(NoParseReason::UnknownToken(tokens)) => {
                    summary.unknown_token += 1;
                    let mut distinct = tokens.clone();
                    distinct.sort();
                    distinct.dedup();
                    for token in distinct {
                        *summary.unknown_tokens.entry(token).or_default() += 1;
                    }
                }
            }
        }
        summary
    }

    pub fn unparsed(&self) -> usize {
        self.total - self.parsed
    }

    /// Mean parse time over the sentences that reached the chart. `None` if there were none.
    pub fn average_parse_time(&self) -> Option<Duration> {
        match u32::try_from(self.attempted) {
            Ok(0) | Err(_) => None,
            Ok(attempted) => Some(self.parse_time / attempted),
        }
    }
}
