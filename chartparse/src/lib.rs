use log::debug;
use thiserror::Error;

pub mod chart;
pub mod error;
pub mod grammar;
pub mod production;
pub mod tree;
mod utils;

pub use crate::chart::{Chart, Span};
use crate::chart::Child;
pub use crate::error::GrammarError;
pub use crate::grammar::{ContextFreeGrammar, GrammarBuilder};
pub use crate::production::{Production, Symbol};
pub use crate::tree::Tree;

/// Why a sentence produced no tree. None of these abort a batch.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NoParseReason {
    #[error("no tokens to parse")]
    EmptyInput,
    #[error("tokens not in grammar: {}", .0.join(", "))]
    UnknownToken(Vec<String>),
    #[error("no derivation of the start symbol covers the input")]
    NoDerivation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(Tree),
    NoParse(NoParseReason),
}

impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }

    pub fn tree(&self) -> Option<&Tree> {
        match self {
            ParseOutcome::Parsed(tree) => Some(tree),
            ParseOutcome::NoParse(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&NoParseReason> {
        match self {
            ParseOutcome::Parsed(_) => None,
            ParseOutcome::NoParse(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<Tree, NoParseReason> {
        match self {
            ParseOutcome::Parsed(tree) => Ok(tree),
            ParseOutcome::NoParse(reason) => Err(reason),
        }
    }
}

/// Bottom-up chart parser. Spans are completed shortest first; within a span, structural
/// productions are tried in grammar order, split points left to right, and the first
/// constituent found for a label is the only one kept. The result is therefore a single,
/// deterministic derivation.
pub struct ChartParser<'a> {
    grammar: &'a ContextFreeGrammar,
}

impl<'a> ChartParser<'a> {
    pub fn from_grammar(grammar: &'a ContextFreeGrammar) -> Self {
        ChartParser { grammar }
    }

    pub fn grammar(&self) -> &'a ContextFreeGrammar {
        self.grammar
    }

    /// Fills the chart for `tokens`. Fails without building a chart if the input is empty or
    /// contains tokens outside the grammar's terminals.
    pub fn chart_parse<'b>(&self, tokens: &'b [String]) -> Result<Chart<'b>, NoParseReason> {
        if tokens.is_empty() {
            return Err(NoParseReason::EmptyInput);
        }
        if !self.grammar.check_coverage(tokens) {
            return Err(NoParseReason::UnknownToken(
                self.grammar.unknown_tokens(tokens),
            ));
        }

        let mut chart = Chart::new(tokens);
        let n = tokens.len();
        for length in 1..=n {
            for start in 0..=n - length {
                let span = Span::new(start, start + length);
                if length == 1 {
                    self.seed(&mut chart, span);
                }
                self.complete(&mut chart, span);
            }
        }
        Ok(chart)
    }

    fn seed(&self, chart: &mut Chart, span: Span) {
        let token = &chart.leaves()[span.start];
        let categories: Vec<&str> = self
            .grammar
            .lexical_productions_for(token)
            .iter()
            .map(|p| p.lhs())
            .collect();
        for category in categories {
            chart.insert(span, category, smallvec::smallvec![Child::Leaf(span.start)]);
        }
    }

    /// Applies structural productions to `span` until no new label appears. Repeating the scan
    /// lets unary productions (`VP -> V`) build on labels added earlier in the same cell.
    fn complete(&self, chart: &mut Chart, span: Span) {
        loop {
            let mut changed = false;
            for production in self.grammar.structural_productions() {
                if production.len() > span.len() || chart.contains(span, production.lhs()) {
                    continue;
                }
                if let Some(children) = chart.match_rhs(production.rhs(), span) {
                    changed |= chart.insert(span, production.lhs(), children);
                }
            }
            if !changed {
                break;
            }
        }
    }

    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> ParseOutcome {
        let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        let chart = match self.chart_parse(&tokens) {
            Ok(chart) => chart,
            Err(reason) => {
                debug!("no parse for {:?}: {}", tokens, reason);
                return ParseOutcome::NoParse(reason);
            }
        };
        debug!(
            "filled chart for {} tokens with {} constituents",
            tokens.len(),
            chart.num_constituents()
        );

        match chart.tree(self.grammar.start(), Span::new(0, tokens.len())) {
            Some(tree) => ParseOutcome::Parsed(tree),
            None => ParseOutcome::NoParse(NoParseReason::NoDerivation),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tagalog_grammar(extra: &str) -> ContextFreeGrammar {
        let text = format!(
            "S -> VP NP | NP AY VP\nVP -> V\nNP -> DET N\nAY -> 'ay'\n{}",
            extra
        );
        grammar::read_grammar(&text)
            .unwrap()
            .lexicon(vec![("V", "kumain"), ("DET", "ang"), ("N", "bata")])
            .build()
            .unwrap()
    }

    fn tree(s: &str) -> Tree {
        Tree::from_bracketed(s).unwrap()
    }

    #[test]
    fn test_verb_initial() {
        let grammar = tagalog_grammar("");
        let parser = ChartParser::from_grammar(&grammar);
        assert_eq!(
            parser.parse(&["kumain", "ang", "bata"]),
            ParseOutcome::Parsed(tree("(S (VP (V kumain)) (NP (DET ang) (N bata)))"))
        );
    }

    #[test]
    fn test_marker() {
        let grammar = tagalog_grammar("");
        let parser = ChartParser::from_grammar(&grammar);
        assert_eq!(
            parser.parse(&["ang", "bata", "ay", "kumain"]),
            ParseOutcome::Parsed(tree(
                "(S (NP (DET ang) (N bata)) (AY ay) (VP (V kumain)))"
            ))
        );
    }

    #[test]
    fn test_failures() {
        let grammar = tagalog_grammar("");
        let parser = ChartParser::from_grammar(&grammar);
        let empty: [&str; 0] = [];
        assert_eq!(
            parser.parse(&empty),
            ParseOutcome::NoParse(NoParseReason::EmptyInput)
        );
        assert_eq!(
            parser.parse(&["kumain", "ang", "pusa", "aso"]),
            ParseOutcome::NoParse(NoParseReason::UnknownToken(vec![
                "pusa".to_string(),
                "aso".to_string()
            ]))
        );
        assert_eq!(
            parser.parse(&["ang", "bata", "kumain"]),
            ParseOutcome::NoParse(NoParseReason::NoDerivation)
        );
    }

    #[test]
    fn test_first_derivation_kept() {
        // Both `NP -> DET N` and `NP -> DET X` cover "ang bata"; the first in grammar order wins.
        let grammar = tagalog_grammar("NP -> DET X\nX -> 'bata'");
        let parser = ChartParser::from_grammar(&grammar);
        let outcome = parser.parse(&["kumain", "ang", "bata"]);
        assert_eq!(
            outcome.tree().map(|t| t[&[1][..]].to_string()),
            Some("(NP (DET ang) (N bata))".to_string())
        );
    }

    #[test]
    fn test_leftmost_split_kept() {
        // "a a a" splits as (A (A a a) a) and (A a (A a a)); the left-to-right scan finds the
        // split after the first token first.
        let grammar: ContextFreeGrammar = "A -> A A | 'a'".parse().unwrap();
        let parser = ChartParser::from_grammar(&grammar);
        assert_eq!(
            parser.parse(&["a", "a", "a"]),
            ParseOutcome::Parsed(tree("(A (A a) (A (A a) (A a)))"))
        );
    }

    #[test]
    fn test_unary_chain_and_cycle() {
        let grammar: ContextFreeGrammar = "S -> A\nA -> B\nB -> A | 'x'".parse().unwrap();
        let parser = ChartParser::from_grammar(&grammar);
        assert_eq!(
            parser.parse(&["x"]),
            ParseOutcome::Parsed(tree("(S (A (B x)))"))
        );
    }

    #[test]
    fn test_terminal_in_structural_rhs() {
        let grammar: ContextFreeGrammar = "S -> 'ang' N\nN -> 'bata'".parse().unwrap();
        let parser = ChartParser::from_grammar(&grammar);
        assert_eq!(
            parser.parse(&["ang", "bata"]),
            ParseOutcome::Parsed(tree("(S ang (N bata))"))
        );
    }

    #[test]
    fn test_undefined_nonterminal_fails_cleanly() {
        let grammar: ContextFreeGrammar = "S -> N MISSING | N\nN -> 'bata'".parse().unwrap();
        let parser = ChartParser::from_grammar(&grammar);
        assert_eq!(
            parser.parse(&["bata", "bata"]),
            ParseOutcome::NoParse(NoParseReason::NoDerivation)
        );
        assert!(parser.parse(&["bata"]).is_parsed());
    }

    #[test]
    fn test_chart_labels() {
        let grammar = tagalog_grammar("");
        let parser = ChartParser::from_grammar(&grammar);
        let tokens: Vec<String> = vec!["kumain".into(), "ang".into(), "bata".into()];
        let chart = parser.chart_parse(&tokens).unwrap();
        assert_eq!(
            chart.labels(Span::new(0, 1)).collect::<Vec<_>>(),
            vec!["V", "VP"]
        );
        assert_eq!(chart.labels(Span::new(1, 3)).collect::<Vec<_>>(), vec!["NP"]);
        assert_eq!(chart.labels(Span::new(0, 3)).collect::<Vec<_>>(), vec!["S"]);
    }
}
