use thiserror::Error;

/// Errors raised while reading or assembling a grammar. All of these are fatal: no sentence
/// should be parsed against a grammar that failed to build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: &'static str },
    #[error("grammar has no productions")]
    Empty,
    #[error("start symbol `{0}` is not the left hand side of any production")]
    MissingStart(String),
    #[error("nonterminal `{symbol}` in `{production}` is not the left hand side of any production")]
    UndefinedNonterminal { symbol: String, production: String },
    #[error("production for `{0}` has an empty right hand side")]
    EmptyRhs(String),
    #[error("token `{0}` is not covered by any lexical production")]
    UncoveredToken(String),
}
