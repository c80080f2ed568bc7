use std::fmt::{Debug, Display, Formatter};

use itertools::Itertools;
use smallvec::SmallVec;

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(String),
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::NonTerminal(nt) => write!(f, "NonTerminal::{}", nt),
            Symbol::Terminal(t) => write!(f, "Terminal::{{ \"{}\" }}", t),
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::NonTerminal(nt) => write!(f, "{}", nt),
            Symbol::Terminal(t) => write!(f, "\"{}\"", t),
        }
    }
}

impl Symbol {
    pub fn terminal<S: Into<String>>(s: S) -> Self {
        Symbol::Terminal(s.into())
    }

    pub fn nonterminal<S: Into<String>>(s: S) -> Self {
        Symbol::NonTerminal(s.into())
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn as_terminal(&self) -> Option<&str> {
        match self {
            Symbol::Terminal(t) => Some(t),
            Symbol::NonTerminal(_) => None,
        }
    }

    pub fn as_nonterminal(&self) -> Option<&str> {
        match self {
            Symbol::Terminal(_) => None,
            Symbol::NonTerminal(nt) => Some(nt),
        }
    }
}

/// A single rewrite rule `lhs -> rhs`. Two productions are equal iff both sides are equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Production {
    pub lhs: String,
    pub rhs: SmallVec<[Symbol; 6]>,
}

impl Production {
    pub fn new<S: Into<String>>(lhs: S, rhs: Vec<Symbol>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    /// Builds the lexical production `category -> "word"`.
    pub fn lexical<C: Into<String>, W: Into<String>>(category: C, word: W) -> Self {
        Self::new(category, vec![Symbol::Terminal(word.into())])
    }

    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    /// A production is lexical if its right hand side is exactly one terminal.
    pub fn is_lexical(&self) -> bool {
        matches!(self.rhs.as_slice(), [Symbol::Terminal(_)])
    }

    pub fn is_structural(&self) -> bool {
        !self.is_lexical()
    }

    /// The word of a lexical production.
    pub fn word(&self) -> Option<&str> {
        match self.rhs.as_slice() {
            [Symbol::Terminal(t)] => Some(t),
            _ => None,
        }
    }

    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        self.rhs.iter().filter_map(Symbol::as_terminal)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.rhs.iter().filter_map(Symbol::as_nonterminal)
    }
}

impl Debug for Production {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Production: {}]", self)
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.lhs,
            self.rhs.iter().map(|x| x.to_string()).join(" ")
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lexical() {
        let prod = Production::lexical("V", "kumain");
        assert!(prod.is_lexical());
        assert_eq!(prod.word(), Some("kumain"));
        assert_eq!(prod.to_string(), "V -> \"kumain\"");

        let prod = Production::new("VP", vec![Symbol::nonterminal("V")]);
        assert!(prod.is_structural());
        assert_eq!(prod.word(), None);

        let prod = Production::new(
            "NP",
            vec![Symbol::terminal("ang"), Symbol::nonterminal("N")],
        );
        assert!(prod.is_structural());
        assert_eq!(prod.terminals().collect::<Vec<_>>(), vec!["ang"]);
        assert_eq!(prod.nonterminals().collect::<Vec<_>>(), vec!["N"]);
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            Production::lexical("N", "bata"),
            Production::new("N", vec![Symbol::terminal("bata")])
        );
        assert_ne!(
            Production::lexical("N", "bata"),
            Production::new("N", vec![Symbol::nonterminal("bata")])
        );
    }
}
