use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use fnv::{FnvBuildHasher, FnvHashSet};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};

use crate::error::GrammarError;
use crate::production::{Production, Symbol};
use crate::utils::SplitFirstChar;

type FnvIndexMap<K, V> = IndexMap<K, V, FnvBuildHasher>;
type FnvIndexSet<K> = IndexSet<K, FnvBuildHasher>;

/// The default category given to corpus tokens that no lexical production covers.
pub const DEFAULT_FALLBACK_CATEGORY: &str = "N";

/// An immutable context free grammar. Once built, it is only ever read, so one instance can be
/// shared by every sentence (and every thread) of a run.
#[derive(Clone, Debug)]
pub struct ContextFreeGrammar {
    start: String,
    productions: Vec<Arc<Production>>,
    lhs_index: FnvIndexMap<String, Vec<Arc<Production>>>,
    lexical_index: FnvIndexMap<String, Vec<Arc<Production>>>,
    structural: Vec<Arc<Production>>,
    terminals: FnvIndexSet<String>,
    undefined: Vec<String>,
    num_fallback: usize,
}

impl ContextFreeGrammar {
    /// Builds a grammar from structural productions, `(tag, word)` lexicon entries and the corpus
    /// tokens that need fallback coverage, using the default fallback category.
    pub fn build<S, P, L, T, W>(
        start: S,
        structural: P,
        lexicon: L,
        fallback_tokens: W,
    ) -> Result<Self, GrammarError>
    where
        S: Into<String>,
        P: IntoIterator<Item = Production>,
        L: IntoIterator<Item = (T, T)>,
        T: Into<String>,
        W: IntoIterator<Item = T>,
    {
        GrammarBuilder::new(start)
            .structural(structural)
            .lexicon(lexicon)
            .fallback_tokens(fallback_tokens)
            .build()
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn start_symbol(&self) -> Symbol {
        Symbol::NonTerminal(self.start.clone())
    }

    pub fn productions(&self) -> &[Arc<Production>] {
        &self.productions
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Every production with the given left hand side, in the order they were added.
    pub fn productions_with_lhs(&self, lhs: &str) -> &[Arc<Production>] {
        self.lhs_index.get(lhs).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every lexical production `category -> "terminal"`, in the order they were added.
    pub fn lexical_productions_for(&self, terminal: &str) -> &[Arc<Production>] {
        self.lexical_index
            .get(terminal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Non-lexical productions, grouped by left hand side in order of first appearance.
    pub fn structural_productions(&self) -> &[Arc<Production>] {
        &self.structural
    }

    /// Every terminal that appears on any right hand side.
    pub fn terminal_set(&self) -> &IndexSet<String, FnvBuildHasher> {
        &self.terminals
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.lhs_index.keys().map(String::as_str)
    }

    /// Nonterminals used on a right hand side which never appear as a left hand side.
    pub fn undefined_nonterminals(&self) -> &[String] {
        &self.undefined
    }

    pub fn num_lexical(&self) -> usize {
        self.productions.iter().filter(|p| p.is_lexical()).count()
    }

    pub fn num_fallback(&self) -> usize {
        self.num_fallback
    }

    pub fn check_coverage<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        tokens
            .iter()
            .all(|t| self.terminals.contains(t.as_ref()))
    }

    /// The tokens that do not appear in `terminal_set`, in input order.
    pub fn unknown_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !self.terminals.contains(*t))
            .map(String::from)
            .collect()
    }
}

impl FromStr for ContextFreeGrammar {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        read_grammar(s)?.build()
    }
}

/// Collects structural productions, lexicon entries and fallback tokens, and compiles them into
/// a `ContextFreeGrammar`. Exact duplicate productions are discarded, keeping the first.
#[derive(Clone, Debug)]
pub struct GrammarBuilder {
    start: String,
    productions: Vec<Production>,
    seen: FnvHashSet<Production>,
    lexicon_words: FnvHashSet<String>,
    fallback_tokens: BTreeSet<String>,
    fallback_category: String,
    strict: bool,
}

impl GrammarBuilder {
    pub fn new<S: Into<String>>(start: S) -> Self {
        GrammarBuilder {
            start: start.into(),
            productions: Vec::new(),
            seen: FnvHashSet::default(),
            lexicon_words: FnvHashSet::default(),
            fallback_tokens: BTreeSet::new(),
            fallback_category: DEFAULT_FALLBACK_CATEGORY.to_string(),
            strict: false,
        }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn with_start<S: Into<String>>(mut self, start: S) -> Self {
        self.start = start.into();
        self
    }

    fn push(&mut self, production: Production) -> bool {
        if self.seen.contains(&production) {
            return false;
        }
        self.seen.insert(production.clone());
        self.productions.push(production);
        true
    }

    pub fn structural<P: IntoIterator<Item = Production>>(mut self, productions: P) -> Self {
        for production in productions {
            self.push(production);
        }
        self
    }

    /// Compiles each `(tag, word)` entry into the lexical production `tag -> "word"`.
    pub fn lexicon<L, T>(mut self, entries: L) -> Self
    where
        L: IntoIterator<Item = (T, T)>,
        T: Into<String>,
    {
        let mut added = 0;
        for (tag, word) in entries {
            let word: String = word.into();
            self.lexicon_words.insert(word.clone());
            if self.push(Production::lexical(tag, word)) {
                added += 1;
            }
        }
        debug!("lexicon contributed {} productions", added);
        self
    }

    /// Tokens observed in the corpus. Any that no lexicon entry names at build time gets a
    /// production under the fallback category, even when a grammar rule such as `AY -> 'ay'`
    /// already derives it. Empty tokens are ignored.
    pub fn fallback_tokens<W, T>(mut self, tokens: W) -> Self
    where
        W: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.fallback_tokens.extend(
            tokens
                .into_iter()
                .map(Into::<String>::into)
                .filter(|t| !t.is_empty()),
        );
        self
    }

    pub fn fallback_category<S: Into<String>>(mut self, category: S) -> Self {
        self.fallback_category = category.into();
        self
    }

    /// In strict mode, a nonterminal that is never a left hand side fails the build instead of
    /// only being reported.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(mut self) -> Result<ContextFreeGrammar, GrammarError> {
        let fallback_tokens = std::mem::take(&mut self.fallback_tokens);
        let lexicon_words = std::mem::take(&mut self.lexicon_words);
        let category = self.fallback_category.clone();
        let mut num_fallback = 0;
        for token in fallback_tokens.iter().filter(|t| !lexicon_words.contains(*t)) {
            if self.push(Production::lexical(category.as_str(), token.as_str())) {
                num_fallback += 1;
            }
        }
        if num_fallback > 0 {
            info!(
                "added {} uncovered tokens as `{}` productions",
                num_fallback, category
            );
        }

        let grammar = ContextFreeGrammar::from_productions(
            self.start,
            self.productions,
            num_fallback,
            self.strict,
        )?;

        if let Some(token) = fallback_tokens
            .iter()
            .find(|t| !grammar.terminals.contains(*t))
        {
            return Err(GrammarError::UncoveredToken(token.clone()));
        }

        Ok(grammar)
    }
}

impl ContextFreeGrammar {
    fn from_productions(
        start: String,
        productions: Vec<Production>,
        num_fallback: usize,
        strict: bool,
    ) -> Result<Self, GrammarError> {
        if productions.is_empty() {
            return Err(GrammarError::Empty);
        }

        let productions: Vec<Arc<Production>> = productions.into_iter().map(Arc::new).collect();
        let mut lhs_index: FnvIndexMap<String, Vec<Arc<Production>>> = FnvIndexMap::default();
        let mut lexical_index: FnvIndexMap<String, Vec<Arc<Production>>> = FnvIndexMap::default();
        let mut terminals = FnvIndexSet::default();

        for prod in productions.iter() {
            if prod.is_empty() {
                return Err(GrammarError::EmptyRhs(prod.lhs.clone()));
            }
            lhs_index
                .entry(prod.lhs.clone())
                .or_default()
                .push(prod.clone());
            if let Some(word) = prod.word() {
                lexical_index
                    .entry(word.to_string())
                    .or_default()
                    .push(prod.clone());
            }
            terminals.extend(prod.terminals().map(String::from));
        }

        if !lhs_index.contains_key(&start) {
            return Err(GrammarError::MissingStart(start));
        }

        let mut undefined: FnvIndexSet<String> = FnvIndexSet::default();
        for prod in productions.iter() {
            for nt in prod.nonterminals() {
                if lhs_index.contains_key(nt) || undefined.contains(nt) {
                    continue;
                }
                if strict {
                    return Err(GrammarError::UndefinedNonterminal {
                        symbol: nt.to_string(),
                        production: prod.to_string(),
                    });
                }
                warn!(
                    "nonterminal `{}` (used in `{}`) has no productions; it can never be parsed",
                    nt, prod
                );
                undefined.insert(nt.to_string());
            }
        }

        let structural = lhs_index
            .values()
            .flatten()
            .filter(|p| p.is_structural())
            .cloned()
            .collect();

        let grammar = ContextFreeGrammar {
            start,
            productions,
            lhs_index,
            lexical_index,
            structural,
            terminals,
            undefined: undefined.into_iter().collect(),
            num_fallback,
        };
        info!(
            "grammar: {} productions ({} lexical), {} terminals, start `{}`",
            grammar.len(),
            grammar.num_lexical(),
            grammar.terminals.len(),
            grammar.start
        );
        Ok(grammar)
    }
}

/// Reads a nonterminal from `line`, returning the nonterminal and the rest of the string if no
/// error occurs.
pub fn standard_nonterm_parser(s: &str) -> Result<(String, &str), &'static str> {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c == '/' || c.is_alphanumeric() => {}
        Some(_) => return Err("unexpected character at start of nonterminal"),
        None => return Err("expected a nonterminal"),
    }

    let end = chars
        .find(|&(_, c)| !(c.is_alphanumeric() || matches!(c, '/' | '^' | '<' | '>' | '-' | '_')))
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    let (nonterm, rest) = s.split_at(end);
    Ok((nonterm.to_string(), rest))
}

/// Reads a quoted terminal from `line`, returning the terminal and the rest of the string if no
/// error occurs.
fn standard_terminal_parser(line: &str) -> Result<(String, &str), &'static str> {
    let (quote, line) = line.split_first().ok_or("expected a terminal")?;

    if quote != '\'' && quote != '"' {
        return Err("terminal did not start with a quote");
    }

    match line.split_once(quote) {
        Some(("", _)) => Err("empty terminal"),
        Some((in_quotes, rest)) => Ok((in_quotes.to_string(), rest)),
        None => Err("no terminating quote found"),
    }
}

fn eat_disjunction(line: &str) -> Option<&str> {
    line.strip_prefix('|')
}

fn eat_arrow(line: &str) -> Option<&str> {
    line.strip_prefix("->")
}

/// Reads one rule, `LHS -> alt | alt ...`, into one production per alternative.
pub fn read_production(line: &str) -> Result<Vec<Production>, &'static str> {
    let (lhs, mut rest) = standard_nonterm_parser(line)?;
    rest = rest.trim_start();
    rest = eat_arrow(rest).ok_or("did not find an arrow after the nonterminal")?;
    rest = rest.trim_start();

    let mut productions: Vec<_> = vec![Production::new(lhs.clone(), vec![])];

    while let Some(c) = rest.chars().next() {
        let current = productions.last_mut().ok_or("no production to extend")?;
        match c {
            '\'' | '"' => {
                let (t, rest_) = standard_terminal_parser(rest)?;
                current.rhs.push(Symbol::Terminal(t));
                rest = rest_;
            }
            '|' => {
                if current.is_empty() {
                    return Err("empty alternative");
                }
                rest = eat_disjunction(rest).ok_or("no disjunction found")?;
                productions.push(Production::new(lhs.clone(), vec![]));
            }
            _ => {
                let (nt, rest_) = standard_nonterm_parser(rest)?;
                current.rhs.push(Symbol::NonTerminal(nt));
                rest = rest_;
            }
        }

        rest = rest.trim_start();
    }

    if productions.iter().any(Production::is_empty) {
        return Err("empty alternative");
    }

    Ok(productions)
}

/// Reads a grammar in the usual `LHS -> RHS | RHS` notation. The start symbol is the left hand
/// side of the first rule unless a `%start` directive names another.
pub fn read_grammar(input: &str) -> Result<GrammarBuilder, GrammarError> {
    let mut productions = Vec::new();
    let mut start = None;
    let mut continued_line = String::new();
    let mut rule_line = 0;

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if continued_line.is_empty() {
            rule_line = line_no;
            if line.starts_with('#') || line.is_empty() {
                continue;
            }
        }
        if let Some(head) = line.strip_suffix('\\') {
            continued_line += head.trim_end();
            continued_line += " ";
            continue;
        }
        if let Some(directive) = line.strip_prefix('%') {
            match directive.strip_prefix("start") {
                Some(name) if !name.trim().is_empty() => {
                    let (nt, _) = standard_nonterm_parser(name.trim()).map_err(|message| {
                        GrammarError::Syntax {
                            line: line_no,
                            message,
                        }
                    })?;
                    start = Some(nt);
                }
                _ => {
                    return Err(GrammarError::Syntax {
                        line: line_no,
                        message: "unsupported directive",
                    })
                }
            }
            continue;
        }

        continued_line += line;
        let rule = read_production(&continued_line).map_err(|message| GrammarError::Syntax {
            line: rule_line,
            message,
        })?;
        productions.extend(rule);
        continued_line.clear();
    }

    if !continued_line.is_empty() {
        return Err(GrammarError::Syntax {
            line: rule_line,
            message: "line continuation at end of input",
        });
    }

    let start = match (start, productions.first()) {
        (Some(start), _) => start,
        (None, Some(first)) => first.lhs.clone(),
        (None, None) => return Err(GrammarError::Empty),
    };

    Ok(GrammarBuilder::new(start).structural(productions))
}

#[cfg(test)]
mod test {
    use super::*;

    const GRAMMAR: &str = "
        # word order
        S -> VP NP | NP AY VP
        VP -> V
        NP -> DET N
        AY -> 'ay'
    ";

    fn grammar() -> ContextFreeGrammar {
        read_grammar(GRAMMAR)
            .unwrap()
            .lexicon(vec![("V", "kumain"), ("DET", "ang"), ("N", "bata")])
            .fallback_tokens(vec!["aso", "ang", "ay"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_standard_nonterm() {
        let s = "HELLO_WORLD -> ...";
        assert_eq!(
            standard_nonterm_parser(s),
            Ok(("HELLO_WORLD".to_string(), " -> ..."))
        );
        assert!(standard_nonterm_parser("-> x").is_err());
    }

    #[test]
    fn test_standard_term() {
        let s = "\"terminal\" | NonTerminal";
        assert_eq!(
            standard_terminal_parser(s),
            Ok(("terminal".to_string(), " | NonTerminal"))
        );
        let s = "\'terminal\' | NonTerminal";
        assert_eq!(
            standard_terminal_parser(s),
            Ok(("terminal".to_string(), " | NonTerminal"))
        );
        assert!(standard_terminal_parser("'open").is_err());
    }

    #[test]
    fn test_eat_arrow() {
        let s = "-> some other stuff";
        assert_eq!(eat_arrow(s), Some(" some other stuff"));
        assert_eq!(eat_arrow("<-"), None);
    }

    #[test]
    fn test_eat_disjunction() {
        let s = "| some other stuff";
        assert_eq!(eat_disjunction(s), Some(" some other stuff"));
        assert_eq!(eat_disjunction("->"), None);
    }

    #[test]
    fn test_read_production() {
        let line = "nonterminal -> \"terminal1\" other nonterminalx \'terminal2\'     | another 'NonTerminal'";
        assert_eq!(
            read_production(line),
            Ok(vec![
                Production::new(
                    "nonterminal",
                    vec![
                        Symbol::terminal("terminal1"),
                        Symbol::nonterminal("other"),
                        Symbol::nonterminal("nonterminalx"),
                        Symbol::terminal("terminal2"),
                    ],
                ),
                Production::new(
                    "nonterminal",
                    vec![
                        Symbol::nonterminal("another"),
                        Symbol::terminal("NonTerminal"),
                    ],
                ),
            ])
        );
        assert_eq!(read_production("A -> B |"), Err("empty alternative"));
        assert_eq!(read_production("A -> | B"), Err("empty alternative"));
    }

    #[test]
    fn test_read_grammar_errors() {
        assert_eq!(read_grammar("# nothing\n").unwrap_err(), GrammarError::Empty);
        assert_eq!(
            read_grammar("S -> A\nA => 'x'").unwrap_err(),
            GrammarError::Syntax {
                line: 2,
                message: "did not find an arrow after the nonterminal"
            }
        );
        assert_eq!(
            read_grammar("%include other.cfg").unwrap_err(),
            GrammarError::Syntax {
                line: 1,
                message: "unsupported directive"
            }
        );
    }

    #[test]
    fn test_continuation_and_start_directive() {
        let builder = read_grammar("%start NP\nS -> NP \\\n  VP\nNP -> 'x'\nVP -> 'y'").unwrap();
        assert_eq!(builder.start(), "NP");
        let grammar = builder.build().unwrap();
        assert_eq!(grammar.productions_with_lhs("S").len(), 1);
        assert_eq!(grammar.productions_with_lhs("S")[0].len(), 2);
    }

    #[test]
    fn test_indexes() {
        let grammar = grammar();
        assert_eq!(grammar.start(), "S");
        assert_eq!(grammar.productions_with_lhs("S").len(), 2);
        assert_eq!(grammar.productions_with_lhs("XP").len(), 0);
        let lexical: Vec<_> = grammar
            .lexical_productions_for("ang")
            .iter()
            .map(|p| p.lhs().to_string())
            .collect();
        assert_eq!(lexical, vec!["DET"]);
        let structural: Vec<_> = grammar
            .structural_productions()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            structural,
            vec!["S -> VP NP", "S -> NP AY VP", "VP -> V", "NP -> DET N"]
        );
    }

    #[test]
    fn test_fallback_only_for_words_outside_lexicon() {
        let grammar = grammar();
        // "ang" is in the lexicon; "ay" only has a grammar rule, so it still gets a fallback.
        assert_eq!(grammar.num_fallback(), 2);
        assert_eq!(grammar.lexical_productions_for("aso")[0].lhs(), "N");
        assert_eq!(grammar.lexical_productions_for("ang").len(), 1);
        let ay: Vec<_> = grammar
            .lexical_productions_for("ay")
            .iter()
            .map(|p| p.lhs().to_string())
            .collect();
        assert_eq!(ay, vec!["AY", "N"]);
        assert!(grammar.check_coverage(&["aso", "ay", "bata"]));
        assert_eq!(grammar.unknown_tokens(&["aso", "pusa"]), vec!["pusa"]);
    }

    #[test]
    fn test_duplicates_discarded() {
        let grammar = GrammarBuilder::new("S")
            .structural(vec![Production::new("S", vec![Symbol::nonterminal("N")])])
            .lexicon(vec![("N", "bata"), ("N", "bata"), ("V", "bata")])
            .fallback_category("Noun")
            .fallback_tokens(vec!["bata", "aso"])
            .build()
            .unwrap();
        assert_eq!(grammar.len(), 4);
        assert_eq!(grammar.lexical_productions_for("bata").len(), 2);
        assert_eq!(grammar.lexical_productions_for("aso")[0].lhs(), "Noun");
    }

    #[test]
    fn test_build_errors() {
        assert_eq!(
            GrammarBuilder::new("S")
                .lexicon(vec![("N", "bata")])
                .build()
                .unwrap_err(),
            GrammarError::MissingStart("S".to_string())
        );
        assert_eq!(
            GrammarBuilder::new("S").build().unwrap_err(),
            GrammarError::Empty
        );
        assert_eq!(
            GrammarBuilder::new("S")
                .structural(vec![Production::new("S", vec![])])
                .build()
                .unwrap_err(),
            GrammarError::EmptyRhs("S".to_string())
        );
    }

    #[test]
    fn test_undefined_nonterminals() {
        let text = "S -> NP VP | NP\nNP -> 'bata'";
        let grammar: ContextFreeGrammar = text.parse().unwrap();
        assert_eq!(grammar.undefined_nonterminals(), &["VP".to_string()]);

        let err = read_grammar(text).unwrap().strict(true).build().unwrap_err();
        assert_eq!(
            err,
            GrammarError::UndefinedNonterminal {
                symbol: "VP".to_string(),
                production: "S -> NP VP".to_string()
            }
        );
    }
}
