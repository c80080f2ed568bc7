use std::fmt::{Display, Formatter};

use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::production::Symbol;
use crate::tree::Tree;
use crate::utils::{display_width, pad_to};

/// A half-open token range `[start, end)`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}]", self.start, self.end)
    }
}

/// A pointer from a completed constituent to one of its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Child {
    /// The input token at this position.
    Leaf(usize),
    /// The constituent with this label over this span.
    Node(String, Span),
}

/// A completed constituent. Its label and span are the key it is stored under in the chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Constituent {
    pub(crate) children: SmallVec<[Child; 4]>,
}

type Cell = IndexMap<String, Constituent, FnvBuildHasher>;

/// The table of completed constituents for one sentence. Each cell keeps at most one
/// constituent per label, in the order the labels were discovered. Cells only grow.
pub struct Chart<'a> {
    tokens: &'a [String],
    cells: Vec<Cell>,
}

impl<'a> Chart<'a> {
    pub(crate) fn new(tokens: &'a [String]) -> Self {
        let n = tokens.len();
        Chart {
            tokens,
            cells: vec![Cell::default(); (n + 1) * (n + 1)],
        }
    }

    pub fn num_leaves(&self) -> usize {
        self.tokens.len()
    }

    pub fn leaves(&self) -> &[String] {
        self.tokens
    }

    fn cell_index(&self, span: Span) -> usize {
        span.start * (self.tokens.len() + 1) + span.end
    }

    fn cell(&self, span: Span) -> &Cell {
        &self.cells[self.cell_index(span)]
    }

    /// Labels of the constituents spanning exactly `span`, in discovery order.
    pub fn labels(&self, span: Span) -> impl Iterator<Item = &str> {
        self.cell(span).keys().map(String::as_str)
    }

    pub fn contains(&self, span: Span, label: &str) -> bool {
        self.cell(span).contains_key(label)
    }

    pub fn num_constituents(&self) -> usize {
        self.cells.iter().map(IndexMap::len).sum()
    }

    /// Adds a constituent unless one with the same label already spans `span`. Returns whether
    /// the chart changed.
    pub(crate) fn insert(&mut self, span: Span, label: &str, children: SmallVec<[Child; 4]>) -> bool {
        let index = self.cell_index(span);
        let cell = &mut self.cells[index];
        if cell.contains_key(label) {
            return false;
        }
        cell.insert(label.to_string(), Constituent { children });
        true
    }

    /// Finds the first way to split `span` into `rhs.len()` contiguous, non-empty parts such that
    /// each part matches the corresponding symbol. Split points are tried left to right.
    pub(crate) fn match_rhs(&self, rhs: &[Symbol], span: Span) -> Option<SmallVec<[Child; 4]>> {
        if rhs.len() > span.len() {
            return None;
        }
        let mut children = SmallVec::new();
        if self.match_from(rhs, span, &mut children) {
            Some(children)
        } else {
            None
        }
    }

    fn match_from(&self, rhs: &[Symbol], span: Span, out: &mut SmallVec<[Child; 4]>) -> bool {
        let (first, rest) = match rhs.split_first() {
            None => return span.is_empty(),
            Some(split) => split,
        };

        if rest.is_empty() {
            return match self.match_symbol(first, span) {
                Some(child) => {
                    out.push(child);
                    true
                }
                None => false,
            };
        }

        // Every remaining symbol needs at least one token.
        for split in span.start + 1..=span.end - rest.len() {
            if let Some(child) = self.match_symbol(first, Span::new(span.start, split)) {
                out.push(child);
                if self.match_from(rest, Span::new(split, span.end), out) {
                    return true;
                }
                out.pop();
            }
        }
        false
    }

    fn match_symbol(&self, symbol: &Symbol, span: Span) -> Option<Child> {
        match symbol {
            Symbol::Terminal(t) => {
                (span.len() == 1 && &self.tokens[span.start] == t).then(|| Child::Leaf(span.start))
            }
            Symbol::NonTerminal(nt) => self
                .contains(span, nt)
                .then(|| Child::Node(nt.clone(), span)),
        }
    }

    /// Builds the tree for the constituent `label` over `span`, if there is one.
    pub fn tree(&self, label: &str, span: Span) -> Option<Tree> {
        let constituent = self.cell(span).get(label)?;
        let mut children = Vec::with_capacity(constituent.children.len());
        for child in &constituent.children {
            children.push(match child {
                Child::Leaf(index) => Tree::Leaf(self.tokens[*index].clone()),
                Child::Node(label, span) => self.tree(label, *span)?,
            });
        }
        Some(Tree::Branch(label.to_string(), children))
    }
}

impl<'a> Chart<'a> {
    /// Draws one row per constituent in the style of a chart diagram:
    /// `|[-------]   .   .| NP`.
    pub fn pretty_format(&self) -> String {
        let widths: Vec<usize> = self
            .tokens
            .iter()
            .map(|t| display_width(t).max(3) + 1)
            .collect();

        let header = self
            .tokens
            .iter()
            .zip(widths.iter())
            .map(|(t, w)| pad_to(t, *w))
            .join("");
        let mut rows = vec![format!(" {}", header)];

        let n = self.num_leaves();
        for length in 1..=n {
            for start in 0..=n - length {
                let span = Span::new(start, start + length);
                for label in self.labels(span) {
                    rows.push(format!("{} {}", self.pretty_format_span(span, &widths), label));
                }
            }
        }

        rows.join("\n")
    }

    fn pretty_format_span(&self, span: Span, widths: &[usize]) -> String {
        let mut output = String::from("|");
        for width in &widths[..span.start] {
            output.push_str(&format!(".{}", " ".repeat(width - 1)));
        }

        let inner: usize = widths[span.start..span.end].iter().sum();
        let fill = if span.start == 0 && span.end == self.num_leaves() {
            "="
        } else {
            "-"
        };
        output.push('[');
        output.push_str(&fill.repeat(inner.saturating_sub(2)));
        output.push(']');

        for width in &widths[span.end..] {
            output.push_str(&format!("{}.", " ".repeat(width - 1)));
        }
        output.push('|');
        output
    }
}
