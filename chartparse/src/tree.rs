use std::fmt::{Display, Formatter};
use std::ops::Index;

use itertools::Itertools;
use thiserror::Error;

/// A derivation: leaves are input tokens, branches are nonterminal labels with ordered
/// children. Each subtree is owned by its parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tree {
    Leaf(String),
    Branch(String, Vec<Tree>),
}

impl Display for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Tree::Leaf(t) => f.write_str(t),
            Tree::Branch(nt, children) => {
                write!(f, "({}", nt)?;
                for child in children {
                    write!(f, " {}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Tree {
    pub fn leaf<S: Into<String>>(word: S) -> Self {
        Tree::Leaf(word.into())
    }

    pub fn branch<S: Into<String>>(label: S, children: Vec<Tree>) -> Self {
        Tree::Branch(label.into(), children)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    /// The nonterminal label of a branch. Leaves have no label.
    pub fn label(&self) -> Option<&str> {
        match self {
            Tree::Leaf(_) => None,
            Tree::Branch(label, _) => Some(label),
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label() == Some(label)
    }

    pub fn children(&self) -> &[Tree] {
        match self {
            Tree::Leaf(_) => &[],
            Tree::Branch(_, children) => children,
        }
    }

    /// The leaf words, left to right.
    pub fn leaves(&self) -> Vec<&str> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a str>) {
        match self {
            Tree::Leaf(word) => leaves.push(word),
            Tree::Branch(_, children) => children.iter().for_each(|c| c.collect_leaves(leaves)),
        }
    }

    /// Number of nodes on the longest path from this node to a leaf, counting both ends.
    pub fn height(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Branch(_, children) => {
                1 + children.iter().map(Tree::height).max().unwrap_or(0)
            }
        }
    }

    pub fn into_branch(self) -> Option<(String, Vec<Tree>)> {
        match self {
            Tree::Leaf(_) => None,
            Tree::Branch(nt, trees) => Some((nt, trees)),
        }
    }

    /// Indented multi-line rendering; a branch whose children are all leaves stays on one line.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_helper(0, &mut out);
        out
    }

    fn pretty_helper(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match self {
            Tree::Branch(label, children) if !children.iter().all(Tree::is_leaf) => {
                out.push_str(&format!("{}({}\n", indent, label));
                for child in children {
                    child.pretty_helper(depth + 1, out);
                }
                out.push_str(&format!("{})\n", indent));
            }
            _ => out.push_str(&format!("{}{}\n", indent, self)),
        }
    }

    /// Parses the bracketed form produced by `Display`, e.g. `(S (NP (N bata)) (VP (V kumain)))`.
    pub fn from_bracketed(s: &str) -> Result<Tree, TreeParseError> {
        let tokens = bracket_tokens(s);
        let mut pos = 0;
        let tree = read_tree(&tokens, &mut pos)?;
        if pos != tokens.len() {
            return Err(TreeParseError::TrailingInput(tokens[pos..].iter().join(" ")));
        }
        Ok(tree)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("expected a label after `(`")]
    MissingLabel,
    #[error("unexpected `)`")]
    UnexpectedClose,
    #[error("unexpected input after tree: `{0}`")]
    TrailingInput(String),
}

fn bracket_tokens(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in s.char_indices() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if let Some(st) = start.take() {
                tokens.push(&s[st..i]);
            }
            if !c.is_whitespace() {
                tokens.push(&s[i..i + 1]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        tokens.push(&s[st..]);
    }
    tokens
}

fn read_tree(tokens: &[&str], pos: &mut usize) -> Result<Tree, TreeParseError> {
    match tokens.get(*pos).copied() {
        None => Err(TreeParseError::UnexpectedEnd),
        Some(")") => Err(TreeParseError::UnexpectedClose),
        Some("(") => {
            *pos += 1;
            let label = match tokens.get(*pos).copied() {
                None => return Err(TreeParseError::UnexpectedEnd),
                Some("(") | Some(")") => return Err(TreeParseError::MissingLabel),
                Some(label) => label.to_string(),
            };
            *pos += 1;
            let mut children = Vec::new();
            loop {
                match tokens.get(*pos).copied() {
                    None => return Err(TreeParseError::UnexpectedEnd),
                    Some(")") => {
                        *pos += 1;
                        return Ok(Tree::Branch(label, children));
                    }
                    Some(_) => children.push(read_tree(tokens, pos)?),
                }
            }
        }
        Some(word) => {
            *pos += 1;
            Ok(Tree::Leaf(word.to_string()))
        }
    }
}

impl Index<&[usize]> for Tree {
    type Output = Tree;

    /// Follows a path of child positions from this node. Panics if the path leaves the tree.
    fn index(&self, index: &[usize]) -> &Self::Output {
        match index.split_first() {
            None => self,
            Some((first, rest)) => match self {
                Tree::Leaf(_) => panic!("Invalid index {:?} for Leaf", index),
                Tree::Branch(_, branch) => branch[*first].index(rest),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> Tree {
        Tree::branch(
            "S",
            vec![
                Tree::branch("VP", vec![Tree::branch("V", vec![Tree::leaf("kumain")])]),
                Tree::branch(
                    "NP",
                    vec![
                        Tree::branch("DET", vec![Tree::leaf("ang")]),
                        Tree::branch("N", vec![Tree::leaf("bata")]),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample().to_string(),
            "(S (VP (V kumain)) (NP (DET ang) (N bata)))"
        );
        assert_eq!(Tree::leaf("ay").to_string(), "ay");
    }

    #[test]
    fn test_leaves_and_height() {
        let tree = sample();
        assert_eq!(tree.leaves(), vec!["kumain", "ang", "bata"]);
        assert_eq!(tree.height(), 4);
        assert_eq!(tree[&[1, 0][..]].label(), Some("DET"));
        assert_eq!(tree[&[1, 0, 0][..]], Tree::leaf("ang"));
    }

    #[test]
    fn test_from_bracketed() {
        let tree = sample();
        assert_eq!(Tree::from_bracketed(&tree.to_string()), Ok(tree));
        assert_eq!(Tree::from_bracketed("bata"), Ok(Tree::leaf("bata")));
        assert_eq!(
            Tree::from_bracketed("(S (NP bata)"),
            Err(TreeParseError::UnexpectedEnd)
        );
        assert_eq!(
            Tree::from_bracketed("(S bata) x"),
            Err(TreeParseError::TrailingInput("x".to_string()))
        );
        assert_eq!(
            Tree::from_bracketed("((S bata))"),
            Err(TreeParseError::MissingLabel)
        );
    }

    #[test]
    fn test_pretty() {
        assert_eq!(
            sample().pretty(),
            "(S\n  (VP\n    (V kumain)\n  )\n  (NP\n    (DET ang)\n    (N bata)\n  )\n)\n"
        );
    }
}
