use chartparse::Tree;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RewriteRulesError {
    #[error("predicate and subject share the label `{0}`; inversion would never settle")]
    SameLabel(String),
}

/// The labels the word order rules look for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteRules {
    pub sentence: String,
    pub predicate: String,
    pub subject: String,
    pub marker_label: String,
    pub marker_word: String,
}

impl Default for RewriteRules {
    fn default() -> Self {
        RewriteRules {
            sentence: "S".to_string(),
            predicate: "VP".to_string(),
            subject: "NP".to_string(),
            marker_label: "AY".to_string(),
            marker_word: "ay".to_string(),
        }
    }
}

impl RewriteRules {
    /// Rejects label sets that make the inversion swap its own output back.
    pub fn validate(&self) -> Result<(), RewriteRulesError> {
        if self.predicate == self.subject {
            return Err(RewriteRulesError::SameLabel(self.predicate.clone()));
        }
        Ok(())
    }

    /// Rewrites `tree` into subject-before-predicate order, returning a new tree.
    ///
    /// At every branch the rules are tried in order, and only the first match applies:
    ///
    /// 1. `S(VP, NP)` becomes `S(NP', VP')`.
    /// 2. `S(NP, marker, VP)` becomes `S(NP', VP')`, dropping the marker. The marker is either the
    ///    marker word as a bare leaf (any case) or any branch labelled with the marker category;
    ///    the branch's own leaves are not inspected.
    /// 3. Anything else keeps its label and has each child rewritten.
    ///
    /// Primes mark children that are rewritten in turn. A discarded marker is never visited.
    /// With distinct predicate and subject labels, the output of rules 1 and 2 matches neither
    /// rule, so rewriting is idempotent.
    pub fn rewrite(&self, tree: &Tree) -> Tree {
        let (label, children) = match tree {
            Tree::Leaf(_) => return tree.clone(),
            Tree::Branch(label, children) => (label, children),
        };

        if label == &self.sentence {
            match children.as_slice() {
                [predicate, subject]
                    if predicate.has_label(&self.predicate) && subject.has_label(&self.subject) =>
                {
                    return Tree::Branch(
                        label.clone(),
                        vec![self.rewrite(subject), self.rewrite(predicate)],
                    );
                }
                [subject, marker, predicate]
                    if subject.has_label(&self.subject)
                        && self.is_marker(marker)
                        && predicate.has_label(&self.predicate) =>
                {
                    return Tree::Branch(
                        label.clone(),
                        vec![self.rewrite(subject), self.rewrite(predicate)],
                    );
                }
                _ => {}
            }
        }

        Tree::Branch(
            label.clone(),
            children.iter().map(|child| self.rewrite(child)).collect(),
        )
    }

    fn is_marker(&self, tree: &Tree) -> bool {
        match tree {
            Tree::Leaf(word) => word.to_lowercase() == self.marker_word.to_lowercase(),
            Tree::Branch(label, _) => label == &self.marker_label,
        }
    }
}

/// Rewrites with the default rule labels.
pub fn rewrite(tree: &Tree) -> Tree {
    RewriteRules::default().rewrite(tree)
}

#[cfg(test)]
mod test {
    use super::*;

    fn tree(s: &str) -> Tree {
        Tree::from_bracketed(s).unwrap()
    }

    #[test]
    fn test_predicate_inversion() {
        assert_eq!(
            rewrite(&tree("(S (VP (V kumain)) (NP (DET ang) (N bata)))")),
            tree("(S (NP (DET ang) (N bata)) (VP (V kumain)))")
        );
    }

    #[test]
    fn test_marker_elision() {
        assert_eq!(
            rewrite(&tree("(S (NP (DET ang) (N bata)) (AY ay) (VP (V kumain)))")),
            tree("(S (NP (DET ang) (N bata)) (VP (V kumain)))")
        );
        // A bare marker leaf, in any case.
        assert_eq!(
            rewrite(&tree("(S (NP (N bata)) Ay (VP (V kumain)))")),
            tree("(S (NP (N bata)) (VP (V kumain)))")
        );
        // The marker branch is matched by label alone.
        assert_eq!(
            rewrite(&tree("(S (NP (N bata)) (AY ngayon) (VP (V kumain)))")),
            tree("(S (NP (N bata)) (VP (V kumain)))")
        );
        // Any other leaf in the middle is not a marker.
        let unchanged = tree("(S (NP (N bata)) at (VP (V kumain)))");
        assert_eq!(rewrite(&unchanged), unchanged);
    }

    #[test]
    fn test_nested_inversion() {
        let input = tree(
            "(S (VP (V sinabi) (S (VP (V kumain)) (NP (N bata)))) (NP (N nanay)))",
        );
        assert_eq!(
            rewrite(&input),
            tree("(S (NP (N nanay)) (VP (V sinabi) (S (NP (N bata)) (VP (V kumain)))))")
        );
    }

    #[test]
    fn test_default_recursion() {
        let input = tree("(ROOT (S (VP (V kumain)) (NP (N bata))) (PUNCT .))");
        assert_eq!(
            rewrite(&input),
            tree("(ROOT (S (NP (N bata)) (VP (V kumain))) (PUNCT .))")
        );
        // Leaves are children, not matches for a labelled pattern.
        let leaves = tree("(S VP NP)");
        assert_eq!(rewrite(&leaves), leaves);
        assert_eq!(rewrite(&Tree::leaf("bata")), Tree::leaf("bata"));
    }

    #[test]
    fn test_custom_labels() {
        let rules = RewriteRules {
            sentence: "CL".to_string(),
            ..RewriteRules::default()
        };
        let input = tree("(CL (VP (V kumain)) (NP (N bata)))");
        assert_eq!(rules.rewrite(&input), tree("(CL (NP (N bata)) (VP (V kumain)))"));
        assert_eq!(rewrite(&input), input);
    }

    #[test]
    fn test_idempotent() {
        let input = tree("(S (NP (N bata)) (AY ay) (VP (V kumain) (S (VP (V x)) (NP (N y)))))");
        let once = rewrite(&input);
        assert_eq!(rewrite(&once), once);
    }

    #[test]
    fn test_same_label_rejected() {
        assert_eq!(RewriteRules::default().validate(), Ok(()));
        let rules = RewriteRules {
            predicate: "XP".to_string(),
            subject: "XP".to_string(),
            ..RewriteRules::default()
        };
        assert_eq!(
            rules.validate(),
            Err(RewriteRulesError::SameLabel("XP".to_string()))
        );
        // Each pass swaps the pair again.
        let input = tree("(S (XP a) (XP b))");
        assert_eq!(rules.rewrite(&rules.rewrite(&input)), input);
    }
}
