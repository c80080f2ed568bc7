use cfg_translator::{rewrite, translate, Dictionary};
use chartparse::Tree;
use proptest::prelude::*;

const LABELS: &[&str] = &["S", "VP", "NP", "AY", "V", "N", "DET"];
const WORDS: &[&str] = &["kumain", "ang", "bata", "ay", "Ay", "aso"];

fn arb_tree() -> impl Strategy<Value = Tree> {
    let leaf = prop::sample::select(WORDS.to_vec()).prop_map(Tree::leaf);
    leaf.prop_recursive(5, 48, 4, |inner| {
        (
            prop::sample::select(LABELS.to_vec()),
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(label, children)| Tree::branch(label, children))
    })
}

fn dictionary() -> Dictionary {
    vec![
        ("kumain", "ate"),
        ("ang", "the"),
        ("bata", "child"),
        ("ay", "is"),
        ("aso", "dog"),
    ]
    .into_iter()
    .collect()
}

proptest! {
    #[test]
    fn rewrite_is_idempotent(tree in arb_tree()) {
        let once = rewrite(&tree);
        prop_assert_eq!(rewrite(&once), once);
    }

    #[test]
    fn rewrite_keeps_labels_of_root(tree in arb_tree()) {
        let out = rewrite(&tree);
        prop_assert_eq!(out.label(), tree.label());
    }

    #[test]
    fn known_words_have_no_placeholder(words in prop::collection::vec(prop::sample::select(WORDS.to_vec()), 1..8)) {
        let translation = translate(&words, &dictionary());
        prop_assert!(!translation.contains('['));
    }
}
