use std::collections::HashMap;

use thiserror::Error;

use crate::dedup::FirstKeyMap;

/// Returned when there is nothing to translate.
pub const NOT_AVAILABLE: &str = "[N/A]";

const PUNCTUATION: [char; 4] = ['?', '.', ',', '!'];

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("dictionary is not a JSON object of strings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source to target word mapping. Keys are stored lowercased, so lookups ignore case.
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    words: HashMap<String, String>,
}

impl Dictionary {
    /// Reads a top-level JSON object of strings. Where two keys are equal ignoring case, the
    /// first in the document wins.
    pub fn from_json_str(s: &str) -> Result<Self, DictionaryError> {
        let FirstKeyMap(entries) = serde_json::from_str::<FirstKeyMap<String>>(s)?;
        Ok(entries.into_iter().collect())
    }

    pub fn insert<S: Into<String>, T: Into<String>>(&mut self, source: S, target: T) {
        self.words
            .entry(source.into().to_lowercase())
            .or_insert_with(|| target.into());
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.words.get(&word.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut dictionary = Dictionary::default();
        for (source, target) in iter {
            dictionary.insert(source, target);
        }
        dictionary
    }
}

/// Translates word by word. Unknown words are kept as `[word]`; words mapped to an empty string
/// are dropped. The result has no space before `? . , !` and starts with a capital letter.
/// Returns [`NOT_AVAILABLE`] when no words remain.
pub fn translate<S: AsRef<str>>(leaves: &[S], dictionary: &Dictionary) -> String {
    let words: Vec<String> = leaves
        .iter()
        .map(|leaf| leaf.as_ref())
        .filter_map(|leaf| match dictionary.get(leaf) {
            Some("") => None,
            Some(word) => Some(word.to_string()),
            None => Some(format!("[{}]", leaf)),
        })
        .collect();

    let sentence = attach_punctuation(&words.join(" "));
    if sentence.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    capitalize_first(&sentence)
}

fn attach_punctuation(sentence: &str) -> String {
    let mut out = String::with_capacity(sentence.len());
    let mut chars = sentence.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' && chars.peek().map_or(false, |next| PUNCTUATION.contains(next)) {
            continue;
        }
        out.push(c);
    }
    out
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dictionary() -> Dictionary {
        vec![
            ("bata", "child"),
            ("ang", "the"),
            ("kumain", "ate"),
            ("ba", ""),
            ("?", "?"),
            (",", ","),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_translate() {
        assert_eq!(translate(&["ang", "bata"], &dictionary()), "The child");
        assert_eq!(
            translate(&["kumain", "ang", "bata", "?"], &dictionary()),
            "Ate the child?"
        );
    }

    #[test]
    fn test_unknown_words_bracketed() {
        assert_eq!(
            translate(&["kumain", "ang", "Pusa"], &dictionary()),
            "Ate the [Pusa]"
        );
        assert_eq!(translate(&["pusa"], &dictionary()), "[pusa]");
    }

    #[test]
    fn test_case_insensitive_lookup() {
        assert_eq!(translate(&["ANG", "Bata"], &dictionary()), "The child");
    }

    #[test]
    fn test_punctuation_spacing() {
        assert_eq!(
            translate(&["ang", "bata", ",", "kumain", "?"], &dictionary()),
            "The child, ate?"
        );
        assert_eq!(attach_punctuation("a ! b . c"), "a! b. c");
    }

    #[test]
    fn test_empty_results() {
        let empty: [&str; 0] = [];
        assert_eq!(translate(&empty, &dictionary()), NOT_AVAILABLE);
        assert_eq!(translate(&["ba"], &dictionary()), NOT_AVAILABLE);
        assert_eq!(translate(&["ba", "bata"], &dictionary()), "Child");
    }

    #[test]
    fn test_only_first_letter_capitalized() {
        let dictionary: Dictionary = vec![("si", "mr."), ("juan", "Juan"), ("x", "éX")]
            .into_iter()
            .collect();
        assert_eq!(translate(&["si", "juan"], &dictionary), "Mr. Juan");
        assert_eq!(translate(&["x"], &dictionary), "ÉX");
    }

    #[test]
    fn test_from_json() {
        let dictionary =
            Dictionary::from_json_str(r#"{"Bata": "child", "bata": "kid", "ñ": "n", "ñ": "x"}"#).unwrap();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.get("BATA"), Some("child"));
        assert_eq!(dictionary.get("Ñ"), Some("n"));
        assert!(Dictionary::from_json_str(r#"["bata"]"#).is_err());
        assert!(Dictionary::from_json_str(r#"{"bata": 1}"#).is_err());
    }
}
