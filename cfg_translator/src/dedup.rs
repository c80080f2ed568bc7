use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("top level of the document is not a JSON object")]
    NotAnObject,
}

/// A JSON object read in document order where a repeated key keeps its first value.
pub(crate) struct FirstKeyMap<V>(pub IndexMap<String, V>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for FirstKeyMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FirstKeyVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for FirstKeyVisitor<V> {
            type Value = FirstKeyMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.entry(key).or_insert(value);
                }
                Ok(FirstKeyMap(map))
            }
        }

        deserializer.deserialize_map(FirstKeyVisitor(PhantomData))
    }
}

/// Drops every line whose trimmed content has been seen before. Kept lines are unchanged,
/// line endings included. Returns the text and the number of lines removed.
pub fn dedup_lines(text: &str) -> (String, usize) {
    let mut seen = HashSet::new();
    let mut out = String::with_capacity(text.len());
    let mut removed = 0;
    for line in text.split_inclusive('\n') {
        if seen.insert(line.trim()) {
            out.push_str(line);
        } else {
            removed += 1;
        }
    }
    (out, removed)
}

/// Re-emits a top-level JSON object with repeated keys removed, keeping each key's first
/// value, indented by four spaces. Returns the text and the number of entries removed.
pub fn dedup_json(text: &str) -> Result<(String, usize), DedupError> {
    let document: Value = serde_json::from_str(text)?;
    if !document.is_object() {
        return Err(DedupError::NotAnObject);
    }

    let FirstKeyMap(entries) = serde_json::from_str::<FirstKeyMap<Value>>(text)?;
    let removed = count_top_level_keys(text)? - entries.len();

    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    entries.serialize(&mut serializer)?;
    // serde_json only writes valid UTF-8.
    let mut out = String::from_utf8_lossy(&out).into_owned();
    out.push('\n');
    Ok((out, removed))
}

/// Counts keys of the top-level object, repeats included.
fn count_top_level_keys(text: &str) -> Result<usize, DedupError> {
    struct Counter;

    impl<'de> Visitor<'de> for Counter {
        type Value = usize;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a JSON object")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<usize, A::Error> {
            let mut count = 0;
            while access
                .next_entry::<serde::de::IgnoredAny, serde::de::IgnoredAny>()?
                .is_some()
            {
                count += 1;
            }
            Ok(count)
        }
    }

    let mut deserializer = serde_json::Deserializer::from_str(text);
    Ok(deserializer.deserialize_map(Counter)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dedup_lines() {
        let text = "S -> VP NP\nVP -> V\n  S -> VP NP  \n\nVP -> V\n\nNP -> N";
        let (out, removed) = dedup_lines(text);
        assert_eq!(out, "S -> VP NP\nVP -> V\n\nNP -> N");
        assert_eq!(removed, 3);

        assert_eq!(dedup_lines(""), (String::new(), 0));
        assert_eq!(dedup_lines("a\r\na\n"), ("a\r\n".to_string(), 1));
    }

    #[test]
    fn test_dedup_json_keeps_first() {
        let text = r#"{"bata": "child", "ang": "the", "bata": "kid", "ñino": "boy"}"#;
        let (out, removed) = dedup_json(text).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            out,
            "{\n    \"bata\": \"child\",\n    \"ang\": \"the\",\n    \"ñino\": \"boy\"\n}\n"
        );
    }

    #[test]
    fn test_dedup_json_errors() {
        assert!(matches!(dedup_json("[1, 2]"), Err(DedupError::NotAnObject)));
        assert!(matches!(dedup_json("{\"a\": "), Err(DedupError::Json(_))));
    }

    #[test]
    fn test_nested_values_kept() {
        let (out, removed) = dedup_json(r#"{"a": {"b": [1, 2]}}"#).unwrap();
        assert_eq!(removed, 0);
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["a"]["b"][1], 2);
    }

    #[test]
    fn test_nested_key_order_kept() {
        let (out, removed) = dedup_json(r#"{"b": {"z": 1, "a": 2}, "b": 3, "a": 4}"#).unwrap();
        assert_eq!(removed, 1);
        let z = out.find("\"z\"").unwrap();
        let a = out.find("\"a\"").unwrap();
        assert!(z < a, "nested keys reordered:\n{}", out);
        assert!(out.find("\"b\"").unwrap() < z);
    }
}
