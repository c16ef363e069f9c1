//! Nested-object conversion of the results map.
//!
//! Key paths such as `a.b.c` or `items[0].price` become nested objects and
//! arrays. Keys are applied in map order and a later key replaces whatever an
//! earlier one left at the same path.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::eval::value::Value;

lazy_static! {
    static ref SEGMENT: Regex =
        Regex::new(r"([^.\[\]]+)|\[(\d+)\]").expect("segment pattern is valid");
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

fn segments(path: &str) -> Vec<Segment> {
    if !path.contains(['.', '[']) {
        return vec![Segment::Key(path.to_string())];
    }
    let segments: Vec<_> = SEGMENT
        .captures_iter(path)
        .filter_map(|captures| match (captures.get(1), captures.get(2)) {
            (Some(key), _) => Some(Segment::Key(key.as_str().to_string())),
            (None, Some(index)) => match index.as_str().parse() {
                Ok(index) => Some(Segment::Index(index)),
                Err(_) => Some(Segment::Key(index.as_str().to_string())),
            },
            (None, None) => None,
        })
        .collect();
    if segments.is_empty() {
        vec![Segment::Key(path.to_string())]
    } else {
        segments
    }
}

/// Converts a flat map with key paths into a nested object.
pub fn unflatten(flat: &BTreeMap<String, Value>) -> Value {
    let mut root = Value::Object(BTreeMap::new());
    for (path, value) in flat {
        insert(&mut root, &segments(path), value.clone());
    }
    root
}

fn insert(target: &mut Value, path: &[Segment], value: Value) {
    let Some((segment, rest)) = path.split_first() else {
        *target = value;
        return;
    };
    let slot = match segment {
        Segment::Key(key) => {
            if !matches!(target, Value::Object(_)) {
                *target = Value::Object(BTreeMap::new());
            }
            match target {
                Value::Object(fields) => fields.entry(key.clone()).or_insert(Value::Null),
                _ => return,
            }
        }
        Segment::Index(index) => {
            if !matches!(target, Value::Object(_) | Value::Array(_)) {
                *target = Value::Array(Vec::new());
            }
            match target {
                Value::Array(items) => {
                    if items.len() <= *index {
                        items.resize(index + 1, Value::Null);
                    }
                    &mut items[*index]
                }
                Value::Object(fields) => fields.entry(index.to_string()).or_insert(Value::Null),
                _ => return,
            }
        }
    };
    insert(slot, rest, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn flat(entries: &[(&str, serde_json::Value)]) -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v.clone())))
            .collect()
    }

    #[test]
    fn test_plain_keys_unchanged() {
        let map = flat(&[("calc_number_one", json!(false)), ("total", json!(4))]);
        assert_eq!(
            unflatten(&map).to_json(),
            json!({"calc_number_one": false, "total": 4})
        );
    }

    #[test]
    fn test_dotted_and_indexed_paths() {
        let map = flat(&[
            ("person.age", json!(21)),
            ("person.name.first", json!("Ada")),
            ("scores[1]", json!(7)),
            ("scores[0]", json!(3)),
            ("items[0].price", json!(9.5)),
        ]);
        assert_eq!(
            unflatten(&map).to_json(),
            json!({
                "person": {"age": 21, "name": {"first": "Ada"}},
                "scores": [3, 7],
                "items": [{"price": 9.5}]
            })
        );
    }

    #[test]
    fn test_later_keys_win() {
        // "a" sorts before "a.b"
        let map = flat(&[("a", json!(1)), ("a.b", json!(2))]);
        assert_eq!(unflatten(&map).to_json(), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_empty() {
        assert_eq!(unflatten(&BTreeMap::new()).to_json(), json!({}));
    }

    #[test]
    fn test_segments() {
        assert_eq!(
            segments("a.b[2]"),
            vec![
                Segment::Key("a".to_string()),
                Segment::Key("b".to_string()),
                Segment::Index(2)
            ]
        );
        assert_eq!(segments("."), vec![Segment::Key(".".to_string())]);
    }
}
