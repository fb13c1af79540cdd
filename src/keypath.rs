//! Key-path notation.
//!
//! A path is the ordered list of ancestor names leading to a key. It can be
//! written as a list (`["database", "pool"]`) or dot-joined (`"database.pool"`);
//! both build the same [`KeyPath`]. Segment names that themselves contain a
//! dot can only be addressed through the list form.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The empty path of a top-level key.
    pub fn root() -> Self {
        KeyPath(Vec::new())
    }

    /// Parse the dot-joined form. The empty string is the root path.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return KeyPath::root();
        }
        KeyPath(dotted.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: &str) -> KeyPath {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        KeyPath(segments)
    }

    /// This path followed by all segments of `tail`.
    pub fn join(&self, tail: &KeyPath) -> KeyPath {
        let mut segments = self.0.clone();
        segments.extend(tail.0.iter().cloned());
        KeyPath(segments)
    }

    /// Dotted address of `key` under this path, e.g. `database.timeout`.
    pub fn dotted_key(&self, key: &str) -> String {
        if self.0.is_empty() {
            key.to_string()
        } else {
            format!("{self}.{key}")
        }
    }
}

/// Split a possibly dotted key into its bare name and the path in front of it.
///
/// `"a.b.key"` becomes `("key", ["a", "b"])`; `"key"` becomes `("key", [])`.
pub fn split_key(key: &str) -> (&str, KeyPath) {
    match key.rsplit_once('.') {
        Some((prefix, leaf)) => (leaf, KeyPath::parse(prefix)),
        None => (key, KeyPath::root()),
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for KeyPath {
    fn from(dotted: &str) -> Self {
        KeyPath::parse(dotted)
    }
}

impl From<String> for KeyPath {
    fn from(dotted: String) -> Self {
        KeyPath::parse(&dotted)
    }
}

impl From<&String> for KeyPath {
    fn from(dotted: &String) -> Self {
        KeyPath::parse(dotted)
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        KeyPath(segments)
    }
}

impl From<Vec<&str>> for KeyPath {
    fn from(segments: Vec<&str>) -> Self {
        KeyPath(segments.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        KeyPath(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        KeyPath(segments.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_and_display() {
        let path = KeyPath::parse("level1.level2.level3");
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "level1.level2.level3");
    }

    #[test]
    fn empty_string_is_root() {
        assert_eq!(KeyPath::from(""), KeyPath::root());
        assert!(KeyPath::root().is_empty());
    }

    #[test]
    fn list_and_dotted_forms_agree() {
        assert_eq!(
            KeyPath::from(["database", "pool"]),
            KeyPath::from("database.pool")
        );
        assert_eq!(
            KeyPath::from(vec!["a".to_string()]),
            KeyPath::from(vec!["a"])
        );
    }

    #[test]
    fn split_dotted_key() {
        let (key, path) = split_key("level1.level2.level3.key");
        assert_eq!(key, "key");
        assert_eq!(path, KeyPath::from(["level1", "level2", "level3"]));
    }

    #[test]
    fn split_plain_key() {
        let (key, path) = split_key("port");
        assert_eq!(key, "port");
        assert!(path.is_empty());
    }

    #[test]
    fn child_join_and_dotted_key() {
        let base = KeyPath::from("a");
        assert_eq!(base.child("b"), KeyPath::from("a.b"));
        assert_eq!(base.join(&KeyPath::from("b.c")), KeyPath::from("a.b.c"));
        assert_eq!(base.dotted_key("k"), "a.k");
        assert_eq!(KeyPath::root().dotted_key("k"), "k");
    }

    #[test]
    fn list_form_keeps_literal_dots() {
        let path = KeyPath::from(vec!["a.b"]);
        assert_eq!(path.len(), 1);
        assert_ne!(path, KeyPath::from("a.b"));
    }

    proptest! {
        #[test]
        fn dotted_form_equals_list_form(segments in prop::collection::vec("[a-z_][a-z0-9_]{0,8}", 0..6)) {
            let list = KeyPath::from(segments.clone());
            let dotted = KeyPath::from(segments.join("."));
            prop_assert_eq!(&list, &dotted);
            prop_assert_eq!(list.to_string(), segments.join("."));
        }

        #[test]
        fn split_key_inverts_dotted_key(
            segments in prop::collection::vec("[a-z][a-z0-9]{0,6}", 0..5),
            key in "[a-z][a-z0-9]{0,6}",
        ) {
            let path = KeyPath::from(segments);
            let dotted = path.dotted_key(&key);
            let (leaf, prefix) = split_key(&dotted);
            prop_assert_eq!(leaf, key.as_str());
            prop_assert_eq!(prefix, path);
        }
    }
}
