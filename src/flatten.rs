//! Flatten a document tree into key-path entries.
//!
//! Every mapping entry at any nesting produces one [`FlatEntry`]: the bare key,
//! the names of its ancestors, and the node it holds (a scalar for leaves, the
//! remaining subtree for interior nodes). Sequences are values, not
//! containers, so their items are never addressed individually.
//!
//! ```text
//! database:            -> database   path []            value {timeout: 30}
//!   timeout: 30        -> timeout    path [database]    value 30
//! ```

use crate::keypath::KeyPath;
use crate::tree::Node;

/// One key occurrence inside a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatEntry {
    pub key: String,
    pub path: KeyPath,
    pub value: Node,
}

/// Entries of one document, plus its control block if present.
#[derive(Debug, Default, PartialEq)]
pub struct Flattened {
    pub entries: Vec<FlatEntry>,
    pub control: Option<Node>,
}

/// Why a document root could not be flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct NotAMapping(pub &'static str);

/// Flatten a parsed document.
///
/// A top-level `control_key` entry is pulled out into [`Flattened::control`]
/// and contributes nothing to the key space. An empty document yields no
/// entries; a scalar or sequence at the root is rejected.
pub fn flatten(root: Node, control_key: &str) -> Result<Flattened, NotAMapping> {
    let mut out = Flattened::default();
    let entries = match root {
        Node::Null => return Ok(out),
        Node::Mapping(entries) => entries,
        Node::Sequence(_) => return Err(NotAMapping("document root is a sequence")),
        _ => return Err(NotAMapping("document root is a scalar")),
    };

    let root_path = KeyPath::root();
    for (key, value) in entries.iter() {
        if key == control_key {
            out.control = Some(value.clone());
            continue;
        }
        walk(key, value, &root_path, &mut out.entries);
    }
    Ok(out)
}

// Subtree clones only bump the children's reference count.
fn walk(key: &str, value: &Node, path: &KeyPath, out: &mut Vec<FlatEntry>) {
    if let Node::Mapping(children) = value {
        let child_path = path.child(key);
        for (child_key, child_value) in children.iter() {
            walk(child_key, child_value, &child_path, out);
        }
    }
    out.push(FlatEntry {
        key: key.to_string(),
        path: path.clone(),
        value: value.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(src: &str) -> Node {
        Node::from(serde_yaml::from_str::<serde_yaml::Value>(src).unwrap())
    }

    fn find<'a>(flat: &'a Flattened, key: &str) -> Vec<&'a FlatEntry> {
        flat.entries.iter().filter(|e| e.key == key).collect()
    }

    #[test]
    fn top_level_scalar() {
        let flat = flatten(yaml("port: 8080\n"), "tierfig").unwrap();
        assert_eq!(flat.entries.len(), 1);
        assert_eq!(flat.entries[0].key, "port");
        assert!(flat.entries[0].path.is_empty());
        assert_eq!(flat.entries[0].value, Node::Integer(8080));
    }

    #[test]
    fn nested_keys_carry_ancestor_path() {
        let flat = flatten(yaml("level1:\n  level2:\n    level3:\n      key: value\n"), "tierfig").unwrap();
        let key = find(&flat, "key");
        assert_eq!(key.len(), 1);
        assert_eq!(key[0].path, KeyPath::from("level1.level2.level3"));
        assert_eq!(key[0].path.len(), 3);
        assert_eq!(key[0].value, Node::from("value"));
    }

    #[test]
    fn interior_nodes_are_entries_with_subtree_values() {
        let flat = flatten(yaml("database:\n  timeout: 30\n  host: db\n"), "tierfig").unwrap();
        assert_eq!(flat.entries.len(), 3);
        let database = find(&flat, "database");
        assert_eq!(database.len(), 1);
        assert!(database[0].path.is_empty());
        assert_eq!(database[0].value.get("timeout"), Some(&Node::Integer(30)));
    }

    #[test]
    fn interior_values_share_the_document_subtree() {
        let flat = flatten(yaml("a:\n  b:\n    c: 1\n"), "tierfig").unwrap();
        let a = find(&flat, "a")[0].value.get("b").cloned().unwrap();
        let b = find(&flat, "b")[0].value.clone();
        match (a, b) {
            (Node::Mapping(x), Node::Mapping(y)) => assert!(std::sync::Arc::ptr_eq(&x, &y)),
            _ => panic!("expected mappings"),
        }
    }

    #[test]
    fn repeated_names_at_different_paths_are_all_kept() {
        let flat = flatten(
            yaml("web:\n  port: 80\napi:\n  port: 8080\nport: 1\n"),
            "tierfig",
        )
        .unwrap();
        let ports = find(&flat, "port");
        assert_eq!(ports.len(), 3);
        let mut paths: Vec<String> = ports.iter().map(|e| e.path.to_string()).collect();
        paths.sort();
        assert_eq!(paths, vec!["", "api", "web"]);
    }

    #[test]
    fn sequences_are_leaf_values() {
        let flat = flatten(yaml("hosts:\n  - name: a\n  - name: b\n"), "tierfig").unwrap();
        assert_eq!(flat.entries.len(), 1);
        assert!(find(&flat, "name").is_empty());
        assert_eq!(flat.entries[0].value.as_sequence().map(<[Node]>::len), Some(2));
    }

    #[test]
    fn control_block_is_separated() {
        let flat = flatten(yaml("tierfig:\n  singleton: false\nport: 1\n"), "tierfig").unwrap();
        assert_eq!(flat.entries.len(), 1);
        assert!(find(&flat, "singleton").is_empty());
        assert_eq!(
            flat.control.and_then(|c| c.get("singleton").cloned()),
            Some(Node::Bool(false))
        );
    }

    #[test]
    fn nested_control_key_name_is_ordinary() {
        let flat = flatten(yaml("app:\n  tierfig: 1\n"), "tierfig").unwrap();
        assert!(flat.control.is_none());
        assert_eq!(find(&flat, "tierfig").len(), 1);
    }

    #[test]
    fn empty_document_has_no_entries() {
        let flat = flatten(Node::Null, "tierfig").unwrap();
        assert!(flat.entries.is_empty());
        assert!(flat.control.is_none());
    }

    #[test]
    fn scalar_root_is_rejected() {
        assert!(flatten(Node::from("just text"), "tierfig").is_err());
        assert!(flatten(Node::from(vec![1i64]), "tierfig").is_err());
    }

    #[test]
    fn empty_mapping_value_is_an_entry() {
        let flat = flatten(yaml("features: {}\n"), "tierfig").unwrap();
        assert_eq!(flat.entries.len(), 1);
        assert_eq!(flat.entries[0].value, Node::mapping(Vec::<(String, Node)>::new()));
    }
}
