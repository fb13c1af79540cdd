//! Environment variable expansion in string values.
//!
//! Recognised forms: `${NAME}`, `$NAME` and `${NAME:-default}`. Names follow
//! shell rules (`[A-Za-z_][A-Za-z0-9_]*`). A variable that is not set is left
//! in place verbatim, unless the `:-` form supplies a default; `$$` and a
//! lone `$` are not special.
//!
//! Expansion runs at lookup time so environment changes between lookups are
//! observed. It never touches the index.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::tree::Node;

static VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("tierfig: invalid variable pattern")
});

/// Expand references in `input` using `lookup` to read variables.
///
/// Takes a closure so tests can pass synthetic data instead of the process
/// environment.
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains('$') {
        return input.to_string();
    }
    VAR.replace_all(input, |caps: &Captures| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let Some(name) = caps.get(1).or_else(|| caps.get(3)) else {
            return whole.to_string();
        };
        match (lookup(name.as_str()), caps.get(2)) {
            (Some(value), _) => value,
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => whole.to_string(),
        }
    })
    .into_owned()
}

/// Expand references in `input` from the process environment.
pub fn expand_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Expand every string inside `node` with `lookup`. Mapping keys and
/// non-string scalars are returned unchanged.
pub fn expand_node_with<F>(node: Node, lookup: &F) -> Node
where
    F: Fn(&str) -> Option<String>,
{
    match node {
        Node::String(s) => Node::String(expand_with(&s, lookup)),
        Node::Sequence(items) => {
            Node::Sequence(items.iter().map(|n| expand_node_with(n.clone(), lookup)).collect())
        }
        Node::Mapping(entries) => Node::Mapping(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), expand_node_with(v.clone(), lookup)))
                .collect(),
        ),
        other => other,
    }
}

/// Expand every string inside `node` from the process environment.
pub fn expand_node(node: Node) -> Node {
    expand_node_with(node, &|name: &str| std::env::var(name).ok())
}
