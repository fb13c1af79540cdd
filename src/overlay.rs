//! In-memory overlay of explicitly set values.
//!
//! Overlay values take precedence over the file-derived index. Each value
//! sits at a [`Slot`]: the key name, path and document of the entry the
//! write resolved to, so every query that resolves to that entry sees it.
//! A write that resolves to nothing, or to several equally-ranked entries,
//! is kept at the address the query names literally. The overlay outlives
//! rebuilds and is never written to the cache.

use std::collections::BTreeMap;

use crate::index::{Index, KeyEntry};
use crate::keypath::KeyPath;
use crate::resolve::Query;
use crate::tree::Node;

/// Address of one overlay value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slot {
    key: String,
    path: Option<KeyPath>,
    document: Option<String>,
}

impl Slot {
    /// The address a query names, ignoring level and depth filters.
    pub fn of(query: &Query) -> Self {
        Slot {
            key: query.key().to_string(),
            path: query.effective_path(),
            document: None,
        }
    }

    /// The address of a document entry of `index`.
    pub fn at(index: &Index, entry: &KeyEntry) -> Self {
        Slot {
            key: entry.key.clone(),
            path: Some(entry.path.clone()),
            document: index.file(entry.source).map(|f| f.relative.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Overlay {
    values: BTreeMap<Slot, Node>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, returning the one it replaces.
    pub fn set(&mut self, slot: Slot, value: Node) -> Option<Node> {
        self.values.insert(slot, value)
    }

    /// Remove a value, returning it if it was set.
    pub fn unset(&mut self, slot: &Slot) -> Option<Node> {
        self.values.remove(slot)
    }

    pub fn get(&self, slot: &Slot) -> Option<&Node> {
        self.values.get(slot)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dotted addresses and values of every overlay entry.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Node)> {
        self.values.iter().map(|(slot, value)| {
            let address = match &slot.path {
                Some(path) => path.dotted_key(&slot.key),
                None => slot.key.clone(),
            };
            (address, value)
        })
    }
}
