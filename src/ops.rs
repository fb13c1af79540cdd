//! Index operations: key listing, value lookup, locations, and result types.
//!
//! Provides the logic behind `keys`, `get`, `whereis` and `rebuild`, and the
//! `IndexResult` enum that callers use to display results.

use std::fmt;

use crate::index::Index;
use crate::resolve::{Location, Query};
use crate::tree::Node;

/// Result of an index operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexResult {
    /// Every key name with its occurrence count.
    Keys { entries: Vec<(String, usize)> },
    /// A resolved value, or `None` if the key is not defined.
    KeyValue { key: String, value: Option<Node> },
    /// Winning locations of a key; several means ambiguous.
    Locations { key: String, locations: Vec<Location> },
    /// Outcome of a rebuild request.
    Rebuilt {
        rebuilt: bool,
        documents: usize,
        keys: usize,
        skipped: usize,
    },
}

impl fmt::Display for IndexResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexResult::Keys { entries } => {
                for (i, (key, count)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} ({count})")?;
                }
                Ok(())
            }
            IndexResult::KeyValue { key, value } => match value {
                Some(v) => write!(f, "{key} = {v}"),
                None => write!(f, "{key} is not defined"),
            },
            IndexResult::Locations { key, locations } => {
                if locations.is_empty() {
                    return write!(f, "{key} is not defined");
                }
                for (i, location) in locations.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{location}")?;
                }
                Ok(())
            }
            IndexResult::Rebuilt {
                rebuilt,
                documents,
                keys,
                skipped,
            } => {
                let head = if *rebuilt { "Index rebuilt" } else { "Index up to date" };
                write!(f, "{head}: {documents} documents, {keys} keys")?;
                if *skipped > 0 {
                    write!(f, ", {skipped} skipped")?;
                }
                Ok(())
            }
        }
    }
}

pub fn list_keys(entries: Vec<(String, usize)>) -> IndexResult {
    IndexResult::Keys { entries }
}

pub fn key_value(query: &Query, value: Option<Node>) -> IndexResult {
    IndexResult::KeyValue {
        key: query.to_string(),
        value,
    }
}

pub fn locations(query: &Query, locations: Vec<Location>) -> IndexResult {
    IndexResult::Locations {
        key: query.to_string(),
        locations,
    }
}

pub fn rebuild_summary(rebuilt: bool, index: &Index) -> IndexResult {
    IndexResult::Rebuilt {
        rebuilt,
        documents: index.files().len(),
        keys: index.key_count(),
        skipped: index.skipped().len(),
    }
}
