//! Lookup resolution: filtering, precedence and ambiguity.
//!
//! A lookup narrows the entries for one key name in two stages:
//!
//! 1. **Filter.** An explicit path keeps only entries whose path is exactly
//!    equal; `level` and `depth` keep only entries at that level or depth.
//! 2. **Precedence.** Among the survivors, keep those at the highest level,
//!    then among those the ones at the lowest depth. Level is always decided
//!    before depth: a deeper deployment tier outranks a shallower key.
//!
//! One survivor is the answer. Several survivors are an ambiguity, reported
//! as [`TierfigError::AmbiguousKey`] unless the query allows the first
//! match, in which case the first entry in build order wins. No survivors
//! means "not found", which is not an error.

use std::fmt;
use std::path::PathBuf;

use crate::error::TierfigError;
use crate::index::{Index, KeyEntry};
use crate::keypath::{self, KeyPath};

/// A key lookup with optional scoping.
///
/// The key may be dotted: `Query::new("database.timeout")` looks up
/// `timeout` under path `database`, exactly like
/// `Query::new("timeout").path(["database"])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    key: String,
    prefix: KeyPath,
    path: Option<KeyPath>,
    level: Option<usize>,
    depth: Option<usize>,
    force_first: bool,
}

impl Query {
    pub fn new(key: &str) -> Self {
        let (leaf, prefix) = keypath::split_key(key);
        Query {
            key: leaf.to_string(),
            prefix,
            ..Query::bare(leaf)
        }
    }

    /// A query for a key name taken literally, dots included.
    pub fn bare(key: &str) -> Self {
        Query {
            key: key.to_string(),
            prefix: KeyPath::root(),
            path: None,
            level: None,
            depth: None,
            force_first: false,
        }
    }

    /// Restrict to entries under exactly this path. Accepts a list or a
    /// dot-joined string. A dotted key's own prefix goes in front of it:
    /// `Query::new("connection.timeout").path("api")` filters on
    /// `connection.api`.
    pub fn path(mut self, path: impl Into<KeyPath>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Return the first match instead of failing on ambiguity.
    pub fn force_first(mut self, force_first: bool) -> Self {
        self.force_first = force_first;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The path filter in effect, if any.
    pub fn effective_path(&self) -> Option<KeyPath> {
        match &self.path {
            Some(path) => Some(self.prefix.join(path)),
            None if self.prefix.is_empty() => None,
            None => Some(self.prefix.clone()),
        }
    }

    pub fn level_filter(&self) -> Option<usize> {
        self.level
    }

    pub fn depth_filter(&self) -> Option<usize> {
        self.depth
    }

    pub fn is_force_first(&self) -> bool {
        self.force_first
    }

    fn matches(&self, entry: &KeyEntry, path: Option<&KeyPath>) -> bool {
        path.is_none_or(|p| &entry.path == p)
            && self.level.is_none_or(|l| entry.level == l)
            && self.depth.is_none_or(|d| entry.depth() == d)
    }
}

impl From<&str> for Query {
    fn from(key: &str) -> Self {
        Query::new(key)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.effective_path() {
            Some(path) => write!(f, "{}", path.dotted_key(&self.key)),
            None => write!(f, "{}", self.key),
        }
    }
}

/// Where a key occurrence lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub key: String,
    pub path: KeyPath,
    pub level: usize,
    pub depth: usize,
    pub file: PathBuf,
    /// Document path relative to the configuration root.
    pub relative: String,
}

impl Location {
    fn of(index: &Index, entry: &KeyEntry) -> Self {
        let (file, relative) = match index.file(entry.source) {
            Some(src) => (src.path.clone(), src.relative.clone()),
            None => (PathBuf::new(), String::new()),
        };
        Location {
            key: entry.key.clone(),
            path: entry.path.clone(),
            level: entry.level,
            depth: entry.depth(),
            file,
            relative,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (level {}, depth {})",
            self.relative,
            self.path.dotted_key(&self.key),
            self.level,
            self.depth
        )
    }
}

/// Every entry passing the query's filters, before precedence.
pub fn filter<'a>(index: &'a Index, query: &Query) -> Vec<&'a KeyEntry> {
    let path = query.effective_path();
    index
        .entries(&query.key)
        .iter()
        .filter(|e| query.matches(e, path.as_ref()))
        .collect()
}

/// Reduce candidates to the highest level, then to the lowest depth.
fn winners(candidates: Vec<&KeyEntry>) -> Vec<&KeyEntry> {
    let Some(top_level) = candidates.iter().map(|e| e.level).max() else {
        return candidates;
    };
    let at_level: Vec<&KeyEntry> = candidates.into_iter().filter(|e| e.level == top_level).collect();
    let Some(min_depth) = at_level.iter().map(|e| e.depth()).min() else {
        return at_level;
    };
    at_level.into_iter().filter(|e| e.depth() == min_depth).collect()
}

/// Resolve a query to a single entry.
///
/// Returns `Ok(None)` when nothing matches and
/// [`TierfigError::AmbiguousKey`] when precedence leaves several entries and
/// the query does not allow the first match.
pub fn resolve<'a>(index: &'a Index, query: &Query) -> Result<Option<&'a KeyEntry>, TierfigError> {
    let mut best = winners(filter(index, query));
    match best.len() {
        0 => Ok(None),
        1 => Ok(best.pop()),
        _ if query.force_first => Ok(best.into_iter().next()),
        _ => {
            let first = best[0];
            Err(TierfigError::AmbiguousKey {
                key: query.to_string(),
                level: first.level,
                depth: first.depth(),
                locations: best
                    .iter()
                    .map(|e| Location::of(index, e).to_string())
                    .collect(),
            })
        }
    }
}

/// Locations of the winning entries. Ambiguity is not an error here: all
/// equally-ranked locations are returned so callers can pick one.
pub fn locate(index: &Index, query: &Query) -> Vec<Location> {
    winners(filter(index, query))
        .into_iter()
        .map(|e| Location::of(index, e))
        .collect()
}

/// Locations of every entry passing the filters, ignoring precedence.
pub fn occurrences(index: &Index, query: &Query) -> Vec<Location> {
    filter(index, query)
        .into_iter()
        .map(|e| Location::of(index, e))
        .collect()
}
