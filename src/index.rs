//! The key index and how it is built.
//!
//! An [`Index`] maps each bare key name to every [`KeyEntry`] carrying that
//! name, across all indexed documents. Entries are appended, never merged:
//! two documents defining `port` produce two entries, and choosing between
//! them is the job of [`resolve`](crate::resolve) at lookup time.
//!
//! Indexes are immutable once built. A rebuild produces a fresh `Index` that
//! replaces the old one wholesale.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document;
use crate::error::TierfigError;
use crate::flatten;
use crate::keypath::KeyPath;
use crate::tree::Node;

/// A discovered configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute location on disk.
    pub path: PathBuf,
    /// Location relative to the configuration root, `/`-separated.
    pub relative: String,
    /// Directory nesting below the root (0 = root directory).
    pub level: usize,
    pub modified: SystemTime,
}

/// One occurrence of a key inside one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEntry {
    pub key: String,
    pub path: KeyPath,
    pub level: usize,
    pub value: Node,
    /// Position of the owning document in [`Index::files`].
    pub source: usize,
}

impl KeyEntry {
    /// Nesting of the key inside its document; the length of its path.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Dotted address, e.g. `database.timeout`.
    pub fn dotted(&self) -> String {
        self.path.dotted_key(&self.key)
    }
}

/// A document left out of the key space because it failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub relative: String,
    pub reason: String,
}

/// Process-wide options read from the reserved control section of documents.
///
/// Sections from several documents are merged option by option; documents
/// at deeper levels are processed later and win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlBlock {
    options: BTreeMap<String, Node>,
}

impl ControlBlock {
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.options.get(name)
    }

    /// Whether a single shared index instance should be used. Defaults to `true`.
    pub fn singleton(&self) -> bool {
        self.get("singleton").and_then(Node::as_bool).unwrap_or(true)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.options.iter()
    }

    fn absorb(&mut self, section: Node, relative: &str) {
        match section {
            Node::Mapping(entries) => self.options.extend(entries.iter().cloned()),
            Node::Null => {}
            _ => warn!(file = relative, "ignoring control section that is not a mapping"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub(crate) files: Vec<SourceFile>,
    pub(crate) keys: BTreeMap<String, Vec<KeyEntry>>,
    #[serde(default)]
    pub(crate) control: ControlBlock,
    #[serde(default)]
    pub(crate) skipped: Vec<SkippedFile>,
    pub(crate) built_at: SystemTime,
}

impl Index {
    /// An index over no documents.
    pub fn empty() -> Self {
        Index {
            files: Vec::new(),
            keys: BTreeMap::new(),
            control: ControlBlock::default(),
            skipped: Vec::new(),
            built_at: SystemTime::now(),
        }
    }

    /// All entries named `key`, in build order.
    pub fn entries(&self, key: &str) -> &[KeyEntry] {
        self.keys.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Bare key names with their occurrence counts, sorted by name.
    pub fn key_counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.keys.iter().map(|(k, v)| (k.as_str(), v.len()))
    }

    /// Number of distinct key names.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Total number of key occurrences across all documents.
    pub fn occurrence_count(&self) -> usize {
        self.keys.values().map(Vec::len).sum()
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, source: usize) -> Option<&SourceFile> {
        self.files.get(source)
    }

    pub fn control(&self) -> &ControlBlock {
        &self.control
    }

    /// Documents that failed to load during the build.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn built_at(&self) -> SystemTime {
        self.built_at
    }

    /// Equal in everything except the build timestamp.
    pub fn same_content(&self, other: &Index) -> bool {
        self.files == other.files
            && self.keys == other.keys
            && self.control == other.control
            && self.skipped == other.skipped
    }
}

/// Parse and flatten every document into a fresh index.
///
/// `files` should be in discovery order (level, then relative path); that
/// order decides which entry counts as first-encountered and which control
/// section wins. Documents that fail to load are skipped with a warning.
pub fn build(files: Vec<SourceFile>, control_key: &str) -> Index {
    let mut index = Index {
        files: Vec::with_capacity(files.len()),
        ..Index::empty()
    };

    for (source, file) in files.into_iter().enumerate() {
        match load_entries(&file, control_key) {
            Ok(flat) => {
                for entry in flat.entries {
                    index
                        .keys
                        .entry(entry.key.clone())
                        .or_default()
                        .push(KeyEntry {
                            key: entry.key,
                            path: entry.path,
                            level: file.level,
                            value: entry.value,
                            source,
                        });
                }
                if let Some(section) = flat.control {
                    index.control.absorb(section, &file.relative);
                }
            }
            Err(e) => {
                warn!(file = %file.relative, error = %e, "skipping document");
                index.skipped.push(SkippedFile {
                    relative: file.relative.clone(),
                    reason: e.to_string(),
                });
            }
        }
        index.files.push(file);
    }

    debug!(
        files = index.files.len(),
        keys = index.key_count(),
        occurrences = index.occurrence_count(),
        skipped = index.skipped.len(),
        "index built"
    );
    index
}

fn load_entries(file: &SourceFile, control_key: &str) -> Result<flatten::Flattened, TierfigError> {
    let root = document::load(&file.path)?;
    flatten::flatten(root, control_key).map_err(|e| TierfigError::Parse {
        path: file.path.clone(),
        reason: e.0.to_string(),
    })
}
