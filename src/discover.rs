//! Document discovery under the configuration root.
//!
//! [`discover`] walks the root recursively and returns every `.yaml`, `.yml`
//! and `.toml` document with its **level**: 0 for files directly in the root,
//! 1 for files one directory down, and so on. Hidden files and directories
//! (leading `.`) are not part of the configuration tree and are skipped, as
//! is the index cache artifact itself.
//!
//! A missing or unreadable root is fatal. An unreadable subdirectory is
//! logged and skipped so one bad permission bit does not take down the whole
//! index.

use std::path::{Component, Path};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::document::DocumentFormat;
use crate::error::TierfigError;
use crate::index::SourceFile;

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Enumerate the documents under `root`, ordered by level and then by
/// relative path. `skip` names a file to leave out (the cache artifact).
pub fn discover(root: &Path, skip: Option<&Path>) -> Result<Vec<SourceFile>, TierfigError> {
    let discovery_err = |source: std::io::Error| TierfigError::Discovery {
        path: root.to_path_buf(),
        source,
    };

    let root = root.canonicalize().map_err(discovery_err)?;
    if !root.is_dir() {
        return Err(discovery_err(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            "not a directory",
        )));
    }
    std::fs::read_dir(&root).map_err(discovery_err)?;
    let skip = skip.and_then(|p| p.canonicalize().ok());

    let mut files = Vec::new();
    let walker = WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(path = ?e.path(), error = %e, "skipping unreadable part of the configuration tree");
                continue;
            }
        };
        if !entry.file_type().is_file() || DocumentFormat::from_path(entry.path()).is_none() {
            continue;
        }
        if skip.as_deref() == Some(entry.path()) {
            continue;
        }
        let modified = match entry.metadata().map_err(std::io::Error::from).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "cannot stat document, skipping");
                continue;
            }
        };
        let Ok(rel) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let segments: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        files.push(SourceFile {
            path: entry.path().to_path_buf(),
            level: segments.len().saturating_sub(1),
            relative: segments.join("/"),
            modified,
        });
    }

    files.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.relative.cmp(&b.relative)));
    debug!(root = %root.display(), documents = files.len(), "discovered documents");
    Ok(files)
}
