//! Index cache: persistence and staleness.
//!
//! The cache artifact is a YAML document holding the full built [`Index`]
//! (documents with their modification times, flattened entries, control
//! block and skipped documents) under a format version and the control key
//! it was built with.
//!
//! Reading never fails: a missing, unreadable, corrupt or mismatched cache
//! simply yields `None` and the caller rebuilds. Writes go to a temporary
//! sibling which is then renamed over the artifact, so readers never observe
//! a half-written cache.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TierfigError;
use crate::index::{Index, SourceFile};

/// Bumped whenever the on-disk layout changes.
pub const CACHE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    control_key: String,
    index: Index,
}

/// Load a cached index, or `None` if it cannot be trusted.
pub fn load(path: &Path, control_key: &str) -> Option<Index> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(cache = %path.display(), "no index cache");
            return None;
        }
        Err(e) => {
            warn!(cache = %path.display(), error = %e, "index cache unreadable, rebuilding");
            return None;
        }
    };

    let cache: CacheFile = match serde_yaml::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!(cache = %path.display(), error = %e, "index cache corrupt, rebuilding");
            return None;
        }
    };

    if cache.version != CACHE_VERSION {
        warn!(
            cache = %path.display(),
            found = cache.version,
            expected = CACHE_VERSION,
            "index cache version mismatch, rebuilding"
        );
        return None;
    }
    if cache.control_key != control_key {
        debug!(cache = %path.display(), "index cache built with another control key");
        return None;
    }
    Some(cache.index)
}

/// Write `index` to the cache artifact at `path`.
pub fn save(index: &Index, path: &Path, control_key: &str) -> Result<(), TierfigError> {
    let cache = CacheFile {
        version: CACHE_VERSION,
        control_key: control_key.to_string(),
        index: index.clone(),
    };
    let text = serde_yaml::to_string(&cache).map_err(|e| TierfigError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;

    let tmp = temp_sibling(path);
    std::fs::write(&tmp, text).map_err(|e| TierfigError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        TierfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    debug!(cache = %path.display(), "index cache written");
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("index"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Why a cached index no longer describes the live document set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    Added(String),
    Removed(String),
    Modified(String),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::Added(file) => write!(f, "{file} added"),
            StaleReason::Removed(file) => write!(f, "{file} removed"),
            StaleReason::Modified(file) => write!(f, "{file} modified"),
        }
    }
}

/// Compare the documents recorded in `cached` with a fresh discovery.
///
/// Each document's recorded modification time is compared to its live one;
/// any difference, addition or removal makes the index stale.
pub fn staleness(cached: &Index, live: &[SourceFile]) -> Option<StaleReason> {
    let recorded: HashMap<&Path, &SourceFile> =
        cached.files().iter().map(|f| (f.path.as_path(), f)).collect();

    for file in live {
        match recorded.get(file.path.as_path()) {
            None => return Some(StaleReason::Added(file.relative.clone())),
            Some(old) if old.modified != file.modified || old.level != file.level => {
                return Some(StaleReason::Modified(file.relative.clone()));
            }
            Some(_) => {}
        }
    }

    if live.len() != recorded.len() {
        let present: HashSet<&Path> =
            live.iter().map(|f| f.path.as_path()).collect();
        if let Some(gone) = cached.files().iter().find(|f| !present.contains(f.path.as_path())) {
            return Some(StaleReason::Removed(gone.relative.clone()));
        }
    }
    None
}
