use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum TierfigError {
    #[error("Cannot index configuration root {path}: {source}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(tierfig::discovery),
            help("point TIERFIG_HOME (or .root_dir() on the builder) at an existing directory")
        )
    )]
    Discovery {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(tierfig::parse)))]
    Parse { path: PathBuf, reason: String },

    #[error(
        "Ambiguous key '{key}': {} entries at level {level}, depth {depth}:\n{}",
        .locations.len(),
        .locations.join("\n")
    )]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(tierfig::ambiguous),
            help("narrow the lookup with a path, level or depth, or allow the first match")
        )
    )]
    AmbiguousKey {
        key: String,
        level: usize,
        depth: usize,
        locations: Vec<String>,
    },

    #[error("Invalid value for '{key}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(tierfig::invalid_value)))]
    InvalidValue { key: String, reason: String },

    #[error("Failed to write {path}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(tierfig::io)))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Settings error: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(tierfig::settings)))]
    Settings(#[from] confique::Error),

    #[error("Could not resolve the configuration root (no home or platform directory found)")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(tierfig::root)))]
    RootUnresolved,
}

impl TierfigError {
    /// True for errors raised while enumerating the configuration root.
    pub fn is_discovery(&self) -> bool {
        matches!(self, TierfigError::Discovery { .. })
    }

    /// True when a lookup had several equally-ranked candidates.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, TierfigError::AmbiguousKey { .. })
    }
}
