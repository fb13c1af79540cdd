use std::path::{Path, PathBuf};

use crate::resolve::Query;

/// Where the configuration root lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootPath {
    /// An explicit directory. Relative paths are taken from the CWD.
    Path(PathBuf),
    /// Current working directory.
    Cwd,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp".into())`.
    Home(String),
    /// Platform config directory for the named application (XDG on Linux,
    /// ~/Library/Application Support on macOS).
    Platform(String),
}

impl RootPath {
    /// Resolve to a concrete directory. Returns `None` if no home or
    /// platform directory can be determined.
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            RootPath::Path(p) => Some(p.clone()),
            RootPath::Cwd => std::env::current_dir().ok(),
            RootPath::Home(subdir) => {
                let user = directories::UserDirs::new()?;
                Some(user.home_dir().join(subdir))
            }
            RootPath::Platform(app) => {
                let proj = directories::ProjectDirs::from("", "", app)?;
                Some(proj.config_dir().to_path_buf())
            }
        }
    }
}

impl From<PathBuf> for RootPath {
    fn from(p: PathBuf) -> Self {
        RootPath::Path(p)
    }
}

impl From<&Path> for RootPath {
    fn from(p: &Path) -> Self {
        RootPath::Path(p.to_path_buf())
    }
}

/// When the index checks its documents for changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refresh {
    /// Every lookup polls modification times and rebuilds if anything changed.
    #[default]
    OnAccess,
    /// Only `open` and explicit `reload` look at the filesystem.
    Manual,
}

/// Whether an [`IndexContext`](crate::IndexContext) hands out one shared
/// index or a fresh one per caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sharing {
    Shared,
    PerCaller,
}

/// An index operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexAction {
    /// List every key name with its occurrence count.
    Keys,
    /// Resolve a key to its value.
    Get { query: Query },
    /// Show where the winning occurrences of a key are defined.
    Whereis { query: Query },
    /// Rebuild the index; `force` rebuilds even if nothing changed.
    Rebuild { force: bool },
}
