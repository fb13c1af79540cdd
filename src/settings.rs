//! Process configuration for the index itself.
//!
//! Two inputs, each overridable from the environment and read once:
//!
//! | Setting      | Env var              | Default        |
//! |--------------|----------------------|----------------|
//! | `home`       | `TIERFIG_HOME`       | `config`       |
//! | `index_file` | `TIERFIG_INDEX_FILE` | `.index.yaml`  |

use std::path::PathBuf;

use confique::Config;

use crate::error::TierfigError;

#[derive(Config, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Configuration root directory.
    #[config(env = "TIERFIG_HOME", default = "config")]
    pub home: PathBuf,

    /// File name of the index cache, created inside the root directory.
    #[config(env = "TIERFIG_INDEX_FILE", default = ".index.yaml")]
    pub index_file: String,
}

impl Settings {
    /// Load from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, TierfigError> {
        Ok(Settings::builder().env().load()?)
    }

    /// Load from a TOML file, with the environment taking precedence.
    /// A missing file is not an error.
    pub fn from_file(path: &std::path::Path) -> Result<Self, TierfigError> {
        Ok(Settings::builder().env().file(path).load()?)
    }

    /// Compiled defaults only.
    pub fn defaults() -> Result<Self, TierfigError> {
        Ok(Settings::builder().load()?)
    }
}
