//! Document formats and parsing.
//!
//! Both formats produce a [`Node`] tree. YAML merge keys (`<<: *anchor`) are
//! applied before conversion so inherited keys are indexed like literal ones.

use std::path::Path;

use crate::error::TierfigError;
use crate::tree::Node;

/// A configuration document format, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a path's extension (`yaml`, `yml`, `toml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Some(DocumentFormat::Yaml)
        } else if ext.eq_ignore_ascii_case("toml") {
            Some(DocumentFormat::Toml)
        } else {
            None
        }
    }

    /// Parse document text into a tree. `path` is only used for error reporting.
    pub fn parse(self, content: &str, path: &Path) -> Result<Node, TierfigError> {
        let parse_err = |reason: String| TierfigError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        match self {
            DocumentFormat::Yaml => {
                let mut value: serde_yaml::Value =
                    serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
                value.apply_merge().map_err(|e| parse_err(e.to_string()))?;
                Ok(Node::from(value))
            }
            DocumentFormat::Toml => {
                let table: toml::Table =
                    toml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
                Ok(Node::from(table))
            }
        }
    }
}

/// Read and parse one document. Unreadable files surface as parse errors so
/// the build can skip them uniformly.
pub fn load(path: &Path) -> Result<Node, TierfigError> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| TierfigError::Parse {
        path: path.to_path_buf(),
        reason: "unsupported document extension".into(),
    })?;
    let content = std::fs::read_to_string(path).map_err(|e| TierfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    format.parse(&content, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b.yaml")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("b.YML")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("c.toml")),
            Some(DocumentFormat::Toml)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("d.json")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn yaml_merge_keys_are_applied() {
        let src = "defaults: &defaults\n  retries: 3\nservice:\n  <<: *defaults\n  workers: 4\n";
        let node = DocumentFormat::Yaml.parse(src, Path::new("x.yaml")).unwrap();
        let service = node.get("service").unwrap();
        assert_eq!(service.get("retries"), Some(&Node::Integer(3)));
        assert_eq!(service.get("workers"), Some(&Node::Integer(4)));
        assert!(service.get("<<").is_none());
    }

    #[test]
    fn yaml_block_scalars_keep_newlines() {
        let src = "help_text: |\n  first line\n  second line\n";
        let node = DocumentFormat::Yaml.parse(src, Path::new("x.yaml")).unwrap();
        assert!(node.get("help_text").unwrap().as_str().unwrap().contains('\n'));
    }

    #[test]
    fn empty_yaml_is_null() {
        let node = DocumentFormat::Yaml.parse("", Path::new("x.yaml")).unwrap();
        assert!(node.is_null());
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let err = DocumentFormat::Yaml
            .parse("a: [unclosed\n", Path::new("broken.yaml"))
            .unwrap_err();
        assert!(matches!(err, TierfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn invalid_toml_reports_path() {
        let err = DocumentFormat::Toml
            .parse("port = = 1\n", Path::new("broken.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "[database]\ntimeout = 30\n").unwrap();
        let node = load(&path).unwrap();
        assert_eq!(
            node.get("database").and_then(|d| d.get("timeout")),
            Some(&Node::Integer(30))
        );
    }

    #[test]
    fn load_missing_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("gone.yaml")).unwrap_err();
        assert!(matches!(err, TierfigError::Parse { .. }));
    }
}
