#[cfg(test)]
pub mod test {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime};

    use crate::index::{Index, KeyEntry, SourceFile};
    use crate::keypath::KeyPath;
    use crate::tree::Node;

    /// Write `(relative path, content)` documents under `root`, creating
    /// directories as needed.
    pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
        for (rel, content) in files {
            let path = root.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
        }
    }

    /// Push a file's modification time forward so it reads as changed even
    /// on filesystems with coarse timestamps.
    pub fn touch(path: &Path) {
        let file = fs::File::options().write(true).open(path).unwrap();
        let old = file.metadata().unwrap().modified().unwrap();
        file.set_modified(old + Duration::from_secs(2)).unwrap();
    }

    /// Overwrite a document and make sure its modification time moves.
    pub fn rewrite(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
        touch(path);
    }

    /// An in-memory index with one synthetic document per entry.
    ///
    /// Entries are `(key, dotted path, level, integer value)`.
    pub fn synthetic_index(entries: &[(&str, &str, usize, i64)]) -> Index {
        let mut index = Index::empty();
        for (source, (key, path, level, value)) in entries.iter().enumerate() {
            index.files.push(SourceFile {
                path: PathBuf::from(format!("/synthetic/f{source}.yaml")),
                relative: format!("f{source}.yaml"),
                level: *level,
                modified: SystemTime::UNIX_EPOCH,
            });
            index.keys.entry(key.to_string()).or_default().push(KeyEntry {
                key: key.to_string(),
                path: KeyPath::from(*path),
                level: *level,
                value: Node::Integer(*value),
                source,
            });
        }
        index
    }

    #[test]
    fn synthetic_index_shape() {
        let index = synthetic_index(&[("port", "", 0, 1), ("port", "web", 1, 2)]);
        assert_eq!(index.files().len(), 2);
        assert_eq!(index.entries("port").len(), 2);
        assert_eq!(index.entries("port")[1].depth(), 1);
    }

    #[test]
    fn touch_moves_mtime_forward() {
        let dir = tempfile::TempDir::new().unwrap();
        write_tree(dir.path(), &[("a.yaml", "k: 1\n")]);
        let path = dir.path().join("a.yaml");
        let before = fs::metadata(&path).unwrap().modified().unwrap();
        touch(&path);
        let after = fs::metadata(&path).unwrap().modified().unwrap();
        assert!(after > before);
    }
}
