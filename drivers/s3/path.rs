//! Key <-> object path mapping under the virtual directory / 键与对象路径映射

/// Maps abstract keys onto object paths below an optional directory prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTranslator {
    /// Never ends with `/`
    directory: String,
}

impl PathTranslator {
    pub fn new(directory: &str) -> Self {
        Self {
            directory: directory.trim_end_matches('/').to_string(),
        }
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Object path for `key` / 获取对象路径
    pub fn compute_path(&self, key: &str) -> String {
        if self.directory.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.directory, key)
        }
    }

    /// Key for a listed object path / 从对象路径还原键
    ///
    /// Drops the first `directory.len()` bytes and then any leading `/`. The
    /// path is not checked against the directory, so a path outside it is
    /// truncated all the same. A path shorter than the directory maps to "".
    pub fn compute_key(&self, path: &str) -> String {
        let cut = self.directory.len();
        if cut > path.len() {
            return String::new();
        }
        let rest = match path.get(cut..) {
            Some(rest) => rest.to_string(),
            None => String::from_utf8_lossy(&path.as_bytes()[cut..]).into_owned(),
        };
        rest.trim_start_matches('/').to_string()
    }
}
