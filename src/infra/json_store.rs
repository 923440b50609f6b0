use std::path::{Path, PathBuf};

use crate::domain::error::DomainError;
use crate::domain::model::catalog::Catalog;
use crate::domain::repository::KeyValueStore;

#[derive(Debug, thiserror::Error)]
pub enum JsonStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),
    #[error(transparent)]
    Catalog(#[from] DomainError),
}

/// ディレクトリ上のKeyValueStore実装。
/// 1 key = 1 JSONファイル (`<dir>/<key>.json`)。
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// keyからファイルパスを返す。path traversal防止のため文字種を制限する。
    pub fn path_for(&self, key: &str) -> Result<PathBuf, JsonStoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(JsonStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    type Error = JsonStoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// カタログJSON (`{"genreOrder": [...], "books": [...]}`) を読み込んで検証する。
pub fn load_catalog(path: &Path) -> Result<Catalog, JsonStoreError> {
    let content = std::fs::read_to_string(path)?;
    let catalog: Catalog = serde_json::from_str(&content)?;
    catalog.validate()?;
    tracing::info!(path = %path.display(), books = catalog.len(), "loaded catalog file");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_set_get() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");

        let store = JsonFileStore::new(&dir);

        // 初回getはNone
        assert!(store.get("libro_saved_books").unwrap().is_none());

        store.set("libro_saved_books", "[]").unwrap();
        assert_eq!(store.get("libro_saved_books").unwrap().as_deref(), Some("[]"));

        // 上書き
        store.set("libro_saved_books", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(
            store.get("libro_saved_books").unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
        assert!(!dir.join("libro_saved_books.tmp").exists());
    }

    #[test]
    fn rejects_unsafe_keys() {
        let store = JsonFileStore::new("/tmp/libro-unused");
        for key in ["", "../etc/passwd", "a/b", "a.b", "spa ce"] {
            assert!(
                matches!(store.path_for(key), Err(JsonStoreError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
        assert!(store.path_for("libro_saved-books2").is_ok());
    }
}
