use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use super::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::Result;

/// Persists tokens as a JSON object of named slots, so a session survives restarts.
///
/// Reads are served from memory. Every change rewrites the file; if that fails the change
/// still applies in memory and the failure is logged.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    slots: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let slots = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), slots = slots.len(), "Opened token store");
        Ok(FileStore {
            path,
            slots: RwLock::new(slots),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get(&self, key: &str) -> Option<String> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn write(&self, slots: &BTreeMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(slots)?)?;
        fs::rename(&tmp, &self.path)
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut slots);
        if let Err(e) = self.write(&slots) {
            warn!(path = %self.path.display(), error = %e, "Unable to persist tokens");
        }
    }
}

impl TokenStore for FileStore {
    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    fn set_tokens(&self, access_token: String, refresh_token: Option<String>) {
        self.update(|slots| {
            slots.insert(ACCESS_TOKEN_KEY.to_string(), access_token);
            if let Some(refresh_token) = refresh_token {
                slots.insert(REFRESH_TOKEN_KEY.to_string(), refresh_token);
            }
        });
    }

    fn clear_tokens(&self) {
        self.update(|slots| {
            slots.remove(ACCESS_TOKEN_KEY);
            slots.remove(REFRESH_TOKEN_KEY);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("taskclient-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("session").join("tokens.json")
    }

    #[test]
    fn test_missing_file_is_empty() {
        let store = FileStore::open(temp_path("missing")).unwrap();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn test_tokens_survive_reopen() {
        let path = temp_path("reopen");
        let store = FileStore::open(&path).unwrap();
        store.set_tokens("A1".to_string(), Some("R1".to_string()));
        store.set_tokens("A2".to_string(), None);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("A2"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("R1"));

        let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"access_token": "A2", "refresh_token": "R1"}));
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let path = temp_path("clear");
        let store = FileStore::open(&path).unwrap();
        store.set_tokens("A1".to_string(), Some("R1".to_string()));
        store.clear_tokens();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.access_token(), None);
        assert_eq!(reopened.refresh_token(), None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"not json").unwrap();
        assert!(FileStore::open(&path).is_err());
    }

    #[test]
    fn test_failed_write_keeps_tokens_in_memory() {
        let path = temp_path("unwritable");
        let store = FileStore::open(&path).unwrap();
        // a directory where the temp file goes makes every write fail
        fs::create_dir_all(path.with_extension("tmp")).unwrap();

        store.set_tokens("A1".to_string(), Some("R1".to_string()));
        assert_eq!(store.access_token().as_deref(), Some("A1"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));
        assert!(!path.exists());

        store.clear_tokens();
        assert_eq!(store.access_token(), None);
    }
}
