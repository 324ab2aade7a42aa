use super::{Session, SessionError, SessionStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Session persisted as a small JSON file, surviving process restarts
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write access from concurrent tasks
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data dir>/rag-admin/session.json`, or a dotfile in the working
    /// directory when no data dir is known
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("rag-admin").join("session.json"))
            .unwrap_or_else(|| PathBuf::from("./.rag-admin-session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Result<Option<Session>, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let session: Session = serde_json::from_str(&content)?;
        if session.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    fn set(&self, session: &Session) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_means_no_session() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert_eq!(store.get().unwrap(), None);
        // Clearing a missing session is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileSessionStore::new(&path)
            .set(&Session::new("token-1", "admin"))
            .unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(
            reopened.get().unwrap(),
            Some(Session::new("token-1", "admin"))
        );
    }

    #[test]
    fn test_clear_removes_token_and_username() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        store.set(&Session::new("token-1", "admin")).unwrap();
        store.clear().unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileSessionStore::new(&path).get().unwrap_err();
        assert!(matches!(err, SessionError::Serialization(_)));
    }
}
