//! [`CartStore`] backends.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fs4::fs_std::FileExt;
use tempfile::NamedTempFile;
use tokio::sync::OwnedMutexGuard;
use tower_sessions::Session;

use super::{CartError, CartStore};
use crate::models::session_keys;

// =============================================================================
// Session
// =============================================================================

/// Cart snapshot kept in the shopper's tower-sessions session.
///
/// Writers are serialized per session by [`super::CartLocks`], so the store
/// itself does not lock.
#[derive(Debug, Clone)]
pub struct SessionCartStore {
    session: Session,
}

impl SessionCartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartStore for SessionCartStore {
    type Guard = ();

    async fn lock(&self) -> Result<(), CartError> {
        Ok(())
    }

    async fn load(&self) -> Result<Option<String>, CartError> {
        self.session
            .get::<String>(session_keys::CART)
            .await
            .map_err(|e| CartError::Store(e.to_string()))
    }

    async fn save(&self, blob: String) -> Result<(), CartError> {
        self.session
            .insert(session_keys::CART, blob)
            .await
            .map_err(|e| CartError::Store(e.to_string()))
    }

    async fn clear(&self) -> Result<(), CartError> {
        self.session
            .remove_value(session_keys::CART)
            .await
            .map(|_| ())
            .map_err(|e| CartError::Store(e.to_string()))
    }
}

// =============================================================================
// Memory
// =============================================================================

/// Cart snapshot held in process memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    slot: Arc<Mutex<Option<String>>>,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl MemoryCartStore {
    /// A store that already holds `blob`.
    #[must_use]
    pub fn with_snapshot(blob: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(blob.into()))),
            gate: Arc::default(),
        }
    }

    /// The raw stored snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<String> {
        match self.slot.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut Option<String>) -> T) -> Result<T, CartError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| CartError::Store("memory cart lock poisoned".to_string()))?;
        Ok(f(&mut slot))
    }
}

impl CartStore for MemoryCartStore {
    type Guard = OwnedMutexGuard<()>;

    async fn lock(&self) -> Result<Self::Guard, CartError> {
        Ok(Arc::clone(&self.gate).lock_owned().await)
    }

    async fn load(&self) -> Result<Option<String>, CartError> {
        self.with_slot(|slot| slot.clone())
    }

    async fn save(&self, blob: String) -> Result<(), CartError> {
        self.with_slot(|slot| *slot = Some(blob))
    }

    async fn clear(&self) -> Result<(), CartError> {
        self.with_slot(|slot| *slot = None)
    }
}

// =============================================================================
// File
// =============================================================================

/// Cart snapshot kept in a JSON file, used by the command-line client.
///
/// Several `glemora` processes may share one file. [`CartStore::lock`] takes
/// an exclusive advisory lock on a sibling `.lock` file, and writes land in a
/// uniquely named temporary file that is then renamed over the target, so
/// concurrent adds never lose an update and a crash never leaves a
/// half-written cart behind.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

/// Exclusive hold on a [`FileCartStore`]; released on drop.
#[derive(Debug)]
pub struct FileCartLock {
    _file: File,
}

impl FileCartStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> CartError {
    CartError::Store(format!("{}: {err}", path.display()))
}

async fn blocking<T: Send + 'static>(
    f: impl FnOnce() -> Result<T, CartError> + Send + 'static,
) -> Result<T, CartError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CartError::Store(format!("cart file task failed: {e}")))?
}

impl CartStore for FileCartStore {
    type Guard = FileCartLock;

    async fn lock(&self) -> Result<FileCartLock, CartError> {
        let dir = self.dir();
        let path = self.lock_path();
        blocking(move || {
            std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, &e))?;
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .map_err(|e| io_error(&path, &e))?;
            file.lock_exclusive().map_err(|e| io_error(&path, &e))?;
            Ok(FileCartLock { _file: file })
        })
        .await
    }

    async fn load(&self) -> Result<Option<String>, CartError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&self.path, &e)),
        }
    }

    async fn save(&self, blob: String) -> Result<(), CartError> {
        let dir = self.dir();
        let path = self.path.clone();
        blocking(move || {
            std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, &e))?;
            let mut temp = NamedTempFile::new_in(&dir).map_err(|e| io_error(&dir, &e))?;
            temp.write_all(blob.as_bytes())
                .and_then(|()| temp.as_file().sync_all())
                .map_err(|e| io_error(temp.path(), &e))?;
            temp.persist(&path).map_err(|e| io_error(&path, &e.error))?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<(), CartError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path, &e)),
        }
    }
}
