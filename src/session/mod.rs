// Session credential store with pluggable persistence and change notification.
pub mod claims;

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use crate::config::ClientConfig;
use claims::Claims;

/// File name of the persisted credential under the config directory.
const TOKEN_FILE: &str = "nagare_token";

/// Persistence backend for the session credential.
///
/// Implementations may fail; the [`TokenStore`] logs and swallows those
/// failures so the in-memory request path always proceeds.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<String>>;
    fn save(&self, token: &str) -> anyhow::Result<()>;
    fn remove(&self) -> anyhow::Result<()>;
}

/// Credential persisted as a plain file, surviving process restarts.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Storage at the standard location for the given config.
    pub fn for_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.resolved_config_dir()?.join(TOKEN_FILE)))
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> anyhow::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok(if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, token: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn remove(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Ephemeral storage for tests and tools that should not touch disk.
#[derive(Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> anyhow::Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> anyhow::Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Holds the current session credential.
///
/// The in-memory value is authoritative; persistence is best-effort and
/// never fails the caller. Replaced wholesale on every change, never
/// mutated in place. Components interested in credential changes subscribe
/// to the watch channel instead of relying on ambient events.
pub struct TokenStore {
    storage: Box<dyn TokenStorage>,
    current: Mutex<Option<String>>,
    changes: watch::Sender<Option<String>>,
}

impl TokenStore {
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        let initial = storage.load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load persisted session token");
            None
        });
        let (changes, _) = watch::channel(initial.clone());
        Self {
            storage,
            current: Mutex::new(initial),
            changes,
        }
    }

    /// Store backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryTokenStorage::default()))
    }

    /// The current credential, or `None` when logged out.
    pub fn get(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the credential. Persistence failures are logged and swallowed;
    /// the new value still takes effect for this process.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        if let Err(err) = self.storage.save(&token) {
            tracing::warn!(error = %err, "failed to persist session token");
        }
        *self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        self.changes.send_replace(Some(token));
    }

    /// Remove the credential. Idempotent: clearing an already-empty store is
    /// a no-op, not an error.
    pub fn clear(&self) {
        if let Err(err) = self.storage.remove() {
            tracing::warn!(error = %err, "failed to remove persisted session token");
        }
        *self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.changes.send_replace(None);
    }

    /// Subscribe to credential changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.changes.subscribe()
    }

    /// Claims decoded from the current credential. Recomputed on every call
    /// so it always reflects the latest stored value; `None` when absent or
    /// malformed.
    pub fn claims(&self) -> Option<Claims> {
        self.get().as_deref().and_then(claims::decode_claims)
    }

    /// Privilege level from the current credential, defaulting to 0.
    pub fn privilege_level(&self) -> i64 {
        self.claims().map(|c| c.privilege_level()).unwrap_or(0)
    }
}
