use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempmail_domain::MailboxSession;
use tempmail_error::MailError;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub const STATE_FILE_NAME: &str = "temp_email_state.json";

/// Everything the plugin remembers across restarts, keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub user_email_ids: BTreeMap<String, MailboxSession>,
    #[serde(default)]
    pub user_message_ids: BTreeMap<String, Vec<String>>,
}

/// Session and message-id cache per user, written through to one JSON file.
///
/// Callers are expected to hold the user's lock from
/// [`UserLocks`](crate::UserLocks) around read-modify-write sequences; the
/// store itself only guarantees that each individual call is atomic.
pub struct SessionStore {
    path: Option<PathBuf>,
    state: RwLock<PersistedState>,
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::with_path(None)
    }

    /// Opens the store at `path` and loads whatever is there.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::with_path(Some(path.into()));
        store.load().await;
        store
    }

    fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            path,
            state: RwLock::new(PersistedState::default()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replaces in-memory state with the file contents. A missing or
    /// unreadable file yields empty state.
    pub async fn load(&self) {
        let loaded = match self.path.as_deref() {
            Some(path) => read_state(path).await,
            None => PersistedState::default(),
        };
        info!(
            sessions = loaded.user_email_ids.len(),
            caches = loaded.user_message_ids.len(),
            "loaded session state"
        );
        *self.state.write().await = loaded;
    }

    pub async fn get_session(&self, user_id: &str) -> Option<MailboxSession> {
        self.state.read().await.user_email_ids.get(user_id).cloned()
    }

    pub async fn set_session(&self, user_id: &str, session: MailboxSession) {
        self.state
            .write()
            .await
            .user_email_ids
            .insert(user_id.to_string(), session);
        self.persist().await;
    }

    pub async fn get_cached_message_ids(&self, user_id: &str) -> Option<Vec<String>> {
        self.state.read().await.user_message_ids.get(user_id).cloned()
    }

    /// Replaces the user's cache wholesale.
    pub async fn set_cached_message_ids(&self, user_id: &str, ids: Vec<String>) {
        self.state
            .write()
            .await
            .user_message_ids
            .insert(user_id.to_string(), ids);
        self.persist().await;
    }

    pub async fn snapshot(&self) -> PersistedState {
        self.state.read().await.clone()
    }

    /// Drops in-memory state only; the file is left as is.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.user_email_ids.clear();
        state.user_message_ids.clear();
    }

    /// Writes the full document to a sibling temp file, then renames it over
    /// the state file.
    pub async fn flush(&self) -> Result<(), MailError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let _writer = self.write_lock.lock().await;
        let snapshot = self.snapshot().await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MailError::persistence(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let payload = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| MailError::persistence(format!("failed to encode state: {e}")))?;

        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, payload).await.map_err(|e| {
            MailError::persistence(format!("failed to write {}: {e}", temp_path.display()))
        })?;
        tokio::fs::rename(&temp_path, path).await.map_err(|e| {
            MailError::persistence(format!("failed to replace {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), "flushed session state");
        Ok(())
    }

    async fn persist(&self) {
        if let Err(e) = self.flush().await {
            warn!(error = %e, "session state not persisted; keeping it in memory");
        }
    }
}

async fn read_state(path: &Path) -> PersistedState {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no session state yet");
            return PersistedState::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read session state; starting empty");
            return PersistedState::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(state) => state,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse session state; starting empty");
            PersistedState::default()
        }
    }
}
