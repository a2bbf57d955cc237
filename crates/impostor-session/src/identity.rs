//! The local key-value identity port.
//!
//! A client remembers two things between runs: which room and player it
//! last was, and the alias it last typed. Neither is authoritative for
//! game logic. The identity is only a hint that recovery checks against
//! the Session Store, and the alias only pre-fills the join form.

use std::future::Future;
use std::path::{Path, PathBuf};

use impostor_protocol::{PlayerId, RoomId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::SessionError;

/// The `(room, player)` pair of the last joined room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredIdentity {
    pub room_id: RoomId,
    pub player_id: PlayerId,

    /// The token a hosted server issued at join; it must accompany a
    /// `Resume` intent. Local games have none.
    #[serde(default)]
    pub resume_token: Option<String>,
}

/// Everything a client keeps on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default)]
    pub identity: Option<StoredIdentity>,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Durable storage for [`LocalState`].
///
/// Implementations only need `load` and `save`; the identity and alias
/// helpers are read-modify-write on top of them.
pub trait IdentityStore: Send + Sync + 'static {
    /// Reads the stored state, or the default if nothing was saved yet.
    fn load(&self) -> impl Future<Output = Result<LocalState, SessionError>> + Send;

    /// Replaces the stored state.
    fn save(&self, state: LocalState) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// The remembered `(room, player)` pair, if any.
    fn identity(&self) -> impl Future<Output = Result<Option<StoredIdentity>, SessionError>> + Send {
        async { Ok(self.load().await?.identity) }
    }

    /// Remembers `identity`, keeping the alias.
    fn remember(
        &self,
        identity: StoredIdentity,
    ) -> impl Future<Output = Result<(), SessionError>> + Send {
        async move {
            let mut state = self.load().await?;
            state.identity = Some(identity);
            self.save(state).await
        }
    }

    /// Forgets the identity, keeping the alias.
    fn forget(&self) -> impl Future<Output = Result<(), SessionError>> + Send {
        async {
            let mut state = self.load().await?;
            if state.identity.take().is_none() {
                return Ok(());
            }
            self.save(state).await
        }
    }

    /// The last alias used, for pre-filling the join form.
    fn alias(&self) -> impl Future<Output = Result<Option<String>, SessionError>> + Send {
        async { Ok(self.load().await?.alias) }
    }

    /// Remembers the alias, keeping the identity.
    fn remember_alias(&self, alias: String) -> impl Future<Output = Result<(), SessionError>> + Send {
        async move {
            let mut state = self.load().await?;
            state.alias = Some(alias);
            self.save(state).await
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps the state in process memory. Used by tests and local mode.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    state: Mutex<LocalState>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already remembers `identity`.
    pub fn with_identity(identity: StoredIdentity) -> Self {
        Self {
            state: Mutex::new(LocalState {
                identity: Some(identity),
                alias: None,
            }),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    async fn load(&self) -> Result<LocalState, SessionError> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: LocalState) -> Result<(), SessionError> {
        *self.state.lock().await = state;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Keeps the state in a small JSON file.
///
/// A missing file reads as the default state. Writes go to a sibling
/// temporary file first and are renamed into place, so a crash mid-write
/// leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl IdentityStore for FileIdentityStore {
    async fn load(&self) -> Result<LocalState, SessionError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LocalState::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, state: LocalState) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(&state)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "local identity saved");
        Ok(())
    }
}
