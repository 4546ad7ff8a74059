use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::storage::{KeyValueStore, MemoryStore, StorageError};

/// Storage key marking a complete, logged-in session
pub const AUTH_KEY: &str = "auth";

/// Storage key holding the logged-in username
pub const USERNAME_KEY: &str = "username";

/// Storage key holding the logged-in role
pub const ROLE_KEY: &str = "role";

const AUTH_FLAG: &str = "true";

/// Current authentication state.
///
/// `is_logged_in` is true exactly when both `username` and `role` are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_logged_in: bool,
    pub username: Option<String>,
    pub role: Option<String>,
}

impl Session {
    pub fn logged_out() -> Self {
        Self::default()
    }

    fn logged_in(identity: &Identity) -> Self {
        Self {
            is_logged_in: true,
            username: Some(identity.username.clone()),
            role: Some(identity.role.clone()),
        }
    }
}

/// Who a successful login is recorded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: String,
}

/// What happens when durable storage rejects a session write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Keep the in-memory session and stop persisting for this process
    #[default]
    Degrade,
    /// Fail the commit and leave the session untouched
    Strict,
}

/// Holds the session in memory and mirrors it into durable storage.
///
/// Only the credential service mutates a store, through `commit` and `clear`.
/// The `auth` key is removed before any identity key changes and written
/// back last, so an interrupted write never leaves storage that reads back
/// as logged in with a mix of two identities.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    session: Session,
    mode: PersistenceMode,
    persistent: bool,
}

impl SessionStore {
    /// Reconstruct the session from storage. Never fails: missing, partial or
    /// unreadable state yields the logged-out default.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::load_with_mode(storage, PersistenceMode::default())
    }

    pub fn load_with_mode(storage: Arc<dyn KeyValueStore>, mode: PersistenceMode) -> Self {
        let mut store = Self {
            storage,
            session: Session::logged_out(),
            mode,
            persistent: true,
        };

        match store.read_persisted() {
            Ok(session) => store.session = session,
            Err(e) => {
                warn!(error = %e, "Session storage unreadable, starting logged out");
                if mode == PersistenceMode::Degrade {
                    store.persistent = false;
                }
            }
        }
        debug!(
            logged_in = store.session.is_logged_in,
            persistent = store.persistent,
            "Session loaded"
        );
        store
    }

    /// A store that never touches durable storage
    pub fn volatile() -> Self {
        Self {
            storage: Arc::new(MemoryStore::new()),
            session: Session::logged_out(),
            mode: PersistenceMode::Degrade,
            persistent: false,
        }
    }

    fn read_persisted(&self) -> Result<Session, StorageError> {
        let auth = self.storage.get(AUTH_KEY)?;
        let username = self.storage.get(USERNAME_KEY)?.filter(|v| !v.is_empty());
        let role = self.storage.get(ROLE_KEY)?.filter(|v| !v.is_empty());

        match (auth, username, role) {
            (Some(_), Some(username), Some(role)) => {
                Ok(Session::logged_in(&Identity { username, role }))
            }
            (None, None, None) => Ok(Session::logged_out()),
            (auth, username, role) => {
                warn!(
                    has_auth = auth.is_some(),
                    has_username = username.is_some(),
                    has_role = role.is_some(),
                    "Partial session in storage, treating as logged out"
                );
                Ok(Session::logged_out())
            }
        }
    }

    /// Enter the logged-in state. Committing the same identity twice leaves
    /// the same state as committing it once.
    ///
    /// Returns an error only in `Strict` mode, in which case the in-memory
    /// session is unchanged and the previously stored session is put back.
    pub(crate) fn commit(&mut self, identity: &Identity) -> Result<(), StorageError> {
        if self.persistent {
            if let Err(e) = self.write_identity(identity) {
                match self.mode {
                    PersistenceMode::Strict => {
                        self.restore_persisted();
                        return Err(e);
                    }
                    PersistenceMode::Degrade => {
                        self.discard_persisted();
                        warn!(error = %e, "Failed to persist session, continuing with a volatile session");
                        self.persistent = false;
                    }
                }
            }
        }
        self.session = Session::logged_in(identity);
        debug!(username = %identity.username, role = %identity.role, "Session committed");
        Ok(())
    }

    /// Return to the logged-out default and erase the stored keys.
    ///
    /// The in-memory transition always happens. Returns whether durable
    /// storage now holds the logged-out state; on `false` the old session
    /// may come back on the next load.
    pub(crate) fn clear(&mut self) -> bool {
        self.session = Session::logged_out();
        if !self.persistent {
            debug!("Session cleared in memory only");
            return false;
        }
        if let Err(e) = self.remove_persisted() {
            error!(error = %e, "Failed to erase stored session, it may be restored on next load");
            self.persistent = false;
            return false;
        }
        debug!("Session cleared");
        true
    }

    /// `auth` comes off before the identity keys change and goes back on
    /// last, so no reader ever sees `auth` next to a mixed identity.
    fn write_identity(&self, identity: &Identity) -> Result<(), StorageError> {
        self.storage.remove(AUTH_KEY)?;
        self.storage.set(USERNAME_KEY, &identity.username)?;
        self.storage.set(ROLE_KEY, &identity.role)?;
        self.storage.set(AUTH_KEY, AUTH_FLAG)?;
        Ok(())
    }

    fn remove_persisted(&self) -> Result<(), StorageError> {
        self.storage.remove(AUTH_KEY)?;
        self.storage.remove(USERNAME_KEY)?;
        self.storage.remove(ROLE_KEY)?;
        Ok(())
    }

    /// Best-effort cleanup after a failed write
    fn discard_persisted(&self) {
        if let Err(e) = self.remove_persisted() {
            debug!(error = %e, "Could not roll back partially written session");
        }
    }

    /// Best-effort return of storage to the in-memory session after a
    /// failed write
    fn restore_persisted(&self) {
        let restored = match (&self.session.username, &self.session.role) {
            (Some(username), Some(role)) if self.session.is_logged_in => {
                self.write_identity(&Identity {
                    username: username.clone(),
                    role: role.clone(),
                })
            }
            _ => self.remove_persisted(),
        };
        if let Err(e) = restored {
            warn!(error = %e, "Could not restore the stored session after a failed commit");
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in
    }

    pub fn username(&self) -> Option<&str> {
        self.session.username.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.session.role.as_deref()
    }

    /// False once the store has fallen back to memory only
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn mode(&self) -> PersistenceMode {
        self.mode
    }
}

// ============================================================================
// Tests
// ============================================================================
