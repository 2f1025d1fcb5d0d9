//! Client-side session: who is logged in.
//!
//! The identity is kept in memory and mirrored under the key
//! [`SESSION_KEY`] into two storages: a persistent one (a JSON file by
//! default) and a per-session one. On open, the per-session copy wins over
//! the persistent one.
//!
//! The backend issues no token and nothing here is verified: anyone able to
//! write the session file can appear logged in as any user.

mod storage;

use pmt_proto::user::User;

pub use storage::{FileStorage, MemoryStorage, SessionStorage, default_session_path};

/// Key the current user is stored under.
pub const SESSION_KEY: &str = "pmt_user";

/// Errors raised by session storages.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the session file failed.
    #[error("session file {path}: {source}")]
    Io {
        /// File that was accessed.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Stored data is not valid JSON of the expected shape.
    #[error("corrupt session data: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// No per-user data directory could be determined.
    #[error("could not determine data directory (no HOME or XDG_DATA_HOME)")]
    NoDataDir,
}

/// The current identity and its two mirrors.
pub struct SessionStore {
    persistent: Box<dyn SessionStorage>,
    per_session: Box<dyn SessionStorage>,
    current: Option<User>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Opens a session over the given storages and restores the stored
    /// identity, if any. Unreadable or corrupt data is logged and treated
    /// as logged out.
    #[must_use]
    pub fn open(
        persistent: Box<dyn SessionStorage>,
        per_session: Box<dyn SessionStorage>,
    ) -> Self {
        let current = restore(per_session.as_ref(), "per-session")
            .or_else(|| restore(persistent.as_ref(), "persistent"));
        if let Some(user) = &current {
            tracing::info!(user = %user.id, "session restored");
        }
        Self {
            persistent,
            per_session,
            current,
        }
    }

    /// An in-memory session with nothing stored.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(
            Box::new(MemoryStorage::new()),
            Box::new(MemoryStorage::new()),
        )
    }

    /// Records `user` as current and persists it into both storages.
    ///
    /// The in-memory identity is set even if persisting fails.
    ///
    /// # Errors
    ///
    /// Returns the first storage error.
    pub fn login(&mut self, user: User) -> Result<(), SessionError> {
        let encoded = serde_json::to_string(&user)?;
        tracing::info!(user = %user.id, "logged in");
        self.current = Some(user);
        let persisted = self.persistent.set(SESSION_KEY, &encoded);
        let mirrored = self.per_session.set(SESSION_KEY, &encoded);
        persisted.and(mirrored)
    }

    /// Forgets the current identity and removes both stored copies.
    ///
    /// # Errors
    ///
    /// Returns the first storage error; the in-memory identity is cleared
    /// regardless.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(user) = self.current.take() {
            tracing::info!(user = %user.id, "logged out");
        }
        let persisted = self.persistent.remove(SESSION_KEY);
        let mirrored = self.per_session.remove(SESSION_KEY);
        persisted.and(mirrored)
    }

    /// Whether an identity is held.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    /// The logged-in user.
    #[must_use]
    pub const fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }
}

fn restore(storage: &dyn SessionStorage, which: &str) -> Option<User> {
    let raw = match storage.get(SESSION_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(storage = which, error = %e, "could not read session");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(storage = which, error = %e, "ignoring corrupt session");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pmt_proto::user::UserId;

    use super::*;

    fn ada() -> User {
        User {
            id: UserId(1),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn login_and_logout_toggle_state() {
        let mut session = SessionStore::in_memory();
        assert!(!session.is_logged_in());
        session.login(ada()).unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.current_user(), Some(&ada()));
        session.logout().unwrap();
        assert!(!session.is_logged_in());
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn login_writes_both_storages_and_logout_clears_them() {
        let persistent = Arc::new(MemoryStorage::new());
        let per_session = Arc::new(MemoryStorage::new());
        let mut session =
            SessionStore::open(Box::new(Arc::clone(&persistent)), Box::new(Arc::clone(&per_session)));

        session.login(ada()).unwrap();
        let stored = persistent.get(SESSION_KEY).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<User>(&stored).unwrap(), ada());
        assert!(per_session.get(SESSION_KEY).unwrap().is_some());

        session.logout().unwrap();
        assert!(persistent.get(SESSION_KEY).unwrap().is_none());
        assert!(per_session.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn per_session_copy_wins_on_open() {
        let persistent = MemoryStorage::new();
        let per_session = MemoryStorage::new();
        let other = User {
            id: UserId(2),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
        };
        persistent
            .set(SESSION_KEY, &serde_json::to_string(&other).unwrap())
            .unwrap();
        per_session
            .set(SESSION_KEY, &serde_json::to_string(&ada()).unwrap())
            .unwrap();

        let session = SessionStore::open(Box::new(persistent), Box::new(per_session));
        assert_eq!(session.current_user(), Some(&ada()));
    }

    #[test]
    fn corrupt_data_means_logged_out() {
        let persistent = MemoryStorage::new();
        persistent.set(SESSION_KEY, "{not a user").unwrap();
        let session = SessionStore::open(Box::new(persistent), Box::new(MemoryStorage::new()));
        assert!(!session.is_logged_in());
    }

    #[test]
    fn fabricated_identity_is_trusted() {
        let persistent = MemoryStorage::new();
        persistent
            .set(
                SESSION_KEY,
                r#"{"id":99,"nom":"Mallory","email":"m@example.com"}"#,
            )
            .unwrap();
        let session = SessionStore::open(Box::new(persistent), Box::new(MemoryStorage::new()));
        assert_eq!(session.current_user().map(|u| u.id), Some(UserId(99)));
    }
}
