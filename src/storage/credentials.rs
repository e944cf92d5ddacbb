use crate::domain::session::{Session, UserProfile};
use crate::storage::{KeyValueStore, StorageError};
use std::sync::{Arc, PoisonError, RwLock};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Access,
    Refresh,
    User,
}

impl CredentialKind {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Access => ACCESS_TOKEN_KEY,
            Self::Refresh => REFRESH_TOKEN_KEY,
            Self::User => USER_KEY,
        }
    }
}

/// Access/refresh tokens and the cached user profile.
///
/// The in-memory [`Session`] and the persisted keys only change together, under the
/// session lock, so no reader sees a token without a known role or the other way round.
#[derive(Debug)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
    session: RwLock<Session>,
}

impl CredentialStore {
    /// Wraps `store`, restoring the cached profile written by a previous run.
    ///
    /// An unreadable profile is dropped from storage.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let session = match store.get(USER_KEY) {
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Session::Authenticated { user },
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable cached profile");
                    if let Err(e) = store.remove(&[USER_KEY]) {
                        tracing::warn!(error = %e, "Failed to remove cached profile");
                    }
                    Session::Anonymous
                }
            },
            None => Session::Anonymous,
        };

        Self { store, session: RwLock::new(session) }
    }

    #[must_use]
    pub fn get(&self, kind: CredentialKind) -> Option<String> {
        self.store.get(kind.key())
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.get(CredentialKind::Access)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.get(CredentialKind::Refresh)
    }

    /// Stores a refreshed access token, but only while `exchanged_refresh` is still the stored
    /// refresh token. Returns `false` without writing when the credentials were cleared or
    /// replaced since the refresh started.
    ///
    /// # Errors
    /// Returns an error if the token cannot be persisted.
    pub fn replace_access(&self, access: &str, exchanged_refresh: &str) -> Result<bool, StorageError> {
        let _session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if self.store.get(REFRESH_TOKEN_KEY).as_deref() != Some(exchanged_refresh) {
            return Ok(false);
        }
        self.store.set(ACCESS_TOKEN_KEY, access)?;
        Ok(true)
    }

    /// Records a successful login: both tokens and the profile, as one transition.
    ///
    /// # Errors
    /// Returns an error if the credentials cannot be persisted; the session is left unchanged.
    pub fn establish(&self, access: &str, refresh: &str, user: UserProfile) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&user)?;
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        self.store.set_many(&[
            (ACCESS_TOKEN_KEY, access),
            (REFRESH_TOKEN_KEY, refresh),
            (USER_KEY, &serialized),
        ])?;
        *session = Session::Authenticated { user };
        Ok(())
    }

    /// Replaces the cached profile of an authenticated session.
    ///
    /// Ignored when the session is anonymous, so a late profile response cannot resurrect a
    /// session that was logged out meanwhile.
    ///
    /// # Errors
    /// Returns an error if the profile cannot be persisted.
    pub fn update_user(&self, user: UserProfile) -> Result<(), StorageError> {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if !session.is_authenticated() {
            tracing::debug!("Ignoring profile update for anonymous session");
            return Ok(());
        }
        self.store.set(USER_KEY, &serde_json::to_string(&user)?)?;
        *session = Session::Authenticated { user };
        Ok(())
    }

    /// Removes both tokens and the cached profile.
    ///
    /// The in-memory session becomes anonymous even if the storage write fails.
    ///
    /// # Errors
    /// Returns an error if the removal cannot be persisted.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *session = Session::Anonymous;
        self.store.remove(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY])
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// True iff an access token is stored and a user profile is known.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        session.is_authenticated() && self.store.get(ACCESS_TOKEN_KEY).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::Role;
    use crate::storage::MemoryStore;

    fn store() -> (Arc<MemoryStore>, CredentialStore) {
        let kv = Arc::new(MemoryStore::new());
        let creds = CredentialStore::new(Arc::clone(&kv) as Arc<dyn KeyValueStore>);
        (kv, creds)
    }

    #[test]
    fn test_replace_access_keeps_refresh() {
        let (_, creds) = store();
        creds.establish("A1", "R1", UserProfile::new("a@b.com", Role::Admin)).unwrap();

        assert!(creds.replace_access("A2", "R1").unwrap());
        assert_eq!(creds.access_token().as_deref(), Some("A2"));
        assert_eq!(creds.refresh_token().as_deref(), Some("R1"));
    }

    #[test]
    fn test_replace_access_after_clear_is_dropped() {
        let (kv, creds) = store();
        creds.establish("A1", "R1", UserProfile::new("a@b.com", Role::Admin)).unwrap();
        creds.clear().unwrap();

        assert!(!creds.replace_access("A2", "R1").unwrap());
        assert!(kv.is_empty());
    }

    #[test]
    fn test_replace_access_after_new_login_is_dropped() {
        let (_, creds) = store();
        creds.establish("B1", "R9", UserProfile::new("b@b.com", Role::Viewer)).unwrap();

        assert!(!creds.replace_access("A2", "R1").unwrap());
        assert_eq!(creds.access_token().as_deref(), Some("B1"));
    }

    #[test]
    fn test_establish_and_clear() {
        let (kv, creds) = store();
        creds.establish("A1", "R1", UserProfile::new("a@b.com", Role::Admin)).unwrap();

        assert!(creds.is_authenticated());
        assert!(creds.get(CredentialKind::User).is_some());

        creds.clear().unwrap();
        assert!(!creds.is_authenticated());
        assert_eq!(creds.session(), Session::Anonymous);
        assert!(kv.is_empty());
    }

    #[test]
    fn test_authenticated_requires_both_token_and_user() {
        let cases = [(false, false), (true, false), (false, true), (true, true)];
        for (has_token, has_user) in cases {
            let kv = Arc::new(MemoryStore::new());
            if has_token {
                kv.set(ACCESS_TOKEN_KEY, "A1").unwrap();
            }
            if has_user {
                kv.set(USER_KEY, r#"{"role":"viewer"}"#).unwrap();
            }
            let creds = CredentialStore::new(kv);
            assert_eq!(creds.is_authenticated(), has_token && has_user, "token={has_token} user={has_user}");
        }
    }

    #[test]
    fn test_profile_restored_on_construction() {
        let kv = Arc::new(MemoryStore::new());
        {
            let creds = CredentialStore::new(Arc::clone(&kv) as Arc<dyn KeyValueStore>);
            creds.establish("A1", "R1", UserProfile::new("a@b.com", Role::Viewer)).unwrap();
        }

        let restored = CredentialStore::new(kv);
        assert!(restored.is_authenticated());
        assert_eq!(restored.session().role(), Role::Viewer);
    }

    #[test]
    fn test_unreadable_profile_is_discarded() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(USER_KEY, "{not json").unwrap();
        kv.set(ACCESS_TOKEN_KEY, "A1").unwrap();

        let creds = CredentialStore::new(Arc::clone(&kv) as Arc<dyn KeyValueStore>);
        assert!(!creds.is_authenticated());
        assert_eq!(kv.get(USER_KEY), None);
    }

    #[test]
    fn test_update_user_ignored_when_anonymous() {
        let (kv, creds) = store();
        creds.update_user(UserProfile::new("late@b.com", Role::Admin)).unwrap();
        assert_eq!(kv.get(USER_KEY), None);
        assert_eq!(creds.session(), Session::Anonymous);
    }
}
