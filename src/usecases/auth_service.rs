//! Login / register / logout flow. Delegates network calls to the gateway
//! and mirrors the session into the store.
//!
//! Explicitly constructed and injected; there is no ambient session global.
//! The in-memory cache gives `current_session()` a synchronous, I/O-free read.

use crate::domain::{IntakeError, Session};
use crate::ports::{BackendGateway, SessionStore};
use std::sync::{Arc, RwLock};
use tracing::info;

/// Minimum username length, checked before any network call.
const MIN_USERNAME_LEN: usize = 3;

pub struct AuthService {
    gateway: Arc<dyn BackendGateway>,
    store: Arc<dyn SessionStore>,
    cache: RwLock<Option<Session>>,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn BackendGateway>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            gateway,
            store,
            cache: RwLock::new(None),
        }
    }

    /// Load the persisted session into the cache. Call once at startup.
    pub async fn restore(&self) -> Result<Option<Session>, IntakeError> {
        let session = self.store.load().await?;
        *self.cache.write().expect("session cache poisoned") = session.clone();
        if let Some(s) = &session {
            info!(username = %s.username, "restored session");
        }
        Ok(session)
    }

    /// Synchronous read of the cached session. No network, no disk.
    pub fn current_session(&self) -> Option<Session> {
        self.cache.read().expect("session cache poisoned").clone()
    }

    /// Register a new account. Validation failures happen before the network
    /// call; a backend conflict surfaces verbatim. Success persists the
    /// session (overwriting any previous one).
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Session, IntakeError> {
        let username = username.trim();
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(IntakeError::Validation(format!(
                "username must be at least {} characters",
                MIN_USERNAME_LEN
            )));
        }
        if password != confirmation {
            return Err(IntakeError::Validation(
                "password confirmation does not match".to_string(),
            ));
        }

        let canonical = self.gateway.register(username, password).await?;
        self.establish(canonical).await
    }

    /// Log in. Unknown username / bad credentials surface verbatim; a failed
    /// attempt leaves any prior state untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, IntakeError> {
        let canonical = self.gateway.login(username.trim(), password).await?;
        self.establish(canonical).await
    }

    /// Clear the persisted session unconditionally. Idempotent.
    pub async fn logout(&self) -> Result<(), IntakeError> {
        self.store.clear().await?;
        *self.cache.write().expect("session cache poisoned") = None;
        info!("logged out");
        Ok(())
    }

    async fn establish(&self, username: String) -> Result<Session, IntakeError> {
        let session = Session::new(username);
        self.store.save(&session).await?;
        *self.cache.write().expect("session cache poisoned") = Some(session.clone());
        info!(username = %session.username, "session established");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::MockBackendGateway;
    use crate::adapters::persistence::SessionJson;
    use std::time::Duration;

    fn service(dir: &tempfile::TempDir) -> (AuthService, Arc<MockBackendGateway>) {
        let gateway = Arc::new(MockBackendGateway::new().with_delay(Duration::from_millis(1)));
        let store = Arc::new(SessionJson::new(dir.path().join("session.json")));
        (
            AuthService::new(gateway.clone(), store),
            gateway,
        )
    }

    #[tokio::test]
    async fn test_register_short_username_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, _) = service(&dir);
        let err = auth.register("ab", "pw1", "pw1").await.unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));
        assert!(auth.current_session().is_none());
    }

    #[tokio::test]
    async fn test_register_confirmation_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, _) = service(&dir);
        let err = auth.register("mudassir", "pw1", "pw2").await.unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_login_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, _) = service(&dir);

        let session = auth.register("mudassir", "pw1", "pw1").await.unwrap();
        assert_eq!(session.username, "mudassir");
        assert_eq!(auth.current_session().unwrap().username, "mudassir");

        let again = auth.login("mudassir", "pw1").await.unwrap();
        assert_eq!(again, session);
    }

    #[tokio::test]
    async fn test_register_conflict_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, _) = service(&dir);
        auth.register("mudassir", "pw1", "pw1").await.unwrap();
        auth.logout().await.unwrap();

        let err = auth.register("mudassir", "pw1", "pw1").await.unwrap_err();
        assert!(matches!(err, IntakeError::Conflict(_)));
        assert!(auth.current_session().is_none());
    }

    #[tokio::test]
    async fn test_login_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, _) = service(&dir);
        let err = auth.login("ghost", "pw").await.unwrap_err();
        assert!(matches!(err, IntakeError::NotFound(_)));
        assert!(auth.current_session().is_none());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (auth, _) = service(&dir);
        auth.register("mudassir", "pw1", "pw1").await.unwrap();

        auth.logout().await.unwrap();
        let after_once = auth.current_session();
        auth.logout().await.unwrap();
        assert_eq!(after_once, auth.current_session());
        assert!(auth.current_session().is_none());
    }

    #[tokio::test]
    async fn test_restore_reads_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (auth, _) = service(&dir);
            auth.register("mudassir", "pw1", "pw1").await.unwrap();
        }
        // Fresh service over the same profile file.
        let (auth, _) = service(&dir);
        assert!(auth.current_session().is_none());
        let restored = auth.restore().await.unwrap().unwrap();
        assert_eq!(restored.username, "mudassir");
        assert_eq!(auth.current_session().unwrap().username, "mudassir");
    }
}
