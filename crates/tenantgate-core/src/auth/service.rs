use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::error::AuthError;
use super::registry::{AccountRegistry, LoginType};
use super::session::{Identity, Session, SessionStore};
use crate::navigation::{self, NavigationContext};

/// Shared, lock-protected session. Readers never observe a half-applied
/// commit because `commit` runs under the write lock.
pub type SessionHandle = Arc<RwLock<SessionStore>>;

const ADMIN_LOGIN_MESSAGE: &str = "Administrator login successful";
const LOGIN_MESSAGE: &str = "Login successful";

/// A submitted username/password pair.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Who was logged in by a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserData {
    pub username: String,
    pub role: String,
}

/// Result of a login attempt. Failures are reported here, never as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<UserData>,
}

impl LoginOutcome {
    fn succeeded(message: &str, user: UserData) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            user_data: Some(user),
        }
    }

    fn failed(err: &AuthError) -> Self {
        Self {
            success: false,
            message: err.user_message().to_string(),
            user_data: None,
        }
    }
}

/// Validates login attempts against the account registry and drives the
/// session through its two transitions.
pub struct CredentialService {
    registry: AccountRegistry,
    session: SessionHandle,
}

impl CredentialService {
    pub fn new(registry: AccountRegistry, store: SessionStore) -> Self {
        Self {
            registry,
            session: Arc::new(RwLock::new(store)),
        }
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// Handle for observers that need to read the session directly
    pub fn session_handle(&self) -> SessionHandle {
        Arc::clone(&self.session)
    }

    /// Check `credentials` and, on a match, commit the session.
    ///
    /// With `login_type` the candidates are restricted to that class of
    /// account; without it every account is scanned in registry order and the
    /// first match wins. A failed attempt leaves the session untouched.
    pub async fn login(&self, credentials: &Credentials, login_type: Option<LoginType>) -> LoginOutcome {
        match self.authenticate(credentials, login_type).await {
            Ok(user) => {
                info!(username = %user.username, role = %user.role, "Login successful");
                let message = if login_type == Some(LoginType::Admin) {
                    ADMIN_LOGIN_MESSAGE
                } else {
                    LOGIN_MESSAGE
                };
                LoginOutcome::succeeded(message, user)
            }
            Err(e @ AuthError::InvalidCredentials { .. }) => {
                warn!(username = %credentials.username, scope = ?login_type, "Login rejected");
                LoginOutcome::failed(&e)
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                LoginOutcome::failed(&e)
            }
        }
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
        scope: Option<LoginType>,
    ) -> Result<UserData, AuthError> {
        let rejected = || AuthError::InvalidCredentials { scope };

        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(rejected());
        }

        let account = self
            .registry
            .find_match(&credentials.username, &credentials.password, scope)
            .ok_or_else(rejected)?;

        let identity = Identity {
            username: credentials.username.clone(),
            role: account.class().role(),
        };
        self.session.write().await.commit(&identity)?;

        Ok(UserData {
            username: identity.username,
            role: identity.role,
        })
    }

    /// Clear the session. Resolves once the cleared state has been handed to
    /// durable storage, with whether storage accepted it. On `false` the
    /// process is logged out but a later load may bring the old session back.
    pub async fn logout(&self) -> bool {
        let mut store = self.session.write().await;
        let was_logged_in = store.is_logged_in();
        let persisted = store.clear();
        info!(was_logged_in, persisted, "Logged out");
        persisted
    }

    /// Handle a pending `?logout=true` directive: log out, then strip the
    /// query from the visible address. Returns whether a directive was found.
    pub async fn process_logout_directive<N>(&self, nav: &mut N) -> bool
    where
        N: NavigationContext + ?Sized,
    {
        if !navigation::has_logout_directive(&*nav) {
            return false;
        }

        info!(path = %nav.path(), "Logout directive found");
        self.logout().await;

        let path = nav.path().to_string();
        nav.replace_location(&path);
        true
    }

    /// Whether a user is logged in, after processing any logout directive.
    ///
    /// If the address carries `logout=true` this logs out and returns false
    /// regardless of the prior session.
    pub async fn is_logged_in<N>(&self, nav: &mut N) -> bool
    where
        N: NavigationContext + ?Sized,
    {
        if self.process_logout_directive(nav).await {
            return false;
        }
        self.is_logged_in_read_only().await
    }

    /// Side-effect-free variant of `is_logged_in`
    pub async fn is_logged_in_read_only(&self) -> bool {
        self.session.read().await.is_logged_in()
    }

    pub async fn current_session(&self) -> Session {
        self.session.read().await.session().clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::registry::{Account, AccountClass};
    use crate::auth::session::{PersistenceMode, AUTH_KEY, ROLE_KEY, USERNAME_KEY};
    use crate::navigation::Location;
    use crate::storage::{KeyValueStore, MemoryStore, StorageError};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn registry() -> AccountRegistry {
        let class = |id: &str| AccountClass::new(id).unwrap();
        AccountRegistry::new(vec![
            Account::new(class("ADMIN"), "root", "hunter2"),
            Account::new(class("USER1"), "alice", "a-pass"),
            Account::new(class("USER2"), "bob", "b-pass"),
            Account::new(class("USER3"), "carol", "c-pass"),
            Account::new(class("USER4"), "dave", "d-pass"),
        ])
        .unwrap()
    }

    fn service_with(storage: Arc<MemoryStore>) -> CredentialService {
        CredentialService::new(registry(), SessionStore::load(storage))
    }

    fn service() -> (CredentialService, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        (service_with(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_admin_login_scoped() {
        let (service, _) = service();
        let outcome = service
            .login(&Credentials::new("root", "hunter2"), Some(LoginType::Admin))
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.message, ADMIN_LOGIN_MESSAGE);
        assert_eq!(
            service.current_session().await,
            Session {
                is_logged_in: true,
                username: Some("root".to_string()),
                role: Some("admin".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_every_account_can_log_in_unscoped() {
        for account in registry().iter() {
            let (service, _) = service();
            let password = match account.username() {
                "root" => "hunter2",
                "alice" => "a-pass",
                "bob" => "b-pass",
                "carol" => "c-pass",
                _ => "d-pass",
            };
            let outcome = service
                .login(&Credentials::new(account.username(), password), None)
                .await;
            assert!(outcome.success, "{} should log in", account.username());

            let session = service.current_session().await;
            assert_eq!(session.role, Some(account.class().role()));
            assert_eq!(session.username.as_deref(), Some(account.username()));
        }
    }

    #[tokio::test]
    async fn test_tenant_login_scoped() {
        let (service, storage) = service();
        let outcome = service
            .login(&Credentials::new("carol", "c-pass"), Some(LoginType::Tenant))
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.message, LOGIN_MESSAGE);
        assert_eq!(
            outcome.user_data,
            Some(UserData {
                username: "carol".to_string(),
                role: "user3".to_string(),
            })
        );
        assert_eq!(storage.get(ROLE_KEY).unwrap().as_deref(), Some("user3"));
    }

    #[tokio::test]
    async fn test_scope_excludes_other_classes() {
        let (service, _) = service();

        let outcome = service
            .login(&Credentials::new("root", "hunter2"), Some(LoginType::Tenant))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Invalid username or password");

        let outcome = service
            .login(&Credentials::new("alice", "a-pass"), Some(LoginType::Admin))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Invalid administrator username or password");

        assert!(!service.is_logged_in_read_only().await);
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_session_unchanged() {
        let (service, storage) = service();
        service.login(&Credentials::new("alice", "a-pass"), None).await;
        let before = service.current_session().await;

        let outcome = service.login(&Credentials::new("root", "wrong"), None).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Invalid credentials");
        assert!(outcome.user_data.is_none());

        assert_eq!(service.current_session().await, before);
        assert_eq!(storage.get(USERNAME_KEY).unwrap().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected() {
        let (service, storage) = service();
        let outcome = service.login(&Credentials::new("", ""), None).await;
        assert!(!outcome.success);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_login_twice_is_idempotent() {
        let (service, storage) = service();
        let credentials = Credentials::new("bob", "b-pass");

        service.login(&credentials, None).await;
        let once = service.current_session().await;
        service.login(&credentials, None).await;

        assert_eq!(service.current_session().await, once);
        assert_eq!(storage.len(), 3);
    }

    #[tokio::test]
    async fn test_logout_erases_storage() {
        let (service, storage) = service();
        service.login(&Credentials::new("root", "hunter2"), None).await;
        assert_eq!(storage.len(), 3);

        assert!(service.logout().await);

        let mut nav = Location::parse("/");
        assert!(!service.is_logged_in(&mut nav).await);
        for key in [AUTH_KEY, USERNAME_KEY, ROLE_KEY] {
            assert_eq!(storage.get(key).unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_logout_directive_logs_out_and_strips_query() {
        let (service, storage) = service();
        service.login(&Credentials::new("root", "hunter2"), None).await;

        let mut nav = Location::parse("https://example.com/dashboard?logout=true");
        assert!(!service.is_logged_in(&mut nav).await);

        assert_eq!(service.current_session().await, Session::logged_out());
        assert!(storage.is_empty());
        assert_eq!(nav.to_string(), "https://example.com/dashboard");
        assert_eq!(nav.query_param("logout"), None);
    }

    #[tokio::test]
    async fn test_logout_directive_when_already_logged_out() {
        let (service, _) = service();
        let mut nav = Location::parse("/?logout=true&area=3");
        assert!(service.process_logout_directive(&mut nav).await);
        assert!(nav.query().is_empty());

        // Directive consumed, a second check has nothing to do
        assert!(!service.process_logout_directive(&mut nav).await);
    }

    #[tokio::test]
    async fn test_is_logged_in_without_directive() {
        let (service, _) = service();
        service.login(&Credentials::new("dave", "d-pass"), None).await;

        let mut nav = Location::parse("/graph?logout=false");
        assert!(service.is_logged_in(&mut nav).await);
        assert_eq!(nav.query_param("logout").as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn test_read_only_check_ignores_directive() {
        let (service, _) = service();
        service.login(&Credentials::new("dave", "d-pass"), None).await;
        assert!(service.is_logged_in_read_only().await);
        assert!(service.current_session().await.is_logged_in);
    }

    #[tokio::test]
    async fn test_session_survives_reload() {
        let storage = Arc::new(MemoryStore::new());
        let service = service_with(storage.clone());
        service.login(&Credentials::new("alice", "a-pass"), None).await;
        drop(service);

        let reloaded = service_with(storage);
        let session = reloaded.current_session().await;
        assert!(session.is_logged_in);
        assert_eq!(session.role.as_deref(), Some("user1"));
    }

    #[tokio::test]
    async fn test_storage_failure_degrades_but_logs_in() {
        let service = CredentialService::new(registry(), SessionStore::load(Arc::new(BrokenStore)));
        let outcome = service.login(&Credentials::new("root", "hunter2"), None).await;

        assert!(outcome.success);
        assert!(service.is_logged_in_read_only().await);
        assert!(!service.session_handle().read().await.is_persistent());
    }

    #[tokio::test]
    async fn test_logout_after_degrade_reports_not_persisted() {
        let service = CredentialService::new(registry(), SessionStore::load(Arc::new(BrokenStore)));
        service.login(&Credentials::new("root", "hunter2"), None).await;

        assert!(!service.logout().await);
        assert!(!service.is_logged_in_read_only().await);
    }

    #[tokio::test]
    async fn test_storage_failure_in_strict_mode_is_system_error() {
        let store = SessionStore::load_with_mode(Arc::new(BrokenStore), PersistenceMode::Strict);
        let service = CredentialService::new(registry(), store);
        let outcome = service.login(&Credentials::new("root", "hunter2"), None).await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, "System error");
        assert!(!service.is_logged_in_read_only().await);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("root", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = LoginOutcome::failed(&AuthError::InvalidCredentials { scope: None });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], serde_json::json!(false));
        assert!(json.get("userData").is_none());
    }
}
