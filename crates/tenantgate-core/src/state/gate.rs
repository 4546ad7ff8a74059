use tracing::debug;

use crate::auth::{CredentialService, LoginType};
use crate::navigation::NavigationContext;

/// Outcome of a page access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted { username: String, role: String },
    /// Logged in, but the page needs another kind of account
    Forbidden,
    RedirectToLogin,
}

/// Gate in front of a page: requires a session and, optionally, an
/// administrator role.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageGate {
    required: Option<LoginType>,
}

impl PageGate {
    pub fn any_user() -> Self {
        Self { required: None }
    }

    pub fn admin_only() -> Self {
        Self {
            required: Some(LoginType::Admin),
        }
    }

    /// Runs the full `is_logged_in` check, so a logout directive in the
    /// address is honoured before access is decided.
    pub async fn check<N>(&self, service: &CredentialService, nav: &mut N) -> Access
    where
        N: NavigationContext + ?Sized,
    {
        if !service.is_logged_in(nav).await {
            debug!(path = %nav.path(), "No session, redirecting to login");
            return Access::RedirectToLogin;
        }

        let session = service.current_session().await;
        let (Some(username), Some(role)) = (session.username, session.role) else {
            return Access::RedirectToLogin;
        };

        if let Some(required) = self.required {
            let is_admin = service
                .registry()
                .classes()
                .any(|c| c.login_type() == LoginType::Admin && c.role() == role);
            let allowed = match required {
                LoginType::Admin => is_admin,
                LoginType::Tenant => !is_admin,
            };
            if !allowed {
                debug!(%role, ?required, "Role not allowed on this page");
                return Access::Forbidden;
            }
        }

        Access::Granted { username, role }
    }
}
