use thiserror::Error;

use super::registry::LoginType;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No account matches the supplied credentials (scope: {scope:?})")]
    InvalidCredentials { scope: Option<LoginType> },

    #[error("System error: {0}")]
    System(#[from] StorageError),
}

impl AuthError {
    /// Message safe to show the user. Never says which field was wrong.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials {
                scope: Some(LoginType::Admin),
            } => "Invalid administrator username or password",
            AuthError::InvalidCredentials {
                scope: Some(LoginType::Tenant),
            } => "Invalid username or password",
            AuthError::InvalidCredentials { scope: None } => "Invalid credentials",
            AuthError::System(_) => "System error",
        }
    }
}
