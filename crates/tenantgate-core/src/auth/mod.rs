//! Authentication module for managing login sessions.
//!
//! This module provides:
//! - `AccountRegistry`: the configured accounts, grouped by class
//! - `SessionStore`: the logged-in state, mirrored into durable storage
//! - `CredentialService`: login/logout and logout-directive handling
//!
//! The credential service is the only writer of a session store.

pub mod error;
pub mod registry;
pub mod service;
pub mod session;

pub use error::AuthError;
pub use registry::{Account, AccountClass, AccountRegistry, LoginType};
pub use service::{CredentialService, Credentials, LoginOutcome, SessionHandle, UserData};
pub use session::{Identity, PersistenceMode, Session, SessionStore};
