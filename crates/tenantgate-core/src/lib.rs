//! Core library for tenantgate.
//!
//! This crate provides the pieces a client needs to gate access behind a
//! configuration-driven login:
//! - `auth`: account registry, persisted session store, and credential service
//! - `storage`: durable key/value backends the session is written to
//! - `navigation`: the address/query context a logout directive arrives through
//! - `config`: account configuration from the environment and app settings on disk
//! - `state`: UI state containers (algorithm selection, graph filters, page gate)

pub mod auth;
pub mod config;
pub mod navigation;
pub mod state;
pub mod storage;

pub use auth::{
    AccountRegistry, AuthError, CredentialService, Credentials, LoginOutcome, LoginType, Session,
    SessionStore,
};
pub use config::{AppConfig, AuthConfig};
pub use navigation::{Location, NavigationContext};
pub use storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StorageError};
