use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// The one privileged account class
pub const ADMIN_CLASS: &str = "ADMIN";

/// Account classes declared when no override is configured, in scan order
pub const DEFAULT_CLASSES: &[&str] = &["ADMIN", "USER1", "USER2", "USER3", "USER4"];

/// Which slice of the registry a login attempt is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    Admin,
    Tenant,
}

impl LoginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginType::Admin => "admin",
            LoginType::Tenant => "tenant",
        }
    }
}

impl FromStr for LoginType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(LoginType::Admin),
            // "user" is what older front ends send for tenant logins
            "tenant" | "user" => Ok(LoginType::Tenant),
            other => Err(format!("Unknown login type: {}", other)),
        }
    }
}

impl fmt::Display for LoginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account class identifier such as `ADMIN` or `USER2`.
///
/// Identifiers are upper-case ASCII letters, digits and underscores so they
/// can be spliced into environment variable names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountClass(pub(crate) String);

impl AccountClass {
    pub fn new(id: &str) -> Result<Self, ConfigError> {
        let id = id.trim().to_uppercase();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(ConfigError::InvalidClass(id));
        }
        Ok(Self(id))
    }

    pub fn admin() -> Self {
        Self(ADMIN_CLASS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Role recorded in the session for accounts of this class
    pub fn role(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn login_type(&self) -> LoginType {
        if self.0 == ADMIN_CLASS {
            LoginType::Admin
        } else {
            LoginType::Tenant
        }
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One configured account: a class plus its expected username and password.
#[derive(Clone)]
pub struct Account {
    class: AccountClass,
    username: String,
    password: String,
}

impl Account {
    pub fn new(class: AccountClass, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            class,
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn class(&self) -> &AccountClass {
        &self.class
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Exact, case-sensitive comparison of both fields
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

// Keep passwords out of debug output and logs
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("class", &self.class)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Static table of valid accounts, in declared order.
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
}

impl AccountRegistry {
    /// Build a registry, rejecting a class that appears more than once
    pub fn new(accounts: Vec<Account>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for account in &accounts {
            if !seen.insert(account.class.clone()) {
                return Err(ConfigError::DuplicateClass(account.class.to_string()));
            }
        }
        Ok(Self { accounts })
    }

    /// First account in declared order whose username and password both
    /// match. With a scope, accounts of other login types are skipped.
    pub fn find_match(
        &self,
        username: &str,
        password: &str,
        scope: Option<LoginType>,
    ) -> Option<&Account> {
        self.accounts
            .iter()
            .filter(|a| scope.map_or(true, |s| a.class.login_type() == s))
            .find(|a| a.matches(username, password))
    }

    pub fn get(&self, class: &AccountClass) -> Option<&Account> {
        self.accounts.iter().find(|a| &a.class == class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn classes(&self) -> impl Iterator<Item = &AccountClass> {
        self.accounts.iter().map(|a| &a.class)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
