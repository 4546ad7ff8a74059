//! Navigation context: the current address and its query parameters.
//!
//! A logout can be requested by sending the user to any page with
//! `?logout=true`. The credential service reads that directive through
//! `NavigationContext` and rewrites the visible address afterwards so a
//! refresh does not repeat it.

use std::fmt;

use tracing::debug;

/// Query parameter carrying a logout directive
pub const LOGOUT_PARAM: &str = "logout";

/// Value of `LOGOUT_PARAM` that triggers a logout
pub const LOGOUT_VALUE: &str = "true";

pub trait NavigationContext {
    /// Path component of the current address, without query or fragment
    fn path(&self) -> &str;

    /// First value of a query parameter, decoded
    fn query_param(&self, name: &str) -> Option<String>;

    /// Replace the visible address without triggering a navigation
    fn replace_location(&mut self, path: &str);
}

/// True when the current address carries `logout=true`
pub fn has_logout_directive<N: NavigationContext + ?Sized>(nav: &N) -> bool {
    nav.query_param(LOGOUT_PARAM).as_deref() == Some(LOGOUT_VALUE)
}

/// An in-process address, parsed from strings like
/// `https://host/dashboard?logout=true#top` or `/dashboard?area=7`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    origin: Option<String>,
    path: String,
    query: Vec<(String, String)>,
    fragment: Option<String>,
}

impl Location {
    pub fn parse(address: &str) -> Self {
        let (rest, fragment) = match address.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (address, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, parse_query(query)),
            None => (rest, Vec::new()),
        };

        let (origin, path) = match rest.split_once("://") {
            Some((scheme, after)) => {
                let (host, path) = match after.find('/') {
                    Some(idx) => after.split_at(idx),
                    None => (after, ""),
                };
                (Some(format!("{}://{}", scheme, host)), path)
            }
            None => (None, rest),
        };

        let path = if path.is_empty() { "/" } else { path };

        Self {
            origin,
            path: path.to_string(),
            query,
            fragment,
        }
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Encoded query string without the leading `?`
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::parse("/")
    }
}

impl From<&str> for Location {
    fn from(address: &str) -> Self {
        Self::parse(address)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref origin) = self.origin {
            f.write_str(origin)?;
        }
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query_string())?;
        }
        if let Some(ref fragment) = self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

impl NavigationContext for Location {
    fn path(&self) -> &str {
        &self.path
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Keeps the origin, drops query and fragment
    fn replace_location(&mut self, path: &str) {
        let replaced = Location::parse(path);
        self.path = replaced.path;
        self.query = replaced.query;
        self.fragment = replaced.fragment;
        debug!(location = %self, "Location replaced");
    }
}

/// Form-style decoding: `+` is a space, undecodable input is kept raw
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode_component(k), decode_component(v)),
            None => (decode_component(pair), String::new()),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
