//! User namespace identifier.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static SCOPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.@-]{0,127}$").expect("valid scope regex"));

/// Opaque user scope that namespaces every collection in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserScope(String);

/// Rejected user scope input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeError(pub String);

impl Display for ScopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid user scope `{}`", self.0)
    }
}

impl Error for ScopeError {}

impl UserScope {
    /// Parses a scope, trimming surrounding whitespace.
    pub fn parse(value: &str) -> Result<Self, ScopeError> {
        let trimmed = value.trim();
        if !SCOPE_RE.is_match(trimmed) {
            return Err(ScopeError(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserScope {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserScope> for String {
    fn from(value: UserScope) -> Self {
        value.0
    }
}
