//! Reference type tags
//!
//! Provides [`ReferenceType`], the identity of a representation strategy for
//! external data (inline string, inline bytes, URL, file handle, ...).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identity tag for a reference representation
///
/// Cheap to clone (shared name). Ordering is by canonical name, which is the
/// tie-break used wherever path selection must be reproducible.
///
/// # Examples
/// - `inline-string`
/// - `inline-bytes`
/// - `http-url`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceType(Arc<str>);

impl ReferenceType {
    /// Create a type tag from a name
    ///
    /// No validation is performed; use [`str::parse`] for untrusted input.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Canonical name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for ReferenceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReferenceType {
    type Err = TypeNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TypeNameError::Empty);
        }
        if let Some(c) = s
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.' | ':'))
        {
            return Err(TypeNameError::InvalidCharacter {
                name: s.to_string(),
                character: c,
            });
        }
        Ok(Self::new(s))
    }
}

impl TryFrom<String> for ReferenceType {
    type Error = TypeNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReferenceType> for String {
    fn from(value: ReferenceType) -> Self {
        value.0.to_string()
    }
}

impl From<&str> for ReferenceType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ReferenceType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors parsing a reference type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeNameError {
    /// Empty name
    #[error("reference type name is empty")]
    Empty,

    /// Character outside `[A-Za-z0-9-_.:]`
    #[error("invalid character '{character}' in reference type name '{name}'")]
    InvalidCharacter { name: String, character: char },
}
