//! Member references extracted from watched attributes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{DerefError, Result};

/// A non-empty identifier (normally a DN) naming one member entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberReference(String);

impl MemberReference {
    /// Parse a raw attribute value. Surrounding whitespace is trimmed; a
    /// value that is empty afterwards is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DerefError::InvalidInput("member reference must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MemberReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MemberReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MemberReference {
    type Error = DerefError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<MemberReference> for String {
    fn from(value: MemberReference) -> Self {
        value.0
    }
}
