//! Build identifier
//!
//! A build identifier tags the images of a run and correlates the run's
//! artifacts. It is usually the short hash of the commit being deployed.
//! Since it ends up as an image tag, it follows the image tag grammar:
//! `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BuildIdError;

/// Maximum length of an image tag
const MAX_LEN: usize = 128;

/// Validated build identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildId(String);

impl BuildId {
    /// Parses and validates a build identifier
    ///
    /// Surrounding whitespace is ignored, so the output of
    /// `git rev-parse --short HEAD` can be passed in directly.
    pub fn parse(input: &str) -> Result<Self, BuildIdError> {
        let value = input.trim();

        let len = value.chars().count();
        if len == 0 {
            return Err(BuildIdError::Empty);
        }
        if len > MAX_LEN {
            return Err(BuildIdError::TooLong(len));
        }

        for (position, ch) in value.chars().enumerate() {
            if !(ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')) {
                return Err(BuildIdError::InvalidChar { ch, position });
            }
            if position == 0 && matches!(ch, '.' | '-') {
                return Err(BuildIdError::InvalidStart(ch));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BuildId {
    type Err = BuildIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BuildId {
    type Error = BuildIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BuildId> for String {
    fn from(id: BuildId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_hash() {
        let id = BuildId::parse("abc123\n").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(BuildId::parse("   "), Err(BuildIdError::Empty));
    }

    #[test]
    fn test_parse_rejects_invalid_characters() {
        assert_eq!(
            BuildId::parse("abc/123"),
            Err(BuildIdError::InvalidChar {
                ch: '/',
                position: 3
            })
        );
        assert_eq!(BuildId::parse("-abc"), Err(BuildIdError::InvalidStart('-')));
        assert!(BuildId::parse("_abc.1-2").is_ok());
    }

    #[test]
    fn test_parse_rejects_long_ids() {
        let long = "a".repeat(129);
        assert_eq!(BuildId::parse(&long), Err(BuildIdError::TooLong(129)));
        assert!(BuildId::parse(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: BuildId = serde_json::from_str("\"v1.2.3\"").unwrap();
        assert_eq!(ok.as_str(), "v1.2.3");

        let bad: Result<BuildId, _> = serde_json::from_str("\"not a tag\"");
        assert!(bad.is_err());
    }
}
