//! Branch code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`BranchCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum BranchCodeError {
    /// The input string is empty.
    #[error("branch code cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("branch code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[A-Za-z0-9-]`.
    #[error("branch code may only contain letters, digits, and '-'")]
    InvalidCharacter,
}

/// A short human-assigned branch identifier, e.g. `NYC01`.
///
/// Branch codes are the value every branch-scoped row stores in its
/// `branch_id` column, and the value a branch manager's profile is
/// pinned to. Codes are normalized to uppercase on parse so that
/// scoping comparisons are exact string matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BranchCode(String);

impl BranchCode {
    /// Maximum length of a branch code.
    pub const MAX_LENGTH: usize = 12;

    /// Parse a `BranchCode` from a string, normalizing to uppercase.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 12
    /// characters, or contains characters outside `[A-Za-z0-9-]`.
    pub fn parse(s: &str) -> Result<Self, BranchCodeError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(BranchCodeError::Empty);
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(BranchCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(BranchCodeError::InvalidCharacter);
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BranchCode {
    type Err = BranchCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for BranchCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let code = BranchCode::parse("nyc01").unwrap();
        assert_eq!(code.as_str(), "NYC01");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let code = BranchCode::parse("  SEA-2 ").unwrap();
        assert_eq!(code.as_str(), "SEA-2");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(BranchCode::parse("  "), Err(BranchCodeError::Empty)));
    }

    #[test]
    fn test_parse_too_long() {
        assert!(matches!(
            BranchCode::parse("ABCDEFGHIJKLM"),
            Err(BranchCodeError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_punctuation() {
        assert!(matches!(
            BranchCode::parse("NYC_01"),
            Err(BranchCodeError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let code = BranchCode::parse("NYC01").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"NYC01\"");

        let parsed: BranchCode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, code);
    }
}
