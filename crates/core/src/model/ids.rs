use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a catalog pack (e.g. `present-simple-1`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackId(String);

impl PackId {
    /// Prefix reserved for the synthetic identifiers of review runs.
    pub const REVIEW_PREFIX: &'static str = "review-";

    /// Creates a new `PackId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthetic identifier used for a run over every unresolved mistake.
    #[must_use]
    pub fn review_all() -> Self {
        Self(format!("{}all", Self::REVIEW_PREFIX))
    }

    /// Synthetic identifier used for a run over one category's mistakes.
    #[must_use]
    pub fn review_category() -> Self {
        Self(format!("{}category", Self::REVIEW_PREFIX))
    }

    /// True for identifiers that name a review run rather than a catalog pack.
    #[must_use]
    pub fn is_review_marker(&self) -> bool {
        self.0.starts_with(Self::REVIEW_PREFIX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a tense (e.g. `past-perfect`), shared by all packs of that tense.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenseId(String);

impl TenseId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque identity handed out by the authentication provider.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackId({})", self.0)
    }
}

impl fmt::Debug for TenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenseId({})", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an identifier from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot be empty", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

fn non_empty(s: &str, kind: &'static str) -> Result<String, ParseIdError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseIdError { kind });
    }
    Ok(trimmed.to_string())
}

impl FromStr for PackId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        non_empty(s, "PackId").map(Self)
    }
}

impl FromStr for TenseId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        non_empty(s, "TenseId").map(Self)
    }
}

impl FromStr for UserId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        non_empty(s, "UserId").map(Self)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_id_parses_trimmed() {
        let id: PackId = "  present-simple-1 ".parse().unwrap();
        assert_eq!(id, PackId::new("present-simple-1"));
        assert_eq!(id.to_string(), "present-simple-1");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!("   ".parse::<PackId>().is_err());
        assert!("".parse::<UserId>().is_err());
        assert!("\t".parse::<TenseId>().is_err());
    }

    #[test]
    fn review_markers_are_recognised() {
        assert!(PackId::review_all().is_review_marker());
        assert!(PackId::review_category().is_review_marker());
        assert!(!PackId::new("past-simple-2").is_review_marker());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&UserId::new("abc-123")).unwrap();
        assert_eq!(json, "\"abc-123\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "abc-123");
    }
}
