//! Dotted paths into remote records.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A parsed dotted path such as `status.locked`.
///
/// Resolving walks nested objects one segment at a time. A missing key or a
/// non-object intermediate value resolves to `None` (the record simply does
/// not carry that value).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordPath {
    segments: Vec<String>,
}

impl RecordPath {
    /// Parses a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(path: &str) -> crate::Result<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(crate::Error::InvalidPath(path.to_string()));
        }
        Ok(Self { segments })
    }

    /// Builds a single-segment path for a top-level key.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            segments: vec![key.into()],
        }
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the first segment (the top-level key in the record).
    #[must_use]
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// Returns true if the path descends into nested objects.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Resolves the path against a record.
    #[must_use]
    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(record, |current, segment| current.as_object()?.get(segment))
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for RecordPath {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
