//! Typed record keys of the form `<namespace>:<sequence>`.
//!
//! Every record lives under a key built from a [`Namespace`] prefix and a positive sequence
//! number. Keys are parsed into [`RecordKey`] before any ordering or sequence arithmetic, so
//! callers never split strings by hand.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Logical record families sharing the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Course materials (`courses:*`).
    Materials,
    /// Saved quizzes (`tests:*`).
    Quizzes,
    /// Saved assignments (`assignments:*`).
    Assignments,
}

impl Namespace {
    /// Key prefix used for records of this namespace.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Materials => "courses",
            Self::Quizzes => "tests",
            Self::Assignments => "assignments",
        }
    }

    /// Older prefix still honoured when deleting records.
    pub const fn legacy_prefix(self) -> Option<&'static str> {
        match self {
            Self::Quizzes => Some("quizzes"),
            Self::Materials | Self::Assignments => None,
        }
    }

    /// Glob pattern matching every key of this namespace.
    pub fn pattern(self) -> String {
        format!("{}:*", self.prefix())
    }

    /// Name of the field holding the primary payload.
    pub const fn content_field(self) -> &'static str {
        match self {
            Self::Materials => "content",
            Self::Quizzes | Self::Assignments => "xml",
        }
    }

    /// Build the key for `sequence` within this namespace.
    pub const fn key(self, sequence: u64) -> RecordKey {
        RecordKey {
            namespace: self,
            sequence,
        }
    }

    /// Normalize a caller-supplied identifier into a full key string.
    ///
    /// A bare identifier such as `"12"` gets the namespace prefix prepended. A full key is
    /// accepted only under this namespace's prefix or its legacy prefix.
    pub fn normalize(self, identifier: &str) -> Result<String, KeyError> {
        let identifier = identifier.trim();
        match identifier.rsplit_once(':') {
            None => Ok(format!("{}:{identifier}", self.prefix())),
            Some((prefix, _))
                if prefix == self.prefix() || self.legacy_prefix() == Some(prefix) =>
            {
                Ok(identifier.to_string())
            }
            Some(_) => Err(KeyError::UnknownNamespace(identifier.to_string())),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Errors raised while parsing a textual key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The key carries no `:` separator.
    #[error("key '{0}' has no namespace separator")]
    MissingSeparator(String),
    /// The prefix does not name a known namespace.
    #[error("key '{0}' does not belong to a known namespace")]
    UnknownNamespace(String),
    /// The suffix is not a non-negative integer.
    #[error("key '{0}' has a non-numeric sequence")]
    InvalidSequence(String),
}

/// Parsed `<namespace>:<sequence>` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Namespace the record belongs to.
    pub namespace: Namespace,
    /// Sequence number within the namespace.
    pub sequence: u64,
}

impl RecordKey {
    /// Parse `raw`, requiring it to belong to `namespace`.
    pub fn parse_in(namespace: Namespace, raw: &str) -> Result<Self, KeyError> {
        let key: Self = raw.parse()?;
        if key.namespace == namespace {
            Ok(key)
        } else {
            Err(KeyError::UnknownNamespace(raw.to_string()))
        }
    }
}

impl FromStr for RecordKey {
    type Err = KeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (prefix, suffix) = raw
            .rsplit_once(':')
            .ok_or_else(|| KeyError::MissingSeparator(raw.to_string()))?;
        let namespace = match prefix {
            "courses" => Namespace::Materials,
            "tests" => Namespace::Quizzes,
            "assignments" => Namespace::Assignments,
            _ => return Err(KeyError::UnknownNamespace(raw.to_string())),
        };
        let sequence = suffix
            .parse()
            .map_err(|_| KeyError::InvalidSequence(raw.to_string()))?;
        Ok(Self {
            namespace,
            sequence,
        })
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace.prefix(), self.sequence)
    }
}

/// Extract the sequence suffix of any key; non-numeric suffixes yield `None`.
///
/// Unlike [`RecordKey`] this accepts foreign prefixes, which is what the vector service
/// and legacy keys need.
pub fn sequence_suffix(raw: &str) -> Option<u64> {
    raw.rsplit_once(':')
        .and_then(|(_, suffix)| suffix.parse().ok())
}

/// Compute the next sequence for a namespace from its existing keys.
///
/// Keys that do not parse are logged and skipped. Returns `max + 1`, or `1` when nothing
/// parses. Gaps left by deletions are never refilled.
pub fn next_sequence<'a, I>(namespace: Namespace, keys: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = keys
        .into_iter()
        .filter_map(|raw| match RecordKey::parse_in(namespace, raw) {
            Ok(key) => Some(key.sequence),
            Err(error) => {
                tracing::warn!(key = raw, %error, "Skipping unparsable key during sequence scan");
                None
            }
        })
        .max()
        .unwrap_or(0);
    highest + 1
}

/// Parse and sort keys ascending by sequence, dropping anything unparsable.
pub fn sorted_keys<'a, I>(namespace: Namespace, keys: I) -> Vec<RecordKey>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parsed: Vec<RecordKey> = keys
        .into_iter()
        .filter_map(|raw| match RecordKey::parse_in(namespace, raw) {
            Ok(key) => Some(key),
            Err(error) => {
                tracing::warn!(key = raw, %error, "Excluding unparsable key from ordering");
                None
            }
        })
        .collect();
    parsed.sort_by_key(|key| key.sequence);
    parsed
}
