use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Team ownership, one tag per owning team.
pub const PTEAM_KEY: &str = "pteam";
pub const STATUS_KEY: &str = "Status";
pub const TYPE_KEY: &str = "Type";
pub const DOMAIN_KEY: &str = "domain";
pub const SUBDOMAIN_KEY: &str = "subdomain";

/// Keys that hold at most one value per entity.
pub const SINGLE_VALUED_KEYS: [&str; 4] = [STATUS_KEY, TYPE_KEY, DOMAIN_KEY, SUBDOMAIN_KEY];

/// A desired key/value tag. Remote tags additionally carry an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tag '{input}': expected exactly one 'key:value' pair with both parts non-empty")]
pub struct TagParseError {
    pub input: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parses `"key:value"`. Anything other than two non-empty parts is rejected.
    pub fn parse(input: &str) -> Result<Self, TagParseError> {
        let parts: Vec<&str> = input.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [key, value] if !key.is_empty() && !value.is_empty() => Ok(Tag::new(*key, *value)),
            _ => Err(TagParseError {
                input: input.to_string(),
            }),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}
