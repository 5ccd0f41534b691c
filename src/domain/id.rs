//! Opaque identifiers for components and configurations
//!
//! ID Format:
//! - Component IDs: `c-{8-char-hash}` (e.g., `c-7f2b4c1a`)
//! - Configuration IDs: `cfg-{8-char-hash}` (e.g., `cfg-9d3e5f20`)
//!
//! Hash is derived from a seed (usually the display name), the creation
//! timestamp and a process-wide sequence number, so two components created
//! with the same name in the same instant still get distinct IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

const HASH_LEN: usize = 8;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid component ID format: expected 'c-{{8-char-hash}}', got '{0}'")]
    InvalidComponentId(String),

    #[error("Invalid configuration ID format: expected 'cfg-{{8-char-hash}}', got '{0}'")]
    InvalidConfigurationId(String),
}

/// Generates an 8-character hash from seed, timestamp and sequence
fn generate_hash(seed: &str, timestamp: DateTime<Utc>) -> String {
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let input = format!(
        "{}{}{}",
        seed,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        sequence
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..HASH_LEN].to_string()
}

fn is_valid_hash(hash: &str) -> bool {
    hash.len() == HASH_LEN && hash.chars().all(|c| c.is_ascii_hexdigit())
}

/// Component ID in the format `c-{8-char-hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentId {
    hash: String,
}

impl ComponentId {
    /// Creates a new component ID from a seed and timestamp
    pub fn new(seed: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(seed, timestamp),
        }
    }

    /// Creates a fresh ID using the current time
    pub fn generate(seed: &str) -> Self {
        Self::new(seed, Utc::now())
    }

    /// Returns the hash portion of the ID
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c-{}", self.hash)
    }
}

impl FromStr for ComponentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("c-") {
            Some(hash) if is_valid_hash(hash) => Ok(Self {
                hash: hash.to_ascii_lowercase(),
            }),
            _ => Err(IdError::InvalidComponentId(s.to_string())),
        }
    }
}

impl TryFrom<String> for ComponentId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> Self {
        id.to_string()
    }
}

/// Configuration ID in the format `cfg-{8-char-hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigurationId {
    hash: String,
}

impl ConfigurationId {
    /// Creates a new configuration ID from a name and timestamp
    pub fn new(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(name, timestamp),
        }
    }

    /// Returns the hash portion of the ID
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cfg-{}", self.hash)
    }
}

impl FromStr for ConfigurationId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("cfg-") {
            Some(hash) if is_valid_hash(hash) => Ok(Self {
                hash: hash.to_ascii_lowercase(),
            }),
            _ => Err(IdError::InvalidConfigurationId(s.to_string())),
        }
    }
}

impl TryFrom<String> for ConfigurationId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConfigurationId> for String {
    fn from(id: ConfigurationId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_and_timestamp_still_unique() {
        let ts = Utc::now();
        let id1 = ComponentId::new("Insulator", ts);
        let id2 = ComponentId::new("Insulator", ts);

        assert_ne!(id1, id2);
    }

    #[test]
    fn component_id_format_is_correct() {
        let s = ComponentId::generate("Pole").to_string();

        assert!(s.starts_with("c-"));
        assert_eq!(s.len(), 10); // "c-" + 8 chars
    }

    #[test]
    fn configuration_id_format_is_correct() {
        let s = ConfigurationId::new("Default", Utc::now()).to_string();

        assert!(s.starts_with("cfg-"));
        assert_eq!(s.len(), 12); // "cfg-" + 8 chars
    }

    #[test]
    fn component_id_parses_correctly() {
        let original = ComponentId::generate("Crossarm");
        let parsed: ComponentId = original.to_string().parse().unwrap();

        assert_eq!(original, parsed);
    }

    #[test]
    fn ids_reject_invalid_format() {
        assert!("invalid".parse::<ComponentId>().is_err());
        assert!("c-short".parse::<ComponentId>().is_err());
        assert!("c-123456789".parse::<ComponentId>().is_err());
        assert!("c-gggggggg".parse::<ComponentId>().is_err());
        assert!("cfg-12345678".parse::<ComponentId>().is_err());
        assert!("c-12345678".parse::<ConfigurationId>().is_err());
    }

    #[test]
    fn serde_roundtrip_ids() {
        let component = ComponentId::generate("Test");
        let json = serde_json::to_string(&component).unwrap();
        assert_eq!(json, format!("\"{}\"", component));
        assert_eq!(serde_json::from_str::<ComponentId>(&json).unwrap(), component);

        let config = ConfigurationId::new("Test", Utc::now());
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<ConfigurationId>(&json).unwrap(), config);
    }
}
