//! Versioned save envelope
//!
//! `{ "version": 1, "kind": "game", "data": { ... } }`. Version and kind are
//! checked before the payload is decoded.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::PersistError;

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub kind: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(kind: &str, data: T) -> Self {
        Self {
            version: SAVE_VERSION,
            kind: kind.to_string(),
            data,
        }
    }
}

/// Wrap `data` in a current-version envelope and encode it
pub fn encode<T: Serialize>(kind: &str, data: &T) -> Result<String, PersistError> {
    Ok(serde_json::to_string(&Envelope::new(kind, data))?)
}

/// Decode the payload of a `kind` envelope
pub fn decode<T: DeserializeOwned>(json: &str, kind: &str) -> Result<T, PersistError> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(json)?;
    if envelope.version != SAVE_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: envelope.version,
            expected: SAVE_VERSION,
        });
    }
    if envelope.kind != kind {
        return Err(PersistError::WrongKind {
            expected: kind.to_string(),
            found: envelope.kind,
        });
    }
    Ok(serde_json::from_value(envelope.data)?)
}
