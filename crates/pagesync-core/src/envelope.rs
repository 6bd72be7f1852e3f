//! Content transport envelope
//!
//! Exported content travels as a [`ContentEnvelope`]: a versioned wrapper
//! stamped with a fixed marker and a production timestamp. Decoding is pure
//! and never touches the content store; a payload that is malformed, carries
//! the wrong marker, or fails document validation is rejected outright.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::document::ContentDocument;
use crate::error::{SyncError, SyncResult};

/// Marker identifying a pagesync export
pub const EXPORT_MARKER: &str = "pagesync-export";

/// Current envelope format version
pub const ENVELOPE_VERSION: u32 = 1;

/// Optional provenance attached to an envelope by its producer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    /// Where the export came from (admin page, CLI, ...)
    #[serde(default)]
    pub source: Option<String>,
    /// Producer identifier
    #[serde(default)]
    pub generator: Option<String>,
}

/// Transport wrapper around a [`ContentDocument`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEnvelope {
    /// Must equal [`EXPORT_MARKER`]
    pub kind: String,
    pub version: u32,
    /// Epoch milliseconds at which the export was produced
    pub produced_at: u64,
    pub document: ContentDocument,
    #[serde(default)]
    pub metadata: EnvelopeMetadata,
}

/// Wrap a document in an envelope stamped with the current time
pub fn encode(document: &ContentDocument) -> ContentEnvelope {
    ContentEnvelope {
        kind: EXPORT_MARKER.to_string(),
        version: ENVELOPE_VERSION,
        produced_at: Utc::now().timestamp_millis() as u64,
        document: document.clone(),
        metadata: EnvelopeMetadata {
            source: None,
            generator: Some(format!("pagesync/{}", env!("CARGO_PKG_VERSION"))),
        },
    }
}

/// Serialize a document into envelope JSON ready for upload
pub fn encode_json(document: &ContentDocument) -> SyncResult<String> {
    Ok(serde_json::to_string_pretty(&encode(document))?)
}

/// Parse and validate envelope JSON
///
/// Fails with [`SyncError::Validation`] when the JSON is malformed, the
/// marker mismatches, or the wrapped document fails validation.
pub fn decode(raw: &str) -> SyncResult<ContentEnvelope> {
    let envelope: ContentEnvelope =
        serde_json::from_str(raw).map_err(|e| SyncError::Validation {
            reason: format!("malformed envelope JSON: {}", e),
        })?;

    if envelope.kind != EXPORT_MARKER {
        return Err(SyncError::Validation {
            reason: format!(
                "unexpected envelope kind '{}', expected '{}'",
                envelope.kind, EXPORT_MARKER
            ),
        });
    }

    envelope.document.validate()?;
    Ok(envelope)
}
