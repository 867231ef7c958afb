//! Remote error-envelope extraction
//!
//! Failure bodies from the control plane arrive in one of two wire formats:
//! a grouped envelope `{"Errors":[{"Type":...,"Details":...}],
//! "ResponseContext":{"RequestId":...}}` and a flat `{"Title":...,
//! "Detail":...}` pair used by some older endpoints. The grouped format is
//! canonical; the flat one is detected and normalized into the same
//! [`ExtractedError`] so no call path degrades its messages.
//!
//! Extraction failure is itself informative: a caller that sees
//! [`EnvelopeError`] knows the server returned an unparsable error body, and
//! surfaces that instead of the (lost) original remote failure.

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while decoding a failure body
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("error body is not a recognized envelope: {0}")]
    Undecodable(#[source] serde_json::Error),

    #[error("error envelope contains no entries")]
    Empty,
}

/// Structured remote failure, derived from a raw body on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedError {
    /// Machine-readable failure kind (envelope `Type` or `Title`)
    pub kind: String,
    /// Human-readable detail (envelope `Details` or `Detail`)
    pub message: String,
    /// Request id from the response context, when the envelope carries one
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireEnvelope {
    Grouped {
        #[serde(rename = "Errors")]
        errors: Vec<GroupedEntry>,
        #[serde(rename = "ResponseContext", default)]
        context: Option<ResponseContext>,
    },
    Flat {
        #[serde(rename = "Title")]
        title: String,
        #[serde(rename = "Detail")]
        detail: String,
    },
}

#[derive(Debug, Deserialize)]
struct GroupedEntry {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Details")]
    details: String,
}

#[derive(Debug, Deserialize)]
struct ResponseContext {
    #[serde(rename = "RequestId", alias = "RequestID", default)]
    request_id: Option<String>,
}

/// Decode a raw failure body into a structured (kind, message) pair.
///
/// Returns the first entry of a grouped envelope, or the normalized flat
/// pair. An undecodable body or an empty `Errors` array is an
/// [`EnvelopeError`]; callers surface that error in place of the original
/// remote failure.
pub fn extract_error_message(raw: &[u8]) -> Result<ExtractedError, EnvelopeError> {
    let envelope: WireEnvelope =
        serde_json::from_slice(raw).map_err(EnvelopeError::Undecodable)?;

    match envelope {
        WireEnvelope::Grouped { errors, context } => {
            let first = errors.into_iter().next().ok_or(EnvelopeError::Empty)?;
            Ok(ExtractedError {
                kind: first.kind,
                message: first.details,
                request_id: context.and_then(|ctx| ctx.request_id),
            })
        }
        WireEnvelope::Flat { title, detail } => {
            Ok(ExtractedError { kind: title, message: detail, request_id: None })
        }
    }
}
