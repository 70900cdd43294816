//! Decoding of the AUR RPC response envelope.
//!
//! Every response carries a `type` discriminator. It is read first, then the
//! body is decoded again into the payload that discriminator announces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::LookupError;

/// What: Package metadata returned by the AUR RPC interface.
///
/// Inputs:
/// - Deserialized from `info` and `search` payloads.
///
/// Output:
/// - Typed fields; optional ones are `None` when the AUR sends `null` or omits them.
///
/// Details:
/// - Timestamps arrive as unix seconds and are converted to UTC.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PkgInfo {
    /// AUR package id.
    #[serde(rename = "ID", default)]
    pub id: i64,
    /// Package name.
    pub name: String,
    /// Latest version on the AUR.
    pub version: String,
    /// One-line description.
    #[serde(default)]
    pub description: Option<String>,
    /// Upstream project URL.
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
    /// Snapshot path relative to the AUR host.
    #[serde(rename = "URLPath", default)]
    pub url_path: Option<String>,
    /// Current maintainer; `None` for orphans.
    #[serde(default)]
    pub maintainer: Option<String>,
    /// Number of votes.
    #[serde(default)]
    pub num_votes: i64,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// When the package was flagged out of date.
    #[serde(default, deserialize_with = "unix_time")]
    pub out_of_date: Option<DateTime<Utc>>,
    /// First submission time.
    #[serde(default, deserialize_with = "unix_time")]
    pub first_submitted: Option<DateTime<Utc>>,
    /// Last modification time.
    #[serde(default, deserialize_with = "unix_time")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Decode an optional unix timestamp into a UTC datetime.
fn unix_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<i64>::deserialize(deserializer)?;
    Ok(secs.and_then(|s| DateTime::from_timestamp(s, 0)))
}

/// Closed set of responses this client understands.
#[derive(Clone, Debug, PartialEq)]
pub enum RpcResponse {
    /// `type: error`, carrying the server's message.
    Error(String),
    /// `type: info` / `multiinfo`; zero or one package.
    Info(Option<PkgInfo>),
    /// `type: search`; results sorted by name.
    Search(Vec<PkgInfo>),
}

/// Discriminator shared by every envelope.
#[derive(Deserialize)]
struct Discriminator {
    /// `error`, `info`, `multiinfo`, or `search`.
    #[serde(rename = "type", alias = "Type")]
    kind: String,
}

/// `type: error` payload. v5 uses `error`; older versions put the text in `results`.
#[derive(Deserialize)]
struct ErrorPayload {
    /// Message in the current RPC version.
    #[serde(default)]
    error: Option<String>,
    /// Message in legacy RPC versions.
    #[serde(default, alias = "Results")]
    results: Option<Value>,
}

/// `info` results may be a single object (legacy) or a list (v5).
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    /// v5 list form.
    Many(Vec<PkgInfo>),
    /// Legacy single-object form.
    One(Box<PkgInfo>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// `type: info` payload.
#[derive(Deserialize)]
struct InfoPayload {
    /// Matching packages.
    #[serde(default, alias = "Results")]
    results: OneOrMany,
}

/// `type: search` payload.
#[derive(Deserialize)]
struct SearchPayload {
    /// Matching packages.
    #[serde(default, alias = "Results")]
    results: Vec<PkgInfo>,
}

/// What: Decode a raw RPC body into a closed `RpcResponse`.
///
/// Inputs:
/// - `body`: Raw response bytes (possibly truncated by the caller's size cap).
///
/// Output:
/// - The decoded response, or `LookupError` when it cannot be understood.
///
/// # Errors
/// - `LookupError::Decode` when the body or its payload is not valid JSON.
/// - `LookupError::UnknownResponseType` for an unrecognized discriminator.
///
/// Details:
/// - Search results are sorted by package name.
pub fn decode_response(body: &[u8]) -> Result<RpcResponse, LookupError> {
    let tag: Discriminator =
        serde_json::from_slice(body).map_err(|e| LookupError::Decode(e.to_string()))?;
    match tag.kind.as_str() {
        "error" => {
            let payload: ErrorPayload =
                serde_json::from_slice(body).map_err(|e| LookupError::Decode(e.to_string()))?;
            let message = payload
                .error
                .or_else(|| {
                    payload
                        .results
                        .as_ref()
                        .and_then(Value::as_str)
                        .map(ToOwned::to_owned)
                })
                .unwrap_or_else(|| "unknown error".to_string());
            Ok(RpcResponse::Error(message))
        }
        "info" | "multiinfo" => {
            let payload: InfoPayload =
                serde_json::from_slice(body).map_err(|e| LookupError::Decode(e.to_string()))?;
            let info = match payload.results {
                OneOrMany::Many(list) => list.into_iter().next(),
                OneOrMany::One(one) => Some(*one),
            };
            Ok(RpcResponse::Info(info))
        }
        "search" => {
            let payload: SearchPayload =
                serde_json::from_slice(body).map_err(|e| LookupError::Decode(e.to_string()))?;
            let mut results = payload.results;
            results.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(RpcResponse::Search(results))
        }
        other => Err(LookupError::UnknownResponseType(other.to_string())),
    }
}
