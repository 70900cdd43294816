//! Remote package registry access.
//!
//! The reconciliation pipeline only depends on the `Registry` trait; the
//! AUR client is one implementation and tests provide in-memory fakes.

use std::future::Future;

use crate::error::LookupError;

mod aur;
mod envelope;

pub use aur::{AurClient, DEFAULT_AUR_RPC_URL, MAX_RESPONSE_BYTES};
pub use envelope::{PkgInfo, RpcResponse, decode_response};

/// Latest version of a package as known to the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteVersion {
    /// Package name as reported upstream.
    pub name: String,
    /// Version string as reported upstream.
    pub version: String,
}

impl From<PkgInfo> for RemoteVersion {
    fn from(info: PkgInfo) -> Self {
        Self {
            name: info.name,
            version: info.version,
        }
    }
}

/// What: Look up the latest version of a package by name.
///
/// Inputs:
/// - `name`: Package name.
///
/// Output:
/// - `RemoteVersion` on success; `LookupError` when the package is unknown
///   upstream or the request fails.
///
/// Details:
/// - Implementations are shared across concurrent workers and must be
///   safe to call from many tasks at once.
pub trait Registry: Send + Sync + 'static {
    /// Fetch the registry's current version of `name`.
    fn lookup(&self, name: &str)
    -> impl Future<Output = Result<RemoteVersion, LookupError>> + Send;
}
