//! HTTP client for the AUR RPC interface.

use std::time::Duration;

use crate::error::LookupError;
use crate::util::percent_encode;

use super::envelope::{PkgInfo, RpcResponse, decode_response};
use super::{Registry, RemoteVersion};

/// Default RPC endpoint.
pub const DEFAULT_AUR_RPC_URL: &str = "https://aur.archlinux.org/rpc/";

/// Upper bound on bytes read from one response body.
///
/// Bytes past this bound are dropped without error and whatever was read
/// is handed to the decoder.
pub const MAX_RESPONSE_BYTES: usize = 1_000_000;

/// RPC query kinds.
#[derive(Clone, Copy, Debug)]
enum QueryKind {
    /// Exact-name lookup.
    Info,
    /// Name/description search.
    Search,
}

impl QueryKind {
    /// Value of the `type` query parameter.
    const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Search => "search",
        }
    }
}

/// What: AUR RPC client backed by a pooled `reqwest::Client`.
///
/// Inputs:
/// - `base_url`: RPC endpoint (defaults to `DEFAULT_AUR_RPC_URL`).
/// - `timeout`: Per-request timeout applied by reqwest.
///
/// Output:
/// - Implements `Registry` for reconciliation, plus `info`/`search` helpers.
///
/// Details:
/// - Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct AurClient {
    /// Shared HTTP client.
    client: reqwest::Client,
    /// RPC endpoint without query string.
    base_url: String,
}

impl AurClient {
    /// What: Build a client for `base_url`.
    ///
    /// Inputs:
    /// - `base_url`: RPC endpoint.
    /// - `timeout`: Whole-request timeout; `None` leaves requests unbounded.
    ///
    /// Output:
    /// - Ready client, or `LookupError::Transport` if the TLS backend fails to initialize.
    ///
    /// # Errors
    /// - Returns `Err` when `reqwest` cannot build the client.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LookupError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("apcheck/{}", env!("CARGO_PKG_VERSION")));
        if let Some(limit) = timeout {
            builder = builder.timeout(limit);
        }
        let client = builder
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the request URL for `kind` with argument `arg`.
    fn url(&self, kind: QueryKind, arg: &str) -> String {
        let sep = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{sep}v=5&type={}&arg={}",
            self.base_url,
            kind.as_str(),
            percent_encode(arg)
        )
    }

    /// What: Issue one RPC query and decode its envelope.
    ///
    /// Inputs:
    /// - `kind`: `info` or `search`.
    /// - `arg`: Package name or search pattern.
    ///
    /// Output:
    /// - Decoded `RpcResponse`; `type: error` envelopes become `LookupError::Server`.
    ///
    /// Details:
    /// - A non-success HTTP status is reported as `Http` unless the body is an
    ///   error envelope, whose message is more useful.
    async fn query(&self, kind: QueryKind, arg: &str) -> Result<RpcResponse, LookupError> {
        let url = self.url(kind, arg);
        tracing::debug!(url = %url, "querying AUR RPC");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        let status = response.status();
        let body = read_capped(response, MAX_RESPONSE_BYTES).await?;
        match decode_response(&body) {
            Ok(RpcResponse::Error(message)) => Err(LookupError::Server(message)),
            Ok(_) | Err(_) if !status.is_success() => Err(LookupError::Http(status.as_u16())),
            other => other,
        }
    }

    /// What: Fetch metadata for one package.
    ///
    /// Inputs:
    /// - `name`: Exact package name.
    ///
    /// Output:
    /// - `Some(PkgInfo)` when the AUR knows the package, `None` otherwise.
    ///
    /// # Errors
    /// - Returns `Err` on transport, HTTP, decoding, or server-reported errors.
    pub async fn info(&self, name: &str) -> Result<Option<PkgInfo>, LookupError> {
        match self.query(QueryKind::Info, name).await? {
            RpcResponse::Info(info) => Ok(info),
            other => Err(unexpected(&other, "info")),
        }
    }

    /// What: Search the AUR by name and description.
    ///
    /// Inputs:
    /// - `pattern`: Search term.
    ///
    /// Output:
    /// - Matching packages sorted by name.
    ///
    /// # Errors
    /// - Returns `Err` on transport, HTTP, decoding, or server-reported errors
    ///   (including the AUR's "too many results" and "query too small" replies).
    pub async fn search(&self, pattern: &str) -> Result<Vec<PkgInfo>, LookupError> {
        match self.query(QueryKind::Search, pattern.trim()).await? {
            RpcResponse::Search(results) => Ok(results),
            other => Err(unexpected(&other, "search")),
        }
    }
}

impl Registry for AurClient {
    async fn lookup(&self, name: &str) -> Result<RemoteVersion, LookupError> {
        self.info(name)
            .await?
            .map(RemoteVersion::from)
            .ok_or(LookupError::NotFound)
    }
}

/// Error for a well-formed envelope of the wrong kind.
fn unexpected(resp: &RpcResponse, wanted: &str) -> LookupError {
    let got = match resp {
        RpcResponse::Error(_) => "error",
        RpcResponse::Info(_) => "info",
        RpcResponse::Search(_) => "search",
    };
    LookupError::UnknownResponseType(format!("{got} (expected {wanted})"))
}

/// What: Read a response body, stopping after `cap` bytes.
///
/// Inputs:
/// - `response`: Response whose body to read.
/// - `cap`: Maximum number of bytes to keep.
///
/// Output:
/// - Up to `cap` bytes of the body.
///
/// Details:
/// - Reaching the cap ends the read like end-of-body would; only a warning is logged.
async fn read_capped(mut response: reqwest::Response, cap: usize) -> Result<Vec<u8>, LookupError> {
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| LookupError::Transport(e.to_string()))?
    {
        let room = cap - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            tracing::warn!(cap, "registry response exceeded size cap; truncated");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
