// crates/launchpad-rpc/src/middleware.rs
//
// Middleware for the RPC server: request logging interceptor and the
// bearer-token authorization predicate handed to the release service.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tonic::{Request, Status};

/// Logging interceptor for incoming requests.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    tracing::debug!("Incoming request: {:?}", req.metadata());
    Ok(req)
}

/// Decides whether a caller may perform mutations.
///
/// The server evaluates this once per request and passes the boolean on;
/// the release service never sees credentials.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, bearer: Option<&str>) -> bool;
}

/// Accepts bearer tokens whose SHA-256 matches one of the configured digests.
///
/// Only digests are kept in memory and in config files. An empty digest list
/// denies every mutation.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthorizer {
    digests: Vec<[u8; 32]>,
}

impl TokenAuthorizer {
    /// Build from hex-encoded SHA-256 digests. Malformed entries are skipped
    /// with a warning.
    pub fn from_hex_digests<S: AsRef<str>>(hex_digests: &[S]) -> Self {
        let mut digests = Vec::with_capacity(hex_digests.len());
        for raw in hex_digests {
            let raw = raw.as_ref().trim();
            let mut digest = [0u8; 32];
            match hex::decode_to_slice(raw, &mut digest) {
                Ok(()) => digests.push(digest),
                Err(e) => tracing::warn!("Ignoring malformed admin token digest: {}", e),
            }
        }
        Self { digests }
    }

    /// Hex SHA-256 of a token, the form `admin_token_sha256` expects.
    pub fn digest_hex(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

impl Authorizer for TokenAuthorizer {
    fn authorize(&self, bearer: Option<&str>) -> bool {
        let Some(token) = bearer.filter(|t| !t.is_empty()) else {
            return false;
        };
        let presented: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        self.digests.iter().any(|d| d[..].ct_eq(&presented[..]).into())
    }
}

/// Extract the token from an `authorization: Bearer <token>` header.
pub fn bearer_token(headers: &http::HeaderMap) -> Option<&str> {
    let value = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}
