//! Request signing for the asset API.
//!
//! Every request carries `x-timestamp` (unix seconds) and `x-signature`, the
//! hex HMAC-SHA256, keyed with the API secret, over the exact concatenation
//! `api_key ‖ timestamp ‖ method ‖ path ‖ body`. There are no separators; the
//! remote side recomputes the digest byte for byte.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-token";
/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// API key and signing secret.
///
/// The [`Debug`] impl redacts the secret to prevent accidental credential
/// exposure in log output.
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Compute the request signature.
#[must_use]
pub fn compute_signature(
    api_key: &str,
    api_secret: &str,
    timestamp: i64,
    method: &str,
    path: &str,
    body: &[u8],
) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(api_secret.as_bytes())
        .expect("HMAC can take key of any size");

    mac.update(api_key.as_bytes());
    mac.update(timestamp.to_string().as_bytes());
    mac.update(method.as_bytes());
    mac.update(path.as_bytes());
    mac.update(body);

    hex::encode(mac.finalize().into_bytes())
}

/// Timestamp and signature for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub timestamp: i64,
    pub signature: String,
}

/// Signs outgoing requests with a fixed set of credentials.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: ApiCredentials,
}

impl RequestSigner {
    #[must_use]
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    /// Sign a request at the current time.
    ///
    /// Called once per attempt, so retries never reuse a timestamp.
    #[must_use]
    pub fn sign_now(&self, method: &str, path: &str, body: &[u8]) -> SignedHeaders {
        self.sign_at(chrono::Utc::now().timestamp(), method, path, body)
    }

    /// Sign a request for an explicit timestamp.
    #[must_use]
    pub fn sign_at(&self, timestamp: i64, method: &str, path: &str, body: &[u8]) -> SignedHeaders {
        SignedHeaders {
            timestamp,
            signature: compute_signature(
                &self.credentials.api_key,
                &self.credentials.api_secret,
                timestamp,
                method,
                path,
                body,
            ),
        }
    }
}
