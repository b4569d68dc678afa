//! Request signing for private endpoints.
//!
//! Exchanges authenticate private calls in one of three ways, selected per
//! exchange through [`SigningScheme`]:
//!
//! - **Header HMAC**: the JSON parameters (with request path and nonce) are
//!   base64-encoded and signed with HMAC-SHA384; payload, signature and key
//!   travel as headers and the body stays empty.
//! - **Query HMAC**: parameters, key and nonce go into the query string; the
//!   full URL is signed with HMAC-SHA512 and the signature sent as a header.
//! - **Compact token**: a JWT-style `header.payload.signature` token, signed
//!   with HMAC-SHA256, carries path, nonce and key id in an auth header; the
//!   body is the plain JSON parameters.
//!
//! Every scheme draws its nonce from one [`NonceSource`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{json, Map, Value};
use sha2::{Sha256, Sha384, Sha512};

use super::transport::{Method, Request};
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// JSON request parameters.
pub type Params = Map<String, Value>;

/// Turn a `json!({...})` object into [`Params`]; anything else is empty.
#[must_use]
pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// API key and secret for one exchange account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Both parts present and non-empty, or `None`.
    #[must_use]
    pub fn from_parts(api_key: Option<String>, api_secret: Option<String>) -> Option<Self> {
        match (api_key, api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(Self::new(key, secret))
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn secret(&self) -> &[u8] {
        self.api_secret.as_bytes()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Source of request nonces.
///
/// Exchanges reject a nonce that is not larger than the last one seen for
/// the same key, so implementations must be strictly increasing across all
/// callers sharing a credential.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> u64;
}

/// Nanoseconds since the Unix epoch, bumped by one when the clock has not
/// advanced since the previous call.
#[derive(Debug, Default)]
pub struct EpochNanos {
    last: AtomicU64,
}

impl EpochNanos {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> u64 {
        Utc::now()
            .timestamp_nanos_opt()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0)
    }
}

impl NonceSource for EpochNanos {
    fn next_nonce(&self) -> u64 {
        let now = Self::now();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// How one exchange authenticates private requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningScheme {
    HeaderHmac {
        key_header: &'static str,
        payload_header: &'static str,
        signature_header: &'static str,
    },
    QueryHmac {
        key_param: &'static str,
        signature_header: &'static str,
    },
    CompactToken {
        auth_header: &'static str,
        extra_headers: &'static [(&'static str, &'static str)],
    },
}

/// HMAC-SHA256 of `message`.
pub fn hmac_sha256(secret: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| Error::Signing(e.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Hex-encoded HMAC-SHA384 of `message`.
pub fn hmac_sha384_hex(secret: &[u8], message: &[u8]) -> Result<String> {
    let mut mac =
        HmacSha384::new_from_slice(secret).map_err(|e| Error::Signing(e.to_string()))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Hex-encoded HMAC-SHA512 of `message`.
pub fn hmac_sha512_hex(secret: &[u8], message: &[u8]) -> Result<String> {
    let mut mac =
        HmacSha512::new_from_slice(secret).map_err(|e| Error::Signing(e.to_string()))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Base64 payload and HMAC-SHA384 signature for the header scheme.
///
/// `payload_json` is the serialized parameter object, request path and
/// nonce included.
pub fn header_hmac_parts(secret: &[u8], payload_json: &str) -> Result<(String, String)> {
    let encoded = STANDARD.encode(payload_json.as_bytes());
    let signature = hmac_sha384_hex(secret, encoded.as_bytes())?;
    Ok((encoded, signature))
}

/// The `header.payload.signature` token for the compact-token scheme.
pub fn compact_token(secret: &[u8], path: &str, nonce: u64, token_id: &str) -> Result<String> {
    let header = json!({ "alg": "HS256", "typ": "JWT" });
    let payload = json!({
        "nonce": nonce.to_string(),
        "path": path,
        "token_id": token_id,
    });
    let header64 = STANDARD.encode(serde_json::to_vec(&header)?);
    let payload64 = STANDARD.encode(serde_json::to_vec(&payload)?);
    let signing_input = format!("{header64}.{payload64}");
    let signature = URL_SAFE.encode(hmac_sha256(secret, signing_input.as_bytes())?);
    Ok(format!("{signing_input}.{signature}"))
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds authenticated requests for one exchange account.
#[derive(Clone)]
pub struct Signer {
    scheme: SigningScheme,
    credentials: Credentials,
    nonce: Arc<dyn NonceSource>,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("scheme", &self.scheme)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Signer {
    #[must_use]
    pub fn new(scheme: SigningScheme, credentials: Credentials, nonce: Arc<dyn NonceSource>) -> Self {
        Self {
            scheme,
            credentials,
            nonce,
        }
    }

    #[must_use]
    pub fn scheme(&self) -> &SigningScheme {
        &self.scheme
    }

    /// Build a signed request for `base_url` + `path`.
    pub fn sign(&self, method: Method, base_url: &str, path: &str, params: Params) -> Result<Request> {
        let nonce = self.nonce.next_nonce();
        let secret = self.credentials.secret();

        match &self.scheme {
            SigningScheme::HeaderHmac {
                key_header,
                payload_header,
                signature_header,
            } => {
                let mut payload = params;
                payload.insert("request".into(), Value::String(path.to_string()));
                payload.insert("nonce".into(), Value::String(nonce.to_string()));
                let (encoded, signature) =
                    header_hmac_parts(secret, &serde_json::to_string(&payload)?)?;

                Ok(Request {
                    method,
                    url: format!("{base_url}{path}"),
                    headers: Vec::new(),
                    body: None,
                }
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .header(*key_header, self.credentials.api_key())
                .header(*payload_header, encoded)
                .header(*signature_header, signature))
            }
            SigningScheme::QueryHmac {
                key_param,
                signature_header,
            } => {
                let mut pairs: Vec<(String, String)> = params
                    .iter()
                    .map(|(k, v)| (k.clone(), param_text(v)))
                    .collect();
                pairs.push(((*key_param).to_string(), self.credentials.api_key().to_string()));
                pairs.push(("nonce".to_string(), nonce.to_string()));
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter())
                    .finish();
                let url = format!("{base_url}{path}?{query}");
                let signature = hmac_sha512_hex(secret, url.as_bytes())?;

                Ok(Request {
                    method,
                    url,
                    headers: Vec::new(),
                    body: None,
                }
                .header("Content-Type", "application/json;charset=utf-8")
                .header("Accept", "application/json")
                .header(*signature_header, signature))
            }
            SigningScheme::CompactToken {
                auth_header,
                extra_headers,
            } => {
                let token = compact_token(secret, path, nonce, self.credentials.api_key())?;
                let body = if params.is_empty() {
                    None
                } else {
                    Some(serde_json::to_string(&params)?)
                };

                let mut request = Request {
                    method,
                    url: format!("{base_url}{path}"),
                    headers: Vec::new(),
                    body,
                }
                .header("Content-Type", "application/json;charset=utf-8")
                .header(*auth_header, token);
                for (name, value) in extra_headers.iter() {
                    request = request.header(*name, *value);
                }
                Ok(request)
            }
        }
    }
}
