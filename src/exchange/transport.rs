//! HTTP transport used by every adapter.
//!
//! Adapters build a [`Request`] (signed or not) and hand it to a
//! [`Transport`], which returns the raw response body. Retries, backoff and
//! timeouts belong to the transport; adapters never retry.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::error::{Error, Result};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Request {
    /// An unsigned GET request for `url` with `params` appended as a query.
    #[must_use]
    pub fn get(url: &str, params: &[(&str, &str)]) -> Self {
        Self {
            method: Method::Get,
            url: with_query(url, params),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Append URL-encoded `params` to `url`, keeping their order.
#[must_use]
pub fn with_query(url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    format!("{url}?{query}")
}

/// Performs requests on behalf of adapters.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the response body as text.
    ///
    /// Network failures are errors. A non-success HTTP status is returned
    /// as a body only when that body is JSON, since it then carries the
    /// exchange's own error message for the adapter to interpret.
    async fn send(&self, request: Request) -> Result<String>;

    /// The caller's external IP address, if it can be discovered.
    async fn external_ip(&self) -> Option<String>;
}

/// [`Transport`] over `reqwest`.
pub struct HttpTransport {
    http: HttpClient,
    ip_echo_url: String,
    external_ip: OnceCell<Option<String>>,
}

impl HttpTransport {
    /// Create a transport with the given request timeout.
    ///
    /// `ip_echo_url` must answer a plain GET with the caller's address as
    /// the body.
    pub fn new(ip_echo_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            ip_echo_url: ip_echo_url.into(),
            external_ip: OnceCell::new(),
        })
    }

    async fn lookup_ip(&self) -> Option<String> {
        let result = async {
            let response = self.http.get(&self.ip_echo_url).send().await?;
            response.error_for_status()?.text().await
        }
        .await;

        match result {
            Ok(body) if !body.trim().is_empty() => Some(body.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, url = %self.ip_echo_url, "External IP lookup failed");
                None
            }
        }
    }
}

/// Pass a body on to the adapter, or fail the call at the transport.
///
/// Error statuses carrying a JSON body go through so the adapter can read
/// the exchange's message. Anything else on an error status (gateway HTML,
/// an empty body) is a transport failure.
fn accept_body(status: StatusCode, url: &str, body: String) -> Result<String> {
    if status.is_success() {
        return Ok(body);
    }
    if serde_json::from_str::<serde_json::Value>(&body).is_ok() {
        debug!(status = %status, url = %url, "Non-success status with exchange error body");
        return Ok(body);
    }
    Err(Error::Transport(format!("{url}: HTTP {status}")))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<String> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{} {}: {e}", request.method, request.url)))?;

        let status = response.status();
        let body = response.text().await?;
        accept_body(status, &request.url, body)
    }

    async fn external_ip(&self) -> Option<String> {
        self.external_ip
            .get_or_init(|| self.lookup_ip())
            .await
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_appends_encoded_query() {
        let req = Request::get("https://api.example.com/0/public/Depth", &[("pair", "XBT/USD"), ("count", "100")]);
        assert_eq!(
            req.url,
            "https://api.example.com/0/public/Depth?pair=XBT%2FUSD&count=100"
        );
        assert_eq!(req.method, Method::Get);
        assert!(req.body.is_none());
    }

    #[test]
    fn get_without_params_keeps_url() {
        let req = Request::get("https://api.example.com/products", &[]);
        assert_eq!(req.url, "https://api.example.com/products");
    }

    #[test]
    fn error_status_with_json_body_reaches_the_adapter() {
        let body = r#"{"message":"Nonce is too small."}"#.to_string();
        let passed = accept_body(StatusCode::BAD_REQUEST, "https://x/v1/order/new", body.clone());
        assert_eq!(passed.unwrap(), body);
    }

    #[test]
    fn error_status_with_html_body_is_a_transport_failure() {
        let html = "<html><body>502 Bad Gateway</body></html>".to_string();
        let err = accept_body(StatusCode::BAD_GATEWAY, "https://x/products", html).unwrap_err();
        assert!(matches!(err, Error::Transport(ref m) if m.contains("502")));

        let err = accept_body(StatusCode::SERVICE_UNAVAILABLE, "https://x/products", String::new());
        assert!(matches!(err, Err(Error::Transport(_))));
    }

    #[test]
    fn success_body_is_passed_through_untouched() {
        let body = "not json at all".to_string();
        assert_eq!(accept_body(StatusCode::OK, "https://x", body.clone()).unwrap(), body);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::get("https://x", &[]).header("X-Api-Key", "k");
        assert_eq!(req.header_value("x-api-key"), Some("k"));
        assert_eq!(req.header_value("missing"), None);
    }
}
