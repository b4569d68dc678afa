use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use coinbridge::error::{Error, ExchangeError};
use coinbridge::exchange::{Request, Shared};
use coinbridge::testkit::transport::ScriptedTransport;
use serde_json::Value;

/// Shared state plus a transport answering `bodies` in order.
pub fn scripted(bodies: &[&str]) -> (Shared, Arc<ScriptedTransport>) {
    let shared = coinbridge::testkit::domain::shared();
    let transport = Arc::new(ScriptedTransport::new().with_responses(bodies));
    (shared, transport)
}

/// The adapter-level cause of `err`, panicking on anything else.
pub fn exchange_error(err: Error) -> ExchangeError {
    match err {
        Error::Exchange(e) => e,
        other => panic!("expected an exchange error, got {other:?}"),
    }
}

/// The JSON payload a header-HMAC request carries in `header`.
pub fn header_payload(request: &Request, header: &str) -> Value {
    let encoded = request.header_value(header).expect("payload header");
    let decoded = STANDARD.decode(encoded).expect("base64 payload");
    serde_json::from_slice(&decoded).expect("JSON payload")
}

/// The JSON body of `request`.
pub fn json_body(request: &Request) -> Value {
    serde_json::from_str(request.body.as_deref().expect("request body")).expect("JSON body")
}
