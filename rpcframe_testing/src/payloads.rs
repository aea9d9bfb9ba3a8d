//! Canned peer payloads.

use serde_json::{Value, json};

/// A `READY` dispatch like the one the peer sends after the handshake.
#[must_use]
pub fn ready_event() -> Value {
    json!({
        "cmd": "DISPATCH",
        "evt": "READY",
        "data": {
            "v": 1,
            "config": {
                "cdn_host": "cdn.example.com",
                "api_endpoint": "//example.com/api",
                "environment": "production"
            },
            "user": { "id": "1", "username": "tester" }
        }
    })
}

/// An `ERROR` event answering `request`.
#[must_use]
pub fn error_event(request: &Value, code: i64, message: &str) -> Value {
    json!({
        "cmd": request["cmd"],
        "evt": "ERROR",
        "nonce": request["nonce"],
        "data": { "code": code, "message": message }
    })
}
