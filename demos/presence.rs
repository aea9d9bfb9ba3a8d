//! Publish a rich-presence activity to a locally running peer.
//!
//! Start the desktop client first, then run this demo with an application
//! id: `cargo run --example presence -- <client id>`. The demo connects,
//! sets an activity, listens for join requests for a while and then
//! clears the activity before disconnecting.

use std::{process, time::Duration};

use rpcframe::{CommandKind, EventKind, Request, Session};
use serde_json::json;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let client_id = std::env::args()
        .nth(1)
        .ok_or("usage: presence <client id>")?;

    let session = Session::builder(client_id)
        .on_event(|evt, payload| async move {
            info!(%evt, bytes = payload.len(), "event received");
        })
        .on_error(|nonce, error| async move {
            warn!(
                %nonce,
                cmd = %error.cmd,
                code = error.data.code,
                message = %error.data.message,
                "command failed"
            );
        })
        .on_disconnect(|close| async move {
            info!(%close, "disconnected");
        })
        .build();

    let ready = session.connect().await?;
    let username = ready
        .data
        .user
        .as_ref()
        .and_then(|user| user.get("username"))
        .and_then(|name| name.as_str())
        .unwrap_or("unknown");
    info!(username, "connected");

    let activity = Request::new(CommandKind::SetActivity).with_args(json!({
        "pid": process::id(),
        "activity": {
            "state": "Exploring",
            "details": "rpcframe presence demo",
            "timestamps": { "start": 0 }
        }
    }));
    let reply = session.call(&activity).await?;
    info!(payload = %String::from_utf8_lossy(reply.raw()), "activity set");

    session.subscribe(EventKind::ActivityJoinRequest, None).await?;
    tokio::time::sleep(Duration::from_secs(15)).await;

    let clear = Request::new(CommandKind::SetActivity).with_args(json!({ "pid": process::id() }));
    let nonce = session.call_async(&clear).await?;
    info!(%nonce, "clearing activity");

    session.disconnect().await;
    Ok(())
}
