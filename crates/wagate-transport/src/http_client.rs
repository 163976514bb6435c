//! Outbound JSON POST capability backed by `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use tracing::trace;

use wagate_core::{PostJsonFn, PostReply, TransportError, TransportResult};

/// Builds a [`PostJsonFn`] whose requests give up after `timeout`.
///
/// The body is sent with `Content-Type: application/json`. Non-2xx answers
/// are returned as a [`PostReply`], not as errors; only failures to connect,
/// send or read count as errors.
pub fn json_poster(timeout: Duration) -> TransportResult<PostJsonFn> {
    let client = ClientBuilder::new()
        .timeout(timeout)
        .build()
        .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

    let post_json: PostJsonFn = Arc::new(move |url, body| post(client.clone(), url, body).boxed());

    Ok(post_json)
}

async fn post(client: Client, url: String, body: Value) -> TransportResult<PostReply> {
    let resp = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| TransportError::Io(e.to_string()))?;
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    trace!(url = %url, status, "JSON POST completed");
    Ok(PostReply { status, body })
}
