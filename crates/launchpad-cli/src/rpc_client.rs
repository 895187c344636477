// crates/launchpad-cli/src/rpc_client.rs
//
// Lightweight client for the launchpad-daemon HTTP endpoints: the JSON-RPC
// envelope plus the streaming artifact routes.

use std::path::Path;

use reqwest::header::CONTENT_LENGTH;
use reqwest::{RequestBuilder, Response};
use tokio::io::AsyncWriteExt;

use launchpad_core::Channel;
use launchpad_rpc::server::RELEASE_NOTES_HEADER;
use launchpad_rpc::{JsonRpcRequest, JsonRpcResponse};

/// Client bound to one daemon endpoint and an optional admin token.
pub struct RpcClient {
    base: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl RpcClient {
    /// `endpoint` is the daemon origin, e.g. `http://127.0.0.1:8000`.
    pub fn new(endpoint: &str, token: Option<String>) -> Self {
        Self {
            base: format!("{}/launchpad", endpoint.trim_end_matches('/')),
            token: token.filter(|t| !t.is_empty()),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.base
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn artifact_url(&self, channel: Channel, version: &str) -> String {
        format!(
            "{}/artifacts/{}/{}",
            self.base,
            channel,
            urlencoding::encode(version)
        )
    }

    /// Send a JSON-RPC call and return the `result` payload.
    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
        let request = JsonRpcRequest {
            method: method.to_string(),
            params,
        };

        let resp = self
            .authorize(self.http.post(format!("{}/rpc", self.base)))
            .json(&request)
            .send()
            .await?;

        read_envelope(resp).await
    }

    /// Stream a local archive to the daemon as a new release.
    pub async fn upload(
        &self,
        channel: Channel,
        version: &str,
        notes: &str,
        path: &Path,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();

        let resp = self
            .authorize(self.http.put(self.artifact_url(channel, version)))
            .header(CONTENT_LENGTH, len)
            .header(RELEASE_NOTES_HEADER, urlencoding::encode(notes).into_owned())
            .body(reqwest::Body::from(file))
            .send()
            .await?;

        read_envelope(resp).await
    }

    /// Download a release's artifact to `dest`, returning the bytes written.
    pub async fn fetch(
        &self,
        channel: Channel,
        version: &str,
        dest: &Path,
    ) -> Result<u64, Box<dyn std::error::Error>> {
        let mut resp = self
            .http
            .get(self.artifact_url(channel, version))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(read_envelope(resp)
                .await
                .err()
                .unwrap_or_else(|| "unexpected response from daemon".into()));
        }

        let mut out = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;
        Ok(written)
    }
}

/// Decode a response envelope. Bodies that are not an envelope surface the
/// HTTP status instead.
async fn read_envelope(resp: Response) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let status = resp.status();
    match resp.json::<JsonRpcResponse>().await {
        Ok(envelope) => into_result(envelope),
        Err(e) => Err(format!("HTTP {}: {}", status, e).into()),
    }
}

fn into_result(envelope: JsonRpcResponse) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    if envelope.success {
        return Ok(envelope.result.unwrap_or(serde_json::Value::Null));
    }
    let message = envelope.error.unwrap_or_else(|| "unknown error".to_string());
    match envelope.error_kind {
        Some(kind) => Err(format!("{} ({})", message, kind).into()),
        None => Err(message.into()),
    }
}
