// crates/launchpad-rpc/tests/http_boundary.rs
//
// Round-trips through the HTTP service: JSON-RPC envelope, streaming
// upload/download routes, authorization and status mapping.

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use tempfile::TempDir;
use tower_service::Service;

use launchpad_catalog::ReleaseService;
use launchpad_core::FormatPolicy;
use launchpad_rpc::{JsonRpcResponse, LaunchpadRpcServer, RpcConfig, TokenAuthorizer};
use launchpad_store::{FsArtifactStore, JsonCatalogStore};

const TOKEN: &str = "correct horse battery staple";
const BUILD: &[u8] = b"PK\x03\x04 launcher build 1.0";

struct Fixture {
    _tmp: TempDir,
    server: LaunchpadRpcServer,
}

fn fixture(max_upload_bytes: u64) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let catalogs = JsonCatalogStore::open(tmp.path().join("data")).unwrap();
    let artifacts = FsArtifactStore::open(tmp.path().join("downloads")).unwrap();
    let service = ReleaseService::new(
        Arc::new(catalogs),
        Arc::new(artifacts),
        FormatPolicy::default(),
        "http://updates.test",
    );
    let authorizer = TokenAuthorizer::from_hex_digests(&[TokenAuthorizer::digest_hex(TOKEN)]);
    let config = RpcConfig {
        max_upload_bytes,
        ..RpcConfig::default()
    };
    Fixture {
        _tmp: tmp,
        server: LaunchpadRpcServer::new(config, Arc::new(service), Arc::new(authorizer)),
    }
}

struct Reply {
    status: StatusCode,
    headers: http::HeaderMap,
    body: Bytes,
}

impl Reply {
    fn envelope(&self) -> JsonRpcResponse {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn send(fx: &Fixture, request: Request<Full<Bytes>>) -> Reply {
    let mut service = fx.server.http_service();
    let response = service.call(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    Reply {
        status,
        headers,
        body,
    }
}

async fn rpc(
    fx: &Fixture,
    method: &str,
    params: serde_json::Value,
    token: Option<&str>,
) -> JsonRpcResponse {
    let payload = serde_json::json!({ "method": method, "params": params });
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/launchpad/rpc")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder
        .body(Full::new(Bytes::from(serde_json::to_vec(&payload).unwrap())))
        .unwrap();
    let reply = send(fx, request).await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.envelope()
}

fn upload_request(
    channel: &str,
    version: &str,
    payload: &[u8],
    token: Option<&str>,
) -> http::request::Builder {
    let mut builder = Request::builder()
        .method(Method::PUT)
        .uri(format!("/launchpad/artifacts/{}/{}", channel, version));
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.header("content-length", payload.len().to_string())
}

async fn upload(fx: &Fixture, channel: &str, version: &str, payload: &[u8]) -> Reply {
    let request = upload_request(channel, version, payload, Some(TOKEN))
        .body(Full::new(Bytes::copy_from_slice(payload)))
        .unwrap();
    send(fx, request).await
}

fn get(uri: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Upload and download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_then_download_through_active_info_url() {
    let fx = fixture(1024);

    let reply = upload(&fx, "launcher", "1.0", BUILD).await;
    assert_eq!(reply.status, StatusCode::OK);
    let result = reply.envelope().result.unwrap();
    assert_eq!(result["artifact_ref"], "launcher-v1.0.zip");
    assert_eq!(result["file_size"], BUILD.len() as u64);
    assert_eq!(result["file_size_formatted"], format!("{} bytes", BUILD.len()));

    let info = rpc(&fx, "release/active_info", serde_json::json!({"channel": "launcher"}), None).await;
    assert!(info.success);
    let info = info.result.unwrap();
    assert_eq!(info["Version"], "1.0");
    assert_eq!(info["DownloadUrl"], "http://updates.test/downloads/launcher-v1.0.zip");
    assert_eq!(info["FileSize"], BUILD.len() as u64);

    let download = send(&fx, get("/launchpad/downloads/launcher-v1.0.zip")).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.body.as_ref(), BUILD);
    assert_eq!(
        download.headers["content-length"].to_str().unwrap(),
        BUILD.len().to_string()
    );
    assert_eq!(download.headers["content-type"], "application/octet-stream");

    let fetched = send(&fx, get("/launchpad/artifacts/launcher/1.0")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body.as_ref(), BUILD);
}

#[tokio::test]
async fn release_notes_header_is_percent_decoded() {
    let fx = fixture(1024);
    let request = upload_request("game", "1.0", BUILD, Some(TOKEN))
        .header("x-release-notes", "Fixes%3A%20crash%20on%20start")
        .body(Full::new(Bytes::from_static(BUILD)))
        .unwrap();
    assert_eq!(send(&fx, request).await.status, StatusCode::OK);

    let history = rpc(&fx, "release/history", serde_json::json!({"channel": "game"}), None).await;
    let history = history.result.unwrap();
    assert_eq!(history["count"], 1);
    assert_eq!(history["releases"][0]["release_notes"], "Fixes: crash on start");
}

#[tokio::test]
async fn upload_without_token_is_unauthorized() {
    let fx = fixture(1024);
    let request = upload_request("game", "1.0", BUILD, None)
        .body(Full::new(Bytes::from_static(BUILD)))
        .unwrap();
    let reply = send(&fx, request).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.envelope().error_kind.as_deref(), Some("unauthorized"));

    let request = upload_request("game", "1.0", BUILD, Some("wrong"))
        .body(Full::new(Bytes::from_static(BUILD)))
        .unwrap();
    assert_eq!(send(&fx, request).await.status, StatusCode::UNAUTHORIZED);

    let history = rpc(&fx, "release/history", serde_json::json!({"channel": "game"}), None).await;
    assert_eq!(history.result.unwrap()["count"], 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let fx = fixture(16);
    let mut payload = b"PK\x03\x04".to_vec();
    payload.extend_from_slice(&[0u8; 60]);

    // Declared length over the cap.
    let reply = upload(&fx, "game", "1.0", &payload).await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);

    // No declared length: the cap trips while streaming.
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/launchpad/artifacts/game/1.0")
        .header("authorization", format!("Bearer {}", TOKEN))
        .body(Full::new(Bytes::from(payload)))
        .unwrap();
    let reply = send(&fx, request).await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);

    let active = rpc(&fx, "release/active", serde_json::json!({"channel": "game"}), None).await;
    assert_eq!(active.error_kind.as_deref(), Some("not_found"));
}

#[tokio::test]
async fn disallowed_format_is_bad_request() {
    let fx = fixture(1024);
    let reply = upload(&fx, "game", "1.0", b"\x1f\x8b\x08 gzip").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.envelope().error_kind.as_deref(), Some("invalid_input"));
}

#[tokio::test]
async fn missing_artifacts_are_not_found() {
    let fx = fixture(1024);
    upload(&fx, "game", "1.0", BUILD).await;

    assert_eq!(send(&fx, get("/launchpad/artifacts/game/9.9")).await.status, StatusCode::NOT_FOUND);
    assert_eq!(send(&fx, get("/launchpad/downloads/game-v9.9.zip")).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        send(&fx, get("/launchpad/downloads/..%2Fdata%2Fversions.json")).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(send(&fx, get("/launchpad/artifacts/beta/1.0")).await.status, StatusCode::NOT_FOUND);
    assert_eq!(send(&fx, get("/launchpad/nowhere")).await.status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// JSON-RPC
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rpc_mutations_follow_catalog_rules() {
    let fx = fixture(1024);
    upload(&fx, "game", "1.0", BUILD).await;
    upload(&fx, "game", "1.1", BUILD).await;

    let params = serde_json::json!({"channel": "game", "version": "1.1"});
    let refused = rpc(&fx, "release/delete", params.clone(), Some(TOKEN)).await;
    assert!(!refused.success);
    assert_eq!(refused.error_kind.as_deref(), Some("invalid_state"));

    let unauthorized = rpc(
        &fx,
        "release/activate",
        serde_json::json!({"channel": "game", "version": "1.0"}),
        None,
    )
    .await;
    assert_eq!(unauthorized.error_kind.as_deref(), Some("unauthorized"));

    let activated = rpc(
        &fx,
        "release/activate",
        serde_json::json!({"channel": "game", "version": "1.0"}),
        Some(TOKEN),
    )
    .await;
    assert!(activated.success);

    let deleted = rpc(&fx, "release/delete", params, Some(TOKEN)).await;
    assert!(deleted.success);
    assert_eq!(deleted.result.unwrap()["version"], "1.1");

    let active = rpc(&fx, "release/active", serde_json::json!({"channel": "game"}), None).await;
    assert_eq!(active.result.unwrap()["release"]["version"], "1.0");
}

#[tokio::test]
async fn rpc_reports_error_kinds() {
    let fx = fixture(1024);

    let unknown_channel = rpc(&fx, "release/history", serde_json::json!({"channel": "beta"}), None).await;
    assert_eq!(unknown_channel.error_kind.as_deref(), Some("not_found"));

    let bad_params = rpc(&fx, "release/activate", serde_json::json!({"channel": "game"}), Some(TOKEN)).await;
    assert_eq!(bad_params.error_kind.as_deref(), Some("invalid_input"));

    let unknown_method = rpc(&fx, "release/rollback", serde_json::json!({}), Some(TOKEN)).await;
    assert_eq!(unknown_method.error_kind.as_deref(), Some("not_found"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/launchpad/rpc")
        .body(Full::new(Bytes::from_static(b"not json")))
        .unwrap();
    let reply = send(&fx, request).await;
    assert_eq!(reply.envelope().error_kind.as_deref(), Some("invalid_input"));
}

#[tokio::test]
async fn sweep_requires_token() {
    let fx = fixture(1024);
    upload(&fx, "game", "1.0", BUILD).await;

    let denied = rpc(&fx, "admin/sweep", serde_json::json!({"channel": "game"}), None).await;
    assert_eq!(denied.error_kind.as_deref(), Some("unauthorized"));

    let swept = rpc(&fx, "admin/sweep", serde_json::json!({"channel": "game"}), Some(TOKEN)).await;
    assert!(swept.success);
    assert_eq!(swept.result.unwrap()["count"], 0);
}

#[tokio::test]
async fn health_reports_channels() {
    let fx = fixture(1024);
    upload(&fx, "launcher", "0.9", BUILD).await;

    let reply = send(&fx, get("/launchpad/health")).await;
    assert_eq!(reply.status, StatusCode::OK);
    let health = reply.envelope().result.unwrap();
    assert_eq!(health["status"], "healthy");
    let channels = health["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[1]["channel"], "launcher");
    assert_eq!(channels[1]["active_version"], "0.9");

    let via_rpc = rpc(&fx, "node/health", serde_json::Value::Null, None).await;
    assert!(via_rpc.success);
}
