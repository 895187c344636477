// crates/launchpad-rpc/src/server.rs
//
// RPC server setup: LaunchpadRpcServer and RpcConfig.
//
// One tonic service named `launchpad` carries two kinds of traffic:
//   POST /launchpad/rpc                          JSON-RPC envelope
//   PUT  /launchpad/artifacts/{channel}/{version} streaming upload
//   GET  /launchpad/artifacts/{channel}/{version} streaming fetch
//   GET  /launchpad/downloads/{artifact}          streaming download
//   GET  /launchpad/health                        health summary
//
// tonic provides the transport; requests are routed by hand inside a
// manually implemented service, so no proto codegen is involved.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tonic::transport::Server;
use tonic::Status;

use launchpad_catalog::ReleaseService;
use launchpad_core::{ArtifactStream, ReleaseError};

use crate::body::{BodyReader, ReaderBody};
use crate::handlers;
use crate::middleware::{self, Authorizer};

/// Header carrying percent-encoded release notes on uploads.
pub const RELEASE_NOTES_HEADER: &str = "x-release-notes";

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 5 * 1024 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
/// The client sends a method name and a JSON params payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "release/active", "admin/sweep").
    pub method: String,
    /// JSON-encoded parameters for the method.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// The result data (if success).
    pub result: Option<serde_json::Value>,
    /// Error message (if not success).
    pub error: Option<String>,
    /// Stable error code (if not success), e.g. "not_found".
    #[serde(default)]
    pub error_kind: Option<String>,
}

impl JsonRpcResponse {
    pub fn ok(value: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(value),
            error: None,
            error_kind: None,
        }
    }

    pub fn from_error(err: &ReleaseError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// LaunchpadRpcServer
// ---------------------------------------------------------------------------

/// The Launchpad server: release service plus the authorization predicate
/// applied to mutations.
#[derive(Clone)]
pub struct LaunchpadRpcServer {
    config: RpcConfig,
    service: Arc<ReleaseService>,
    authorizer: Arc<dyn Authorizer>,
    start_time: Instant,
}

impl std::fmt::Debug for LaunchpadRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchpadRpcServer")
            .field("config", &self.config)
            .field("base_url", &self.service.base_url())
            .finish()
    }
}

impl LaunchpadRpcServer {
    pub fn new(
        config: RpcConfig,
        service: Arc<ReleaseService>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            config,
            service,
            authorizer,
            start_time: Instant::now(),
        }
    }

    /// Daemon start time for uptime calculation.
    pub fn with_start_time(mut self, start_time: Instant) -> Self {
        self.start_time = start_time;
        self
    }

    /// The HTTP service tonic hosts. Exposed so it can be driven directly.
    pub fn http_service(&self) -> LaunchpadHttpService {
        LaunchpadHttpService::new(LaunchpadServiceImpl {
            service: self.service.clone(),
            authorizer: self.authorizer.clone(),
            max_upload_bytes: self.config.max_upload_bytes,
            start_time: self.start_time,
        })
    }

    /// Start the server and serve requests until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: std::future::Future<Output = ()>,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("Launchpad server starting on {}", addr);

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                self.http_service(),
                middleware::logging_interceptor,
            ))
            .serve_with_shutdown(addr, shutdown)
            .await?;

        tracing::info!("Launchpad server stopped");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request handling
// ---------------------------------------------------------------------------

/// Shared state behind the HTTP service.
#[derive(Clone)]
struct LaunchpadServiceImpl {
    service: Arc<ReleaseService>,
    authorizer: Arc<dyn Authorizer>,
    max_upload_bytes: u64,
    start_time: Instant,
}

impl LaunchpadServiceImpl {
    /// Dispatch a JSON-RPC request to the appropriate handler based on the method name.
    async fn dispatch(&self, request: JsonRpcRequest, authorized: bool) -> JsonRpcResponse {
        let service = self.service.as_ref();
        let params = request.params;

        let result = match request.method.as_str() {
            // Public reads
            "release/active" => {
                dispatch_handler(params, |r| handlers::release::handle_get_active(service, r)).await
            }
            "release/active_info" => {
                dispatch_handler(params, |r| {
                    handlers::release::handle_get_active_info(service, r)
                })
                .await
            }
            "release/history" => {
                dispatch_handler(params, |r| handlers::release::handle_get_history(service, r))
                    .await
            }

            // Authorized mutations
            "release/activate" => {
                dispatch_handler(params, |r| {
                    handlers::release::handle_activate(service, r, authorized)
                })
                .await
            }
            "release/delete" => {
                dispatch_handler(params, |r| {
                    handlers::release::handle_delete(service, r, authorized)
                })
                .await
            }
            "admin/sweep" => {
                dispatch_handler(params, |r| handlers::admin::handle_sweep(service, r, authorized))
                    .await
            }

            // Node
            "node/health" => {
                let start_time = self.start_time;
                dispatch_handler(serde_json::json!({}), |r| {
                    handlers::node::handle_get_health(service, r, start_time)
                })
                .await
            }

            _ => Err(ReleaseError::NotFound(format!(
                "Unknown method: {}",
                request.method
            ))),
        };

        match result {
            Ok(value) => JsonRpcResponse::ok(value),
            Err(err) => {
                log_failure(&request.method, &err);
                JsonRpcResponse::from_error(&err)
            }
        }
    }

    async fn upload<B>(
        &self,
        req: http::Request<B>,
        channel: &str,
        version: &str,
    ) -> http::Response<tonic::body::BoxBody>
    where
        B: HttpBody + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
        B::Data: Send,
    {
        let authorized = self.authorizer.authorize(middleware::bearer_token(req.headers()));

        let declared = req
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if authorized && declared.is_some_and(|len| len > self.max_upload_bytes) {
            return self.too_large();
        }

        let notes = req
            .headers()
            .get(RELEASE_NOTES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(percent_decode)
            .unwrap_or_default();

        let mut reader = BodyReader::new(req.into_body(), self.max_upload_bytes);
        let result = handlers::artifact::handle_upload(
            &self.service,
            channel,
            version,
            &notes,
            &mut reader,
            authorized,
        )
        .await;

        match result {
            Ok(resp) => match serde_json::to_value(resp) {
                Ok(value) => json_response(StatusCode::OK, &JsonRpcResponse::ok(value)),
                Err(e) => error_response(&ReleaseError::Io(format!(
                    "Failed to serialize response: {}",
                    e
                ))),
            },
            Err(_) if reader.over_limit() => self.too_large(),
            Err(err) => {
                log_failure("artifact/upload", &err);
                error_response(&err)
            }
        }
    }

    fn too_large(&self) -> http::Response<tonic::body::BoxBody> {
        let err = ReleaseError::InvalidInput(format!(
            "upload exceeds the {} byte limit",
            self.max_upload_bytes
        ));
        tracing::debug!("Rejected upload: {}", err);
        json_response(StatusCode::PAYLOAD_TOO_LARGE, &JsonRpcResponse::from_error(&err))
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, ReleaseError>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: std::future::Future<Output = Result<Resp, ReleaseError>>,
{
    let request: Req = serde_json::from_value(params)
        .map_err(|e| ReleaseError::InvalidInput(format!("Failed to deserialize request: {}", e)))?;
    let response = handler(request).await?;
    serde_json::to_value(response)
        .map_err(|e| ReleaseError::Io(format!("Failed to serialize response: {}", e)))
}

fn log_failure(operation: &str, err: &ReleaseError) {
    match err {
        ReleaseError::Io(_) => tracing::error!(operation, "Request failed: {}", err),
        _ => tracing::debug!(operation, "Request rejected: {}", err),
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Rpc,
    Health,
    Upload { channel: String, version: String },
    Fetch { channel: String, version: String },
    Download { name: String },
    MethodNotAllowed,
    NotFound,
}

fn route(method: &Method, path: &str) -> Route {
    let path = path.strip_prefix("/launchpad").unwrap_or(path);
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match segments.as_slice() {
        ["rpc"] => match *method {
            Method::POST => Route::Rpc,
            _ => Route::MethodNotAllowed,
        },
        ["health"] => match *method {
            Method::GET => Route::Health,
            _ => Route::MethodNotAllowed,
        },
        ["artifacts", channel, version] if !version.is_empty() => {
            let channel = percent_decode(channel);
            let version = percent_decode(version);
            match *method {
                Method::PUT => Route::Upload { channel, version },
                Method::GET => Route::Fetch { channel, version },
                _ => Route::MethodNotAllowed,
            }
        }
        ["downloads", name] if !name.is_empty() => match *method {
            Method::GET => Route::Download {
                name: percent_decode(name),
            },
            _ => Route::MethodNotAllowed,
        },
        _ => Route::NotFound,
    }
}

/// Decode `%XX` escapes. Malformed escapes are kept literally and invalid
/// UTF-8 is replaced.
fn percent_decode(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

/// HTTP status for a core error on the artifact routes.
pub fn status_for(err: &ReleaseError) -> StatusCode {
    match err {
        ReleaseError::NotFound(_) => StatusCode::NOT_FOUND,
        ReleaseError::InvalidState(_) | ReleaseError::Conflict(_) => StatusCode::CONFLICT,
        ReleaseError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ReleaseError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ReleaseError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------

/// The tonic service wrapper. Routes each HTTP request to the JSON-RPC
/// dispatcher or one of the artifact transfer handlers.
#[derive(Clone)]
pub struct LaunchpadHttpService {
    inner: LaunchpadServiceImpl,
}

impl std::fmt::Debug for LaunchpadHttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchpadHttpService").finish()
    }
}

impl LaunchpadHttpService {
    fn new(inner: LaunchpadServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for LaunchpadHttpService {
    const NAME: &'static str = "launchpad";
}

impl<B> tower_service::Service<http::Request<B>> for LaunchpadHttpService
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let route = route(req.method(), req.uri().path());
            tracing::debug!(method = %req.method(), path = %req.uri().path(), "Routing request");

            let response = match route {
                Route::Rpc => {
                    let authorized = inner
                        .authorizer
                        .authorize(middleware::bearer_token(req.headers()));
                    let body_bytes = match collect_body(req.into_body()).await {
                        Ok(b) => b,
                        Err(e) => {
                            tracing::error!("Failed to read request body: {}", e);
                            let err = ReleaseError::Io(format!("Failed to read request body: {}", e));
                            return Ok(json_response(StatusCode::OK, &JsonRpcResponse::from_error(&err)));
                        }
                    };
                    let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                        Ok(r) => r,
                        Err(e) => {
                            let err = ReleaseError::InvalidInput(format!("Invalid JSON-RPC request: {}", e));
                            return Ok(json_response(StatusCode::OK, &JsonRpcResponse::from_error(&err)));
                        }
                    };
                    let rpc_response = inner.dispatch(rpc_request, authorized).await;
                    json_response(StatusCode::OK, &rpc_response)
                }
                Route::Health => {
                    let rpc_response = inner
                        .dispatch(
                            JsonRpcRequest {
                                method: "node/health".to_string(),
                                params: serde_json::Value::Null,
                            },
                            false,
                        )
                        .await;
                    json_response(StatusCode::OK, &rpc_response)
                }
                Route::Upload { channel, version } => inner.upload(req, &channel, &version).await,
                Route::Fetch { channel, version } => artifact_response(
                    handlers::artifact::handle_fetch_artifact(&inner.service, &channel, &version)
                        .await,
                ),
                Route::Download { name } => artifact_response(
                    handlers::artifact::handle_download(&inner.service, &name).await,
                ),
                Route::MethodNotAllowed => json_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    &JsonRpcResponse::from_error(&ReleaseError::InvalidInput(format!(
                        "method {} not allowed here",
                        req.method()
                    ))),
                ),
                Route::NotFound => error_response(&ReleaseError::NotFound(format!(
                    "no route for {}",
                    req.uri().path()
                ))),
            };

            Ok(response)
        })
    }
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Stream an opened artifact, or map the lookup error to a status.
fn artifact_response(
    result: Result<ArtifactStream, ReleaseError>,
) -> http::Response<tonic::body::BoxBody> {
    let stream = match result {
        Ok(stream) => stream,
        Err(err) => {
            log_failure("artifact/fetch", &err);
            return error_response(&err);
        }
    };

    tracing::debug!(artifact = %stream.artifact_ref, size = stream.size, "Serving artifact");
    let disposition = format!("attachment; filename=\"{}\"", stream.artifact_ref);
    let body = tonic::body::BoxBody::new(ReaderBody::new(stream.reader, stream.size));

    let mut response = http::Response::new(body);
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(stream.size));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    response
}

fn error_response(err: &ReleaseError) -> http::Response<tonic::body::BoxBody> {
    json_response(status_for(err), &JsonRpcResponse::from_error(err))
}

/// Build an HTTP response with the given JSON envelope.
fn json_response(
    status: StatusCode,
    envelope: &JsonRpcResponse,
) -> http::Response<tonic::body::BoxBody> {
    let json = serde_json::to_vec(envelope).unwrap_or_default();
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
