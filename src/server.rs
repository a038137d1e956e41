//! HTTP bridge server
//! Serves the subscription endpoint and a small read-only inbound view

use crate::error::BridgeError;
use crate::model::ClientIdentity;
use crate::profile::load_profiles_async;
use crate::source::InboundSource;
use crate::subscription::{generate_links, render_base64, render_plain, SubscriptionFormat};
use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;
use uuid::Uuid;

type Body = BoxBody<Bytes, hyper::Error>;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Where the HTTP server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddr {
    Tcp(SocketAddr),
    /// Filesystem unix socket (`/run/bridge.sock`)
    Unix(PathBuf),
    /// Linux abstract unix socket (`@bridge`)
    Abstract(String),
}

impl FromStr for ListenAddr {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with('/') {
            return Ok(ListenAddr::Unix(PathBuf::from(s)));
        }
        if let Some(name) = s.strip_prefix('@') {
            return Ok(ListenAddr::Abstract(name.to_string()));
        }

        // `:8081` binds every interface
        let addr = if s.starts_with(':') {
            format!("0.0.0.0{}", s)
        } else {
            s.to_string()
        };
        addr.parse()
            .map(ListenAddr::Tcp)
            .map_err(|e| anyhow!("invalid listen address '{}': {}", s, e))
    }
}

impl std::fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenAddr::Tcp(addr) => write!(f, "{}", addr),
            ListenAddr::Unix(path) => write!(f, "{}", path.display()),
            ListenAddr::Abstract(name) => write!(f, "@{}", name),
        }
    }
}

/// Bridge server configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub listen: ListenAddr,
    /// Profile file; `None` disables the subscription endpoint
    pub subs_config: Option<PathBuf>,
    /// Query token that selects every client
    pub superkey: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen: ListenAddr::Tcp(SocketAddr::from(([127, 0, 0, 1], 8081))),
            subs_config: None,
            superkey: None,
        }
    }
}

#[derive(Serialize)]
struct SuccessResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    success: bool,
    error: &'a str,
}

#[derive(Serialize)]
struct UserCount {
    count: usize,
}

/// Per-inbound client views under `/inbound/{tag}/...`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InboundView {
    Users,
    UserCount,
}

/// Split `/inbound/{tag}/users[/count]` into the decoded tag and the view
fn parse_inbound_view(path: &str) -> Option<(String, InboundView)> {
    let rest = path.strip_prefix("/inbound/")?;
    let (tag, view) = match rest.strip_suffix("/users/count") {
        Some(tag) => (tag, InboundView::UserCount),
        None => (rest.strip_suffix("/users")?, InboundView::Users),
    };
    if tag.is_empty() || tag.contains('/') {
        return None;
    }
    Some((percent_decode_str(tag).decode_utf8_lossy().into_owned(), view))
}

/// Bridge server
pub struct BridgeServer {
    config: BridgeConfig,
    source: Arc<dyn InboundSource>,
}

impl BridgeServer {
    pub fn new(config: BridgeConfig, source: Arc<dyn InboundSource>) -> Self {
        Self { config, source }
    }

    /// Run until SIGINT/SIGTERM
    pub async fn run(self: Arc<Self>) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves
    pub async fn run_until<F>(self: Arc<Self>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        match self.config.listen.clone() {
            ListenAddr::Tcp(addr) => self.serve_tcp(addr, shutdown).await,
            #[cfg(unix)]
            ListenAddr::Unix(path) => self.serve_unix(path, shutdown).await,
            #[cfg(target_os = "linux")]
            ListenAddr::Abstract(name) => self.serve_abstract(name, shutdown).await,
            #[allow(unreachable_patterns)]
            other => Err(anyhow!("listen address {} is not supported on this platform", other)),
        }
    }

    async fn serve_tcp<F>(self: Arc<Self>, addr: SocketAddr, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        info!("HTTP server listening on {}", addr);

        let listener = &listener;
        self.accept_loop(
            move || async move {
                listener
                    .accept()
                    .await
                    .map(|(stream, remote_addr)| (stream, remote_addr.to_string()))
            },
            shutdown,
        )
        .await;

        info!("HTTP server on {} stopped", addr);
        Ok(())
    }

    #[cfg(unix)]
    async fn serve_unix<F>(self: Arc<Self>, path: PathBuf, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        use std::os::unix::fs::PermissionsExt;
        use tokio::net::UnixListener;

        match std::fs::remove_file(&path) {
            Ok(()) => debug!("removed stale socket {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("failed to remove existing unix socket"),
        }

        let listener = UnixListener::bind(&path)
            .with_context(|| format!("failed to listen on unix socket {}", path.display()))?;
        // The web front end runs as another user
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o666))
            .context("failed to change unix socket permissions")?;
        info!("HTTP server listening on unix socket {}", path.display());

        let listener = &listener;
        let peer = path.display().to_string();
        self.accept_loop(
            move || {
                let peer = peer.clone();
                async move { listener.accept().await.map(|(stream, _)| (stream, peer)) }
            },
            shutdown,
        )
        .await;

        if let Err(e) = std::fs::remove_file(&path) {
            warn!("failed to remove unix socket file on shutdown: {}", e);
        }
        Ok(())
    }

    #[cfg(target_os = "linux")]
    async fn serve_abstract<F>(self: Arc<Self>, name: String, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        use std::os::linux::net::SocketAddrExt;
        use std::os::unix::net::{SocketAddr as UnixSocketAddr, UnixListener as StdUnixListener};

        let addr = UnixSocketAddr::from_abstract_name(name.as_bytes())?;
        let std_listener = StdUnixListener::bind_addr(&addr)
            .with_context(|| format!("failed to listen on abstract unix socket @{}", name))?;
        std_listener.set_nonblocking(true)?;
        let listener = tokio::net::UnixListener::from_std(std_listener)?;
        info!("HTTP server listening on abstract unix socket @{}", name);

        let listener = &listener;
        let peer = format!("@{}", name);
        self.accept_loop(
            move || {
                let peer = peer.clone();
                async move { listener.accept().await.map(|(stream, _)| (stream, peer)) }
            },
            shutdown,
        )
        .await;
        Ok(())
    }

    /// Accept until `shutdown` resolves. A failed accept (EMFILE and the
    /// like) is logged and retried after a short pause.
    async fn accept_loop<I, A, Fut, F>(self: Arc<Self>, mut accept: A, shutdown: F)
    where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        A: FnMut() -> Fut,
        Fut: Future<Output = std::io::Result<(I, String)>>,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = accept() => match accepted {
                    Ok((io, peer)) => self.clone().spawn_connection(io, peer),
                    Err(e) => {
                        warn!("failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }
    }

    fn spawn_connection<I>(self: Arc<Self>, io: I, peer: String)
    where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        tokio::spawn(async move {
            if let Err(e) = self.handle_connection(io, peer.clone()).await {
                debug!("HTTP connection error from {}: {}", peer, e);
            }
        });
    }

    /// Handle a single HTTP connection
    async fn handle_connection<I>(self: Arc<Self>, io: I, peer: String) -> Result<()>
    where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        http1::Builder::new()
            .serve_connection(
                TokioIo::new(io),
                service_fn(move |req| {
                    let server = self.clone();
                    let peer = peer.clone();
                    async move { server.handle_request(req, &peer).await }
                }),
            )
            .await
            .map_err(|e| anyhow!("HTTP service error: {}", e))
    }

    /// Handle incoming request
    async fn handle_request(
        &self,
        req: Request<Incoming>,
        peer: &str,
    ) -> std::result::Result<Response<Body>, Infallible> {
        let (parts, _body) = req.into_parts();
        let request_id = Uuid::new_v4().to_string();
        debug!(
            "[{}] {} {} from {}",
            request_id,
            parts.method,
            parts.uri.path(),
            peer
        );

        let query = parts.uri.query().unwrap_or("");
        let mut response = self.route(&parts.method, parts.uri.path(), query).await;
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }
        Ok(response)
    }

    async fn route(&self, method: &Method, path: &str, query: &str) -> Response<Body> {
        match (method, path) {
            (&Method::GET, "/health") => Self::text_response(StatusCode::OK, "OK"),
            (&Method::GET, "/status") => Self::json_response(
                StatusCode::OK,
                &SuccessResponse::<()> {
                    success: true,
                    data: None,
                    message: Some("Xray API Bridge is running!".to_string()),
                },
            ),
            (&Method::GET, "/subscription") => self.handle_subscription(query).await,
            (&Method::GET, "/inbound") => self.handle_list_inbounds().await,
            (_, "/health" | "/status" | "/subscription" | "/inbound") => {
                Self::error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
            }
            _ => match parse_inbound_view(path) {
                Some((tag, view)) if *method == Method::GET => {
                    self.handle_inbound_users(&tag, view, query).await
                }
                Some(_) => Self::error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
                None => Self::error_response(StatusCode::NOT_FOUND, "Not Found"),
            },
        }
    }

    /// GET /subscription?uuid=<ids|superkey>[&format=json|plain|base64]
    async fn handle_subscription(&self, query: &str) -> Response<Body> {
        let params: HashMap<String, String> =
            form_urlencoded::parse(query.as_bytes()).into_owned().collect();

        let uuid = match params.get("uuid").filter(|u| !u.is_empty()) {
            Some(u) => u,
            None => return Self::bridge_error(None, BridgeError::MissingQuery("uuid")),
        };

        let format = match params
            .get("format")
            .map(String::as_str)
            .unwrap_or("")
            .parse::<SubscriptionFormat>()
        {
            Ok(f) => f,
            Err(msg) => return Self::error_response(StatusCode::BAD_REQUEST, &msg),
        };

        let subs_config = self.config.subs_config.as_deref().unwrap_or(Path::new(""));
        let profiles = match load_profiles_async(subs_config).await {
            Ok(p) => p,
            Err(e) => return Self::bridge_error(Some("Failed to load subscription config"), e),
        };

        let inbounds = match self.source.list_inbounds().await {
            Ok(i) => i,
            Err(e) => return Self::bridge_error(Some("Failed to list inbounds"), e),
        };
        if inbounds.is_empty() {
            return Self::bridge_error(None, BridgeError::NoInbounds);
        }

        let links = match generate_links(&inbounds, &profiles, uuid, self.config.superkey.as_deref()) {
            Ok(l) => l,
            Err(e) => return Self::bridge_error(Some("Failed to generate subscription links"), e),
        };
        if links.is_empty() {
            return Self::bridge_error(None, BridgeError::NoLinks);
        }

        debug!("generated {} subscription links", links.len());

        match format {
            SubscriptionFormat::Json => Self::json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    data: Some(links),
                    message: None,
                },
            ),
            SubscriptionFormat::Plain => Self::text_response(StatusCode::OK, &render_plain(&links)),
            SubscriptionFormat::Base64 => Self::text_response(StatusCode::OK, &render_base64(&links)),
        }
    }

    /// GET /inbound
    async fn handle_list_inbounds(&self) -> Response<Body> {
        match self.source.list_inbounds().await {
            Ok(inbounds) => Self::json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    data: Some(inbounds),
                    message: None,
                },
            ),
            Err(e) => Self::bridge_error(Some("Failed to list inbounds"), e),
        }
    }

    /// GET /inbound/{tag}/users[/count][?email=<email>]
    async fn handle_inbound_users(&self, tag: &str, view: InboundView, query: &str) -> Response<Body> {
        let inbounds = match self.source.list_inbounds().await {
            Ok(i) => i,
            Err(e) => return Self::bridge_error(Some("Failed to get inbound users"), e),
        };
        let inbound = match inbounds.into_iter().find(|i| i.tag == tag) {
            Some(i) => i,
            None => return Self::bridge_error(None, BridgeError::InboundNotFound(tag.to_string())),
        };

        let email = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "email")
            .map(|(_, value)| value.into_owned())
            .filter(|email| !email.is_empty());
        let users: Vec<ClientIdentity> = inbound
            .clients
            .into_iter()
            .filter(|c| email.as_deref().map_or(true, |e| c.email == e))
            .collect();

        match view {
            InboundView::Users => Self::json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    data: Some(users),
                    message: None,
                },
            ),
            InboundView::UserCount => Self::json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    data: Some(UserCount { count: users.len() }),
                    message: None,
                },
            ),
        }
    }

    fn bridge_error(stage: Option<&str>, err: BridgeError) -> Response<Body> {
        let status = err.status();
        let message = match stage {
            Some(stage) => format!("{}: {}", stage, err),
            None => err.to_string(),
        };

        if status.is_server_error() {
            error!("Request error: {}", message);
        } else {
            debug!("Request rejected: {}", message);
        }
        Self::error_response(status, &message)
    }

    /// Create JSON response
    fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response<Body> {
        match serde_json::to_vec(payload) {
            Ok(body) => Self::response(status, "application/json", Bytes::from(body)),
            Err(e) => {
                error!("Failed to encode response: {}", e);
                Self::text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    /// Create error response
    fn error_response(status: StatusCode, message: &str) -> Response<Body> {
        Self::json_response(
            status,
            &ErrorResponse {
                success: false,
                error: message,
            },
        )
    }

    /// Create text response
    fn text_response(status: StatusCode, body: &str) -> Response<Body> {
        Self::response(status, "text/plain; charset=utf-8", Bytes::from(body.to_string()))
    }

    fn response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Body> {
        let mut response = Response::new(Self::full_body(body));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        response
    }

    /// Create full body
    fn full_body(bytes: Bytes) -> Body {
        Full::new(bytes).map_err(|never| match never {}).boxed()
    }
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down Xray API Bridge...");
}
