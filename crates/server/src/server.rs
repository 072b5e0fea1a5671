//! HTTP listener and request dispatch.

use std::net::SocketAddr;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::handler::{Handler, Response};

/// Upper bound on the request head (request line + headers).
const MAX_REQUEST_HEAD: usize = 8192;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 0 }
    }
}

/// The crosshair HTTP server.
///
/// Accepts connections until shutdown and dispatches the single
/// `GET /<identity>` route to the provided [`Handler`]; each
/// connection is served on its own task.
pub struct HttpServer<H: Handler> {
    config: ServerConfig,
    handler: Arc<H>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl<H: Handler> HttpServer<H> {
    /// Creates a new server with the given handler.
    pub fn new(config: ServerConfig, handler: H) -> Arc<Self> {
        Arc::new(Self {
            config,
            handler: Arc::new(handler),
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until cancellation.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("http server listening on {local_addr}");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("server shutting down");
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream).await {
                                    tracing::error!(%peer_addr, "connection error: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Serves a single connection: one request, one response.
    async fn handle_connection(self: &Arc<Self>, mut stream: TcpStream) -> Result<(), ServerError> {
        let head = match read_request_head(&mut stream).await {
            Ok(head) => head,
            Err(ServerError::RequestTooLarge) => {
                write_response(&mut stream, &Response::error(400, "request too large")).await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let response = match route(&head) {
            Route::Crosshair(identity) => self.handler.on_crosshair(identity).await,
            Route::BadRequest => Response::error(400, "bad request"),
            Route::MethodNotAllowed => Response::error(405, "method not allowed"),
            Route::NotFound => Response::error(404, "not found"),
        };

        write_response(&mut stream, &response).await
    }
}

/// Routing outcome for one request head.
enum Route {
    Crosshair(String),
    BadRequest,
    MethodNotAllowed,
    NotFound,
}

/// Parses the request line and resolves the single supported route.
fn route(head: &str) -> Route {
    let Some(request_line) = head.lines().next() else {
        return Route::BadRequest;
    };

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(_version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Route::BadRequest;
    };

    if method != "GET" {
        return Route::MethodNotAllowed;
    }

    // Query strings are not part of the route.
    let path = target.split('?').next().unwrap_or("");
    let Some(identity) = path.strip_prefix('/') else {
        return Route::BadRequest;
    };

    if identity.is_empty() || identity.contains('/') {
        return Route::NotFound;
    }

    let identity = percent_decode_str(identity).decode_utf8_lossy().into_owned();
    Route::Crosshair(identity)
}

/// Reads the request head, bounded by [`MAX_REQUEST_HEAD`].
async fn read_request_head(stream: &mut TcpStream) -> Result<String, ServerError> {
    let mut head = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if head.len() > MAX_REQUEST_HEAD {
            return Err(ServerError::RequestTooLarge);
        }
    }

    Ok(String::from_utf8_lossy(&head).into_owned())
}

/// Writes a plain-text HTTP/1.1 response and closes the stream.
async fn write_response(stream: &mut TcpStream, response: &Response) -> Result<(), ServerError> {
    let raw = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason(response.status),
        response.body.len(),
        response.body
    );
    stream.write_all(raw.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Error",
    }
}
