//! Handler trait for the crosshair route.

use std::future::Future;
use std::pin::Pin;

/// A boxed future returned by handler methods.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Response> + Send + 'a>>;

/// A plain-text HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    /// 200 with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Error response; the message becomes the body line.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let mut body = message.into();
        if !body.ends_with('\n') {
            body.push('\n');
        }
        Self { status, body }
    }
}

/// Trait for serving crosshair lookups.
///
/// The server handles listening, request parsing, and response
/// framing; the handler provides the domain logic for the single
/// route.
pub trait Handler: Send + Sync + 'static {
    /// Called for `GET /<identity>`. The identity arrives
    /// percent-decoded, exactly as embedded in the path.
    fn on_crosshair(&self, identity: String) -> HandlerFuture<'_>;
}
