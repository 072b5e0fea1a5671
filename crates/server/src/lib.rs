//! Minimal HTTP endpoint for crosshair lookups.
//!
//! Listens on a TCP port and serves exactly one route,
//! `GET /<identity>`, as plain text. Request handling is dispatched to
//! a [`Handler`] trait; the server owns the listener lifecycle and
//! graceful shutdown.

mod handler;
mod server;

pub use handler::{Handler, HandlerFuture, Response};
pub use server::{HttpServer, ServerConfig};

/// Errors produced by the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request head too large")]
    RequestTooLarge,
}
