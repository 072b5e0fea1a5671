//! Application orchestrator — wires all service components together.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use xhair_pipeline::Pipeline;
use xhair_server::{Handler, HandlerFuture, HttpServer, Response, ServerConfig};

use crate::config::Config;
use crate::decoder;

/// Runs the service until shutdown is requested.
pub async fn run(config: Config) -> anyhow::Result<()> {
    if config.faceit_api_key.is_empty() {
        tracing::warn!("FACEIT API key is empty; platform lookups will fail");
    }

    // -- Platform client --
    let mut faceit = xhair_faceit::Client::new(&config.faceit_api_key)?;
    if !config.api_base_url.is_empty() {
        faceit = faceit.with_base_url(config.api_base_url.clone());
    }

    // -- Demo download client --
    let download = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .build()?;

    // -- Pipeline --
    let pipeline = Arc::new(Pipeline::new(faceit, download, decoder::factory()));
    let cancel = CancellationToken::new();

    // -- HTTP server --
    let handler = CrosshairHandler {
        pipeline,
        cancel: cancel.clone(),
    };
    let server = HttpServer::new(ServerConfig { port: config.port }, handler);
    let server_run = Arc::clone(&server);
    tokio::spawn(async move {
        if let Err(e) = server_run.run().await {
            tracing::error!("server error: {e}");
        }
    });

    // Wait for the server to bind.
    let port = loop {
        let p = server.port().await;
        if p > 0 {
            break p;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    };

    tracing::info!(port, "serving crosshair lookups");

    // -- Main loop: wait for shutdown --
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::info!("shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, shutting down");
        }
    }

    // -- Graceful shutdown --
    cancel.cancel();
    server.shutdown();

    Ok(())
}

/// Serves one crosshair lookup per request via the pipeline.
struct CrosshairHandler {
    pipeline: Arc<Pipeline>,
    cancel: CancellationToken,
}

impl Handler for CrosshairHandler {
    fn on_crosshair(&self, identity: String) -> HandlerFuture<'_> {
        Box::pin(async move {
            // Child token: service shutdown cancels in-flight runs.
            let request_cancel = self.cancel.child_token();

            match self.pipeline.run(&identity, &request_cancel).await {
                Ok(result) => Response::ok(format!("{}\n", result.code)),
                Err(e) => {
                    tracing::error!(identity = %identity, error = %e, "pipeline failed");
                    Response::error(e.status(), e.to_string())
                }
            }
        })
    }
}
