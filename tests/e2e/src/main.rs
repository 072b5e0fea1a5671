fn main() {
    println!("Run `cargo test -p e2e` to execute the end-to-end scenarios.");
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio_util::sync::CancellationToken;

    use xhair_pipeline::Pipeline;
    use xhair_replay::parser::{
        DemoParser, LivePlayer, MatchStart, MatchStartHandler, ParseError, ParserFactory,
    };
    use xhair_replay::scan::crosshair_property;
    use xhair_server::{Handler, HandlerFuture, HttpServer, Response, ServerConfig};

    // -----------------------------------------------------------------
    // Mock platform API
    // -----------------------------------------------------------------

    /// Serves canned JSON bodies keyed by path prefix, indefinitely.
    async fn start_platform(
        routes: Vec<(&'static str, String)>,
    ) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");

        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]).into_owned();
                let path = head
                    .lines()
                    .next()
                    .and_then(|l| l.split_whitespace().nth(1))
                    .unwrap_or("")
                    .to_string();

                let body = routes
                    .iter()
                    .find(|(prefix, _)| path.starts_with(prefix))
                    .map(|(_, body)| body.clone())
                    .unwrap_or_else(|| r#"{"errors":[{"message":"no such route"}]}"#.to_string());

                let resp = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, handle)
    }

    // -----------------------------------------------------------------
    // Mock demo host
    // -----------------------------------------------------------------

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    /// Serves one gzip payload for any path and counts hits.
    async fn start_demo_host(
        payload: Vec<u8>,
    ) -> (String, Arc<AtomicUsize>, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}/demo.dem.gz");
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_counter = Arc::clone(&hits);

        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                hits_counter.fetch_add(1, Ordering::SeqCst);

                let mut buf = vec![0u8; 8192];
                let _ = stream.read(&mut buf).await;

                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    payload.len()
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(&payload).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, hits, handle)
    }

    // -----------------------------------------------------------------
    // Scripted parser factory
    // -----------------------------------------------------------------

    /// One scripted match-start event: (platform id, entity index, code).
    type Event = Vec<(u64, i32, Option<&'static str>)>;

    struct ScriptedFactory {
        events: Vec<Event>,
        fault: Option<&'static str>,
        /// Path of the last opened artifact, for cleanup assertions.
        opened: Arc<Mutex<Option<PathBuf>>>,
    }

    impl ScriptedFactory {
        fn new(events: Vec<Event>) -> Self {
            Self {
                events,
                fault: None,
                opened: Arc::new(Mutex::new(None)),
            }
        }

        fn with_fault(mut self, message: &'static str) -> Self {
            self.fault = Some(message);
            self
        }

        fn opened_path(&self) -> Arc<Mutex<Option<PathBuf>>> {
            Arc::clone(&self.opened)
        }
    }

    impl ParserFactory for ScriptedFactory {
        fn open(&self, path: &Path) -> Result<Box<dyn DemoParser>, ParseError> {
            // The artifact must exist and be readable at open time.
            std::fs::File::open(path)?;
            *self.opened.lock().unwrap() = Some(path.to_path_buf());

            Ok(Box::new(ScriptedParser {
                events: self.events.clone(),
                fault: self.fault,
                handler: None,
            }))
        }
    }

    struct ScriptedParser {
        events: Vec<Event>,
        fault: Option<&'static str>,
        handler: Option<MatchStartHandler>,
    }

    impl DemoParser for ScriptedParser {
        fn register_match_start(&mut self, handler: MatchStartHandler) {
            self.handler = Some(handler);
        }

        fn parse_to_end(&mut self) -> Result<(), ParseError> {
            let mut handler = self.handler.take();
            for event in &self.events {
                if let Some(handler) = handler.as_mut() {
                    let props: Vec<HashMap<String, String>> = event
                        .iter()
                        .map(|(_, entity_index, code)| {
                            let mut map = HashMap::new();
                            if let Some(code) = code {
                                map.insert(crosshair_property(*entity_index), code.to_string());
                            }
                            map
                        })
                        .collect();

                    let playing: Vec<LivePlayer<'_>> = event
                        .iter()
                        .zip(props.iter())
                        .map(|((platform_id, entity_index, _), props)| LivePlayer {
                            platform_id: *platform_id,
                            entity_index: *entity_index,
                            entity: props,
                        })
                        .collect();

                    handler(&MatchStart { playing: &playing });
                }
            }
            match self.fault {
                Some(message) => Err(ParseError::Decode(message.into())),
                None => Ok(()),
            }
        }
    }

    // -----------------------------------------------------------------
    // Service wiring
    // -----------------------------------------------------------------

    fn platform_routes(
        identity: &str,
        player_id: &str,
        history: serde_json::Value,
        match_body: serde_json::Value,
    ) -> Vec<(&'static str, String)> {
        let player = serde_json::json!({
            "player_id": player_id,
            "nickname": format!("player-{identity}"),
        });
        // Leaked prefixes keep the route table 'static for the server task.
        let history_prefix: &'static str =
            Box::leak(format!("/players/{player_id}/history").into_boxed_str());
        vec![
            (history_prefix, history.to_string()),
            ("/players?", player.to_string()),
            ("/matches/", match_body.to_string()),
        ]
    }

    struct PipelineHandler {
        pipeline: Arc<Pipeline>,
        cancel: CancellationToken,
    }

    impl Handler for PipelineHandler {
        fn on_crosshair(&self, identity: String) -> HandlerFuture<'_> {
            Box::pin(async move {
                let cancel = self.cancel.child_token();
                match self.pipeline.run(&identity, &cancel).await {
                    Ok(result) => Response::ok(format!("{}\n", result.code)),
                    Err(e) => Response::error(e.status(), e.to_string()),
                }
            })
        }
    }

    async fn start_service(
        platform_url: String,
        factory: Arc<dyn ParserFactory>,
    ) -> (
        Arc<HttpServer<PipelineHandler>>,
        u16,
        tokio::task::JoinHandle<()>,
    ) {
        let faceit = xhair_faceit::Client::new("test-key")
            .unwrap()
            .with_base_url(platform_url);
        let pipeline = Arc::new(Pipeline::new(faceit, reqwest::Client::new(), factory));

        let handler = PipelineHandler {
            pipeline,
            cancel: CancellationToken::new(),
        };
        let server = HttpServer::new(ServerConfig { port: 0 }, handler);
        let server_run = Arc::clone(&server);
        let handle = tokio::spawn(async move {
            server_run.run().await.unwrap();
        });

        let port = loop {
            let p = server.port().await;
            if p > 0 {
                break p;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        };

        (server, port, handle)
    }

    async fn get(port: u16, path: &str) -> (u16, String) {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream
            .write_all(format!("GET {path} HTTP/1.1\r\nHost: x\r\n\r\n").as_bytes())
            .await
            .unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let raw = String::from_utf8_lossy(&raw).into_owned();

        let status: u16 = raw
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let body = raw
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();
        (status, body)
    }

    // -----------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn scenario_a_returns_the_crosshair_code() {
        let demo_bytes = b"demo-bytes".repeat(256);
        let (demo_url, _hits, demo_handle) = start_demo_host(gzip(&demo_bytes)).await;

        let routes = platform_routes(
            "111",
            "p-111",
            serde_json::json!({"items": [
                {"match_id": "M1", "competition_type": "matchmaking"},
            ]}),
            serde_json::json!({"match_id": "M1", "demo_url": [demo_url]}),
        );
        let (platform_url, platform_handle) = start_platform(routes).await;

        let factory = Arc::new(ScriptedFactory::new(vec![vec![
            (111, 4, Some("5;1;1;1;0")),
            (222, 5, Some("1;2;3")),
        ]]));
        let opened = factory.opened_path();

        let (server, port, server_handle) = start_service(platform_url, factory).await;

        let (status, body) = get(port, "/111").await;
        assert_eq!(status, 200);
        assert_eq!(body, "5;1;1;1;0\n");

        // The artifact was materialized and is gone after the run.
        let path = opened.lock().unwrap().clone().expect("artifact opened");
        assert!(!path.exists(), "artifact should be deleted after the run");

        server.shutdown();
        server_handle.await.unwrap();
        platform_handle.abort();
        demo_handle.abort();
    }

    #[tokio::test]
    async fn scenario_b_empty_history_never_downloads() {
        let (demo_url, hits, demo_handle) = start_demo_host(gzip(b"unused")).await;

        let routes = platform_routes(
            "222",
            "p-222",
            serde_json::json!({"items": []}),
            serde_json::json!({"match_id": "M1", "demo_url": [demo_url]}),
        );
        let (platform_url, platform_handle) = start_platform(routes).await;

        let factory = Arc::new(ScriptedFactory::new(vec![]));
        let (server, port, server_handle) = start_service(platform_url, factory).await;

        let (status, body) = get(port, "/222").await;
        assert_eq!(status, 500);
        assert!(body.contains("has not played for at least 6 months"), "body: {body}");
        assert_eq!(hits.load(Ordering::SeqCst), 0, "demo host must not be contacted");

        server.shutdown();
        server_handle.await.unwrap();
        platform_handle.abort();
        demo_handle.abort();
    }

    #[tokio::test]
    async fn scenario_c_absent_identity_yields_empty_line() {
        let (demo_url, _hits, demo_handle) = start_demo_host(gzip(b"demo")).await;

        let routes = platform_routes(
            "333",
            "p-333",
            serde_json::json!({"items": [
                {"match_id": "M2", "competition_type": "matchmaking"},
            ]}),
            serde_json::json!({"match_id": "M2", "demo_url": [demo_url]}),
        );
        let (platform_url, platform_handle) = start_platform(routes).await;

        // The identity never appears among live participants.
        let factory = Arc::new(ScriptedFactory::new(vec![vec![(444, 2, Some("9;9;9"))]]));
        let (server, port, server_handle) = start_service(platform_url, factory).await;

        let (status, body) = get(port, "/333").await;
        assert_eq!(status, 200);
        assert_eq!(body, "\n");

        server.shutdown();
        server_handle.await.unwrap();
        platform_handle.abort();
        demo_handle.abort();
    }

    #[tokio::test]
    async fn championship_only_history_is_rejected_before_download() {
        let (demo_url, hits, demo_handle) = start_demo_host(gzip(b"unused")).await;

        let routes = platform_routes(
            "555",
            "p-555",
            serde_json::json!({"items": [
                {"match_id": "M3", "competition_type": "championship"},
                {"match_id": "M4", "competition_type": "championship"},
            ]}),
            serde_json::json!({"match_id": "M3", "demo_url": [demo_url]}),
        );
        let (platform_url, platform_handle) = start_platform(routes).await;

        let factory = Arc::new(ScriptedFactory::new(vec![]));
        let (server, port, server_handle) = start_service(platform_url, factory).await;

        let (status, body) = get(port, "/555").await;
        assert_eq!(status, 500);
        assert!(body.contains("no recent match eligible"), "body: {body}");
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        server.shutdown();
        server_handle.await.unwrap();
        platform_handle.abort();
        demo_handle.abort();
    }

    #[tokio::test]
    async fn decode_fault_reports_error_and_removes_artifact() {
        let (demo_url, _hits, demo_handle) = start_demo_host(gzip(b"demo")).await;

        let routes = platform_routes(
            "666",
            "p-666",
            serde_json::json!({"items": [
                {"match_id": "M5", "competition_type": "matchmaking"},
            ]}),
            serde_json::json!({"match_id": "M5", "demo_url": [demo_url]}),
        );
        let (platform_url, platform_handle) = start_platform(routes).await;

        let factory =
            Arc::new(ScriptedFactory::new(vec![vec![(666, 1, Some("x"))]]).with_fault("bad tick"));
        let opened = factory.opened_path();

        let (server, port, server_handle) = start_service(platform_url, factory).await;

        let (status, body) = get(port, "/666").await;
        assert_eq!(status, 500);
        assert!(body.contains("bad tick"), "body: {body}");

        let path = opened.lock().unwrap().clone().expect("artifact opened");
        assert!(!path.exists(), "artifact should be deleted after a failed scan");

        server.shutdown();
        server_handle.await.unwrap();
        platform_handle.abort();
        demo_handle.abort();
    }

    /// Factory that records the artifact path but refuses to open it.
    struct RefusingFactory {
        seen: Arc<Mutex<Option<PathBuf>>>,
    }

    impl ParserFactory for RefusingFactory {
        fn open(&self, path: &Path) -> Result<Box<dyn DemoParser>, ParseError> {
            *self.seen.lock().unwrap() = Some(path.to_path_buf());
            Err(ParseError::Decode("decoder unavailable".into()))
        }
    }

    #[tokio::test]
    async fn unopened_artifact_is_still_removed() {
        let (demo_url, _hits, demo_handle) = start_demo_host(gzip(b"demo")).await;

        let routes = platform_routes(
            "888",
            "p-888",
            serde_json::json!({"items": [
                {"match_id": "M6", "competition_type": "matchmaking"},
            ]}),
            serde_json::json!({"match_id": "M6", "demo_url": [demo_url]}),
        );
        let (platform_url, platform_handle) = start_platform(routes).await;

        let seen = Arc::new(Mutex::new(None));
        let factory = Arc::new(RefusingFactory {
            seen: Arc::clone(&seen),
        });
        let (server, port, server_handle) = start_service(platform_url, factory).await;

        let (status, body) = get(port, "/888").await;
        assert_eq!(status, 500);
        assert!(body.contains("decoder unavailable"), "body: {body}");

        let path = seen.lock().unwrap().clone().expect("factory reached");
        assert!(!path.exists(), "artifact should be deleted even when never opened");

        server.shutdown();
        server_handle.await.unwrap();
        platform_handle.abort();
        demo_handle.abort();
    }

    #[tokio::test]
    async fn platform_envelope_error_surfaces_as_server_error() {
        let routes = vec![(
            "/players?",
            serde_json::json!({"errors": [
                {"message": "rate limited", "code": "err_rl", "http_status": 429},
            ]})
            .to_string(),
        )];
        let (platform_url, platform_handle) = start_platform(routes).await;

        let factory = Arc::new(ScriptedFactory::new(vec![]));
        let (server, port, server_handle) = start_service(platform_url, factory).await;

        let (status, body) = get(port, "/777").await;
        assert_eq!(status, 500);
        assert!(body.contains("Could not find user with steam id: 777"), "body: {body}");

        server.shutdown();
        server_handle.await.unwrap();
        platform_handle.abort();
    }
}
