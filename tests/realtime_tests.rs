//! End-to-end tests: a real server on a loopback port, followed by the
//! HTTP transport and the reconnecting client.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use status_board::client::{FrameStream, StatusTransport};
use status_board::realtime::Frame;
use status_board::{
    ClientEvent, Config, HttpTransport, ReconnectPolicy, ServerError, Snapshot, StatusClient,
    StatusServer,
};

struct Running {
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl Running {
    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

async fn start(config: Config) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let server = StatusServer::from_config(config).unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(server.serve(listener, async move {
        let _ = rx.await;
    }));
    Running {
        url,
        shutdown: Some(tx),
        task,
    }
}

async fn next_frame(stream: &mut FrameStream, wait: Duration) -> Option<Frame> {
    match timeout(wait, stream.next()).await {
        Ok(Some(Ok(frame))) => Some(frame),
        Ok(Some(Err(e))) => panic!("stream failed: {e}"),
        Ok(None) => panic!("stream ended"),
        Err(_) => None,
    }
}

async fn next_snapshot(stream: &mut FrameStream) -> Snapshot {
    loop {
        match next_frame(stream, Duration::from_secs(5)).await {
            Some(Frame::Data(json)) => return serde_json::from_str(&json).unwrap(),
            Some(Frame::Heartbeat) => continue,
            None => panic!("no snapshot within 5s"),
        }
    }
}

/// Assert no data frame arrives within `wait`
async fn assert_quiet(stream: &mut FrameStream, wait: Duration) {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match next_frame(stream, remaining).await {
            Some(Frame::Data(json)) => panic!("unexpected frame: {json}"),
            Some(Frame::Heartbeat) => continue,
            None => return,
        }
    }
}

async fn post(url: &str, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{url}/api/status"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_post_produces_one_frame() {
    let server = start(Config::in_memory()).await;
    let transport = HttpTransport::new(server.url.clone()).unwrap();
    let mut stream = transport.open_stream().await.unwrap();

    assert!(next_snapshot(&mut stream).await.is_empty());

    let response = post(&server.url, json!({"name": "A", "activity": "home"})).await;
    assert!(response.status().is_success());

    let snapshot = next_snapshot(&mut stream).await;
    assert_eq!(snapshot.len(), 1);
    let member = snapshot.get("A").unwrap();
    assert_eq!(member.activity, "home");
    assert_eq!(member.state, "");

    assert_quiet(&mut stream, Duration::from_millis(500)).await;

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn test_burst_is_coalesced() {
    let config = Config {
        debounce: Duration::from_millis(500),
        ..Config::in_memory()
    };
    let server = start(config).await;
    let transport = HttpTransport::new(server.url.clone()).unwrap();
    let mut stream = transport.open_stream().await.unwrap();
    next_snapshot(&mut stream).await;

    for i in 0..5 {
        post(&server.url, json!({"name": "A", "activity": format!("step-{i}")})).await;
    }

    let snapshot = next_snapshot(&mut stream).await;
    assert_eq!(snapshot.get("A").unwrap().activity, "step-4");
    assert_quiet(&mut stream, Duration::from_millis(800)).await;

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn test_delete_missing_member_broadcasts_nothing() {
    let server = start(Config::in_memory()).await;
    let transport = HttpTransport::new(server.url.clone()).unwrap();
    let mut stream = transport.open_stream().await.unwrap();
    next_snapshot(&mut stream).await;

    let response = reqwest::Client::new()
        .delete(format!("{}/api/status/A", server.url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    assert_quiet(&mut stream, Duration::from_millis(500)).await;

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn test_heartbeat_reaches_idle_stream() {
    let config = Config {
        heartbeat: Duration::from_secs(1),
        ..Config::in_memory()
    };
    let server = start(config).await;
    let transport = HttpTransport::new(server.url.clone()).unwrap();
    let mut stream = transport.open_stream().await.unwrap();
    next_snapshot(&mut stream).await;

    let frame = next_frame(&mut stream, Duration::from_secs(3)).await;
    assert_eq!(frame, Some(Frame::Heartbeat));

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_ends_open_streams() {
    let server = start(Config::in_memory()).await;
    let transport = HttpTransport::new(server.url.clone()).unwrap();
    let mut stream = transport.open_stream().await.unwrap();
    next_snapshot(&mut stream).await;

    server.stop().await;

    let end = timeout(Duration::from_secs(5), stream.next()).await.unwrap();
    assert!(matches!(end, Some(Err(_))));
}

#[tokio::test]
async fn test_client_reports_status_changes() {
    let server = start(Config::in_memory()).await;
    let transport = Arc::new(HttpTransport::new(server.url.clone()).unwrap());
    let (handle, mut events) = StatusClient::new(transport, ReconnectPolicy::default()).spawn();

    let first = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
    assert_eq!(first, Some(ClientEvent::Snapshot(Snapshot::default())));

    post(&server.url, json!({"name": "A", "activity": "home"})).await;

    let changed = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
    match changed {
        Some(ClientEvent::StatusChanged { member }) => {
            assert_eq!(member.name, "A");
            assert_eq!(member.activity, "home");
        }
        other => panic!("expected StatusChanged, got {other:?}"),
    }
    let snapshot = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
    assert!(matches!(snapshot, Some(ClientEvent::Snapshot(s)) if s.len() == 1));

    handle.shutdown().await;
    server.stop().await;
}

#[tokio::test]
async fn test_client_falls_back_when_streaming_fails() {
    let server = start(Config::in_memory()).await;
    post(&server.url, json!({"name": "A", "activity": "home"})).await;

    /// Plain HTTP pulls only
    struct PollOnly(HttpTransport);

    #[async_trait::async_trait]
    impl StatusTransport for PollOnly {
        fn supports_streaming(&self) -> bool {
            false
        }

        async fn open_stream(&self) -> Result<FrameStream, status_board::client::ClientError> {
            self.0.open_stream().await
        }

        async fn fetch_snapshot(&self) -> Result<Snapshot, status_board::client::ClientError> {
            self.0.fetch_snapshot().await
        }
    }

    let transport = Arc::new(PollOnly(HttpTransport::new(server.url.clone()).unwrap()));
    let (handle, mut events) = StatusClient::new(transport, ReconnectPolicy::default()).spawn();

    let degraded = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
    assert_eq!(degraded, Some(ClientEvent::Degraded));
    let pulled = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
    assert!(matches!(pulled, Some(ClientEvent::Snapshot(s)) if s.get("A").is_some()));

    handle.shutdown().await;
    server.stop().await;
}
