//! End-to-end tests against an in-process FEMS edge.

use fems_connect_core::{
    ConnectorMetrics, FemsConfig, FemsRuntime, Measurement, MeasurementSink, ReconnectPolicy,
    Supervisor,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
enum EdgeEvent {
    Connected(usize),
    Request(usize, Value),
    Disconnected(usize),
}

#[derive(Clone)]
struct EdgeScript {
    auth_error: bool,
    pushes: Vec<String>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("fems_connect_core=debug")
        .with_test_writer()
        .try_init();
}

/// Start a fake edge and return its `host:port` plus a feed of what it saw
async fn spawn_edge(script: EdgeScript) -> (String, mpsc::UnboundedReceiver<EdgeEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut conn = 0;
        while let Ok((tcp, _)) = listener.accept().await {
            conn += 1;
            tokio::spawn(serve(conn, tcp, script.clone(), tx.clone()));
        }
    });

    (addr.to_string(), rx)
}

async fn serve(
    conn: usize,
    tcp: TcpStream,
    script: EdgeScript,
    events: mpsc::UnboundedSender<EdgeEvent>,
) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
        return;
    };
    let _ = events.send(EdgeEvent::Connected(conn));

    while let Some(Ok(msg)) = ws.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let request: Value = serde_json::from_str(text.as_str()).unwrap();
        let _ = events.send(EdgeEvent::Request(conn, request.clone()));

        let reply = match request["method"].as_str() {
            Some("authenticateWithPassword") if script.auth_error => json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": {"code": 1, "message": "bad password"}
            }),
            _ => json!({"jsonrpc": "2.0", "id": request["id"], "error": null}),
        };
        if ws.send(Message::text(reply.to_string())).await.is_err() {
            break;
        }

        if request["method"] == "edgeRpc" {
            for push in &script.pushes {
                if ws.send(Message::text(push.clone())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = events.send(EdgeEvent::Disconnected(conn));
}

/// Collect edge events until `done` matches one of them
async fn wait_for(
    events: &mut mpsc::UnboundedReceiver<EdgeEvent>,
    seen: &mut Vec<EdgeEvent>,
    done: impl Fn(&EdgeEvent) -> bool,
) {
    timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            let finished = done(&event);
            seen.push(event);
            if finished {
                return;
            }
        }
    })
    .await
    .expect("edge event did not arrive");
}

fn config_for(url: String) -> FemsConfig {
    FemsConfig {
        url,
        channels: vec!["ch1".to_string(), "ch2".to_string()],
        ..FemsConfig::default()
    }
}

#[tokio::test]
async fn test_push_event_becomes_one_measurement() {
    init_tracing();
    let push = json!({
        "method": "event",
        "params": {"method": "x", "payload": {"params": {"ch1": 42, "ch2": null}}}
    });
    let (url, mut events) = spawn_edge(EdgeScript {
        auth_error: false,
        pushes: vec![push.to_string()],
    })
    .await;

    let (tx, mut measurements) = mpsc::unbounded_channel::<Measurement>();
    let mut runtime = FemsRuntime::new(&config_for(url)).unwrap();
    runtime.start(Arc::new(tx)).unwrap();

    let measurement = timeout(Duration::from_secs(5), measurements.recv())
        .await
        .expect("no measurement emitted")
        .unwrap();
    assert_eq!(measurement.source, "fems");
    assert_eq!(&measurement.fields, json!({"ch1": 42}).as_object().unwrap());

    assert!(timeout(Duration::from_millis(300), measurements.recv())
        .await
        .is_err());

    let snapshot = runtime.metrics().snapshot();
    assert_eq!(snapshot.batches, 1);
    assert_eq!(snapshot.missing_channels, 1);
    assert!(snapshot.connected);

    runtime.stop().await;
    assert!(!runtime.is_running());

    let mut seen = Vec::new();
    wait_for(&mut events, &mut seen, |e| *e == EdgeEvent::Disconnected(1)).await;

    let methods: Vec<&str> = seen
        .iter()
        .filter_map(|e| match e {
            EdgeEvent::Request(_, request) => request["method"].as_str(),
            _ => None,
        })
        .collect();
    assert_eq!(methods, vec!["authenticateWithPassword", "edgeRpc"]);

    let subscribe = seen
        .iter()
        .find_map(|e| match e {
            EdgeEvent::Request(_, request) if request["method"] == "edgeRpc" => Some(request),
            _ => None,
        })
        .unwrap();
    assert_eq!(subscribe["params"]["edgeId"], "0");
    assert_eq!(subscribe["params"]["payload"]["params"]["channels"], json!(["ch1", "ch2"]));
}

#[tokio::test]
async fn test_rejected_login_reconnects_until_stopped() {
    init_tracing();
    let (url, mut events) = spawn_edge(EdgeScript {
        auth_error: true,
        pushes: Vec::new(),
    })
    .await;

    let (tx, mut measurements) = mpsc::unbounded_channel::<Measurement>();
    let sink: Arc<dyn MeasurementSink> = Arc::new(tx);
    let metrics = Arc::new(ConnectorMetrics::new("test"));
    let shutdown = CancellationToken::new();

    let supervisor = Supervisor::new(
        config_for(url).target().unwrap(),
        ReconnectPolicy::fixed(Duration::from_millis(300)),
        sink,
        metrics.clone(),
        shutdown.clone(),
    );
    let handle = tokio::spawn(supervisor.run());

    // First attempt is rejected, then the supervisor dials again after the delay
    let mut seen = Vec::new();
    wait_for(&mut events, &mut seen, |e| *e == EdgeEvent::Connected(2)).await;

    let first_conn_methods: Vec<&str> = seen
        .iter()
        .filter_map(|e| match e {
            EdgeEvent::Request(1, request) => request["method"].as_str(),
            _ => None,
        })
        .collect();
    assert_eq!(first_conn_methods, vec!["authenticateWithPassword"]);

    // Let the second login fail too, then stop while the supervisor waits
    wait_for(&mut events, &mut seen, |e| matches!(e, EdgeEvent::Request(2, _))).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();

    timeout(Duration::from_secs(2), handle)
        .await
        .expect("supervisor kept running after shutdown")
        .unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    assert!(seen.contains(&EdgeEvent::Disconnected(1)));
    assert!(!seen.contains(&EdgeEvent::Connected(3)));
    assert!(!seen.iter().any(|e| matches!(
        e,
        EdgeEvent::Request(_, request) if request["method"] == "edgeRpc"
    )));
    assert!(measurements.try_recv().is_err());
    assert_eq!(metrics.snapshot().connect_attempts, 2);
    assert!(!metrics.snapshot().connected);
}
