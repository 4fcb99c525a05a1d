//! End-to-end tests: a `session::Session` talking to a scripted WebSocket
//! server through `WsConnector`.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use session::{
    BaseClient, CallError, CloseInfo, DispatchMode, EndpointAddress, EventName, ExtendedClient,
    RpcProtocol, ServerError, Session, TransportError, TransportFailureMode,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};
use ws_rpc::{WsConnector, WsRpcClient};

type ServerSocket = WebSocketStream<TcpStream>;

const WAIT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Scripted server
// ---------------------------------------------------------------------------

/// Accepts one connection on an ephemeral port and runs `script` on it.
async fn serve<F, Fut>(script: F) -> EndpointAddress
where
    F: FnOnce(ServerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = accept_async(tcp).await.unwrap();
        script(ws).await;
    });
    EndpointAddress::new(format!("127.0.0.1:{port}")).unwrap()
}

async fn next_request(ws: &mut ServerSocket) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("connection ended while waiting for a request: {other:?}"),
        }
    }
}

async fn send(ws: &mut ServerSocket, frame: Value) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

fn answer(request: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": request["id"], "result": result })
}

async fn drain(mut ws: ServerSocket) {
    while ws.next().await.is_some() {}
}

async fn connect(address: EndpointAddress) -> Session {
    Session::builder(address)
        .transport_failure_mode(TransportFailureMode::ReportAndReject)
        .connect(&WsConnector::new())
        .await
        .unwrap()
}

/// Protocol client without a session on top, for checks below the adapter.
async fn raw_client(address: &EndpointAddress) -> WsRpcClient {
    let url = address.ws_url();
    let (stream, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    let observer = Session::builder(address.clone()).forwarder();
    WsRpcClient::spawn(url, stream, observer)
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_success_and_remote_failure_round_trip() {
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let address = serve(move |mut ws| async move {
        let request = next_request(&mut ws).await;
        seen_tx.send(request.clone()).unwrap();
        send(&mut ws, answer(&request, json!({ "success": true, "data": "3.0" }))).await;

        let request = next_request(&mut ws).await;
        seen_tx.send(request.clone()).unwrap();
        send(
            &mut ws,
            answer(&request, json!({ "success": false, "error": { "message": "not found" } })),
        )
        .await;
        drain(ws).await;
    })
    .await;

    let session = connect(address).await;

    assert_eq!(session.get_app_version().await.unwrap(), json!("3.0"));
    let err = session.get_comm_port_info("bad").await.unwrap_err();
    assert_eq!(
        err.as_remote().unwrap().descriptor(),
        &json!({ "message": "not found" })
    );

    let first = seen_rx.recv().await.unwrap();
    assert_eq!(first["jsonrpc"], "2.0");
    assert_eq!(first["method"], "GetAppVersion");
    assert_eq!(first["params"], json!([]));
    let second = seen_rx.recv().await.unwrap();
    assert_eq!(second["method"], "GetCommPortInfo");
    assert_eq!(second["params"], json!(["bad"]));
    assert_ne!(first["id"], second["id"]);
}

#[tokio::test]
async fn test_out_of_order_answers_reach_their_callers() {
    let address = serve(|mut ws| async move {
        let first = next_request(&mut ws).await;
        let second = next_request(&mut ws).await;
        for request in [&second, &first] {
            let name = request["params"][0].clone();
            send(&mut ws, answer(request, json!({ "success": true, "data": name }))).await;
        }
        drain(ws).await;
    })
    .await;

    let session = connect(address).await;
    let (a, b) = tokio::join!(session.read_variable("a"), session.read_variable("b"));

    assert_eq!(a.unwrap(), json!("a"));
    assert_eq!(b.unwrap(), json!("b"));
}

#[tokio::test]
async fn test_unreadable_and_unmatched_frames_are_ignored() {
    let address = serve(|mut ws| async move {
        let request = next_request(&mut ws).await;
        ws.send(Message::Text("not json".into())).await.unwrap();
        send(
            &mut ws,
            json!({ "jsonrpc": "2.0", "id": 9999, "result": { "success": true, "data": "stray" } }),
        )
        .await;
        send(&mut ws, answer(&request, json!({ "success": true, "data": 42 }))).await;
        drain(ws).await;
    })
    .await;

    let session = connect(address).await;

    assert_eq!(session.is_board_detected().await.unwrap(), json!(42));
}

#[tokio::test]
async fn test_abandoned_calls_leave_nothing_pending() {
    let address = serve(drain).await;
    let client = raw_client(&address).await;

    for _ in 0..100 {
        let outcome = tokio::time::timeout(
            Duration::from_millis(1),
            client.call("GetAppVersion", Vec::new()),
        )
        .await;
        assert!(outcome.is_err(), "the server never answers");
    }

    assert_eq!(client.pending_calls(), 0);
}

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rpc_error_takes_the_side_channel() {
    let address = serve(|mut ws| async move {
        let request = next_request(&mut ws).await;
        send(
            &mut ws,
            json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": { "code": -32601, "message": "Method not found" }
            }),
        )
        .await;
        drain(ws).await;
    })
    .await;

    let reports = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&reports);
    let session = Session::builder(address)
        .transport_failure_mode(TransportFailureMode::ReportAndReject)
        .on_server_error(move |_err: &ServerError| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .connect(&WsConnector::new())
        .await
        .unwrap();

    let err = session.call("NoSuchMethod", vec![]).await.unwrap_err();

    let CallError::Transport(server_error) = err else {
        panic!("expected transport failure, got {err:?}");
    };
    assert_eq!(server_error.method.as_str(), "NoSuchMethod");
    assert_eq!(
        server_error.error,
        TransportError::Rpc {
            code: -32601,
            message: "Method not found".into()
        }
    );
    assert_eq!(reports.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dropped_connection_fails_pending_calls_and_reports_close() {
    let address = serve(|mut ws| async move {
        let _request = next_request(&mut ws).await;
        drop(ws);
    })
    .await;

    let (closed_tx, mut closed_rx) = mpsc::unbounded_channel();
    let session = Session::builder(address)
        .transport_failure_mode(TransportFailureMode::ReportAndReject)
        .on_close(move |close: &CloseInfo| {
            let _ = closed_tx.send(close.clone());
        })
        .connect(&WsConnector::new())
        .await
        .unwrap();

    let err = session.start_recorder(0).await.unwrap_err();
    let CallError::Transport(server_error) = err else {
        panic!("expected transport failure, got {err:?}");
    };
    assert_eq!(server_error.error, TransportError::ConnectionClosed);

    tokio::time::timeout(WAIT, closed_rx.recv())
        .await
        .expect("close was not reported")
        .unwrap();

    let err = session.stop_recorder(0).await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_dropped_connection_leaves_call_pending_in_report_only_mode() {
    let address = serve(|mut ws| async move {
        let _request = next_request(&mut ws).await;
        drop(ws);
    })
    .await;

    let reports = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&reports);
    let session = Session::builder(address)
        .on_server_error(move |_err: &ServerError| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .connect(&WsConnector::new())
        .await
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(500), session.stop_comm()).await;

    assert!(outcome.is_err(), "call must stay pending");
    assert_eq!(reports.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refused_connection_is_reported_to_on_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (error_tx, mut error_rx) = mpsc::unbounded_channel();
    let result = Session::builder(EndpointAddress::new(format!("127.0.0.1:{port}")).unwrap())
        .on_error(move |err: &TransportError| {
            let _ = error_tx.send(err.clone());
        })
        .connect(&WsConnector::new())
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, TransportError::Connect { .. }));
    assert_eq!(error_rx.recv().await.unwrap(), err);
}

#[tokio::test]
async fn test_close_ends_the_session() {
    let address = serve(drain).await;

    let (closed_tx, mut closed_rx) = mpsc::unbounded_channel();
    let session = Session::builder(address)
        .transport_failure_mode(TransportFailureMode::ReportAndReject)
        .on_close(move |close: &CloseInfo| {
            let _ = closed_tx.send(close.clone());
        })
        .connect(&WsConnector::new())
        .await
        .unwrap();

    session.close().await;

    tokio::time::timeout(WAIT, closed_rx.recv())
        .await
        .expect("close was not reported")
        .unwrap();
    assert!(session.get_app_version().await.unwrap_err().is_transport());
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_notifications_reach_handlers_after_activation() {
    let address = serve(|mut ws| async move {
        let request = next_request(&mut ws).await;
        assert_eq!(request["method"], "EnableEvents");
        send(&mut ws, answer(&request, json!({ "success": true }))).await;
        send(
            &mut ws,
            json!({ "jsonrpc": "2.0", "method": "OnMystery", "params": [1] }),
        )
        .await;
        send(
            &mut ws,
            json!({ "jsonrpc": "2.0", "method": "OnVariableChanged", "params": ["speed", 5] }),
        )
        .await;
        send(&mut ws, json!({ "jsonrpc": "2.0", "method": "OnRecorderDone" })).await;
        drain(ws).await;
    })
    .await;

    let session = connect(address).await;
    let extended = session.activate();

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    for event in [EventName::VariableChanged, EventName::RecorderDone] {
        let events_tx = events_tx.clone();
        extended.set_event_handler(
            event,
            Arc::new(move |args: &[Value]| {
                let _ = events_tx.send((event, args.to_vec()));
            }),
        );
    }

    assert_eq!(extended.enable_events(true).await.unwrap(), Value::Null);

    let first = tokio::time::timeout(WAIT, events_rx.recv()).await.unwrap();
    assert_eq!(
        first,
        Some((EventName::VariableChanged, vec![json!("speed"), json!(5)]))
    );
    let second = tokio::time::timeout(WAIT, events_rx.recv()).await.unwrap();
    assert_eq!(second, Some((EventName::RecorderDone, Vec::new())));
}

#[tokio::test]
async fn test_named_dispatch_passes_params_as_one_argument() {
    let (registered_tx, registered_rx) = oneshot::channel::<()>();
    let address = serve(move |mut ws| async move {
        registered_rx.await.unwrap();
        send(
            &mut ws,
            json!({ "jsonrpc": "2.0", "method": "OnTrace", "params": [1, 2, 3] }),
        )
        .await;
        send(
            &mut ws,
            json!({ "jsonrpc": "2.0", "method": "OnTrace", "params": { "channel": "a" } }),
        )
        .await;
        drain(ws).await;
    })
    .await;

    let client = raw_client(&address).await;
    let (args_tx, mut args_rx) = mpsc::unbounded_channel();
    client.dispatch(
        "OnTrace",
        DispatchMode::Named,
        Arc::new(move |args: &[Value]| {
            let _ = args_tx.send(args.to_vec());
        }),
    );
    registered_tx.send(()).unwrap();

    let first = tokio::time::timeout(WAIT, args_rx.recv()).await.unwrap();
    assert_eq!(first, Some(vec![json!([1, 2, 3])]));
    let second = tokio::time::timeout(WAIT, args_rx.recv()).await.unwrap();
    assert_eq!(second, Some(vec![json!({ "channel": "a" })]));
    assert_eq!(client.registered_methods(), vec!["OnTrace".to_string()]);
}
