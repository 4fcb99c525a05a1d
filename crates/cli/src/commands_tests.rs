use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use session::{EndpointAddress, TransportFailureMode};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use super::*;

/// Serves one connection, answering each request with the `result`
/// envelope from `respond`. The connection is closed right after answering
/// a request for `hang_up_after`.
async fn fake_service<F>(respond: F, hang_up_after: Option<&'static str>) -> SessionConfig
where
    F: Fn(&Value) -> Value + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        while let Some(Ok(message)) = ws.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let request: Value = serde_json::from_str(&text).unwrap();
            let reply = json!({ "jsonrpc": "2.0", "id": request["id"], "result": respond(&request) });
            ws.send(Message::Text(reply.to_string())).await.unwrap();
            if hang_up_after.is_some_and(|method| request["method"] == method) {
                break;
            }
        }
        let _ = ws.close(None).await;
    });

    SessionConfig {
        address: EndpointAddress::new(format!("127.0.0.1:{port}")).unwrap(),
        transport_failure_mode: TransportFailureMode::ReportAndReject,
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn test_watch_ends_when_the_service_hangs_up() {
    let config = fake_service(|_| json!({ "success": true }), Some("SubscribeVariable")).await;
    let command = Command::Watch {
        variables: vec!["speed".to_string()],
        interval: 50,
    };

    let outcome = tokio::time::timeout(Duration::from_secs(5), run(command, config))
        .await
        .expect("watch kept waiting after the connection closed");

    assert!(outcome.is_ok(), "{outcome:?}");
}

#[tokio::test]
async fn test_watch_setup_failure_keeps_the_remote_error() {
    let config = fake_service(
        |request| {
            if request["method"] == "EnableEvents" {
                json!({ "success": false, "error": { "message": "events unavailable" } })
            } else {
                json!({ "success": true })
            }
        },
        None,
    )
    .await;
    let command = Command::Watch {
        variables: Vec::new(),
        interval: 100,
    };

    let err = tokio::time::timeout(Duration::from_secs(5), run(command, config))
        .await
        .unwrap()
        .unwrap_err();

    let Some(SessionError::Call(CallError::Remote(remote))) = err.downcast_ref::<SessionError>()
    else {
        panic!("expected a remote call failure, got {err:#}");
    };
    assert_eq!(remote.message(), Some("events unavailable"));
}
