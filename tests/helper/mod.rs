//! Shared helpers for LSP end-to-end tests

#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tower_lsp::ClientSocket;
use tower_lsp::jsonrpc::{Request, Response};
use tower_lsp::lsp_types::{PublishDiagnosticsParams, Url};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to listen before concluding a message was never sent
pub const SILENCE_TIMEOUT: Duration = Duration::from_millis(300);

pub fn create_initialize_request(id: i64) -> Request {
    create_initialize_request_with_capabilities(id, json!({}))
}

/// Initialize request from a client that answers `workspace/configuration`
pub fn create_initialize_request_with_configuration(id: i64) -> Request {
    create_initialize_request_with_capabilities(
        id,
        json!({ "workspace": { "configuration": true } }),
    )
}

pub fn create_initialize_request_with_capabilities(id: i64, capabilities: Value) -> Request {
    Request::build("initialize")
        .params(json!({ "capabilities": capabilities }))
        .id(id)
        .finish()
}

pub fn create_initialized_notification() -> Request {
    Request::build("initialized").params(json!({})).finish()
}

pub fn create_did_open_notification(uri: &str, text: &str) -> Request {
    Request::build("textDocument/didOpen")
        .params(json!({
            "textDocument": {
                "uri": uri,
                "languageId": "sql",
                "version": 1,
                "text": text
            }
        }))
        .finish()
}

pub fn create_did_save_notification(uri: &str) -> Request {
    Request::build("textDocument/didSave")
        .params(json!({ "textDocument": { "uri": uri } }))
        .finish()
}

pub fn create_did_close_notification(uri: &str) -> Request {
    Request::build("textDocument/didClose")
        .params(json!({ "textDocument": { "uri": uri } }))
        .finish()
}

pub fn create_shutdown_request(id: i64) -> Request {
    Request::build("shutdown").id(id).finish()
}

pub fn create_did_change_configuration_notification(settings: Value) -> Request {
    Request::build("workspace/didChangeConfiguration")
        .params(json!({ "settings": settings }))
        .finish()
}

/// Writes a document to disk and returns it with its `file://` URI
pub fn create_document(content: &str) -> (NamedTempFile, String) {
    let mut file = tempfile::Builder::new()
        .suffix(".sql")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    let uri = Url::from_file_path(file.path()).unwrap().to_string();
    (file, uri)
}

/// Plays the editor side of the connection.
///
/// Every server-to-client message is forwarded to the returned channel.
/// Requests are answered: `workspace/configuration` with `settings` for each
/// requested item, anything else with `null`.
pub fn spawn_notification_collector(
    socket: ClientSocket,
    settings: Value,
) -> mpsc::UnboundedReceiver<Request> {
    spawn_client(socket, Some(settings))
}

/// Like [`spawn_notification_collector`], but `workspace/configuration`
/// requests are recorded and never answered
pub fn spawn_unresponsive_configuration_collector(
    socket: ClientSocket,
) -> mpsc::UnboundedReceiver<Request> {
    spawn_client(socket, None)
}

fn spawn_client(socket: ClientSocket, settings: Option<Value>) -> mpsc::UnboundedReceiver<Request> {
    let (tx, rx) = mpsc::unbounded_channel();
    let (mut stream, mut sink) = socket.split();

    tokio::spawn(async move {
        while let Some(request) = stream.next().await {
            if let Some(id) = request.id().cloned() {
                let result = if request.method() == "workspace/configuration" {
                    settings.as_ref().map(|settings| {
                        let items = request
                            .params()
                            .and_then(|p| p.get("items"))
                            .and_then(Value::as_array)
                            .map(Vec::len)
                            .unwrap_or(1);
                        Value::Array(vec![settings.clone(); items])
                    })
                } else {
                    Some(Value::Null)
                };

                if let Some(result) = result {
                    if sink.send(Response::from_ok(id, result)).await.is_err() {
                        break;
                    }
                }
            }

            if tx.send(request).is_err() {
                break;
            }
        }
    });

    rx
}

/// Waits for the next message with `method`, skipping everything before it
pub async fn wait_for_notification(
    rx: &mut mpsc::UnboundedReceiver<Request>,
    method: &str,
) -> Option<Request> {
    wait_for_notification_within(rx, method, WAIT_TIMEOUT).await
}

pub async fn wait_for_notification_within(
    rx: &mut mpsc::UnboundedReceiver<Request>,
    method: &str,
    timeout: Duration,
) -> Option<Request> {
    tokio::time::timeout(timeout, async {
        while let Some(request) = rx.recv().await {
            if request.method() == method {
                return Some(request);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Waits for a `window/logMessage` whose text contains `needle`
pub async fn wait_for_log_message(
    rx: &mut mpsc::UnboundedReceiver<Request>,
    needle: &str,
) -> Option<String> {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        while let Some(request) = rx.recv().await {
            if request.method() != "window/logMessage" {
                continue;
            }
            let message = request
                .params()
                .and_then(|p| p.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            if message.contains(needle) {
                return Some(message.to_string());
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

pub async fn wait_for_diagnostics(
    rx: &mut mpsc::UnboundedReceiver<Request>,
) -> Option<PublishDiagnosticsParams> {
    let notification = wait_for_notification(rx, "textDocument/publishDiagnostics").await?;
    serde_json::from_value(notification.params()?.clone()).ok()
}

/// Asserts that no diagnostics are published within [`SILENCE_TIMEOUT`]
pub async fn assert_no_diagnostics(rx: &mut mpsc::UnboundedReceiver<Request>) {
    let notification =
        wait_for_notification_within(rx, "textDocument/publishDiagnostics", SILENCE_TIMEOUT)
            .await;
    assert!(
        notification.is_none(),
        "unexpected publishDiagnostics: {:?}",
        notification
    );
}
