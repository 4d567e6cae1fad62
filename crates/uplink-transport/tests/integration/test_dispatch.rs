//! Dispatcher wire format and per-host isolation

use std::time::Duration;

use uplink_core::domain::{HostResult, UploadError, UploadPayload};
use uplink_core::ports::UploadDispatcher;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, GameFolder, API_KEY, FILE_TEXT};

// ============================================================================
// Wire format
// ============================================================================

#[tokio::test]
async fn test_request_headers_and_compressed_json_body() {
    let folder = GameFolder::new();
    let file = folder.write_file(FILE_TEXT);
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header("content-encoding", "gzip"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(header("user-agent", "WowthingAutoUploader"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (dispatcher, _) = common::dispatcher(common::store(&folder, vec![server.uri()], 20));
    let report = dispatcher.upload(&file).await.unwrap();
    assert_eq!(report.delivered(), 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(
        request.headers.get("content-length").is_none(),
        "compressed body must not declare a length"
    );

    let decompressed = common::gunzip(&request.body).await;
    assert_eq!(
        decompressed,
        UploadPayload::new(API_KEY, FILE_TEXT).to_json().unwrap(),
        "decompressed body must equal the serialized payload byte for byte"
    );
    let json: serde_json::Value = serde_json::from_slice(&decompressed).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "apiKey": API_KEY, "fileContents": FILE_TEXT })
    );
}

#[tokio::test]
async fn test_host_with_trailing_slash_joins_cleanly() {
    let folder = GameFolder::new();
    let file = folder.write_file(FILE_TEXT);
    let server = common::mock_host(200, "").await;

    let (dispatcher, _) =
        common::dispatcher(common::store(&folder, vec![format!("{}/", server.uri())], 20));
    let report = dispatcher.upload(&file).await.unwrap();

    assert_eq!(report.outcomes[0].url, format!("{}/api/upload", server.uri()));
    assert_eq!(report.delivered(), 1);
}

#[tokio::test]
async fn test_file_read_at_dispatch_time() {
    let folder = GameFolder::new();
    let file = folder.write_file("old contents");
    let server = common::mock_host(200, "").await;
    let (dispatcher, _) = common::dispatcher(common::store(&folder, vec![server.uri()], 20));

    std::fs::write(&file, "new contents").unwrap();
    dispatcher.upload(&file).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let json: serde_json::Value =
        serde_json::from_slice(&common::gunzip(&requests[0].body).await).unwrap();
    assert_eq!(json["fileContents"], "new contents");
}

#[tokio::test]
async fn test_api_key_taken_from_current_snapshot() {
    let folder = GameFolder::new();
    let file = folder.write_file(FILE_TEXT);
    let server = common::mock_host(200, "").await;
    let store = common::store(&folder, vec![server.uri()], 20);
    let (dispatcher, _) = common::dispatcher(store.clone());

    store.update(|c| c.upload.api_key = "rotated-key".to_string()).unwrap();
    dispatcher.upload(&file).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let json: serde_json::Value =
        serde_json::from_slice(&common::gunzip(&requests[0].body).await).unwrap();
    assert_eq!(json["apiKey"], "rotated-key");
}

// ============================================================================
// Per-host isolation and status lines
// ============================================================================

#[tokio::test]
async fn test_success_then_rejection_logs_one_line_each() {
    let folder = GameFolder::new();
    let file = folder.write_file(FILE_TEXT);
    let ok = common::mock_host(200, "").await;
    let bad = common::mock_host(500, "boom").await;

    let (dispatcher, activity) =
        common::dispatcher(common::store(&folder, vec![ok.uri(), bad.uri()], 20));
    let report = dispatcher.upload(&file).await.unwrap();

    let rel = folder.relative().display().to_string();
    assert_eq!(
        activity.messages(),
        vec![
            format!("Uploading {rel}..."),
            format!("Uploaded {rel}"),
            "Upload failed: boom".to_string(),
        ]
    );
    assert_eq!(report.relative_path, folder.relative());
    assert_eq!(report.outcomes[0].result, HostResult::Delivered { status: 200 });
    assert_eq!(
        report.outcomes[1].result,
        HostResult::Rejected {
            status: 500,
            body: "boom".to_string()
        }
    );
}

#[tokio::test]
async fn test_every_host_attempted_in_order() {
    let folder = GameFolder::new();
    let file = folder.write_file(FILE_TEXT);
    let servers = vec![
        common::mock_host(503, "down").await,
        common::mock_host(200, "").await,
        common::mock_host(401, "bad key").await,
        common::mock_host(200, "").await,
    ];
    let hosts: Vec<String> = servers.iter().map(MockServer::uri).collect();

    let (dispatcher, _) = common::dispatcher(common::store(&folder, hosts.clone(), 20));
    let report = dispatcher.upload(&file).await.unwrap();

    assert_eq!(report.attempts(), 4);
    assert_eq!(report.delivered(), 2);
    assert_eq!(report.failed(), 2);
    let attempted: Vec<_> = report.outcomes.iter().map(|o| o.host.clone()).collect();
    assert_eq!(attempted, hosts);
    for server in &servers {
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_unreachable_host_does_not_stop_next() {
    let folder = GameFolder::new();
    let file = folder.write_file(FILE_TEXT);
    let good = common::mock_host(200, "").await;

    let (dispatcher, activity) = common::dispatcher(common::store(
        &folder,
        vec!["http://127.0.0.1:1".to_string(), good.uri()],
        20,
    ));
    let report = dispatcher.upload(&file).await.unwrap();

    assert!(matches!(
        report.outcomes[0].result,
        HostResult::TransportFailed { .. }
    ));
    assert!(report.outcomes[1].result.is_delivered());

    let messages = activity.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[1].starts_with("EXCEPTION: "));
    assert_eq!(messages[2], format!("Uploaded {}", folder.relative().display()));
}

#[tokio::test]
async fn test_timeout_is_a_transport_failure() {
    let folder = GameFolder::new();
    let file = folder.write_file(FILE_TEXT);
    let slow = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&slow)
        .await;
    let fast = common::mock_host(200, "").await;

    let (dispatcher, activity) =
        common::dispatcher(common::store(&folder, vec![slow.uri(), fast.uri()], 1));
    let report = dispatcher.upload(&file).await.unwrap();

    assert!(matches!(
        report.outcomes[0].result,
        HostResult::TransportFailed { .. }
    ));
    assert!(report.outcomes[1].result.is_delivered());
    assert!(activity.messages()[1].starts_with("EXCEPTION: "));
}

// ============================================================================
// Text decoding
// ============================================================================

async fn uploaded_contents(server: &MockServer) -> String {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let json: serde_json::Value =
        serde_json::from_slice(&common::gunzip(&requests[0].body).await).unwrap();
    json["fileContents"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_invalid_utf8_is_uploaded_with_replacement_character() {
    let folder = GameFolder::new();
    let file = folder.write_bytes(b"WWTCSaved = { [\"name\"] = \"caf\xe9\" }\n");
    let server = common::mock_host(200, "").await;
    let (dispatcher, activity) = common::dispatcher(common::store(&folder, vec![server.uri()], 20));

    let report = dispatcher.upload(&file).await.unwrap();

    assert_eq!(report.delivered(), 1);
    assert_eq!(
        uploaded_contents(&server).await,
        "WWTCSaved = { [\"name\"] = \"caf\u{fffd}\" }\n"
    );
    assert!(activity
        .messages()
        .iter()
        .all(|m| !m.starts_with("ERROR: unable to read")));
}

#[tokio::test]
async fn test_leading_bom_is_not_uploaded() {
    let folder = GameFolder::new();
    let file = folder.write_bytes(b"\xef\xbb\xbfWWTCSaved = {}\n");
    let server = common::mock_host(200, "").await;
    let (dispatcher, _) = common::dispatcher(common::store(&folder, vec![server.uri()], 20));

    dispatcher.upload(&file).await.unwrap();

    let contents = uploaded_contents(&server).await;
    assert!(!contents.starts_with('\u{feff}'));
    assert_eq!(contents, "WWTCSaved = {}\n");
}

// ============================================================================
// Aborted dispatches
// ============================================================================

#[tokio::test]
async fn test_unreadable_file_logs_error_and_posts_nothing() {
    let folder = GameFolder::new();
    let server = common::mock_host(200, "").await;
    let (dispatcher, activity) = common::dispatcher(common::store(&folder, vec![server.uri()], 20));

    let err = dispatcher.upload(&folder.file()).await.unwrap_err();

    assert!(matches!(err, UploadError::ReadFailed { .. }));
    let messages = activity.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with(&format!(
        "ERROR: unable to read {}: ",
        folder.relative().display()
    )));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_host_rejected_at_construction() {
    let folder = GameFolder::new();
    let store = common::store(&folder, vec!["not a url".to_string()], 20);
    let result = uplink_transport::MultiHostDispatcher::new(
        store,
        std::sync::Arc::new(uplink_audit::ActivityLog::default()),
    );
    assert!(matches!(result, Err(uplink_transport::TransportError::Hosts(_))));
}
