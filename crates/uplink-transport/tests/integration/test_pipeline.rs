//! End-to-end: file write → watcher → debouncer → queue → scheduler → hosts

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use uplink_sync::{TickOutcome, UploadPipeline};

use crate::common::{self, GameFolder, FILE_TEXT};

async fn received(server: &wiremock::MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_write_is_uploaded_to_every_host() {
    let folder = GameFolder::new();
    let a = common::mock_host(200, "").await;
    let b = common::mock_host(500, "nope").await;
    let store = common::store(&folder, vec![a.uri(), b.uri()], 20);
    let config = store.snapshot();
    let (dispatcher, activity) = common::dispatcher(store);

    let mut pipeline = UploadPipeline::new(&config, Arc::new(dispatcher), Arc::clone(&activity)).unwrap();
    assert!(pipeline.watch(config.watch_target()).is_active());
    let shutdown = CancellationToken::new();
    let scheduler = pipeline.spawn_scheduler(shutdown.clone());

    folder.write_file(FILE_TEXT);

    let deadline = Instant::now() + Duration::from_secs(10);
    while (received(&a).await == 0 || received(&b).await == 0) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    // One write may surface as several OS events; each is uploaded.
    assert!(received(&a).await >= 1, "upload never reached the first host");
    assert!(received(&b).await >= 1, "upload never reached the second host");

    while pipeline.gate().is_held() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(!pipeline.gate().is_held(), "gate must be released after the dispatch");

    let messages = activity.messages();
    assert!(messages.iter().any(|m| m == "Upload failed: nope"));
    assert!(messages
        .iter()
        .any(|m| m == &format!("Uploaded {}", folder.relative().display())));

    shutdown.cancel();
    scheduler.await.unwrap();
}

#[tokio::test]
async fn test_deleted_file_is_dropped_before_dispatch() {
    let folder = GameFolder::new();
    let server = common::mock_host(200, "").await;
    let store = common::store(&folder, vec![server.uri()], 20);
    let config = store.snapshot();
    let (dispatcher, activity) = common::dispatcher(store);
    let pipeline = UploadPipeline::new(&config, Arc::new(dispatcher), Arc::clone(&activity)).unwrap();

    let file = folder.write_file(FILE_TEXT);
    pipeline.notify_changed(&file).await.unwrap();
    std::fs::remove_file(&file).unwrap();

    let outcome = pipeline.scheduler().tick();
    assert!(matches!(outcome, TickOutcome::SourceMissing(_)));
    assert!(!pipeline.gate().is_held());
    assert!(activity.messages().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
