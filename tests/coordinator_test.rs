//! Fan-out integration tests against a mock cover service
//!
//! Covers the slot scenarios of the retrieval contract:
//! 1. All slots succeed: covers in slot order
//! 2. One slot fails: no covers at all
//! 3. A late failure cancels fetches that are still waiting on the network

mod common;

use std::time::{Duration, Instant};

use bookcovers::config::CoverServiceConfig;
use bookcovers::covers::FanOutCoordinator;
use bookcovers::models::{CoverRecord, FetchOutcome};
use bookcovers::utils::error::FetchError;
use wiremock::{MockServer, ResponseTemplate};

use common::{cover_response, mock_config, mount_ok_slots, mount_slot, test_book_id};

// ============================================================================
// All-success scenarios
// ============================================================================

#[tokio::test]
async fn test_all_slots_succeed_in_slot_order() {
    let mock_server = MockServer::start().await;
    let book_id = test_book_id();

    // Later slots answer first so completion order differs from slot order
    for slot in 1..=5 {
        let delay = Duration::from_millis(250 - slot as u64 * 50);
        mount_slot(
            &mock_server,
            &book_id,
            slot,
            cover_response(&format!("B-{slot}")).set_delay(delay),
        )
        .await;
    }

    let coordinator = FanOutCoordinator::from_config(&mock_config(&mock_server)).unwrap();
    let covers = coordinator.fetch_all_covers(&book_id).await.unwrap();

    let ids: Vec<&str> = covers.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["B-1", "B-2", "B-3", "B-4", "B-5"]);
}

#[tokio::test]
async fn test_more_slots_than_concurrency_limit() {
    let mock_server = MockServer::start().await;
    let book_id = test_book_id();
    mount_ok_slots(&mock_server, &book_id, 1..=8, Duration::from_millis(20)).await;

    let config = CoverServiceConfig {
        cover_slots: 8,
        max_concurrent_fetches: 3,
        ..mock_config(&mock_server)
    };
    let coordinator = FanOutCoordinator::from_config(&config).unwrap();
    let covers = coordinator.fetch_all_covers(&book_id).await.unwrap();

    assert_eq!(covers.len(), 8);
    for (i, cover) in covers.iter().enumerate() {
        assert_eq!(cover.id, format!("B-{}", i + 1));
    }
}

#[tokio::test]
async fn test_lowercase_bodies_decode() {
    let mock_server = MockServer::start().await;
    let book_id = test_book_id();
    for slot in 1..=5 {
        let body = format!(r#"{{"id":"B-{slot}"}}"#);
        mount_slot(
            &mock_server,
            &book_id,
            slot,
            ResponseTemplate::new(200).set_body_string(body),
        )
        .await;
    }

    let coordinator = FanOutCoordinator::from_config(&mock_config(&mock_server)).unwrap();
    let covers = coordinator.fetch_all_covers(&book_id).await.unwrap();

    let expected: Vec<CoverRecord> = (1..=5).map(|s| CoverRecord::new(format!("B-{s}"))).collect();
    assert_eq!(covers, expected);
}

// ============================================================================
// Failure scenarios
// ============================================================================

#[tokio::test]
async fn test_one_404_yields_no_covers() {
    let mock_server = MockServer::start().await;
    let book_id = test_book_id();
    mount_ok_slots(&mock_server, &book_id, [1, 3, 4, 5], Duration::ZERO).await;
    mount_slot(&mock_server, &book_id, 2, ResponseTemplate::new(404)).await;

    let coordinator = FanOutCoordinator::from_config(&mock_config(&mock_server)).unwrap();
    let covers = coordinator.fetch_all_covers(&book_id).await.unwrap();

    assert!(covers.is_empty(), "Partial results must not be returned");
}

#[tokio::test]
async fn test_every_outcome_is_reported() {
    let mock_server = MockServer::start().await;
    let book_id = test_book_id();
    mount_ok_slots(&mock_server, &book_id, [1, 3, 4, 5], Duration::ZERO).await;
    mount_slot(&mock_server, &book_id, 2, ResponseTemplate::new(404)).await;

    let coordinator = FanOutCoordinator::from_config(&mock_config(&mock_server)).unwrap();
    let report = coordinator.dispatch(&book_id).await.unwrap();

    assert_eq!(report.book_id(), &book_id);
    assert_eq!(report.outcomes().len(), 5);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcomes()[1],
        FetchOutcome::RemoteFailure(FetchError::NotFound)
    ));
    assert_eq!(
        report.succeeded() + report.failed() + report.cancelled(),
        5
    );
}

#[tokio::test]
async fn test_malformed_slot_yields_no_covers() {
    let mock_server = MockServer::start().await;
    let book_id = test_book_id();
    mount_ok_slots(&mock_server, &book_id, [1, 2, 3, 4], Duration::ZERO).await;
    mount_slot(
        &mock_server,
        &book_id,
        5,
        ResponseTemplate::new(200).set_body_string("{\"title\":\"no id\"}"),
    )
    .await;

    let coordinator = FanOutCoordinator::from_config(&mock_config(&mock_server)).unwrap();
    let covers = coordinator.fetch_all_covers(&book_id).await.unwrap();

    assert!(covers.is_empty());
}

#[tokio::test]
async fn test_late_failure_cancels_in_flight_fetches() {
    let mock_server = MockServer::start().await;
    let book_id = test_book_id();

    // Slots 1 and 3 finish first, slot 2 fails next, slots 4 and 5 hang
    mount_ok_slots(&mock_server, &book_id, [1, 3], Duration::ZERO).await;
    mount_slot(
        &mock_server,
        &book_id,
        2,
        ResponseTemplate::new(500).set_delay(Duration::from_millis(300)),
    )
    .await;
    mount_ok_slots(&mock_server, &book_id, [4, 5], Duration::from_secs(10)).await;

    let coordinator = FanOutCoordinator::from_config(&mock_config(&mock_server)).unwrap();

    let start = Instant::now();
    let report = coordinator.dispatch(&book_id).await.unwrap();
    let elapsed = start.elapsed();

    let outcomes = report.outcomes();
    assert!(outcomes[0].is_success());
    assert!(matches!(
        outcomes[1],
        FetchOutcome::RemoteFailure(FetchError::ServerError(500))
    ));
    assert!(outcomes[2].is_success());
    assert!(outcomes[3].is_cancelled(), "slot 4: {:?}", outcomes[3]);
    assert!(outcomes[4].is_cancelled(), "slot 5: {:?}", outcomes[4]);
    assert!(
        elapsed < Duration::from_secs(5),
        "Hanging fetches should be aborted, took {elapsed:?}"
    );

    assert!(report.into_covers().is_err());
}

#[tokio::test]
async fn test_late_failure_returns_empty_promptly() {
    let mock_server = MockServer::start().await;
    let book_id = test_book_id();
    mount_ok_slots(&mock_server, &book_id, [1, 3], Duration::ZERO).await;
    mount_slot(
        &mock_server,
        &book_id,
        2,
        ResponseTemplate::new(500).set_delay(Duration::from_millis(300)),
    )
    .await;
    mount_ok_slots(&mock_server, &book_id, [4, 5], Duration::from_secs(10)).await;

    let coordinator = FanOutCoordinator::from_config(&mock_config(&mock_server)).unwrap();

    let start = Instant::now();
    let covers = coordinator.fetch_all_covers(&book_id).await.unwrap();

    assert!(covers.is_empty());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_unreachable_service_yields_no_covers() {
    let config = CoverServiceConfig::default().with_base_url("http://127.0.0.1:1");
    let coordinator = FanOutCoordinator::from_config(&config).unwrap();

    let report = coordinator.dispatch(&test_book_id()).await.unwrap();
    assert_eq!(report.outcomes().len(), 5);
    assert!(report.failed() >= 1);
    assert_eq!(report.succeeded(), 0);
}
