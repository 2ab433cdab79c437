//! Common test utilities

use std::time::Duration;

use bookcovers::config::CoverServiceConfig;
use bookcovers::models::{BookId, CoverId};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fixed book used by the slot scenarios
#[allow(dead_code)]
pub fn test_book_id() -> BookId {
    "9b0896fa-3880-4c2e-bfd6-925c87f22878".parse().unwrap()
}

/// Cover service configuration pointing at a mock server
#[allow(dead_code)]
pub fn mock_config(mock_server: &MockServer) -> CoverServiceConfig {
    CoverServiceConfig {
        request_timeout_secs: 30,
        requests_per_second: 100,
        ..CoverServiceConfig::default()
    }
    .with_base_url(mock_server.uri())
}

/// Path of a cover document on the cover service
#[allow(dead_code)]
pub fn cover_path(cover_id: &CoverId) -> String {
    format!("/api/bookcovers/{cover_id}")
}

/// 200 response carrying a cover document for `id`
#[allow(dead_code)]
pub fn cover_response(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "Id": id,
        "Content": "aW1hZ2U=",
    }))
}

/// Mount `response` for cover slot `slot` (1-based) of `book_id`
#[allow(dead_code)]
pub async fn mount_slot(
    mock_server: &MockServer,
    book_id: &BookId,
    slot: usize,
    response: ResponseTemplate,
) {
    Mock::given(method("GET"))
        .and(path(cover_path(&CoverId::for_slot(book_id, slot))))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

/// Mount a successful cover `B-{slot}` for every slot in `slots`, delayed by `delay`
#[allow(dead_code)]
pub async fn mount_ok_slots(
    mock_server: &MockServer,
    book_id: &BookId,
    slots: impl IntoIterator<Item = usize>,
    delay: Duration,
) {
    for slot in slots {
        let response = cover_response(&format!("B-{slot}")).set_delay(delay);
        mount_slot(mock_server, book_id, slot, response).await;
    }
}
