//! End-to-end batch run flows against a mock server.
//!
//! Exercises the full launch → poll → aggregate path through ApiClient,
//! including status transitions across successive polls. Poll intervals are
//! shrunk to milliseconds so the flows stay fast.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use testlab_api_client::api::ApiClient;
use testlab_api_client::config::ApiConfig;
use testlab_api_client::executor::{BatchRunExecutor, ExecutorError, PollPolicy};
use testlab_api_client::output::MemorySink;

fn test_client(server: &MockServer) -> ApiClient {
    let config = ApiConfig {
        url_base: server.uri(),
        token: "test-token".to_string(),
        organization: "acme".to_string(),
        project: "mobile".to_string(),
        http_headers: Vec::new(),
    };
    ApiClient::new(config).expect("failed to create client")
}

fn fast_policy() -> PollPolicy {
    PollPolicy {
        initial_interval: Duration::from_millis(1),
        steady_interval: Duration::from_millis(1),
        backoff_threshold: Duration::from_millis(50),
        wait_limit: Duration::from_secs(60),
    }
}

fn run_body(number: u64, status: &str, succeeded: u64, failed: u64, total: u64) -> serde_json::Value {
    json!({
        "url": format!("https://app.testlab.io/acme/mobile/batch-run/{number}/"),
        "status": status,
        "batch_run_number": number,
        "test_cases": {
            "succeeded": succeeded, "failed": failed,
            "aborted": 0, "unresolved": 0, "total": total
        }
    })
}

#[tokio::test]
async fn single_run_polled_to_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/acme/mobile/batch-run/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(5, "running", 0, 0, 3)))
        .mount(&server)
        .await;
    // First poll still running, then terminal.
    Mock::given(method("GET"))
        .and(path("/api/v1.0/acme/mobile/batch-run/5/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(5, "running", 2, 0, 3)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1.0/acme/mobile/batch-run/5/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(5, "succeeded", 3, 0, 3)))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let executor = BatchRunExecutor::new(test_client(&server), &sink).with_policy(fast_policy());

    let outcome = executor.execute(0, "", true).await.expect("execute failed");

    assert_eq!(outcome.exit_code(), 0);
    let lines = sink.lines();
    assert!(lines.contains(&"https://app.testlab.io/acme/mobile/batch-run/5/".to_string()));
    assert!(lines.contains(&"2/3 finished".to_string()));
    assert!(lines.contains(&"batch run succeeded".to_string()));
}

#[tokio::test]
async fn cross_batch_run_group_polled_in_launch_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/acme/mobile/cross-batch-run/"))
        .and(body_partial_json(json!({"test_settings_number": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch_runs": [run_body(10, "running", 0, 0, 2), run_body(11, "running", 0, 0, 2)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1.0/acme/mobile/batch-run/10/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(10, "succeeded", 2, 0, 2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1.0/acme/mobile/batch-run/11/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(11, "failed", 1, 1, 2)))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let executor = BatchRunExecutor::new(test_client(&server), &sink).with_policy(fast_policy());

    let outcome = executor
        .execute(3, r#"{"model":"Pixel 4"}"#, true)
        .await
        .expect("execute failed");

    assert!(outcome.has_error);
    assert_eq!(outcome.exit_code(), 1);

    let lines = sink.lines();
    let wait_10 = lines.iter().position(|l| l.contains("#10 wait until"));
    let wait_11 = lines.iter().position(|l| l.contains("#11 wait until"));
    assert!(wait_10.unwrap() < wait_11.unwrap());
    assert!(lines.contains(&"batch run failed (1 failed)".to_string()));
}

#[tokio::test]
async fn unresolved_cases_surface_exit_code_two() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/acme/mobile/batch-run/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(8, "running", 0, 0, 5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1.0/acme/mobile/batch-run/8/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://app.testlab.io/acme/mobile/batch-run/8/",
            "status": "succeeded",
            "batch_run_number": 8,
            "test_cases": {"succeeded": 3, "failed": 0, "aborted": 0, "unresolved": 2, "total": 5}
        })))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let executor = BatchRunExecutor::new(test_client(&server), &sink).with_policy(fast_policy());

    let outcome = executor.execute(0, "", true).await.expect("execute failed");

    assert!(!outcome.has_error);
    assert!(outcome.has_unresolved);
    assert_eq!(outcome.exit_code(), 2);
    assert!(sink
        .lines()
        .contains(&"5/5 finished (2 unresolved)".to_string()));
}

#[tokio::test]
async fn fetch_failure_flags_error_but_keeps_polling_the_rest() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/acme/mobile/cross-batch-run/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch_runs": [run_body(20, "running", 0, 0, 1), run_body(21, "running", 0, 0, 1)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1.0/acme/mobile/batch-run/20/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server exploded"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1.0/acme/mobile/batch-run/21/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(21, "succeeded", 1, 0, 1)))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let executor = BatchRunExecutor::new(test_client(&server), &sink).with_policy(fast_policy());

    let outcome = executor
        .execute(0, r#"{"test_settings":[{"model":"Pixel 4"}]}"#, true)
        .await
        .expect("execute failed");

    assert!(outcome.has_error);
    assert_eq!(outcome.exit_code(), 1);
    let lines = sink.lines();
    assert!(lines
        .iter()
        .any(|l| l.contains("500 Internal Server Error") && l.contains("server exploded")));
    assert!(lines.contains(&"batch run succeeded".to_string()));
}

#[tokio::test]
async fn launch_failure_aborts_before_polling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/acme/mobile/batch-run/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let executor = BatchRunExecutor::new(test_client(&server), &sink).with_policy(fast_policy());

    let err = executor.execute(0, "", true).await.unwrap_err();

    match err {
        ExecutorError::Launch(api_err) => {
            let message = api_err.to_string();
            assert!(message.contains("401 Unauthorized"));
            assert!(message.contains("bad token"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Nothing was printed; the operation failed before any run existed.
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn budget_exhaustion_reports_never_finished() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/acme/mobile/batch-run/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(30, "running", 0, 0, 1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1.0/acme/mobile/batch-run/30/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body(30, "running", 0, 0, 1)))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let policy = PollPolicy {
        wait_limit: Duration::from_millis(3),
        ..fast_policy()
    };
    let executor = BatchRunExecutor::new(test_client(&server), &sink).with_policy(policy);

    let err = executor.execute(0, "", true).await.unwrap_err();
    assert!(matches!(err, ExecutorError::NeverFinished { .. }));
}
