use invento_client::adapters::{ApiResponse, RequestDescriptor};
use invento_client::domain::session::Role;
use invento_client::error::ApiError;
use invento_client::storage::KeyValueStore;
use invento_client::ui::Route;
use reqwest::{Method, StatusCode};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

mod common;

#[tokio::test]
async fn test_expired_access_is_refreshed_and_retried_once() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A0", Some("R1"), Role::Admin);

    let body = test.app.api.get("/alerts/").await.unwrap();

    assert_eq!(body, json!({"count": 0}));
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(test.api.alerts_calls.load(Ordering::SeqCst), 2, "original call plus one retry");
    assert_eq!(test.app.credentials.access_token().as_deref(), Some("A2"));
    assert_eq!(test.app.credentials.refresh_token().as_deref(), Some("R1"));
    assert!(test.app.session.is_authenticated());
    assert!(!test.api.refresh_saw_auth_header.load(Ordering::SeqCst), "refresh must not carry a bearer token");
}

#[tokio::test]
async fn test_missing_refresh_token_expires_session() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A0", None, Role::Admin);

    let err = test.app.api.get("/alerts/").await.unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(err.to_string(), "Session expired. Please login again.");
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 0);
    for key in ["access_token", "refresh_token", "user"] {
        assert_eq!(test.store.get(key), None, "{key} should be cleared");
    }
    assert_eq!(test.navigator.last(), Some(Route::Login));
    assert!(!test.app.session.is_authenticated());
}

#[tokio::test]
async fn test_rejected_refresh_expires_session() {
    let test = common::TestApp::spawn().await;
    test.api.refresh_fails.store(true, Ordering::SeqCst);
    test.seed_session("A0", Some("R1"), Role::Viewer);

    let err = test.app.api.get("/dashboard/").await.unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(test.store.is_empty());
    assert_eq!(test.navigator.history(), vec![Route::Login]);
}

#[tokio::test]
async fn test_second_401_is_returned_without_another_refresh() {
    let test = common::TestApp::spawn().await;
    test.api.stale_refresh.store(true, Ordering::SeqCst);
    test.seed_session("A0", Some("R1"), Role::Admin);

    let err = test.app.api.get("/alerts/").await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.to_string(), "Given token not valid for any token type");
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(test.api.alerts_calls.load(Ordering::SeqCst), 2);
    assert_eq!(test.app.credentials.access_token().as_deref(), Some("STALE"));
    assert!(test.navigator.last().is_none());
}

#[tokio::test]
async fn test_forbidden_is_not_refreshed() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A1", Some("R1"), Role::Viewer);

    let err = test.app.api.get("/forbidden/").await.unwrap_err();

    match &err {
        ApiError::Status { status, message, body } => {
            assert_eq!(*status, StatusCode::FORBIDDEN);
            assert_eq!(message, "Forbidden");
            assert_eq!(body.as_ref(), Some(&json!({"detail": "Forbidden"})));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 0);
    assert!(test.app.session.is_authenticated());
}

#[tokio::test]
async fn test_non_json_error_gets_generic_message() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A1", Some("R1"), Role::Admin);

    let err = test.app.api.get("/broken/").await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.to_string(), "An error occurred");
    assert!(matches!(err, ApiError::Status { body: None, .. }));
}

#[tokio::test]
async fn test_unauthenticated_401_is_decoded_not_refreshed() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A1", Some("R1"), Role::Admin);

    let request = RequestDescriptor::new(Method::POST, "/accounts/login/")
        .with_body(json!({"email": "a@b.com", "password": "wrong"}))
        .unauthenticated();
    let err = test.app.api.execute(request).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.to_string(), "No active account found with the given credentials");
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 0);
    assert!(test.app.session.is_authenticated());
}

#[tokio::test]
async fn test_concurrent_expiries_share_one_refresh() {
    let test = common::TestApp::spawn().await;
    test.api.refresh_delay_ms.store(100, Ordering::SeqCst);
    test.seed_session("A0", Some("R1"), Role::Admin);

    let calls = (0..5).map(|_| test.app.api.get("/alerts/"));
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert_eq!(result.unwrap(), json!({"count": 0}));
    }
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transport_failure_is_not_retried() {
    let test = common::TestApp::spawn_with(|config| {
        config.api.api_url = "http://127.0.0.1:9/api".to_string();
        config.api.request_timeout_secs = 2;
    })
    .await;
    test.seed_session("A1", Some("R1"), Role::Admin);

    let err = test.app.api.get("/alerts/").await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert!(test.app.session.is_authenticated(), "a network error must not end the session");
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_success_is_raw() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A1", Some("R1"), Role::Admin);

    let response = test.app.api.execute(RequestDescriptor::new(Method::DELETE, "/inventory/2/")).await.unwrap();

    match response {
        ApiResponse::Raw { status, bytes, .. } => {
            assert_eq!(status, StatusCode::NO_CONTENT);
            assert!(bytes.is_empty());
        }
        ApiResponse::Json(v) => panic!("expected raw response, got {v}"),
    }
}

#[tokio::test]
async fn test_typed_decode_mismatch() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A1", Some("R1"), Role::Admin);

    let err = test.app.api.get_json::<Vec<u32>>("/alerts/").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_download_refreshes_and_streams_to_file() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A0", Some("R1"), Role::Admin);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("report.csv");

    let query = vec![("file_format".to_string(), "csv".to_string()), ("status".to_string(), "expired".to_string())];
    let written = test.app.api.download("/reports/download/", query, &dest).await.unwrap();

    let contents = std::fs::read_to_string(&dest).unwrap();
    assert_eq!(written, contents.len() as u64);
    assert_eq!(contents, "sku,name,status\nWD-001,Widget,expired\n");
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_download_failure_reports_status() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A1", Some("R1"), Role::Admin);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("report.pdf");

    let query = vec![("file_format".to_string(), "pdf".to_string())];
    let err = test.app.api.download("/reports/download/", query, &dest).await.unwrap_err();

    assert_eq!(err.to_string(), "Download failed: 400");
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_refresh_finishing_after_logout_is_discarded() {
    let test = common::TestApp::spawn().await;
    test.api.refresh_delay_ms.store(300, Ordering::SeqCst);
    test.seed_session("A0", Some("R1"), Role::Admin);

    let api = Arc::clone(&test.app.api);
    let pending = tokio::spawn(async move { api.get("/alerts/").await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    test.app.session.logout().await;

    let err = pending.await.unwrap().unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(test.api.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(test.api.alerts_calls.load(Ordering::SeqCst), 1, "no retry after logout");
    for key in ["access_token", "refresh_token", "user"] {
        assert_eq!(test.store.get(key), None, "{key} should stay cleared");
    }
    assert!(!test.app.session.is_authenticated());
    assert_eq!(test.navigator.history(), vec![Route::Login]);
}

#[tokio::test]
async fn test_interrupted_download_leaves_no_file() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A1", Some("R1"), Role::Admin);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("report.csv");

    let err = test.app.api.download("/reports/truncated/", Vec::new(), &dest).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)), "unexpected error: {err:?}");
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0, "partial file should be removed");
}

#[tokio::test]
async fn test_download_replaces_existing_file_only_on_success() {
    let test = common::TestApp::spawn().await;
    test.seed_session("A1", Some("R1"), Role::Admin);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("report.csv");
    std::fs::write(&dest, "previous").unwrap();

    assert!(test.app.api.download("/reports/truncated/", Vec::new(), &dest).await.is_err());
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous");

    let query = vec![("file_format".to_string(), "csv".to_string())];
    test.app.api.download("/reports/download/", query, &dest).await.unwrap();
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "sku,name,status\nWD-001,Widget,\n");
}
