#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use invento_client::config::{ApiConfig, Config};
use invento_client::domain::session::{Role, UserProfile};
use invento_client::storage::{KeyValueStore, MemoryStore};
use invento_client::ui::{FixedAnswer, HistoryNavigator};
use invento_client::{App, AppBuilder};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("invento_client=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// Server-side state of the mock Invento API.
#[derive(Debug)]
pub struct MockApi {
    /// The only access token protected routes accept.
    pub valid_token: Mutex<String>,
    pub refresh_calls: AtomicUsize,
    pub refresh_fails: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    pub refresh_saw_auth_header: AtomicBool,
    /// Refresh hands out a token that protected routes still reject.
    pub stale_refresh: AtomicBool,
    pub logout_calls: AtomicUsize,
    pub logout_status: AtomicU16,
    pub logout_body: Mutex<Option<Value>>,
    /// Logout rejects requests without a valid access token.
    pub logout_requires_auth: AtomicBool,
    /// Every request that reaches the alerts route, rejected ones included.
    pub alerts_calls: AtomicUsize,
    pub dashboard_calls: AtomicUsize,
    pub forbidden_calls: AtomicUsize,
    pub items: Mutex<Vec<Value>>,
    pub deleted: Mutex<Vec<i64>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            valid_token: Mutex::new("A1".to_string()),
            refresh_calls: AtomicUsize::new(0),
            refresh_fails: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
            refresh_saw_auth_header: AtomicBool::new(false),
            stale_refresh: AtomicBool::new(false),
            logout_calls: AtomicUsize::new(0),
            logout_status: AtomicU16::new(200),
            logout_body: Mutex::new(None),
            logout_requires_auth: AtomicBool::new(false),
            alerts_calls: AtomicUsize::new(0),
            dashboard_calls: AtomicUsize::new(0),
            forbidden_calls: AtomicUsize::new(0),
            items: Mutex::new(sample_items()),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

impl MockApi {
    /// Makes the server reject every access token issued so far.
    pub fn rotate_token(&self, token: &str) {
        *self.valid_token.lock().unwrap() = token.to_string();
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(expected.as_str())
    }
}

pub fn sample_items() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Widget", "sku": "WD-001", "category_name": "Hardware", "quantity": 5,
               "unit_price": "10.00", "reorder_level": 10}),
        json!({"id": 2, "name": "Gadget", "sku": "GD-001", "category_name": "Electronics", "quantity": 100,
               "unit_price": "250.50", "reorder_level": 20}),
        json!({"id": 3, "name": "Milk", "sku": "FD-001", "category_name": "Food", "quantity": 40,
               "unit_price": "1.25", "expiry_date": "2020-01-01"}),
    ]
}

fn admin_user() -> Value {
    json!({"id": 1, "email": "a@b.com", "first_name": "Asha", "last_name": "Rao", "role": "admin"})
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"})),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("a@b.com"), Some("x")) => {
            Json(json!({"access": "A1", "refresh": "R1", "user": admin_user()})).into_response()
        }
        (Some("v@b.com"), Some("x")) => Json(json!({
            "access": "A1",
            "refresh": "R1",
            "user": {"id": 2, "email": "v@b.com", "role": "viewer"}
        }))
        .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response(),
    }
}

async fn refresh(State(api): State<Arc<MockApi>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if headers.contains_key(header::AUTHORIZATION) {
        api.refresh_saw_auth_header.store(true, Ordering::SeqCst);
    }

    let delay = api.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if api.refresh_fails.load(Ordering::SeqCst) || body["refresh"] != "R1" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token is invalid or expired"}))).into_response();
    }

    if api.stale_refresh.load(Ordering::SeqCst) {
        return Json(json!({"access": "STALE"})).into_response();
    }
    api.rotate_token("A2");
    Json(json!({"access": "A2"})).into_response()
}

async fn logout(State(api): State<Arc<MockApi>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    api.logout_calls.fetch_add(1, Ordering::SeqCst);
    *api.logout_body.lock().unwrap() = Some(body);
    if api.logout_requires_auth.load(Ordering::SeqCst) && !api.authorized(&headers) {
        return unauthorized();
    }
    let status = StatusCode::from_u16(api.logout_status.load(Ordering::SeqCst)).unwrap();
    (status, Json(json!({}))).into_response()
}

async fn profile(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let mut user = admin_user();
    user["first_name"] = json!("Asha Updated");
    Json(user).into_response()
}

async fn list_items(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let items = api.items.lock().unwrap().clone();
    Json(json!({"count": items.len(), "results": items})).into_response()
}

async fn create_item(State(api): State<Arc<MockApi>>, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let mut items = api.items.lock().unwrap();
    if items.iter().any(|i| i["sku"] == body["sku"]) {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "An item with this SKU already exists."})))
            .into_response();
    }
    body["id"] = json!(items.len() + 100);
    body["unit_price"] = json!(format!("{:.2}", body["unit_price"].as_f64().unwrap_or_default()));
    items.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_item(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let mut items = api.items.lock().unwrap();
    let Some(item) = items.iter_mut().find(|i| i["id"] == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response();
    };
    for (k, v) in body.as_object().unwrap() {
        item[k] = v.clone();
    }
    Json(item.clone()).into_response()
}

async fn delete_item(State(api): State<Arc<MockApi>>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let mut items = api.items.lock().unwrap();
    let before = items.len();
    items.retain(|i| i["id"] != id);
    if items.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response();
    }
    api.deleted.lock().unwrap().push(id);
    StatusCode::NO_CONTENT.into_response()
}

async fn dashboard(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let n = api.dashboard_calls.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "total_items": 3,
        "low_stock_count": 1,
        "expired_items_count": 1,
        "total_stock_value": "25100.00",
        "stock_trend": [{"date": "2026-10-15", "total_items": 2}, {"date": "2026-10-16", "total_items": n}],
        "category_distribution": [{"category_name": "Hardware", "count": 1}]
    }))
    .into_response()
}

async fn alerts(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    api.alerts_calls.fetch_add(1, Ordering::SeqCst);
    if !api.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"count": 0})).into_response()
}

async fn report_summary(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "total_items": 3,
        "total_value": "25100.00",
        "low_stock_count": 1,
        "expired_count": 1,
        "filters_applied": {
            "start_date": params.get("start_date"),
            "end_date": params.get("end_date"),
            "status": params.get("status"),
        }
    }))
    .into_response()
}

async fn report_download(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    match params.get("file_format").map(String::as_str) {
        Some("csv") => {
            let status = params.get("status").cloned().unwrap_or_default();
            ([(header::CONTENT_TYPE, "text/csv")], format!("sku,name,status\nWD-001,Widget,{status}\n"))
                .into_response()
        }
        _ => (StatusCode::BAD_REQUEST, Json(json!({"detail": "Unsupported format"}))).into_response(),
    }
}

/// Sends the start of a CSV file, then fails the body mid-stream.
async fn truncated_download(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        return unauthorized();
    }
    let head = stream::once(async { Ok::<_, std::io::Error>(Bytes::from_static(b"sku,name\nWD-001,Wid")) });
    let failure = stream::once(async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Err(std::io::Error::other("connection reset"))
    });
    ([(header::CONTENT_TYPE, "text/csv")], Body::from_stream(head.chain(failure))).into_response()
}

async fn forbidden(State(api): State<Arc<MockApi>>) -> Response {
    api.forbidden_calls.fetch_add(1, Ordering::SeqCst);
    (StatusCode::FORBIDDEN, Json(json!({"detail": "Forbidden"}))).into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, [(header::CONTENT_TYPE, "text/plain")], "boom").into_response()
}

fn router(api: Arc<MockApi>) -> Router {
    Router::new()
        .route("/api/accounts/login/", post(login))
        .route("/api/accounts/token/refresh/", post(refresh))
        .route("/api/accounts/logout/", post(logout))
        .route("/api/accounts/profile/", get(profile))
        .route("/api/inventory/", get(list_items).post(create_item))
        .route("/api/inventory/{id}/", patch(update_item).delete(delete_item))
        .route("/api/dashboard/", get(dashboard))
        .route("/api/alerts/", get(alerts))
        .route("/api/reports/summary/", get(report_summary))
        .route("/api/reports/download/", get(report_download))
        .route("/api/reports/truncated/", get(truncated_download))
        .route("/api/forbidden/", get(forbidden))
        .route("/api/broken/", get(broken))
        .with_state(api)
}

/// Captured terminal output of the toast manager.
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub struct TestApp {
    pub server_url: String,
    pub api: Arc<MockApi>,
    pub app: App,
    pub store: Arc<MemoryStore>,
    pub navigator: Arc<HistoryNavigator>,
    pub toasts: SharedBuf,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut Config)) -> Self {
        setup_tracing();

        let api = Arc::new(MockApi::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app_router = router(Arc::clone(&api));
        tokio::spawn(async move {
            axum::serve(listener, app_router).await.unwrap();
        });

        let server_url = format!("http://{addr}");
        let mut config = Config {
            api: ApiConfig { api_url: format!("{server_url}/api"), request_timeout_secs: 5 },
            ..Config::default()
        };
        configure(&mut config);

        let store = Arc::new(MemoryStore::new());
        let navigator = Arc::new(HistoryNavigator::new());
        let toasts = SharedBuf::default();
        let app = AppBuilder::new(config)
            .with_store(Arc::clone(&store) as Arc<dyn KeyValueStore>)
            .with_navigator(Arc::clone(&navigator) as _)
            .with_confirm(Arc::new(FixedAnswer(true)))
            .with_toast_sink(Box::new(toasts.clone()))
            .build()
            .unwrap();

        Self { server_url, api, app, store, navigator, toasts }
    }

    /// Stores a session as a previous login would have left it.
    pub fn seed_session(&self, access: &str, refresh: Option<&str>, role: Role) {
        let mut user = UserProfile::new("a@b.com", role);
        user.first_name = Some("Asha".to_string());
        self.app.credentials.establish(access, refresh.unwrap_or("unused"), user).unwrap();
        if refresh.is_none() {
            self.store.remove(&["refresh_token"]).unwrap();
        }
    }
}
