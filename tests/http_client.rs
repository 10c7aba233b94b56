//! HTTP client tests against an in-process admin API

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use termine_admin::{
    ApiError, AppointmentBatch, ClientConfig, HttpUserApi, NewUser, User, UserApi,
    UserTableController,
};

#[derive(Default)]
struct FakeAdminApi {
    users: Mutex<Vec<Value>>,
    requests: Mutex<Vec<(&'static str, Value)>>,
}

impl FakeAdminApi {
    fn with_users(users: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(users),
            ..Self::default()
        })
    }

    fn record(&self, route: &'static str, body: Value) {
        self.requests.lock().unwrap().push((route, body));
    }

    fn requests(&self) -> Vec<(&'static str, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

async fn list_users(State(api): State<Arc<FakeAdminApi>>) -> Json<Vec<Value>> {
    Json(api.users.lock().unwrap().clone())
}

async fn update_user(State(api): State<Arc<FakeAdminApi>>, Json(body): Json<Value>) -> StatusCode {
    let mut users = api.users.lock().unwrap();
    if let Some(stored) = users
        .iter_mut()
        .find(|u| u["user_name"] == body["user_name"])
    {
        *stored = body.clone();
    }
    drop(users);
    api.record("PATCH /user", body);
    StatusCode::OK
}

async fn create_user(State(api): State<Arc<FakeAdminApi>>, Json(body): Json<Value>) -> StatusCode {
    api.record("PUT /user", body);
    StatusCode::CREATED
}

async fn create_appointments(
    State(api): State<Arc<FakeAdminApi>>,
    Json(body): Json<Value>,
) -> StatusCode {
    api.record("PUT /appointments", body);
    StatusCode::OK
}

async fn increment_coupons(
    State(api): State<Arc<FakeAdminApi>>,
    Json(body): Json<Value>,
) -> StatusCode {
    api.record("PATCH /coupon", body);
    StatusCode::OK
}

fn admin_router(api: Arc<FakeAdminApi>) -> Router {
    let admin_routes = Router::new()
        .route("/user", get(list_users).patch(update_user).put(create_user))
        .route("/appointments", put(create_appointments))
        .route("/coupon", patch(increment_coupons));

    Router::new()
        .nest("/admin_api", admin_routes)
        .route("/healthcheck", get(|| async { "OK" }))
        .with_state(api)
}

/// Serve `router` on an ephemeral port and return the admin API base URL
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/admin_api", addr)
}

fn client(base_url: &str) -> HttpUserApi {
    HttpUserApi::new(ClientConfig::new(base_url)).unwrap()
}

fn sample_users() -> Vec<Value> {
    vec![
        json!({"user_name": "alice", "is_admin": false, "total_bookings": 3, "coupons": 2}),
        json!({"user_name": "bob", "is_admin": true, "total_bookings": 0, "coupons": 10}),
    ]
}

#[tokio::test]
async fn test_fetch_users() {
    let base_url = spawn_server(admin_router(FakeAdminApi::with_users(sample_users()))).await;

    let users = client(&base_url).fetch_users().await.unwrap();
    assert_eq!(
        users,
        vec![
            User::new("alice").bookings(3).coupons(2),
            User::new("bob").admin(true).coupons(10),
        ]
    );
}

#[tokio::test]
async fn test_write_payloads() {
    let server = FakeAdminApi::with_users(sample_users());
    let base_url = spawn_server(admin_router(Arc::clone(&server))).await;
    let api = client(&base_url);

    api.patch_user(&User::new("alice").bookings(3).coupons(5))
        .await
        .unwrap();
    // PUT /user answers 201
    api.add_user(&NewUser::new("carol", "hunter2")).await.unwrap();
    api.add_appointments(&AppointmentBatch {
        day: 24,
        month: 12,
        year: 2026,
        ..AppointmentBatch::default()
    })
    .await
    .unwrap();
    api.increment_coupons("bob", -3).await.unwrap();

    let requests = server.requests();
    assert_eq!(
        requests,
        vec![
            (
                "PATCH /user",
                json!({"user_name": "alice", "is_admin": false, "total_bookings": 3, "coupons": 5})
            ),
            (
                "PUT /user",
                json!({
                    "newUserName": "carol",
                    "newUserPassword": "hunter2",
                    "newUserPasswordConfirm": "hunter2"
                })
            ),
            (
                "PUT /appointments",
                json!({
                    "day": 24,
                    "month": 12,
                    "year": 2026,
                    "start_hour": 8,
                    "start_min": 30,
                    "num_slots": 13,
                    "num_appointment_per_slot": 8,
                    "slot_duration_min": 30
                })
            ),
            ("PATCH /coupon", json!({"user_name": "bob", "increment": -3})),
        ]
    );
}

#[tokio::test]
async fn test_health_at_server_root() {
    let base_url = spawn_server(admin_router(FakeAdminApi::with_users(vec![]))).await;
    client(&base_url).health().await.unwrap();
}

#[tokio::test]
async fn test_non_ok_status_is_server_error() {
    let router = Router::new().route(
        "/admin_api/user",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "database down") }),
    );
    let base_url = spawn_server(router).await;

    let err = client(&base_url).fetch_users().await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Server {
            status: 503,
            message: "database down".to_string()
        }
    );
}

#[tokio::test]
async fn test_fetch_accepts_only_200() {
    let router = Router::new().route(
        "/admin_api/user",
        get(|| async { (StatusCode::ACCEPTED, Json(Vec::<Value>::new())) }),
    );
    let base_url = spawn_server(router).await;

    let err = client(&base_url).fetch_users().await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 202, .. }));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let router = Router::new().route(
        "/admin_api/user",
        get(|| async { Json(json!([{"user_name": "alice"}])) }),
    );
    let base_url = spawn_server(router).await;

    let err = client(&base_url).fetch_users().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}/admin_api", addr))
        .fetch_users()
        .await
        .unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn test_controller_saves_inline_edit() {
    let server = FakeAdminApi::with_users(sample_users());
    let base_url = spawn_server(admin_router(Arc::clone(&server))).await;

    let controller = UserTableController::new(client(&base_url));
    controller.first_load().await;
    assert_eq!(controller.users().len(), 2);

    controller.begin_edit("alice").unwrap();
    controller.change_input("coupons", "7").unwrap();
    assert!(controller.on_key_down("Enter").await.unwrap());

    assert_eq!(
        server.requests(),
        vec![(
            "PATCH /user",
            json!({"user_name": "alice", "is_admin": false, "total_bookings": 3, "coupons": 7})
        )]
    );
    assert_eq!(controller.user("alice").map(|u| u.coupons), Some(7));
    assert!(controller.last_error().is_none());

    controller.shutdown();
}
