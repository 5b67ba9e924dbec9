// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test harness: an in-process fake of the booking backend.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use clinic_session::config::Config;
use clinic_session::services::TokenStore;
use clinic_session::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

/// Create a test JWT that expires `ttl_secs` from now (negative for the past).
#[allow(dead_code)]
pub fn create_test_jwt(user_id: i64, ttl_secs: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
        iat: i64,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ttl_secs,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn valid_token() -> String {
    create_test_jwt(1, 3600)
}

#[allow(dead_code)]
pub fn expired_token() -> String {
    create_test_jwt(1, -3600)
}

#[allow(dead_code)]
pub fn user_json() -> Value {
    json!({
        "id": 1,
        "full_name": "Rahim Uddin",
        "email": "rahim@example.com",
        "user_type": "PATIENT",
        "mobile_number": "+8801712345678",
        "division_id": 1,
        "district_id": 2,
        "thana_id": 3,
        "profile_image_filename": "rahim.png",
        "profile_image_content_type": "image/png"
    })
}

/// Mutable behaviour and request log of the fake backend.
#[derive(Default)]
pub struct BackendState {
    statuses: Mutex<HashMap<&'static str, u16>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    hits: Mutex<HashMap<&'static str, usize>>,
    pub user: Mutex<Value>,
    pub notifications: Mutex<Value>,
    pub unread_count: Mutex<u64>,
    pub last_bearer: Mutex<Option<String>>,
    pub last_query: Mutex<HashMap<String, String>>,
    pub marked_read: Mutex<Vec<i64>>,
    pub booked: Mutex<Vec<Value>>,
}

#[allow(dead_code)]
impl BackendState {
    /// Force `route` to answer with `status`.
    pub fn set_status(&self, route: &'static str, status: u16) {
        self.statuses.lock().unwrap().insert(route, status);
    }

    /// Make `route` wait `delay` before answering.
    pub fn set_delay(&self, route: &'static str, delay: Duration) {
        self.delays.lock().unwrap().insert(route, delay);
    }

    async fn pause(&self, route: &'static str) {
        let delay = self.delays.lock().unwrap().get(route).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn hits(&self, route: &'static str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    fn record(&self, route: &'static str, headers: &HeaderMap) -> StatusCode {
        *self.hits.lock().unwrap().entry(route).or_insert(0) += 1;
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);
        *self.last_bearer.lock().unwrap() = bearer;

        let code = self
            .statuses
            .lock()
            .unwrap()
            .get(route)
            .copied()
            .unwrap_or(200);
        StatusCode::from_u16(code).unwrap()
    }
}

type Shared = Arc<BackendState>;

fn reply(status: StatusCode, body: Value) -> Response {
    if status.is_success() {
        (status, Json(body)).into_response()
    } else if status == StatusCode::UNAUTHORIZED {
        (status, Json(json!({ "detail": "Could not validate credentials" }))).into_response()
    } else {
        (status, Json(json!({ "detail": "Simulated failure" }))).into_response()
    }
}

async fn login(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let status = s.record("login", &headers);
    if !status.is_success() {
        return reply(status, Value::Null);
    }
    if body["password"] != "Correct#123" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect email or password" })),
        )
            .into_response();
    }
    let user = s.user.lock().unwrap().clone();
    reply(
        status,
        json!({ "access_token": valid_token(), "token_type": "bearer", "user": user }),
    )
}

async fn signup(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let status = s.record("signup", &headers);
    let mut user = body.clone();
    user["id"] = json!(42);
    if let Some(map) = user.as_object_mut() {
        map.remove("password");
    }
    reply(status, user)
}

async fn dashboard(State(s): State<Shared>, headers: HeaderMap) -> Response {
    let status = s.record("dashboard", &headers);
    s.pause("dashboard").await;
    let user = s.user.lock().unwrap().clone();
    reply(status, user)
}

async fn appointments_count(State(s): State<Shared>, headers: HeaderMap) -> Response {
    let status = s.record("appointments_count", &headers);
    reply(status, json!({ "appointments_count": 3 }))
}

async fn logout(State(s): State<Shared>, headers: HeaderMap) -> Response {
    let status = s.record("logout", &headers);
    reply(status, json!({ "message": "Successfully logged out", "success": true }))
}

async fn notifications(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let status = s.record("notifications", &headers);
    *s.last_query.lock().unwrap() = query;
    let body = s.notifications.lock().unwrap().clone();
    reply(status, body)
}

async fn unread_count(State(s): State<Shared>, headers: HeaderMap) -> Response {
    let status = s.record("unread_count", &headers);
    let count = *s.unread_count.lock().unwrap();
    reply(status, json!({ "unread_count": count }))
}

async fn mark_read(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let status = s.record("mark_read", &headers);
    if status.is_success() {
        s.marked_read.lock().unwrap().push(id);
        let mut unread = s.unread_count.lock().unwrap();
        *unread = unread.saturating_sub(1);
    }
    reply(status, json!({ "message": "Notification marked as read" }))
}

async fn mark_all_read(State(s): State<Shared>, headers: HeaderMap) -> Response {
    let status = s.record("mark_all_read", &headers);
    if status.is_success() {
        *s.unread_count.lock().unwrap() = 0;
    }
    reply(status, json!({ "message": "All notifications marked as read" }))
}

async fn doctors(State(s): State<Shared>, headers: HeaderMap) -> Response {
    let status = s.record("doctors", &headers);
    reply(
        status,
        json!([
            {
                "id": 10,
                "full_name": "Karim Ahmed",
                "email": "karim@example.com",
                "user_type": "DOCTOR",
                "doctor_profile": {
                    "id": 5,
                    "user_id": 10,
                    "license_number": "BMDC-1234",
                    "experience_years": 7,
                    "consultation_fee": 800.0
                }
            },
            {
                "id": 11,
                "full_name": "Profile Pending",
                "email": "pending@example.com",
                "user_type": "DOCTOR",
                "doctor_profile": null
            }
        ]),
    )
}

async fn availability(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(doctor_id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let status = s.record("availability", &headers);
    let date = query.get("appointment_date").cloned().unwrap_or_default();
    *s.last_query.lock().unwrap() = query;
    reply(
        status,
        json!({
            "doctor_id": doctor_id,
            "date": date,
            "available_slots": [
                { "time": "10:00", "available": true },
                { "time": "10:30", "available": true }
            ]
        }),
    )
}

async fn create_appointment(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let status = s.record("create_appointment", &headers);
    if !status.is_success() {
        return reply(status, Value::Null);
    }
    if body["appointment_time"] == "09:00" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Time slot is not available" })),
        )
            .into_response();
    }
    s.booked.lock().unwrap().push(body.clone());
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 77,
            "patient_id": 1,
            "doctor_id": body["doctor_id"],
            "appointment_date": body["appointment_date"],
            "appointment_time": format!("{}:00", body["appointment_time"].as_str().unwrap_or("")),
            "notes": body["notes"],
            "status": "PENDING",
            "doctor_name": "Karim Ahmed"
        })),
    )
        .into_response()
}

async fn list_appointments(State(s): State<Shared>, headers: HeaderMap) -> Response {
    let status = s.record("list_appointments", &headers);
    reply(
        status,
        json!([{
            "id": 77,
            "patient_id": 1,
            "doctor_id": 5,
            "appointment_date": "2030-01-15",
            "appointment_time": "10:00:00",
            "notes": null,
            "status": "CONFIRMED",
            "doctor_name": "Karim Ahmed",
            "doctor_license": "BMDC-1234",
            "consultation_fee": 800.0
        }]),
    )
}

async fn cancel_appointment(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> Response {
    let status = s.record("cancel_appointment", &headers);
    reply(status, json!({ "message": "Appointment cancelled successfully" }))
}

/// A running fake backend.
#[allow(dead_code)]
pub struct FakeBackend {
    pub base_url: String,
    pub state: Shared,
}

#[allow(dead_code)]
impl FakeBackend {
    /// Serve the fake API on an ephemeral local port.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        *state.user.lock().unwrap() = user_json();
        *state.notifications.lock().unwrap() = json!([]);

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/signup", post(signup))
            .route("/auth/dashboard", get(dashboard))
            .route("/auth/appointments_count", get(appointments_count))
            .route("/auth/logout", post(logout))
            .route("/notifications", get(notifications))
            .route("/notifications/unread-count", get(unread_count))
            .route("/notifications/mark-all-read", put(mark_all_read))
            .route("/notifications/{id}/read", put(mark_read))
            .route("/doctors/", get(doctors))
            .route(
                "/appointments/doctors/{id}/availability",
                get(availability),
            )
            .route(
                "/appointments/",
                post(create_appointment).get(list_appointments),
            )
            .route("/appointments/{id}", delete(cancel_appointment))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

/// Base URL of a port nothing listens on.
#[allow(dead_code)]
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Client state against `base_url` with an empty in-memory store.
#[allow(dead_code)]
pub fn test_app(base_url: &str) -> AppState {
    let mut config = Config::for_base_url(base_url);
    config.request_timeout = Duration::from_secs(5);
    config.redirect_delay = Duration::from_millis(10);
    AppState::new(config, Arc::new(TokenStore::in_memory())).unwrap()
}
