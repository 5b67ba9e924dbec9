// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Booking backend API client.
//!
//! Thin, stateless wrapper over the REST endpoints. It never touches the
//! token store; it only maps HTTP outcomes onto [`ClientError`]:
//! - 401 becomes `AuthRequired(Rejected)`
//! - other 4xx become `Rejected` with the backend's `detail`
//! - 5xx and connection failures become `Transient`
//! - undecodable bodies become `Unexpected`

use crate::error::{AuthReason, ClientError};
use crate::models::{
    Appointment, AppointmentRequest, AppointmentsCount, Availability, Doctor, LoginRequest,
    LoginResponse, NotificationRecord, SignupRequest, UnreadCount, UserRecord,
};
use crate::time_utils::format_query_date;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Booking backend client.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transient(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ─── Auth ────────────────────────────────────────────────────────────────

    /// Exchange credentials for an access token.
    ///
    /// A 401 here means bad credentials, not a dead session, so it is
    /// reported as `Rejected`.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let detail = error_detail(response)
                .await
                .unwrap_or_else(|| "Login failed".to_string());
            return Err(ClientError::Rejected {
                status: 401,
                detail,
            });
        }

        check_response_json(response).await
    }

    /// Create an account.
    pub async fn signup(&self, request: &SignupRequest) -> Result<UserRecord, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/signup"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        check_response_json(response).await
    }

    /// Profile of the token's owner.
    pub async fn dashboard(&self, token: &str) -> Result<UserRecord, ClientError> {
        self.get_json("/auth/dashboard", token).await
    }

    pub async fn appointments_count(&self, token: &str) -> Result<u64, ClientError> {
        let body: AppointmentsCount = self.get_json("/auth/appointments_count", token).await?;
        Ok(body.appointments_count)
    }

    /// Invalidate the token server-side.
    pub async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        check_response(response).await
    }

    // ─── Notifications ───────────────────────────────────────────────────────

    pub async fn notifications(
        &self,
        token: &str,
        limit: u32,
        read_only: bool,
    ) -> Result<Vec<NotificationRecord>, ClientError> {
        let response = self
            .http
            .get(self.url("/notifications"))
            .bearer_auth(token)
            .query(&[
                ("limit", limit.to_string()),
                ("read_only", read_only.to_string()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        check_response_json(response).await
    }

    pub async fn unread_count(&self, token: &str) -> Result<u64, ClientError> {
        let body: UnreadCount = self.get_json("/notifications/unread-count", token).await?;
        Ok(body.unread_count)
    }

    pub async fn mark_notification_read(
        &self,
        token: &str,
        notification_id: i64,
    ) -> Result<(), ClientError> {
        self.put_empty(&format!("/notifications/{}/read", notification_id), token)
            .await
    }

    pub async fn mark_all_notifications_read(&self, token: &str) -> Result<(), ClientError> {
        self.put_empty("/notifications/mark-all-read", token).await
    }

    // ─── Doctors & appointments ──────────────────────────────────────────────

    pub async fn doctors(&self, token: &str) -> Result<Vec<Doctor>, ClientError> {
        self.get_json("/doctors/", token).await
    }

    pub async fn availability(
        &self,
        token: &str,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Availability, ClientError> {
        let response = self
            .http
            .get(self.url(&format!(
                "/appointments/doctors/{}/availability",
                doctor_id
            )))
            .bearer_auth(token)
            .query(&[("appointment_date", format_query_date(date))])
            .send()
            .await
            .map_err(transport_error)?;

        check_response_json(response).await
    }

    pub async fn create_appointment(
        &self,
        token: &str,
        request: &AppointmentRequest,
    ) -> Result<Appointment, ClientError> {
        let response = self
            .http
            .post(self.url("/appointments/"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        check_response_json(response).await
    }

    pub async fn appointments(&self, token: &str) -> Result<Vec<Appointment>, ClientError> {
        self.get_json("/appointments/", token).await
    }

    pub async fn cancel_appointment(
        &self,
        token: &str,
        appointment_id: i64,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/appointments/{}", appointment_id)))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        check_response(response).await
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    /// Generic authorized GET with JSON response.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        check_response_json(response).await
    }

    async fn put_empty(&self, path: &str, token: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .put(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        check_response(response).await
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Transient(format!("Request timed out: {}", e))
    } else {
        ClientError::Transient(e.to_string())
    }
}

/// FastAPI puts the reason in `{"detail": "..."}`.
async fn error_detail(response: reqwest::Response) -> Option<String> {
    let body = response.text().await.ok()?;
    let value: serde_json::Value = serde_json::from_str(&body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<(), ClientError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(status_error(response).await)
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ClientError::Transient(format!("Failed to read response: {}", e)))?;

    serde_json::from_slice(&body)
        .map_err(|e| ClientError::Unexpected(format!("JSON parse error: {}", e)))
}

/// Classify a non-2xx response.
async fn status_error(response: reqwest::Response) -> ClientError {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return ClientError::AuthRequired(AuthReason::Rejected);
    }

    let detail = error_detail(response).await;

    if status.is_client_error() {
        return ClientError::Rejected {
            status: status.as_u16(),
            detail: detail.unwrap_or_else(|| status.to_string()),
        };
    }

    tracing::warn!(status = %status, "Backend request failed");
    ClientError::Transient(match detail {
        Some(detail) => format!("HTTP {}: {}", status, detail),
        None => format!("HTTP {}", status),
    })
}
