// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Clinic-Session: client-side session and notification sync for the
//! appointment booking service.
//!
//! This crate keeps a persisted bearer token in step with the booking
//! backend, falls back to the cached profile when the backend is
//! unreachable, and polls the user's notifications.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{
    AppointmentService, BackendClient, NotificationPoller, RedirectGate, SessionGateway,
    TokenStore,
};
use std::sync::Arc;

/// Shared client state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<TokenStore>,
    pub redirect: Arc<RedirectGate>,
    pub gateway: SessionGateway,
    pub appointments: AppointmentService,
}

impl AppState {
    /// Wire every component around one store and one redirect gate.
    pub fn new(config: Config, store: Arc<TokenStore>) -> error::Result<Self> {
        let client = BackendClient::new(config.api_base_url.clone(), config.request_timeout)?;
        tracing::debug!(api = client.base_url(), "Backend client ready");
        let gateway = SessionGateway::new(client, store.clone());

        Ok(Self {
            appointments: AppointmentService::new(gateway.clone()),
            redirect: Arc::new(RedirectGate::new()),
            gateway,
            store,
            config,
        })
    }

    /// A notification poller bound to this state's session and redirect gate.
    pub fn notification_poller(&self) -> NotificationPoller {
        NotificationPoller::new(
            self.gateway.clone(),
            self.redirect.clone(),
            self.config.notification_limit,
        )
    }
}
