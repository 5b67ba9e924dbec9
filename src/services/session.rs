// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session reconciliation between the local token store and the backend.
//!
//! Handles:
//! - Establishing the current user (live fetch, cached fallback, re-auth)
//! - Login, signup and logout
//! - Running authorized backend calls that purge the store on 401

use crate::error::{AuthReason, ClientError, Result};
use crate::models::{LoginRequest, SignupRequest, UserRecord};
use crate::services::backend::BackendClient;
use crate::services::token_store::TokenStore;
use crate::services::token_validator;
use std::future::Future;
use std::sync::Arc;
use validator::Validate;

/// Where a session's user record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Fetched from the backend just now.
    Live,
    /// Backend unreachable; served from the local cache.
    Cached,
}

/// The user behind a usable session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub user: UserRecord,
    pub freshness: Freshness,
}

impl SessionUser {
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Cached
    }
}

/// What the dashboard header shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub session: SessionUser,
    /// None when the count could not be fetched.
    pub appointments_count: Option<u64>,
}

/// Session gateway.
///
/// Never navigates: every auth failure comes back as
/// `ClientError::AuthRequired` after the store has been cleared, and the
/// caller decides what to do with it.
#[derive(Clone, Debug)]
pub struct SessionGateway {
    client: BackendClient,
    store: Arc<TokenStore>,
}

impl SessionGateway {
    pub fn new(client: BackendClient, store: Arc<TokenStore>) -> Self {
        Self { client, store }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Establish the current user.
    ///
    /// 1. No token: re-auth
    /// 2. Token expired locally: clear, re-auth
    /// 3. Fetch `/auth/dashboard`: 401 clears and re-auths, success refreshes the cache
///    (unless the stored token changed meanwhile)
    /// 4. Any other failure: serve the cached user, or clear and re-auth if there is none
    pub async fn ensure_session(&self) -> Result<SessionUser> {
        // ─────────────────────────────────────────────────────────────
        // STEP 1: Token present?
        // ─────────────────────────────────────────────────────────────
        let Some(token) = self.store.get() else {
            tracing::debug!("No access token stored");
            return Err(ClientError::AuthRequired(AuthReason::MissingToken));
        };

        // ─────────────────────────────────────────────────────────────
        // STEP 2: Local expiry check (no I/O)
        // ─────────────────────────────────────────────────────────────
        if token_validator::is_expired(&token) {
            tracing::info!("Access token expired, clearing session");
            return Err(self.require_auth(AuthReason::Expired));
        }

        // ─────────────────────────────────────────────────────────────
        // STEP 3: Live fetch
        // ─────────────────────────────────────────────────────────────
        let failure = match self.client.dashboard(&token).await {
            Ok(user) => {
                // A logout or re-login may have landed while the fetch was in flight.
                if !self.store.update_user_if_current(&token, &user)? {
                    tracing::info!("Session changed during dashboard fetch, not caching user");
                    if self.store.get().is_none() {
                        return Err(ClientError::AuthRequired(AuthReason::MissingToken));
                    }
                }
                tracing::debug!(user_id = user.id, "Session refreshed from server");
                return Ok(SessionUser {
                    user,
                    freshness: Freshness::Live,
                });
            }
            Err(ClientError::AuthRequired(reason)) => {
                tracing::info!(%reason, "Server rejected token, clearing session");
                return Err(self.require_auth(reason));
            }
            Err(e) => e,
        };

        // ─────────────────────────────────────────────────────────────
        // STEP 4: Fall back to the cached user
        // ─────────────────────────────────────────────────────────────
        match self.store.user() {
            Some(user) => {
                tracing::warn!(error = %failure, "Dashboard fetch failed, using cached user data");
                Ok(SessionUser {
                    user,
                    freshness: Freshness::Cached,
                })
            }
            None => {
                tracing::warn!(error = %failure, "Dashboard fetch failed and no cached user data");
                Err(self.require_auth(AuthReason::NoCachedUser))
            }
        }
    }

    /// Session plus the appointment counter.
    ///
    /// The counter is only fetched for a live session; an unreachable
    /// backend already failed once in `ensure_session`.
    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        let session = self.ensure_session().await?;

        let appointments_count = match session.freshness {
            Freshness::Cached => None,
            Freshness::Live => {
                match self
                    .authorized(|client, token| async move {
                        client.appointments_count(&token).await
                    })
                    .await
                {
                    Ok(count) => Some(count),
                    Err(e) if e.is_auth_required() => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to fetch appointments count");
                        None
                    }
                }
            }
        };

        Ok(DashboardSummary {
            session,
            appointments_count,
        })
    }

    /// Run a backend call with the stored token.
    ///
    /// A missing or expired token, or a 401 from the call, clears the store
    /// and yields `AuthRequired`. Other errors pass through untouched.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T>
    where
        F: FnOnce(BackendClient, String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(token) = self.store.get() else {
            return Err(ClientError::AuthRequired(AuthReason::MissingToken));
        };
        if token_validator::is_expired(&token) {
            return Err(self.require_auth(AuthReason::Expired));
        }

        match call(self.client.clone(), token).await {
            Err(ClientError::AuthRequired(reason)) => Err(self.require_auth(reason)),
            other => other,
        }
    }

    /// Log in and persist the returned token and user.
    pub async fn login(&self, request: &LoginRequest) -> Result<Option<UserRecord>> {
        request.validate()?;

        let response = self.client.login(request).await?;
        if response.user.is_none() {
            tracing::warn!("No user data in login response");
        }

        self.store
            .set(&response.access_token, response.user.as_ref())?;
        tracing::info!(email = %request.email, "Logged in");
        Ok(response.user)
    }

    /// Register a new account. Does not log in.
    pub async fn signup(&self, request: &SignupRequest) -> Result<UserRecord> {
        request.validate()?;

        let user = self.client.signup(request).await?;
        tracing::info!(user_id = user.id, user_type = %user.user_type, "Account created");
        Ok(user)
    }

    /// Best-effort server logout; the local session is cleared regardless.
    pub async fn logout(&self) -> Result<()> {
        if let Some(token) = self.store.get() {
            match self.client.logout(&token).await {
                Ok(()) => tracing::info!("Logged out from server"),
                Err(e) => {
                    tracing::warn!(error = %e, "Server logout failed, continuing with local logout")
                }
            }
        }

        self.store.clear()?;
        Ok(())
    }

    /// Clear the store and build the matching `AuthRequired` error.
    fn require_auth(&self, reason: AuthReason) -> ClientError {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear session storage");
        }
        ClientError::AuthRequired(reason)
    }
}
