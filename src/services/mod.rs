// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session, notification and booking logic.

pub mod appointments;
pub mod backend;
pub mod notifications;
pub mod redirect;
pub mod session;
pub mod token_store;
pub mod token_validator;

pub use appointments::AppointmentService;
pub use backend::BackendClient;
pub use notifications::{CycleOutcome, NotificationPanel, NotificationPoller, PollerState};
pub use redirect::{Redirect, RedirectGate};
pub use session::{DashboardSummary, Freshness, SessionGateway, SessionUser};
pub use token_store::{FileStorage, MemoryStorage, PersistedSession, StorageBackend, TokenStore};
