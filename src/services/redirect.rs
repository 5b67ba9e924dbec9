// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-shot login redirect intent.
//!
//! Several components can discover a dead session at the same moment (both
//! notification requests returning 401, for instance). The gate collapses
//! those into a single navigation: the first `request` wins and later calls
//! are ignored. The boundary layer waits on [`RedirectGate::wait`] and does
//! the actual navigation.

use crate::error::AuthReason;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Page the boundary navigates to on an auth redirect.
pub const LOGIN_PATH: &str = "/login";

/// A pending navigation to the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub target: &'static str,
    pub reason: AuthReason,
}

/// Idempotent redirect signal.
#[derive(Debug)]
pub struct RedirectGate {
    fired: AtomicBool,
    tx: watch::Sender<Option<Redirect>>,
}

impl Default for RedirectGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RedirectGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            fired: AtomicBool::new(false),
            tx,
        }
    }

    /// Ask for a login redirect. Returns true only for the call that fired it.
    pub fn request(&self, reason: AuthReason) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            tracing::debug!(%reason, "Redirect already pending, ignoring");
            return false;
        }

        tracing::info!(%reason, target = LOGIN_PATH, "Redirecting to login");
        self.tx.send_replace(Some(Redirect {
            target: LOGIN_PATH,
            reason,
        }));
        true
    }

    /// The pending redirect, if one has fired.
    pub fn pending(&self) -> Option<Redirect> {
        *self.tx.borrow()
    }

    /// Resolve once a redirect has been requested.
    pub async fn wait(&self) -> Redirect {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(redirect) = *rx.borrow_and_update() {
                return redirect;
            }
            if rx.changed().await.is_err() {
                // Sender lives in self, so this cannot close while we borrow it.
                continue;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_only_first_request_fires() {
        let gate = RedirectGate::new();
        assert!(gate.pending().is_none());
        assert!(gate.request(AuthReason::Rejected));
        assert!(!gate.request(AuthReason::Expired));
        assert_eq!(
            gate.pending(),
            Some(Redirect {
                target: LOGIN_PATH,
                reason: AuthReason::Rejected
            })
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_collapse() {
        let gate = Arc::new(RedirectGate::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.request(AuthReason::Rejected) })
            })
            .collect();

        let mut fired = 0;
        for handle in handles {
            if handle.await.unwrap() {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(gate.wait().await.reason, AuthReason::Rejected);
    }
}
