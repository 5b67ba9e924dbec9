// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error taxonomy shared by every backend-facing operation.

use crate::services::token_store::StoreError;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Why a caller has to go back through login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthReason {
    /// No token is stored.
    MissingToken,
    /// The stored token is malformed or past its `exp`.
    Expired,
    /// The backend answered 401.
    Rejected,
    /// The backend was unreachable and no cached user exists to fall back on.
    NoCachedUser,
}

impl std::fmt::Display for AuthReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            AuthReason::MissingToken => "not logged in",
            AuthReason::Expired => "session expired",
            AuthReason::Rejected => "session rejected by server",
            AuthReason::NoCachedUser => "server unreachable and no cached profile",
        };
        f.write_str(text)
    }
}

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Authentication required: {0}")]
    AuthRequired(AuthReason),

    #[error("Temporary failure: {0}")]
    Transient(String),

    #[error("Request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Invalid input: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unexpected response: {0}")]
    Unexpected(String),

    #[error("Session storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ClientError {
    /// Returns true if the caller must re-authenticate.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, ClientError::AuthRequired(_))
    }

    /// Returns true for failures worth retrying or covering with cached data.
    ///
    /// Unparseable responses count as transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transient(_) | ClientError::Unexpected(_))
    }

    /// Banner text for the boundary layer.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::AuthRequired(AuthReason::MissingToken) => {
                "Please log in to continue.".to_string()
            }
            ClientError::AuthRequired(_) => "Session expired. Please log in again.".to_string(),
            ClientError::Transient(_) | ClientError::Unexpected(_) => {
                "The server could not be reached. Please try again shortly.".to_string()
            }
            ClientError::Rejected { detail, .. } => detail.clone(),
            ClientError::Validation(_) => "Please correct the errors above.".to_string(),
            ClientError::Storage(_) => "Could not access the saved session.".to_string(),
        }
    }

    /// `(field path, message)` pairs for a validation error, nested fields included.
    ///
    /// Paths look like `doctor_profile.available_timeslots[0].start_time`.
    /// Empty for every other variant.
    pub fn field_messages(&self) -> Vec<(String, String)> {
        let mut messages = Vec::new();
        if let ClientError::Validation(errors) = self {
            collect_field_messages(errors, "", &mut messages);
        }
        messages.sort();
        messages
    }
}

fn collect_field_messages(
    errors: &ValidationErrors,
    prefix: &str,
    out: &mut Vec<(String, String)>,
) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        // Struct-level (schema) errors are keyed `__all__`.
        let path = match (prefix.is_empty(), field == "__all__") {
            (true, true) => "form".to_string(),
            (false, true) => prefix.to_string(),
            (true, false) => field,
            (false, false) => format!("{}.{}", prefix, field),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let message = e
                        .message
                        .as_deref()
                        .map(str::to_string)
                        .unwrap_or_else(|| e.code.to_string());
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_field_messages(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_messages(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
