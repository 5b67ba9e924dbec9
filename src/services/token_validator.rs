// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local validity check for JWT-shaped access tokens.
//!
//! Only the payload's `exp` claim is inspected. The signature is the
//! backend's business; this check just avoids sending a request that is
//! certain to fail. Anything that cannot be read counts as expired.

use crate::time_utils::now_unix_secs;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Returns true if `token` is malformed or its `exp` is in the past.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, now_unix_secs())
}

/// Same as [`is_expired`] against an explicit clock (seconds since epoch).
pub fn is_expired_at(token: &str, now: i64) -> bool {
    match expiry(token) {
        Some(exp) => exp < now as f64,
        None => true,
    }
}

/// The numeric `exp` claim, if the token has one.
pub fn expiry(token: &str) -> Option<f64> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;

    claims.get("exp")?.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_two_segments_is_expired() {
        assert!(is_expired_at("a.b", 2000));
    }

    #[test]
    fn test_four_segments_is_expired() {
        let token = format!("{}.extra", token_with_payload(r#"{"exp":3000}"#));
        assert!(is_expired_at(&token, 2000));
    }

    #[test]
    fn test_exp_before_now_is_expired() {
        assert!(is_expired_at(&token_with_payload(r#"{"exp":1000}"#), 2000));
    }

    #[test]
    fn test_exp_after_now_is_valid() {
        assert!(!is_expired_at(&token_with_payload(r#"{"exp":3000}"#), 2000));
    }

    #[test]
    fn test_exp_equal_to_now_is_valid() {
        assert!(!is_expired_at(&token_with_payload(r#"{"exp":2000}"#), 2000));
    }

    #[test]
    fn test_unusable_payloads_are_expired() {
        for payload in [r#"{"sub":"1"}"#, r#"{"exp":"3000"}"#, "not json", "[]"] {
            assert!(
                is_expired_at(&token_with_payload(payload), 2000),
                "payload {payload:?} should fail closed"
            );
        }
        assert!(is_expired_at("x.%%%.y", 2000));
        assert!(is_expired_at("", 2000));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let token = format!("h.{}.s", URL_SAFE.encode(r#"{"exp":3000}"#));
        assert!(!is_expired_at(&token, 2000));
    }
}
