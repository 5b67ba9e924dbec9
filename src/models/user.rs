//! User model and the login/signup payloads.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Role of an account on the booking platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    Patient,
    Doctor,
    Admin,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            UserType::Patient => "PATIENT",
            UserType::Doctor => "DOCTOR",
            UserType::Admin => "ADMIN",
        };
        f.write_str(text)
    }
}

/// Authenticated user as returned by `/auth/dashboard` and cached locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub user_type: UserType,
    pub mobile_number: String,
    /// Stored profile image file name, if the user uploaded one
    #[serde(default)]
    pub profile_image_filename: Option<String>,
    #[serde(default)]
    pub profile_image_content_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UserRecord {
    /// Relative path of the profile image, if any.
    pub fn profile_image_path(&self) -> Option<String> {
        self.profile_image_filename
            .as_deref()
            .map(|name| format!("static/profiles/{}", name))
    }

    /// Single-letter placeholder shown when there is no profile image.
    pub fn initial(&self) -> char {
        self.full_name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }

    pub fn is_doctor(&self) -> bool {
        self.user_type == UserType::Doctor
    }
}

/// Credentials posted to `/auth/login`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub remember_me: bool,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into().trim().to_string(),
            remember_me: false,
        }
    }
}

/// Response body of `/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

/// Weekly slot a doctor offers, `HH:MM` on both ends.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct TimeslotInput {
    #[validate(custom(function = "validate_clock_time"))]
    pub start_time: String,
    #[validate(custom(function = "validate_clock_time"))]
    pub end_time: String,
    pub is_available: bool,
}

/// Doctor-specific part of a signup.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct DoctorProfileInput {
    #[validate(length(min = 3, message = "License number must be at least 3 characters"))]
    pub license_number: String,
    #[validate(range(min = 0, max = 60, message = "Experience years must be between 0 and 60"))]
    pub experience_years: i32,
    #[validate(range(
        min = 0.0,
        max = 10000.0,
        message = "Consultation fee must be between 0 and 10000"
    ))]
    pub consultation_fee: f64,
    #[validate(length(min = 1, message = "At least one timeslot is required for doctors"))]
    #[validate(nested)]
    pub available_timeslots: Vec<TimeslotInput>,
}

/// Account creation payload for `/auth/signup`.
#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "validate_doctor_fields"))]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_mobile_number"))]
    pub mobile_number: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[serde(skip)]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    pub user_type: UserType,
    pub division_id: i64,
    pub district_id: i64,
    pub thana_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub doctor_profile: Option<DoctorProfileInput>,
}

/// Mobile numbers are `+88` followed by eleven digits.
fn validate_mobile_number(value: &str) -> Result<(), ValidationError> {
    let digits = value
        .strip_prefix("+88")
        .ok_or_else(|| invalid("mobile_prefix", "Mobile number must start with +88"))?;

    if value.len() != 14 {
        return Err(invalid(
            "mobile_length",
            "Mobile number must be exactly 14 digits including +88",
        ));
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("mobile_format", "Invalid mobile number format"));
    }
    Ok(())
}

const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

fn validate_password_strength(value: &str) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    if value.chars().count() < 8 {
        missing.push("at least 8 characters");
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        missing.push("one uppercase letter");
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        missing.push("one digit");
    }
    if !value.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        missing.push("one special character");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(invalid(
            "password_strength",
            format!("Password must contain: {}", missing.join(", ")),
        ))
    }
}

/// `H:MM` or `HH:MM`, 24-hour clock.
pub(crate) fn validate_clock_time(value: &str) -> Result<(), ValidationError> {
    let parsed = value.split_once(':').and_then(|(h, m)| {
        let hour_ok = (1..=2).contains(&h.len()) && h.chars().all(|c| c.is_ascii_digit());
        let minute_ok = m.len() == 2 && m.chars().all(|c| c.is_ascii_digit());
        if !hour_ok || !minute_ok {
            return None;
        }
        Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?))
    });

    match parsed {
        Some((hour, minute)) if hour < 24 && minute < 60 => Ok(()),
        _ => Err(invalid(
            "clock_time",
            "Time must be in HH:MM format (e.g., 10:00)",
        )),
    }
}

fn validate_doctor_fields(request: &SignupRequest) -> Result<(), ValidationError> {
    if request.user_type == UserType::Doctor && request.doctor_profile.is_none() {
        return Err(invalid(
            "doctor_profile",
            "License number, experience and fee are required for doctors",
        ));
    }
    Ok(())
}

fn invalid(code: &'static str, message: impl Into<std::borrow::Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}
