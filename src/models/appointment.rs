//! Doctor, availability and appointment models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::user::validate_clock_time;

/// Lifecycle of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn can_cancel(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

/// Public doctor profile nested in a doctor's user record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DoctorProfile {
    pub id: i64,
    pub license_number: String,
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub consultation_fee: f64,
}

/// Entry of `/doctors/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub doctor_profile: Option<DoctorProfile>,
}

impl Doctor {
    /// Picker label, e.g. `Dr. Karim - BMDC-1 ($800)`. None if the profile is missing.
    pub fn label(&self) -> Option<String> {
        self.doctor_profile.as_ref().map(|profile| {
            format!(
                "Dr. {} - {} (${})",
                self.full_name, profile.license_number, profile.consultation_fee
            )
        })
    }
}

/// One bookable half-hour slot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeSlot {
    pub time: String,
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

/// Body of `/appointments/doctors/{id}/availability`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Availability {
    pub doctor_id: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub available_slots: Vec<TimeSlot>,
}

/// Booking payload for `POST /appointments/`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct AppointmentRequest {
    pub doctor_id: i64,
    #[validate(custom(function = "validate_not_in_past"))]
    pub appointment_date: NaiveDate,
    #[validate(custom(function = "validate_clock_time"))]
    pub appointment_time: String,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

fn validate_not_in_past(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date < chrono::Local::now().date_naive() {
        return Err(ValidationError::new("past_date")
            .with_message("Appointment date cannot be in the past".into()));
    }
    Ok(())
}

/// Appointment as returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub doctor_license: Option<String>,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
}

/// Body of `/auth/appointments_count`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AppointmentsCount {
    #[serde(default)]
    pub appointments_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_actions() {
        assert!(AppointmentStatus::Pending.can_cancel());
        assert!(AppointmentStatus::Confirmed.can_cancel());
        assert!(!AppointmentStatus::Completed.can_cancel());
    }

    #[test]
    fn test_booking_in_the_past_is_invalid() {
        let request = AppointmentRequest {
            doctor_id: 1,
            appointment_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            appointment_time: "10:00".to_string(),
            notes: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("appointment_date"));
    }

    #[test]
    fn test_doctor_without_profile_has_no_label() {
        let doctor = Doctor {
            id: 3,
            full_name: "Karim".to_string(),
            doctor_profile: None,
        };
        assert_eq!(doctor.label(), None);
    }
}
