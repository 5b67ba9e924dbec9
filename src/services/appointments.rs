// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Doctor lookup and appointment booking.
//!
//! Every call goes through [`SessionGateway::authorized`], so a dead token
//! clears the local session before the error reaches the caller.

use crate::error::Result;
use crate::models::{Appointment, AppointmentRequest, Availability, Doctor};
use crate::services::session::SessionGateway;
use chrono::NaiveDate;
use validator::Validate;

/// Appointment operations for the logged-in user.
#[derive(Clone, Debug)]
pub struct AppointmentService {
    gateway: SessionGateway,
}

impl AppointmentService {
    pub fn new(gateway: SessionGateway) -> Self {
        Self { gateway }
    }

    /// Doctors that can be booked (entries without a doctor profile are skipped).
    pub async fn doctors(&self) -> Result<Vec<Doctor>> {
        let doctors = self
            .gateway
            .authorized(|client, token| async move { client.doctors(&token).await })
            .await?;

        let total = doctors.len();
        let bookable: Vec<Doctor> = doctors
            .into_iter()
            .filter(|d| d.doctor_profile.is_some())
            .collect();
        tracing::debug!(total, bookable = bookable.len(), "Loaded doctors");
        Ok(bookable)
    }

    /// Free slots for a doctor on a date.
    ///
    /// `doctor_id` is the doctor profile id, not the user id.
    pub async fn availability(&self, doctor_id: i64, date: NaiveDate) -> Result<Availability> {
        self.gateway
            .authorized(|client, token| async move {
                client.availability(&token, doctor_id, date).await
            })
            .await
    }

    /// Book an appointment. Invalid input is rejected before any request.
    pub async fn book(&self, request: &AppointmentRequest) -> Result<Appointment> {
        request.validate()?;

        let appointment = self
            .gateway
            .authorized(|client, token| async move {
                client.create_appointment(&token, request).await
            })
            .await?;

        tracing::info!(
            appointment_id = appointment.id,
            doctor_id = appointment.doctor_id,
            date = %appointment.appointment_date,
            "Appointment booked"
        );
        Ok(appointment)
    }

    /// Appointments visible to the current user.
    pub async fn list(&self) -> Result<Vec<Appointment>> {
        self.gateway
            .authorized(|client, token| async move { client.appointments(&token).await })
            .await
    }

    pub async fn cancel(&self, appointment_id: i64) -> Result<()> {
        self.gateway
            .authorized(|client, token| async move {
                client.cancel_appointment(&token, appointment_id).await
            })
            .await?;

        tracing::info!(appointment_id, "Appointment cancelled");
        Ok(())
    }
}
