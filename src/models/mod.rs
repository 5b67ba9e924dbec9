// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Wire and storage models.

pub mod appointment;
pub mod notification;
pub mod user;

pub use appointment::{
    Appointment, AppointmentRequest, AppointmentStatus, AppointmentsCount, Availability, Doctor,
    DoctorProfile, TimeSlot,
};
pub use notification::{NotificationRecord, UnreadCount};
pub use user::{
    DoctorProfileInput, LoginRequest, LoginResponse, SignupRequest, TimeslotInput, UserRecord,
    UserType,
};
