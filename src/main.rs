// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clinic-Session command line client.
//!
//! This is the boundary layer: it renders what the library returns and
//! performs the login "redirect" the library only signals.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clinic_session::{
    config::Config,
    error::ClientError,
    models::{
        AppointmentRequest, DoctorProfileInput, LoginRequest, SignupRequest, TimeslotInput,
        UserType,
    },
    services::{
        notifications::NotificationPanel, DashboardSummary, FileStorage, Redirect, TokenStore,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "false")]
        remember_me: bool,
    },

    /// Create an account.
    Signup(SignupArgs),

    /// Log out (the local session is cleared even if the server is down).
    Logout,

    /// Show the dashboard and keep polling notifications until Ctrl-C.
    Dashboard,

    /// Fetch the notification panel once.
    Notifications,

    /// Mark one notification as read.
    MarkRead { id: i64 },

    /// Mark every notification as read.
    MarkAllRead,

    /// List bookable doctors.
    Doctors,

    /// Free slots for a doctor on a date.
    Slots {
        #[arg(long, help = "Doctor profile id")]
        doctor: i64,
        #[arg(long, help = "Date as YYYY-MM-DD")]
        date: NaiveDate,
    },

    /// Book an appointment.
    Book {
        #[arg(long, help = "Doctor profile id")]
        doctor: i64,
        #[arg(long, help = "Date as YYYY-MM-DD")]
        date: NaiveDate,
        #[arg(long, help = "Slot time as HH:MM")]
        time: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List your appointments.
    Appointments,

    /// Cancel an appointment.
    Cancel { id: i64 },
}

#[derive(clap::Args, Debug)]
struct SignupArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, help = "Mobile number, +88 followed by 11 digits")]
    mobile: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long, value_parser = parse_user_type, default_value = "PATIENT")]
    user_type: UserType,
    #[arg(long)]
    division: i64,
    #[arg(long)]
    district: i64,
    #[arg(long)]
    thana: i64,
    #[arg(long, help = "Doctors only")]
    license: Option<String>,
    #[arg(long, help = "Doctors only")]
    experience_years: Option<i32>,
    #[arg(long, help = "Doctors only")]
    fee: Option<f64>,
    #[arg(long = "slot", help = "Doctors only, HH:MM-HH:MM, repeatable")]
    slots: Vec<String>,
}

fn parse_user_type(raw: &str) -> Result<UserType, String> {
    match raw.to_ascii_uppercase().as_str() {
        "PATIENT" => Ok(UserType::Patient),
        "DOCTOR" => Ok(UserType::Doctor),
        other => Err(format!("unknown user type {other:?}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let storage = FileStorage::new(&config.session_file);
    let storage_path = storage.path().display().to_string();
    let store = TokenStore::open(storage)
        .with_context(|| format!("Failed to open session storage at {}", storage_path))?;
    let state = AppState::new(config, Arc::new(store))?;

    match run(&state, cli.command).await {
        Ok(()) => Ok(()),
        Err(e) => {
            report(&state, &e).await;
            std::process::exit(1);
        }
    }
}

async fn run(state: &AppState, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login {
            email,
            password,
            remember_me,
        } => {
            let mut request = LoginRequest::new(email, password);
            request.remember_me = remember_me;
            let user = state.gateway.login(&request).await?;
            match user {
                Some(user) => println!("Login successful. Welcome, {}!", user.full_name),
                None => println!("Login successful."),
            }
        }
        Command::Signup(args) => {
            let request = signup_request(args);
            let user = state.gateway.signup(&request).await?;
            println!(
                "Account created for {} ({}). You can now log in.",
                user.full_name, user.email
            );
        }
        Command::Logout => {
            state.gateway.logout().await?;
            println!("Logged out.");
        }
        Command::Dashboard => dashboard(state).await?,
        Command::Notifications => {
            let panel = state.notification_poller().fetch_once().await?;
            print_panel(&panel);
        }
        Command::MarkRead { id } => {
            state.notification_poller().mark_read(id).await?;
            println!("Notification {} marked as read.", id);
        }
        Command::MarkAllRead => {
            state.notification_poller().mark_all_read().await?;
            println!("All notifications marked as read.");
        }
        Command::Doctors => {
            let doctors = state.appointments.doctors().await?;
            if doctors.is_empty() {
                println!("No doctors available.");
            }
            for doctor in doctors {
                if let (Some(profile), Some(label)) = (&doctor.doctor_profile, doctor.label()) {
                    println!("[{}] {}", profile.id, label);
                }
            }
        }
        Command::Slots { doctor, date } => {
            let availability = state.appointments.availability(doctor, date).await?;
            let free: Vec<&str> = availability
                .available_slots
                .iter()
                .filter(|s| s.available)
                .map(|s| s.time.as_str())
                .collect();
            if free.is_empty() {
                println!("No available time slots for this date.");
            } else {
                println!("{}", free.join("  "));
            }
        }
        Command::Book {
            doctor,
            date,
            time,
            notes,
        } => {
            let request = AppointmentRequest {
                doctor_id: doctor,
                appointment_date: date,
                appointment_time: time,
                notes: notes.filter(|n| !n.trim().is_empty()),
            };
            let appointment = state.appointments.book(&request).await?;
            println!(
                "Appointment booked successfully! #{} on {} at {}",
                appointment.id, appointment.appointment_date, appointment.appointment_time
            );
        }
        Command::Appointments => {
            let appointments = state.appointments.list().await?;
            if appointments.is_empty() {
                println!("No appointments found.");
            }
            for a in appointments {
                println!(
                    "#{} {:?} Dr. {} on {} at {}{}{}",
                    a.id,
                    a.status,
                    a.doctor_name.as_deref().unwrap_or("Unknown"),
                    a.appointment_date,
                    a.appointment_time,
                    a.notes.map(|n| format!(" ({})", n)).unwrap_or_default(),
                    if a.status.can_cancel() { " [cancellable]" } else { "" }
                );
            }
        }
        Command::Cancel { id } => {
            state.appointments.cancel(id).await?;
            println!("Appointment cancelled successfully.");
        }
    }
    Ok(())
}

/// Dashboard loop: header once, then the notification panel whenever it changes.
async fn dashboard(state: &AppState) -> Result<(), ClientError> {
    let summary = state.gateway.dashboard().await?;
    print_summary(&summary);

    let mut poller = state.notification_poller();
    let mut panels = poller.subscribe();
    poller.start(state.config.poll_interval).await;

    let result = loop {
        tokio::select! {
            redirect = state.redirect.wait() => {
                break Err(ClientError::AuthRequired(redirect.reason));
            }
            changed = panels.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                if let Some(panel) = panels.borrow_and_update().clone() {
                    print_panel(&panel);
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    poller.stop().await;
    result
}

fn print_summary(summary: &DashboardSummary) {
    let user = &summary.session.user;
    if summary.session.is_stale() {
        println!("(offline: showing saved profile)");
    }
    println!("Hello, {}!", user.full_name);
    println!("  Email:     {}", user.email);
    println!("  User type: {}", user.user_type);
    println!("  Mobile:    {}", user.mobile_number);
    match user.profile_image_path() {
        Some(path) => println!("  Picture:   {}", path),
        None => println!("  Picture:   [{}]", user.initial()),
    }
    if let Some(count) = summary.appointments_count {
        println!("  Appointments: {}", count);
    }
}

fn print_panel(panel: &NotificationPanel) {
    match panel.badge() {
        Some(unread) => println!("Notifications ({} unread)", unread),
        None => println!("Notifications"),
    }
    if panel.is_empty() {
        println!("  No notifications to display");
    }
    for item in &panel.items {
        let marker = if item.is_read { " " } else { "*" };
        println!(
            "  {} [{}] {}  {}",
            marker,
            item.id,
            item.summary,
            item.date_label.as_deref().unwrap_or("")
        );
    }
}

/// Banner for the error, then the redirect if the session is gone.
async fn report(state: &AppState, error: &ClientError) {
    match error {
        ClientError::Validation(_) => {
            for (field, message) in error.field_messages() {
                eprintln!("  {}: {}", field, message);
            }
            eprintln!("{}", error.user_message());
        }
        ClientError::AuthRequired(reason) => {
            eprintln!("{}", error.user_message());
            let redirect = state.redirect.pending().unwrap_or(Redirect {
                target: clinic_session::services::redirect::LOGIN_PATH,
                reason: *reason,
            });
            tokio::time::sleep(state.config.redirect_delay).await;
            eprintln!("Redirecting to {} ({})", redirect.target, redirect.reason);
        }
        other => {
            tracing::error!(error = %other, "Command failed");
            eprintln!("{}", other.user_message());
        }
    }
}

fn signup_request(args: SignupArgs) -> SignupRequest {
    let doctor_profile = match args.user_type {
        UserType::Doctor => Some(DoctorProfileInput {
            license_number: args.license.unwrap_or_default(),
            experience_years: args.experience_years.unwrap_or(-1),
            consultation_fee: args.fee.unwrap_or(-1.0),
            available_timeslots: args
                .slots
                .iter()
                .map(|slot| {
                    let (start, end) = slot.split_once('-').unwrap_or((slot.as_str(), ""));
                    TimeslotInput {
                        start_time: start.trim().to_string(),
                        end_time: end.trim().to_string(),
                        is_available: true,
                    }
                })
                .collect(),
        }),
        _ => None,
    };

    SignupRequest {
        full_name: args.name.trim().to_string(),
        email: args.email.trim().to_string(),
        mobile_number: args.mobile.trim().to_string(),
        password: args.password,
        confirm_password: args.confirm_password,
        user_type: args.user_type,
        division_id: args.division,
        district_id: args.district,
        thana_id: args.thana,
        profile_image_base64: None,
        profile_image_filename: None,
        doctor_profile,
    }
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("clinic_session=info,warn")),
        )
        .with(format)
        .init();
}
