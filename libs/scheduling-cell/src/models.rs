// libs/scheduling-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat status enumeration. Transitions are deliberately unconstrained: any
/// status may be set to any other. Only two carry scheduling semantics:
/// `Cancelled` and `NoShow` are inert and never block other bookings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Inert appointments are excluded from every conflict check and never
    /// occupy availability slots.
    pub fn is_inert(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wire = match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::InProgress => "IN_PROGRESS",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        };
        write!(f, "{}", wire)
    }
}

/// A proposed appointment under conflict evaluation, not yet persisted.
/// `exclude_id` carries the appointment's own id when validating an update so
/// it cannot conflict with itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAppointment {
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub exclude_id: Option<Uuid>,
}

/// Working-hours window driving slot generation. Static configuration, not
/// persisted per professional.
#[derive(Debug, Clone, Copy)]
pub struct SchedulingWindow {
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub slot_minutes: i64,
}

impl Default for SchedulingWindow {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            day_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            slot_minutes: 30,
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub treatment: Option<String>,
}

/// Full-row update, mirroring the create payload. The conflict check re-runs
/// against all other appointments with the updated values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub treatment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub patient_id: Option<Uuid>,
    pub professional_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

// ==============================================================================
// CONFLICT DETECTION MODELS
// ==============================================================================

/// The one rejection the checker reports; checks run in fixed priority order
/// so a candidate violating several rules always reports the first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictReason {
    PatientAlreadyInProgress,
    PatientDailyLimit,
    ProfessionalTimeOverlap,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ConflictReason::PatientAlreadyInProgress => {
                "Patient already has an appointment in progress"
            }
            ConflictReason::PatientDailyLimit => {
                "Patient already has an appointment scheduled that day"
            }
            ConflictReason::ProfessionalTimeOverlap => {
                "Time conflict for this professional"
            }
        };
        write!(f, "{}", message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictCheck {
    Accepted,
    Rejected(ConflictReason),
}

impl ConflictCheck {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConflictCheck::Accepted)
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("{0}")]
    Conflict(ConflictReason),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

// ==============================================================================
// WIRE FORMAT HELPERS
// ==============================================================================

/// Serde adapter for the `HH:MM` wall-clock wire format. Deserialization also
/// accepts `HH:MM:SS`, which some store backends emit for time columns.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

/// Format a slot instant for API responses.
pub fn format_slot(time: NaiveTime) -> String {
    time.format(hhmm::FORMAT).to_string()
}
