// libs/scheduling-cell/src/services/scheduling.rs
//
// Store-facing scheduling service. Loads the scoped appointment sets the
// conflict checker needs, runs the pure checks, and performs the writes while
// holding the professional's agenda lock.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::store::StoreClient;

use crate::models::{
    hhmm, Appointment, AppointmentSearchQuery, AppointmentStatus, CandidateAppointment,
    ConflictCheck, CreateAppointmentRequest, SchedulingError, UpdateAppointmentRequest,
};
use crate::services::{availability, conflict};
use crate::state::SchedulingState;

const APPOINTMENTS_PATH: &str = "/rest/v1/appointments";
const NON_INERT_FILTER: &str = "status=not.in.(CANCELLED,NO_SHOW)";

pub struct SchedulingService {
    store: StoreClient,
    state: Arc<SchedulingState>,
}

impl SchedulingService {
    pub fn new(state: Arc<SchedulingState>) -> Self {
        Self {
            store: StoreClient::new(&state.config),
            state,
        }
    }

    /// Validate, conflict-check and persist a new appointment. The whole
    /// read-check-write sequence runs under the professional's agenda lock.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        validate_times(request.start_time, request.end_time)?;

        let candidate = CandidateAppointment {
            patient_id: request.patient_id,
            professional_id: request.professional_id,
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            status: request.status,
            exclude_id: None,
        };

        let lock = self.state.professional_lock(candidate.professional_id);
        let _guard = lock.lock().await;

        self.reject_on_conflict(&candidate, auth_token).await?;

        let now = Utc::now();
        let row = json!({
            "patient_id": request.patient_id,
            "professional_id": request.professional_id,
            "date": request.date,
            "start_time": request.start_time.format(hhmm::FORMAT).to_string(),
            "end_time": request.end_time.format(hhmm::FORMAT).to_string(),
            "status": request.status,
            "notes": request.notes.unwrap_or_default(),
            "treatment": request.treatment.unwrap_or_default(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let created: Vec<Appointment> = self
            .store
            .request_with_headers(
                Method::POST,
                APPOINTMENTS_PATH,
                Some(auth_token),
                Some(row),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| SchedulingError::Database("store returned no row for insert".to_string()))
    }

    /// Re-validate and persist a full-row update. The edited appointment is
    /// excluded from every check so it cannot conflict with itself.
    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        validate_times(request.start_time, request.end_time)?;

        let candidate = CandidateAppointment {
            patient_id: request.patient_id,
            professional_id: request.professional_id,
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            status: request.status,
            exclude_id: Some(appointment_id),
        };

        let lock = self.state.professional_lock(candidate.professional_id);
        let _guard = lock.lock().await;

        self.reject_on_conflict(&candidate, auth_token).await?;

        let row = json!({
            "patient_id": request.patient_id,
            "professional_id": request.professional_id,
            "date": request.date,
            "start_time": request.start_time.format(hhmm::FORMAT).to_string(),
            "end_time": request.end_time.format(hhmm::FORMAT).to_string(),
            "status": request.status,
            "notes": request.notes.unwrap_or_default(),
            "treatment": request.treatment.unwrap_or_default(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, appointment_id);
        let updated: Vec<Appointment> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(row),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        updated.into_iter().next().ok_or(SchedulingError::NotFound)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, appointment_id);
        let rows: Vec<Appointment> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(SchedulingError::NotFound)
    }

    /// Hard delete. Cancelling is a status update and keeps the row; this
    /// drops it from history entirely.
    pub async fn delete_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, appointment_id);
        let _: Vec<serde_json::Value> = self
            .store
            .request(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        Ok(())
    }

    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut query_parts = Vec::new();

        if let Some(patient_id) = query.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(professional_id) = query.professional_id {
            query_parts.push(format!("professional_id=eq.{}", professional_id));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(date) = query.date {
            query_parts.push(format!("date=eq.{}", date));
        }
        if let Some(from_date) = query.from_date {
            query_parts.push(format!("date=gte.{}", from_date));
        }
        if let Some(to_date) = query.to_date {
            query_parts.push(format!("date=lte.{}", to_date));
        }
        if let Some(limit) = query.limit {
            query_parts.push(format!("limit={}", limit));
        }
        if let Some(offset) = query.offset {
            query_parts.push(format!("offset={}", offset));
        }

        query_parts.push("order=date.asc,start_time.asc".to_string());

        let path = format!("{}?{}", APPOINTMENTS_PATH, query_parts.join("&"));
        self.store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))
    }

    /// Bookable start instants for a professional on a date, using the
    /// configured working-hours window.
    pub async fn available_slots(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<NaiveTime>, SchedulingError> {
        let appointments = self
            .professional_day_appointments(professional_id, date, exclude_id, auth_token)
            .await?;

        let window = self.state.window();
        Ok(availability::available_slots(
            professional_id,
            date,
            &window,
            &appointments,
            exclude_id,
        ))
    }

    /// Dry-run conflict check: loads the scoped sets and runs the pure policy
    /// without writing anything.
    pub async fn check_conflict(
        &self,
        candidate: &CandidateAppointment,
        auth_token: &str,
    ) -> Result<ConflictCheck, SchedulingError> {
        validate_times(candidate.start_time, candidate.end_time)?;

        let existing = self.load_candidate_context(candidate, auth_token).await?;
        Ok(conflict::check_conflict(candidate, &existing))
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn reject_on_conflict(
        &self,
        candidate: &CandidateAppointment,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        let existing = self.load_candidate_context(candidate, auth_token).await?;

        match conflict::check_conflict(candidate, &existing) {
            ConflictCheck::Accepted => Ok(()),
            ConflictCheck::Rejected(reason) => {
                warn!(
                    "Conflict for professional {} on {}: {}",
                    candidate.professional_id, candidate.date, reason
                );
                Err(SchedulingError::Conflict(reason))
            }
        }
    }

    /// The checker's inputs are scoped repository reads, not table scans:
    /// the professional's day, the patient's day, and (only for in-progress
    /// candidates) the patient's in-progress appointments across dates.
    async fn load_candidate_context(
        &self,
        candidate: &CandidateAppointment,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        debug!(
            "Loading conflict context for professional {} / patient {} on {}",
            candidate.professional_id, candidate.patient_id, candidate.date
        );

        let mut existing = self
            .professional_day_appointments(
                candidate.professional_id,
                candidate.date,
                candidate.exclude_id,
                auth_token,
            )
            .await?;

        existing.extend(
            self.patient_day_appointments(
                candidate.patient_id,
                candidate.date,
                candidate.exclude_id,
                auth_token,
            )
            .await?,
        );

        if candidate.status == AppointmentStatus::InProgress {
            existing.extend(
                self.patient_in_progress_appointments(
                    candidate.patient_id,
                    candidate.exclude_id,
                    auth_token,
                )
                .await?,
            );
        }

        Ok(existing)
    }

    async fn professional_day_appointments(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut query_parts = vec![
            format!("professional_id=eq.{}", professional_id),
            format!("date=eq.{}", date),
            NON_INERT_FILTER.to_string(),
        ];
        if let Some(id) = exclude_id {
            query_parts.push(format!("id=neq.{}", id));
        }

        self.fetch_appointments(&query_parts, auth_token).await
    }

    async fn patient_day_appointments(
        &self,
        patient_id: Uuid,
        date: NaiveDate,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut query_parts = vec![
            format!("patient_id=eq.{}", patient_id),
            format!("date=eq.{}", date),
            NON_INERT_FILTER.to_string(),
        ];
        if let Some(id) = exclude_id {
            query_parts.push(format!("id=neq.{}", id));
        }

        self.fetch_appointments(&query_parts, auth_token).await
    }

    async fn patient_in_progress_appointments(
        &self,
        patient_id: Uuid,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut query_parts = vec![
            format!("patient_id=eq.{}", patient_id),
            "status=eq.IN_PROGRESS".to_string(),
        ];
        if let Some(id) = exclude_id {
            query_parts.push(format!("id=neq.{}", id));
        }

        self.fetch_appointments(&query_parts, auth_token).await
    }

    async fn fetch_appointments(
        &self,
        query_parts: &[String],
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let path = format!(
            "{}?{}&order=start_time.asc",
            APPOINTMENTS_PATH,
            query_parts.join("&")
        );

        self.store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))
    }
}

fn validate_times(start_time: NaiveTime, end_time: NaiveTime) -> Result<(), SchedulingError> {
    if start_time >= end_time {
        return Err(SchedulingError::InvalidTime(
            "start_time must be strictly before end_time".to_string(),
        ));
    }
    Ok(())
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}
