// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{NaiveDate, NaiveTime};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    format_slot, hhmm, AppointmentSearchQuery, AppointmentStatus, CandidateAppointment,
    ConflictCheck, CreateAppointmentRequest, SchedulingError, UpdateAppointmentRequest,
};
use crate::services::scheduling::SchedulingService;
use crate::state::SchedulingState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub patient_id: Option<Uuid>,
    pub professional_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub exclude_appointment_id: Option<Uuid>,
}

// ==============================================================================
// APPOINTMENT CRUD HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = SchedulingService::new(state);

    let appointment = service
        .create_appointment(request, token)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = SchedulingService::new(state);

    let appointment = service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = SchedulingService::new(state);

    let appointment = service
        .update_appointment(appointment_id, request, token)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = SchedulingService::new(state);

    service
        .delete_appointment(appointment_id, token)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true
    })))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<AppointmentQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = SchedulingService::new(state);

    let search_query = AppointmentSearchQuery {
        patient_id: params.patient_id,
        professional_id: params.professional_id,
        status: params.status,
        date: params.date,
        from_date: params.from_date,
        to_date: params.to_date,
        limit: params.limit,
        offset: params.offset,
    };

    let appointments = service
        .search_appointments(search_query, token)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
        "limit": params.limit,
        "offset": params.offset
    })))
}

// ==============================================================================
// AVAILABILITY AND CONFLICT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<AvailableSlotsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = SchedulingService::new(state);

    let slots = service
        .available_slots(
            params.professional_id,
            params.date,
            params.exclude_appointment_id,
            token,
        )
        .await
        .map_err(map_scheduling_error)?;

    let slots: Vec<String> = slots.into_iter().map(format_slot).collect();

    Ok(Json(json!({
        "professional_id": params.professional_id,
        "date": params.date,
        "slots": slots
    })))
}

/// Dry-run conflict check for form validation; never writes.
#[axum::debug_handler]
pub async fn check_appointment_conflict(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<ConflictCheckQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = SchedulingService::new(state);

    let candidate = CandidateAppointment {
        patient_id: params.patient_id,
        professional_id: params.professional_id,
        date: params.date,
        start_time: params.start_time,
        end_time: params.end_time,
        status: params.status,
        exclude_id: params.exclude_appointment_id,
    };

    let outcome = service
        .check_conflict(&candidate, token)
        .await
        .map_err(map_scheduling_error)?;

    let body = match outcome {
        ConflictCheck::Accepted => json!({
            "accepted": true
        }),
        ConflictCheck::Rejected(reason) => json!({
            "accepted": false,
            "reason": reason,
            "message": reason.to_string()
        }),
    };

    Ok(Json(body))
}

fn map_scheduling_error(error: SchedulingError) -> AppError {
    match error {
        SchedulingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        SchedulingError::Conflict(reason) => AppError::Conflict(reason.to_string()),
        SchedulingError::InvalidTime(msg) => AppError::BadRequest(msg),
        SchedulingError::Validation(msg) => AppError::BadRequest(msg),
        SchedulingError::Database(msg) => AppError::Database(msg),
    }
}
