// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::state::SchedulingState;

pub fn scheduling_routes(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/", get(handlers::search_appointments))
        .route("/search", get(handlers::search_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}", put(handlers::update_appointment))
        .route("/{appointment_id}", delete(handlers::delete_appointment))
        .route("/availability", get(handlers::get_available_slots))
        .route("/conflicts/check", get(handlers::check_appointment_conflict))
        .with_state(state)
}
