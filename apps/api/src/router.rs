use std::sync::Arc;

use axum::{routing::get, Router};

use scheduling_cell::router::scheduling_routes;
use scheduling_cell::state::SchedulingState;

pub fn create_router(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic Agenda API is running!" }))
        .nest("/appointments", scheduling_routes(state))
}
