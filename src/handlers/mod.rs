pub mod calendar;
pub mod courts;
pub mod health;
pub mod wizard;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/courts", get(courts::list_courts))
        .route("/api/courts/:court_id/slots", get(courts::list_slots))
        .route("/api/wizard", post(wizard::create_session))
        .route("/api/wizard/:id", get(wizard::get_session))
        .route("/api/wizard/:id/court", post(wizard::select_court))
        .route("/api/wizard/:id/date", post(wizard::select_date))
        .route("/api/wizard/:id/toggle", post(wizard::toggle_slot))
        .route("/api/wizard/:id/continue", post(wizard::continue_to_details))
        .route("/api/wizard/:id/details", post(wizard::submit_details))
        .route("/api/wizard/:id/payment", post(wizard::submit_payment))
        .route("/api/wizard/:id/back", post(wizard::go_back))
        .route(
            "/api/wizard/:id/calendar.ics",
            get(calendar::download_ics),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
