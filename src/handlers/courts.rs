use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{CandidateSlot, Court, TimeInterval};
use crate::services::slots::generate_slots;
use crate::state::AppState;

// GET /api/courts
pub async fn list_courts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Court>>, AppError> {
    let courts = state.availability.list_courts().await.map_err(|e| {
        tracing::error!(error = %e, "failed to load courts");
        AppError::AvailabilityFetch(e.to_string())
    })?;
    Ok(Json(courts))
}

// GET /api/courts/:court_id/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    court_id: String,
    date: String,
    shared_allocation: bool,
    slots: Vec<CandidateSlot>,
}

pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Path(court_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let day = state
        .availability
        .fetch_availability(&court_id, query.date)
        .await
        .map_err(|e| {
            tracing::warn!(court = %court_id, error = %e, "availability fetch failed");
            AppError::AvailabilityFetch(e.to_string())
        })?;

    let windows: Vec<TimeInterval> = day.available_windows.iter().map(|w| w.interval()).collect();
    let slots = generate_slots(day.shared_allocation, &windows, &day.booked_intervals);

    Ok(Json(SlotsResponse {
        court_id,
        date: query.date.format("%Y-%m-%d").to_string(),
        shared_allocation: day.shared_allocation,
        slots,
    }))
}
