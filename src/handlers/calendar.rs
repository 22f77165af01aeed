use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};

use crate::errors::AppError;
use crate::models::WizardStep;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

// GET /api/wizard/:id/calendar.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (booking, court) = {
        let sessions = state
            .sessions
            .lock()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        let ttl = Duration::minutes(state.config.session_ttl_minutes);
        let session = sessions
            .get(&id)
            .filter(|s| !s.is_expired(Utc::now().naive_utc(), ttl))
            .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;

        match (session.step(), session.booking(), session.court()) {
            (WizardStep::Confirmed, Some(b), Some(c)) => (b.clone(), c.clone()),
            _ => return Err(AppError::NotFound("confirmed booking".to_string())),
        }
    };

    let ics = generate_ics(&booking, &court);
    let filename = format!("booking-{}.ics", booking.booking_reference);

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
