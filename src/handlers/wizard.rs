use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{
    AllocationType, Booking, BookingDraft, GuestDetails, PaymentMethod, PaymentUpdate, WizardStep,
};
use crate::services::backend::StoreError;
use crate::services::wizard::{FetchTicket, Submission, WizardSession, WizardView};
use crate::state::AppState;

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

// Runs `f` against a live session while holding the session lock.
fn with_session<T>(
    state: &AppState,
    id: &str,
    f: impl FnOnce(&mut WizardSession) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
    let ttl = Duration::minutes(state.config.session_ttl_minutes);
    let now = now();

    let expired = match sessions.get(id) {
        Some(s) => s.is_expired(now, ttl),
        None => return Err(AppError::NotFound(format!("session {id}"))),
    };
    if expired {
        sessions.remove(id);
        tracing::debug!(session = %id, "wizard session expired");
        return Err(AppError::NotFound(format!("session {id}")));
    }

    let session = sessions
        .get_mut(id)
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
    session.touch(now);
    f(session)
}

fn view_of(state: &AppState, id: &str) -> Result<Json<WizardView>, AppError> {
    with_session(state, id, |s| Ok(Json(s.view(now()))))
}

// Fetches availability without holding the session lock, then hands the
// result back to the session.
async fn run_fetch(state: &AppState, id: &str, ticket: FetchTicket) -> Result<(), AppError> {
    let result = state
        .availability
        .fetch_availability(&ticket.court_id, ticket.date)
        .await
        .map_err(|e| format!("{e:#}"));

    with_session(state, id, |s| {
        if !s.apply_fetch(&ticket, result) {
            tracing::debug!(session = %id, "availability result arrived after a newer request");
        }
        Ok(())
    })
}

// POST /api/wizard
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<WizardView>), AppError> {
    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
    let now = now();
    let ttl = Duration::minutes(state.config.session_ttl_minutes);

    let before = sessions.len();
    sessions.retain(|_, s| !s.is_expired(now, ttl));
    if sessions.len() < before {
        tracing::debug!(evicted = before - sessions.len(), "evicted idle wizard sessions");
    }

    let id = uuid::Uuid::new_v4().to_string();
    let session = WizardSession::new(id.clone(), now);
    let view = session.view(now);
    sessions.insert(id.clone(), session);
    tracing::info!(session = %id, "wizard session started");

    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/wizard/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WizardView>, AppError> {
    view_of(&state, &id)
}

// POST /api/wizard/:id/court
#[derive(Deserialize)]
pub struct SelectCourtRequest {
    pub court_id: String,
}

pub async fn select_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SelectCourtRequest>,
) -> Result<Json<WizardView>, AppError> {
    let courts = state.availability.list_courts().await.map_err(|e| {
        tracing::error!(error = %e, "failed to load courts");
        AppError::AvailabilityFetch(e.to_string())
    })?;
    let court = courts
        .into_iter()
        .find(|c| c.id == body.court_id)
        .ok_or_else(|| AppError::NotFound(format!("court {}", body.court_id)))?;

    let ticket = with_session(&state, &id, |s| Ok(s.select_court(court)?))?;
    if let Some(ticket) = ticket {
        run_fetch(&state, &id, ticket).await?;
    }
    view_of(&state, &id)
}

// POST /api/wizard/:id/date
#[derive(Deserialize)]
pub struct SelectDateRequest {
    pub date: NaiveDate,
}

pub async fn select_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SelectDateRequest>,
) -> Result<Json<WizardView>, AppError> {
    let ticket = with_session(&state, &id, |s| Ok(s.select_date(body.date)?))?;
    run_fetch(&state, &id, ticket).await?;
    view_of(&state, &id)
}

// POST /api/wizard/:id/toggle
#[derive(Deserialize)]
pub struct ToggleRequest {
    pub start: NaiveDateTime,
}

pub async fn toggle_slot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<WizardView>, AppError> {
    with_session(&state, &id, |s| {
        let now = now();
        if let Some(reason) = s.toggle(body.start, now)? {
            tracing::debug!(session = %id, reason = %reason, "slot change refused");
        }
        Ok(Json(s.view(now)))
    })
}

// POST /api/wizard/:id/continue
pub async fn continue_to_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WizardView>, AppError> {
    with_session(&state, &id, |s| {
        s.continue_to_details()?;
        Ok(Json(s.view(now())))
    })
}

// POST /api/wizard/:id/details
#[derive(Deserialize)]
pub struct DetailsRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub allocation_type: AllocationType,
}

pub async fn submit_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<DetailsRequest>,
) -> Result<Json<WizardView>, AppError> {
    let guest = GuestDetails {
        name: body.name,
        email: body.email,
        phone: body.phone,
        notes: body.notes,
    };

    let submission = with_session(&state, &id, |s| {
        Ok(s.begin_submit(&guest, body.allocation_type)?)
    })?;
    let (draft, replaces) = match submission {
        Submission::Unchanged => {
            tracing::debug!(session = %id, "details unchanged, keeping booking");
            return view_of(&state, &id);
        }
        Submission::Create { draft, replaces } => (draft, replaces),
    };

    // The store call runs detached so the session is settled even if the client goes away.
    let result = tokio::spawn(create_booking(Arc::clone(&state), id.clone(), draft, replaces))
        .await
        .map_err(|e| anyhow::anyhow!("booking task failed: {e}"))?;

    result.map_err(AppError::from_create)?;
    view_of(&state, &id)
}

async fn create_booking(
    state: Arc<AppState>,
    id: String,
    draft: BookingDraft,
    replaces: Option<String>,
) -> Result<Booking, StoreError> {
    if let Some(old) = replaces {
        match state.store.cancel_booking(&old).await {
            Ok(()) | Err(StoreError::NotFound(_)) => {
                tracing::info!(session = %id, booking = %old, "released replaced booking");
                settle(&state, &id, |s| s.release_booking(&old));
            }
            Err(e) => {
                tracing::warn!(session = %id, booking = %old, error = %e, "could not release booking");
                let result: Result<Booking, StoreError> = Err(e);
                settle(&state, &id, |s| {
                    s.finish_submit(&result);
                });
                return result;
            }
        }
    }

    let result = state.store.create_booking(&draft).await;
    match &result {
        Ok(booking) => tracing::info!(
            session = %id,
            reference = %booking.booking_reference,
            court = %booking.court_id,
            "booking created"
        ),
        Err(e) => tracing::warn!(session = %id, error = %e, "booking creation failed"),
    }

    if let Some(ticket) = settle(&state, &id, |s| s.finish_submit(&result)).flatten() {
        if let Err(e) = run_fetch(&state, &id, ticket).await {
            tracing::warn!(session = %id, error = %e, "refresh after conflict failed");
        }
    }
    result
}

// Applies a store outcome to the session. The session may have expired meanwhile.
fn settle<T>(state: &AppState, id: &str, f: impl FnOnce(&mut WizardSession) -> T) -> Option<T> {
    match with_session(state, id, |s| Ok(f(s))) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(session = %id, error = %e, "store outcome not applied");
            None
        }
    }
}

// POST /api/wizard/:id/payment
#[derive(Deserialize)]
pub struct PaymentRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub pay_later: bool,
}

pub async fn submit_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<PaymentRequest>,
) -> Result<Json<WizardView>, AppError> {
    let update = PaymentUpdate {
        payment_method: body.payment_method,
        pay_later: body.pay_later,
    };

    let booking_id = with_session(&state, &id, |s| Ok(s.begin_payment()?))?;
    let result = tokio::spawn(record_payment(Arc::clone(&state), id.clone(), booking_id, update))
        .await
        .map_err(|e| anyhow::anyhow!("payment task failed: {e}"))?;

    result.map_err(AppError::from_payment)?;
    view_of(&state, &id)
}

async fn record_payment(
    state: Arc<AppState>,
    id: String,
    booking_id: String,
    update: PaymentUpdate,
) -> Result<Booking, StoreError> {
    let result = state.store.update_payment(&booking_id, &update).await;
    match &result {
        Ok(booking) => tracing::info!(
            session = %id,
            reference = %booking.booking_reference,
            status = booking.payment_status.as_str(),
            "payment recorded"
        ),
        Err(e) => tracing::warn!(session = %id, error = %e, "payment update failed"),
    }

    settle(&state, &id, |s| s.finish_payment(&result));
    result
}

// POST /api/wizard/:id/back
#[derive(Deserialize)]
pub struct BackRequest {
    pub step: WizardStep,
}

pub async fn go_back(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<BackRequest>,
) -> Result<Json<WizardView>, AppError> {
    let release = with_session(&state, &id, |s| Ok(s.back(body.step)?))?;
    if let Some(booking_id) = release {
        tokio::spawn(release_booking(Arc::clone(&state), id.clone(), booking_id))
            .await
            .map_err(|e| anyhow::anyhow!("release task failed: {e}"))?
            .map_err(|e| AppError::Backend(e.to_string()))?;
    }
    view_of(&state, &id)
}

async fn release_booking(
    state: Arc<AppState>,
    id: String,
    booking_id: String,
) -> Result<(), StoreError> {
    match state.store.cancel_booking(&booking_id).await {
        Ok(()) | Err(StoreError::NotFound(_)) => {
            tracing::info!(session = %id, booking = %booking_id, "released booking");
            settle(&state, &id, |s| s.release_booking(&booking_id));
            Ok(())
        }
        Err(e) => {
            tracing::warn!(session = %id, booking = %booking_id, error = %e, "could not release booking");
            Err(e)
        }
    }
}
