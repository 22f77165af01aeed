use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{
    AllocationType, Booking, BookingDraft, CandidateSlot, Court, DayAvailability, GuestDetails,
    PaymentUpdate, TimeInterval, WizardStep,
};
use crate::services::backend::StoreError;
use crate::services::draft::{assemble, ValidationError};
use crate::services::pricing::{price_allocation, price_selection};
use crate::services::selection::{RejectionReason, SelectionSet};
use crate::services::slots::generate_slots;

// How long a selection rejection stays visible.
pub const NOTICE_TTL_SECS: i64 = 3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("cannot go from {} to {}", .from.as_str(), .to.as_str())]
    StepOrder { from: WizardStep, to: WizardStep },

    #[error("this booking is already confirmed")]
    AlreadyConfirmed,

    #[error("choose a court and a date first")]
    NoCourtOrDate,

    #[error("no available slot starts at {0}")]
    UnknownSlot(NaiveDateTime),

    #[error("a request for this booking is already in progress")]
    RequestPending,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// What a details submission still needs from the booking store.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    // The held booking already matches the details.
    Unchanged,
    Create {
        draft: BookingDraft,
        replaces: Option<String>,
    },
}

// Identifies one availability fetch. Results carrying an outdated
// generation are dropped on arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub court_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
struct Notice {
    message: String,
    raised_at: NaiveDateTime,
}

// One guest's pass through the booking wizard.
#[derive(Debug, Clone)]
pub struct WizardSession {
    id: String,
    step: WizardStep,
    court: Option<Court>,
    date: Option<NaiveDate>,
    generation: u64,
    loading: bool,
    slots: Vec<CandidateSlot>,
    selection: SelectionSet,
    notice: Option<Notice>,
    errors: HashMap<WizardStep, String>,
    booking: Option<Booking>,
    in_flight: bool,
    last_activity: NaiveDateTime,
}

impl WizardSession {
    pub fn new(id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            step: WizardStep::SelectCourt,
            court: None,
            date: None,
            generation: 0,
            loading: false,
            slots: vec![],
            selection: SelectionSet::new(),
            notice: None,
            errors: HashMap::new(),
            booking: None,
            in_flight: false,
            last_activity: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn slots(&self) -> &[CandidateSlot] {
        &self.slots
    }

    pub fn booking(&self) -> Option<&Booking> {
        self.booking.as_ref()
    }

    pub fn court(&self) -> Option<&Court> {
        self.court.as_ref()
    }

    pub fn touch(&mut self, now: NaiveDateTime) {
        self.last_activity = now;
    }

    pub fn is_expired(&self, now: NaiveDateTime, ttl: Duration) -> bool {
        now - self.last_activity > ttl
    }

    // Picks (or switches) the court. Returns a fetch to run when a date is already chosen.
    pub fn select_court(&mut self, court: Court) -> Result<Option<FetchTicket>, WizardError> {
        self.require_before(WizardStep::EnterDetails)?;

        let changed = self.court.as_ref().map(|c| c.id != court.id).unwrap_or(true);
        self.court = Some(court);
        if changed {
            self.reset_time_selection();
        }
        self.enter(WizardStep::SelectTime);

        Ok(self.date.is_some().then(|| self.begin_fetch()).flatten())
    }

    pub fn select_date(&mut self, date: NaiveDate) -> Result<FetchTicket, WizardError> {
        if self.step != WizardStep::SelectTime {
            return Err(self.step_order(WizardStep::SelectTime));
        }
        if self.date != Some(date) {
            self.date = Some(date);
            self.reset_time_selection();
        }
        self.begin_fetch().ok_or(WizardError::NoCourtOrDate)
    }

    // Re-fetches availability for the current court and date, superseding any fetch in flight.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        let court_id = self.court.as_ref()?.id.clone();
        let date = self.date?;
        self.generation += 1;
        self.loading = true;
        Some(FetchTicket {
            generation: self.generation,
            court_id,
            date,
        })
    }

    // Applies a fetch result. Returns `false` when the result is stale and was discarded.
    pub fn apply_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<DayAvailability, String>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                session = %self.id,
                stale = ticket.generation,
                current = self.generation,
                "discarding stale availability"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(day) => {
                let windows: Vec<TimeInterval> =
                    day.available_windows.iter().map(|w| w.interval()).collect();
                self.slots = generate_slots(day.shared_allocation, &windows, &day.booked_intervals);
                if let Some(court) = self.court.as_mut() {
                    court.shared_allocation = day.shared_allocation;
                }
                if self.errors.get(&WizardStep::SelectTime).map(String::as_str)
                    == Some(AVAILABILITY_ERROR)
                {
                    self.errors.remove(&WizardStep::SelectTime);
                }
            }
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "availability fetch failed");
                self.slots.clear();
                self.errors
                    .insert(WizardStep::SelectTime, AVAILABILITY_ERROR.to_string());
            }
        }
        true
    }

    // Toggles the candidate slot starting at `start`. A refused change is
    // reported as a transient notice and returned, with the selection untouched.
    pub fn toggle(
        &mut self,
        start: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<Option<RejectionReason>, WizardError> {
        if self.step != WizardStep::SelectTime {
            return Err(self.step_order(WizardStep::SelectTime));
        }
        // A refresh may have dropped a slot that is still selected; it must stay removable.
        let slot = self
            .selection
            .slots()
            .iter()
            .chain(self.slots.iter())
            .find(|s| s.interval.start == start)
            .cloned()
            .ok_or(WizardError::UnknownSlot(start))?;

        match self.selection.toggle(slot) {
            Ok(()) => {
                self.notice = None;
                Ok(None)
            }
            Err(reason) => {
                self.notice = Some(Notice {
                    message: reason.to_string(),
                    raised_at: now,
                });
                Ok(Some(reason))
            }
        }
    }

    pub fn continue_to_details(&mut self) -> Result<(), WizardError> {
        if self.step != WizardStep::SelectTime {
            return Err(self.step_order(WizardStep::EnterDetails));
        }
        if self.selection.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }
        self.enter(WizardStep::EnterDetails);
        Ok(())
    }

    // Assembles the draft. A booking already held by this session is kept when
    // the draft still matches it and replaced otherwise.
    pub fn begin_submit(
        &mut self,
        guest: &GuestDetails,
        allocation: AllocationType,
    ) -> Result<Submission, WizardError> {
        if self.step != WizardStep::EnterDetails {
            return Err(self.step_order(WizardStep::ChoosePayment));
        }
        if self.in_flight {
            return Err(WizardError::RequestPending);
        }

        let draft = match assemble(&self.selection, self.court.as_ref(), guest, allocation) {
            Ok(draft) => draft,
            Err(e) => {
                self.errors.insert(WizardStep::EnterDetails, e.to_string());
                return Err(e.into());
            }
        };
        self.errors.remove(&WizardStep::EnterDetails);

        if self.booking.as_ref().is_some_and(|b| b.matches_draft(&draft)) {
            self.step = WizardStep::ChoosePayment;
            return Ok(Submission::Unchanged);
        }

        self.in_flight = true;
        Ok(Submission::Create {
            replaces: self.booking.as_ref().map(|b| b.id.clone()),
            draft,
        })
    }

    // Records the store's answer to a submission. A conflict invalidates the
    // selection and sends the guest back to time selection; the returned
    // ticket refreshes the now outdated availability.
    pub fn finish_submit(&mut self, result: &Result<Booking, StoreError>) -> Option<FetchTicket> {
        self.in_flight = false;
        match result {
            Ok(booking) => {
                self.booking = Some(booking.clone());
                self.step = WizardStep::ChoosePayment;
                None
            }
            Err(StoreError::Conflict) => {
                self.selection.clear();
                self.enter(WizardStep::SelectTime);
                self.errors
                    .insert(WizardStep::SelectTime, StoreError::Conflict.to_string());
                self.begin_fetch()
            }
            Err(e) => {
                self.errors.insert(WizardStep::EnterDetails, e.to_string());
                None
            }
        }
    }

    pub fn begin_payment(&mut self) -> Result<String, WizardError> {
        if self.step != WizardStep::ChoosePayment {
            return Err(self.step_order(WizardStep::Confirmed));
        }
        if self.in_flight {
            return Err(WizardError::RequestPending);
        }
        let booking_id = self
            .booking
            .as_ref()
            .map(|b| b.id.clone())
            .ok_or_else(|| self.step_order(WizardStep::Confirmed))?;
        self.in_flight = true;
        Ok(booking_id)
    }

    pub fn finish_payment(&mut self, result: &Result<Booking, StoreError>) {
        self.in_flight = false;
        match result {
            Ok(booking) => {
                self.booking = Some(booking.clone());
                self.errors.remove(&WizardStep::ChoosePayment);
                self.step = WizardStep::Confirmed;
            }
            Err(e) => {
                self.errors.insert(
                    WizardStep::ChoosePayment,
                    format!("payment update failed: {e}"),
                );
            }
        }
    }

    // Moves back to an earlier step. Returns the held booking to release when
    // leaving the details step behind; it stays held until `release_booking`.
    pub fn back(&mut self, to: WizardStep) -> Result<Option<String>, WizardError> {
        if self.step == WizardStep::Confirmed {
            return Err(WizardError::AlreadyConfirmed);
        }
        if self.in_flight {
            return Err(WizardError::RequestPending);
        }
        if to >= self.step {
            return Err(self.step_order(to));
        }
        self.enter(to);

        let release = match &self.booking {
            Some(b) if to < WizardStep::EnterDetails => Some(b.id.clone()),
            _ => None,
        };
        Ok(release)
    }

    // Forgets a booking the store has cancelled.
    pub fn release_booking(&mut self, booking_id: &str) {
        if self.booking.as_ref().is_some_and(|b| b.id == booking_id) {
            self.booking = None;
        }
    }

    pub fn notice(&self, now: NaiveDateTime) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| now - n.raised_at < Duration::seconds(NOTICE_TTL_SECS))
            .map(|n| n.message.as_str())
    }

    pub fn view(&self, now: NaiveDateTime) -> WizardView {
        let court = self.court.clone();
        let span = self.selection.span();
        let total_price = court.as_ref().map(|c| price_selection(c, &self.selection));
        let half_court_price = match (&court, &span) {
            (Some(c), Some(span)) if c.shared_allocation => {
                Some(price_allocation(c, span, AllocationType::HalfA))
            }
            _ => None,
        };

        WizardView {
            id: self.id.clone(),
            step: self.step,
            court,
            date: self.date.map(|d| d.format("%Y-%m-%d").to_string()),
            loading: self.loading,
            slots: self
                .slots
                .iter()
                .map(|s| SlotView {
                    selected: self.selection.contains(&s.interval),
                    slot: s.clone(),
                })
                .collect(),
            selection: self.selection.slots().to_vec(),
            span,
            duration_hours: self.selection.size(),
            total_price,
            half_court_price,
            notice: self.notice(now).map(str::to_string),
            error: self.errors.get(&self.step).cloned(),
            booking: self.booking.clone(),
        }
    }

    fn enter(&mut self, step: WizardStep) {
        if matches!(step, WizardStep::SelectTime | WizardStep::EnterDetails) {
            self.errors.remove(&step);
        }
        self.step = step;
    }

    fn reset_time_selection(&mut self) {
        self.selection.clear();
        self.slots.clear();
        self.notice = None;
        // Any fetch still in flight belongs to the old court or date.
        self.generation += 1;
        self.loading = false;
    }

    fn require_before(&self, limit: WizardStep) -> Result<(), WizardError> {
        if self.step >= limit {
            return Err(self.step_order(WizardStep::SelectTime));
        }
        Ok(())
    }

    fn step_order(&self, to: WizardStep) -> WizardError {
        if self.step == WizardStep::Confirmed {
            return WizardError::AlreadyConfirmed;
        }
        WizardError::StepOrder {
            from: self.step,
            to,
        }
    }
}

const AVAILABILITY_ERROR: &str = "could not load availability, please try again";

#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    #[serde(flatten)]
    pub slot: CandidateSlot,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub id: String,
    pub step: WizardStep,
    pub court: Option<Court>,
    pub date: Option<String>,
    pub loading: bool,
    pub slots: Vec<SlotView>,
    pub selection: Vec<CandidateSlot>,
    pub span: Option<TimeInterval>,
    pub duration_hours: usize,
    pub total_price: Option<f64>,
    pub half_court_price: Option<f64>,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub booking: Option<Booking>,
}
