pub mod local;
pub mod remote;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Booking, BookingDraft, Court, DayAvailability, PaymentUpdate};

// Court reference data and per-day availability.
#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    async fn list_courts(&self) -> anyhow::Result<Vec<Court>>;

    async fn fetch_availability(
        &self,
        court_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<DayAvailability>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("that time is no longer available, please pick another slot")]
    Conflict,

    #[error("that time is outside opening hours ({hours})")]
    OutsideOpeningHours { hours: String },

    #[error("booking not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

// Owns reservations; its answer on conflicts is final.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create_booking(&self, draft: &BookingDraft) -> Result<Booking, StoreError>;

    async fn update_payment(
        &self,
        booking_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Booking, StoreError>;

    // Releases an unconfirmed booking the guest is replacing or abandoning.
    async fn cancel_booking(&self, booking_id: &str) -> Result<(), StoreError>;
}
