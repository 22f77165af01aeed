use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::Connection;

use super::{AvailabilityProvider, BookingStore, StoreError};
use crate::db::queries;
use crate::models::{
    AvailabilityWindow, BookedInterval, Booking, BookingDraft, Court, DayAvailability,
    OpeningHours, PaymentStatus, PaymentUpdate,
};
use crate::services::slots::can_book;

// SQLite-backed stand-in for the reservations backend, used when no remote is configured.
#[derive(Clone)]
pub struct LocalBackend {
    db: Arc<Mutex<Connection>>,
}

impl LocalBackend {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }
}

fn booked_intervals(bookings: &[Booking]) -> Vec<BookedInterval> {
    bookings
        .iter()
        .map(|b| BookedInterval {
            start_time: b.interval.start,
            end_time: b.interval.end,
            allocation_type: b.allocation_type,
        })
        .collect()
}

fn load_court(conn: &Connection, court_id: &str) -> anyhow::Result<Court> {
    queries::get_court(conn, court_id)?.ok_or_else(|| anyhow::anyhow!("unknown court: {court_id}"))
}

#[async_trait]
impl AvailabilityProvider for LocalBackend {
    async fn list_courts(&self) -> anyhow::Result<Vec<Court>> {
        let db = self.conn()?;
        queries::list_courts(&db)
    }

    async fn fetch_availability(
        &self,
        court_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<DayAvailability> {
        let db = self.conn()?;
        let court = load_court(&db, court_id)?;
        let hours = queries::get_opening_hours(&db, court_id)?
            .ok_or_else(|| anyhow::anyhow!("no opening hours for court: {court_id}"))?;

        let day_start = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("invalid date: {date}"))?;
        let day_end = day_start + Duration::days(1);
        let bookings = queries::get_bookings_overlapping(&db, court_id, &day_start, &day_end)?;

        Ok(DayAvailability {
            available_windows: hours
                .windows_on(date)
                .into_iter()
                .map(AvailabilityWindow::from)
                .collect(),
            booked_intervals: booked_intervals(&bookings),
            shared_allocation: court.shared_allocation,
        })
    }
}

#[async_trait]
impl BookingStore for LocalBackend {
    async fn create_booking(&self, draft: &BookingDraft) -> Result<Booking, StoreError> {
        let db = self.conn()?;
        let court = load_court(&db, &draft.court_id)?;
        let hours = queries::get_opening_hours(&db, &draft.court_id)?
            .unwrap_or(OpeningHours { slots: vec![] });

        let within_hours = hours
            .windows_on(draft.interval.start.date())
            .iter()
            .any(|w| w.start <= draft.interval.start && draft.interval.end <= w.end);
        if !within_hours {
            return Err(StoreError::OutsideOpeningHours {
                hours: hours.to_human_readable(),
            });
        }

        let existing = queries::get_bookings_overlapping(
            &db,
            &draft.court_id,
            &draft.interval.start,
            &draft.interval.end,
        )?;
        if !can_book(
            court.shared_allocation,
            &draft.interval,
            draft.allocation_type,
            &booked_intervals(&existing),
        ) {
            tracing::info!(
                court = %draft.court_id,
                interval = %draft.interval.display(),
                "rejecting conflicting booking"
            );
            return Err(StoreError::Conflict);
        }

        let id = uuid::Uuid::new_v4();
        let booking = Booking {
            id: id.to_string(),
            booking_reference: booking_reference(&id),
            court_id: draft.court_id.clone(),
            interval: draft.interval,
            allocation_type: draft.allocation_type,
            guest_name: draft.guest_name.clone(),
            guest_email: draft.guest_email.clone(),
            guest_phone: draft.guest_phone.clone(),
            notes: draft.notes.clone(),
            total_price: draft.total_price,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            created_at: Utc::now().naive_utc(),
        };
        queries::create_booking(&db, &booking)?;

        tracing::info!(
            booking = %booking.id,
            reference = %booking.booking_reference,
            court = %booking.court_id,
            "booking created"
        );
        Ok(booking)
    }

    async fn update_payment(
        &self,
        booking_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Booking, StoreError> {
        let db = self.conn()?;
        let status = if update.pay_later {
            PaymentStatus::Unpaid
        } else {
            PaymentStatus::Paid
        };

        if !queries::update_payment(&db, booking_id, update.payment_method, status)? {
            return Err(StoreError::NotFound(booking_id.to_string()));
        }

        queries::get_booking_by_id(&db, booking_id)?
            .ok_or_else(|| StoreError::NotFound(booking_id.to_string()))
    }

    async fn cancel_booking(&self, booking_id: &str) -> Result<(), StoreError> {
        let db = self.conn()?;
        if !queries::cancel_booking(&db, booking_id)? {
            return Err(StoreError::NotFound(booking_id.to_string()));
        }
        tracing::info!(booking = %booking_id, "booking released");
        Ok(())
    }
}

fn booking_reference(id: &uuid::Uuid) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("CB-{}", &simple[..8])
}
