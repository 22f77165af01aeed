use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;

use super::{AvailabilityProvider, BookingStore, StoreError};
use crate::models::{Booking, BookingDraft, Court, DayAvailability, PaymentUpdate};

#[derive(Clone)]
pub struct RemoteBackend {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl AvailabilityProvider for RemoteBackend {
    async fn list_courts(&self) -> anyhow::Result<Vec<Court>> {
        let courts: Vec<Court> = self
            .client
            .get(format!("{}/courts", self.base_url))
            .send()
            .await
            .context("failed to request courts")?
            .error_for_status()
            .context("courts endpoint returned error")?
            .json()
            .await
            .context("failed to parse courts response")?;
        Ok(courts)
    }

    async fn fetch_availability(
        &self,
        court_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<DayAvailability> {
        let url = format!(
            "{}/courts/{court_id}/availability?date={}",
            self.base_url,
            date.format("%Y-%m-%d")
        );

        let availability: DayAvailability = self
            .client
            .get(url)
            .send()
            .await
            .context("failed to request availability")?
            .error_for_status()
            .context("availability endpoint returned error")?
            .json()
            .await
            .context("failed to parse availability response")?;
        Ok(availability)
    }
}

#[async_trait]
impl BookingStore for RemoteBackend {
    async fn create_booking(&self, draft: &BookingDraft) -> Result<Booking, StoreError> {
        let res = self
            .client
            .post(format!("{}/bookings", self.base_url))
            .json(draft)
            .send()
            .await
            .context("failed to submit booking")?;

        if res.status() == StatusCode::CONFLICT {
            return Err(StoreError::Conflict);
        }

        let booking: Booking = res
            .error_for_status()
            .context("booking endpoint returned error")?
            .json()
            .await
            .context("failed to parse booking response")?;
        Ok(booking)
    }

    async fn update_payment(
        &self,
        booking_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Booking, StoreError> {
        let res = self
            .client
            .post(format!("{}/bookings/{booking_id}/payment", self.base_url))
            .json(update)
            .send()
            .await
            .context("failed to submit payment update")?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(booking_id.to_string()));
        }

        let booking: Booking = res
            .error_for_status()
            .context("payment endpoint returned error")?
            .json()
            .await
            .context("failed to parse payment response")?;
        Ok(booking)
    }

    async fn cancel_booking(&self, booking_id: &str) -> Result<(), StoreError> {
        let res = self
            .client
            .post(format!("{}/bookings/{booking_id}/cancel", self.base_url))
            .send()
            .await
            .context("failed to submit cancellation")?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(booking_id.to_string()));
        }

        res.error_for_status()
            .context("cancel endpoint returned error")?;
        Ok(())
    }
}
