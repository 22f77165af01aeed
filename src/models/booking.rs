use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::court::AllocationType;
use super::interval::TimeInterval;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub notes: Option<String>,
}

// Reservation request handed to the booking store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub court_id: String,
    pub interval: TimeInterval,
    pub allocation_type: AllocationType,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub notes: Option<String>,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub booking_reference: String,
    pub court_id: String,
    pub interval: TimeInterval,
    pub allocation_type: AllocationType,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub notes: Option<String>,
    pub total_price: f64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: NaiveDateTime,
}

impl Booking {
    // True when submitting `draft` again would ask for exactly this booking.
    pub fn matches_draft(&self, draft: &BookingDraft) -> bool {
        self.court_id == draft.court_id
            && self.interval == draft.interval
            && self.allocation_type == draft.allocation_type
            && self.guest_name == draft.guest_name
            && self.guest_email == draft.guest_email
            && self.guest_phone == draft.guest_phone
            && self.notes == draft.notes
            && self.total_price == draft.total_price
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Unpaid,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(PaymentMethod::Card),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub pay_later: bool,
}
