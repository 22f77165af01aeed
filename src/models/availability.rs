use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::court::AllocationType;
use super::interval::TimeInterval;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl AvailabilityWindow {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start,
            end: self.end,
        }
    }
}

impl From<TimeInterval> for AvailabilityWindow {
    fn from(iv: TimeInterval) -> Self {
        Self {
            start: iv.start,
            end: iv.end,
        }
    }
}

// An existing, committed reservation as reported by the availability provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookedInterval {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub allocation_type: AllocationType,
}

impl BookedInterval {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    #[serde(default)]
    pub available_windows: Vec<AvailabilityWindow>,
    #[serde(default)]
    pub booked_intervals: Vec<BookedInterval>,
    #[serde(default)]
    pub shared_allocation: bool,
}
