use serde::{Deserialize, Serialize};

use super::interval::TimeInterval;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateSlot {
    pub interval: TimeInterval,
    pub display: String,
    pub partially_occupied: bool,
}

impl CandidateSlot {
    pub fn new(interval: TimeInterval, partially_occupied: bool) -> Self {
        Self {
            display: interval.display(),
            interval,
            partially_occupied,
        }
    }
}
