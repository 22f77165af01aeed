use serde::Serialize;

use crate::models::{adjacency_tolerance, adjacent, CandidateSlot, TimeInterval};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("Please select consecutive time slots.")]
    NotConsecutive,
    #[error("Removing this slot would leave a gap in your booking. Remove a slot from either end instead.")]
    WouldBreakContinuity,
}

// The slots a guest has picked for one booking, kept as one unbroken chain.
//
// Members stay sorted by start time and no interval appears twice. Every
// neighbouring pair touches within `adjacency_tolerance`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionSet {
    slots: Vec<CandidateSlot>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    // Adds `slot` if absent, removes it if present. On rejection nothing changes.
    pub fn toggle(&mut self, slot: CandidateSlot) -> Result<(), RejectionReason> {
        if let Some(pos) = self.position(&slot.interval) {
            let mut remaining = self.slots.clone();
            remaining.remove(pos);
            if !is_contiguous(&remaining) {
                return Err(RejectionReason::WouldBreakContinuity);
            }
            self.slots = remaining;
            return Ok(());
        }

        if let (Some(earliest), Some(latest)) = (self.slots.first(), self.slots.last()) {
            let tolerance = adjacency_tolerance();
            if !adjacent(&slot.interval, &earliest.interval, tolerance)
                && !adjacent(&slot.interval, &latest.interval, tolerance)
            {
                return Err(RejectionReason::NotConsecutive);
            }
        }

        self.slots.push(slot);
        self.slots.sort_by_key(|s| s.interval.start);
        Ok(())
    }

    pub fn contains(&self, interval: &TimeInterval) -> bool {
        self.position(interval).is_some()
    }

    pub fn slots(&self) -> &[CandidateSlot] {
        &self.slots
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn span(&self) -> Option<TimeInterval> {
        TimeInterval::span(self.slots.iter().map(|s| &s.interval))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    fn position(&self, interval: &TimeInterval) -> Option<usize> {
        self.slots.iter().position(|s| s.interval == *interval)
    }
}

fn is_contiguous(sorted: &[CandidateSlot]) -> bool {
    let tolerance = adjacency_tolerance().num_seconds();
    sorted.windows(2).all(|pair| {
        (pair[0].interval.end - pair[1].interval.start).num_seconds().abs() <= tolerance
    })
}
