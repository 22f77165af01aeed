use crate::models::{AllocationType, Court, TimeInterval};
use crate::services::selection::SelectionSet;

// Price of a multi-slot selection: hourly rate times number of slots.
// Partial occupancy of a shared court does not discount this path.
pub fn price_selection(court: &Court, selection: &SelectionSet) -> f64 {
    round_cents(court.hourly_rate * selection.size() as f64)
}

// Price of one explicitly chosen interval with an allocation choice.
// Half allocations of a shared court cost half the hourly rate.
pub fn price_allocation(court: &Court, interval: &TimeInterval, allocation: AllocationType) -> f64 {
    let factor = if allocation.is_half() { 0.5 } else { 1.0 };
    round_cents(interval.duration_hours() * court.hourly_rate * factor)
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
