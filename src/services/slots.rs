use chrono::Duration;

use crate::models::{overlaps, AllocationType, BookedInterval, CandidateSlot, TimeInterval};

// Derives the selectable one-hour slots for a court on one date.
//
// Each window is walked in whole hours from its start; a trailing partial
// hour is dropped. On a shared court the two halves are counted, not told
// apart: one overlapping half booking leaves the slot partially occupied,
// two or more fill it. Any overlapping `Full` booking removes the slot.
pub fn generate_slots(
    shared_allocation: bool,
    windows: &[TimeInterval],
    booked: &[BookedInterval],
) -> Vec<CandidateSlot> {
    let step = Duration::hours(1);
    let mut slots = vec![];

    for window in windows {
        let mut start = window.start;
        while start + step <= window.end {
            let candidate = TimeInterval {
                start,
                end: start + step,
            };
            start += step;

            if let Some(partially_occupied) = occupancy(shared_allocation, &candidate, booked) {
                slots.push(CandidateSlot::new(candidate, partially_occupied));
            }
        }
    }

    slots.sort_by_key(|s| s.interval.start);
    slots.dedup_by_key(|s| s.interval);
    slots
}

// Whether `interval` can still take a booking of `allocation`, by the same
// counting rule the slot list uses. Halves are counted over the whole interval.
pub fn can_book(
    shared_allocation: bool,
    interval: &TimeInterval,
    allocation: AllocationType,
    booked: &[BookedInterval],
) -> bool {
    match occupancy(shared_allocation, interval, booked) {
        Some(false) => true,
        Some(true) => allocation.is_half(),
        None => false,
    }
}

// `None` when the candidate is fully booked, otherwise whether one half is taken.
fn occupancy(
    shared_allocation: bool,
    candidate: &TimeInterval,
    booked: &[BookedInterval],
) -> Option<bool> {
    let overlapping = booked.iter().filter(|b| overlaps(&b.interval(), candidate));

    if !shared_allocation {
        // Half bookings cannot exist on an unsplit court; treat them as whole.
        return match overlapping.count() {
            0 => Some(false),
            _ => None,
        };
    }

    let mut halves = 0;
    for b in overlapping {
        match b.allocation_type {
            AllocationType::Full => return None,
            AllocationType::HalfA | AllocationType::HalfB => halves += 1,
        }
    }

    match halves {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use proptest::prelude::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn iv(start: &str, end: &str) -> TimeInterval {
        TimeInterval::new(dt(&format!("2025-06-16 {start}")), dt(&format!("2025-06-16 {end}")))
            .unwrap()
    }

    fn booked(start: &str, end: &str, allocation_type: AllocationType) -> BookedInterval {
        let i = iv(start, end);
        BookedInterval {
            start_time: i.start,
            end_time: i.end,
            allocation_type,
        }
    }

    fn displays(slots: &[CandidateSlot]) -> Vec<&str> {
        slots.iter().map(|s| s.display.as_str()).collect()
    }

    #[test]
    fn test_whole_window_split_into_hours() {
        let slots = generate_slots(false, &[iv("14:00", "17:00")], &[]);
        assert_eq!(
            displays(&slots),
            vec!["14:00 - 15:00", "15:00 - 16:00", "16:00 - 17:00"]
        );
        assert!(slots.iter().all(|s| !s.partially_occupied));
    }

    #[test]
    fn test_trailing_partial_hour_discarded() {
        let slots = generate_slots(false, &[iv("09:00", "10:30")], &[]);
        assert_eq!(displays(&slots), vec!["09:00 - 10:00"]);
    }

    #[test]
    fn test_window_shorter_than_an_hour_yields_nothing() {
        let slots = generate_slots(false, &[iv("09:00", "09:45")], &[]);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_full_booking_excludes_any_overlapping_hour() {
        let slots = generate_slots(
            false,
            &[iv("09:00", "12:00")],
            &[booked("09:30", "10:15", AllocationType::Full)],
        );
        assert_eq!(displays(&slots), vec!["11:00 - 12:00"]);
    }

    #[test]
    fn test_booking_touching_slot_does_not_exclude_it() {
        let slots = generate_slots(
            false,
            &[iv("09:00", "11:00")],
            &[booked("08:00", "09:00", AllocationType::Full)],
        );
        assert_eq!(displays(&slots), vec!["09:00 - 10:00", "10:00 - 11:00"]);
    }

    #[test]
    fn test_shared_court_two_halves_exclude_slot() {
        let slots = generate_slots(
            true,
            &[iv("09:00", "11:00")],
            &[
                booked("09:00", "10:00", AllocationType::HalfA),
                booked("09:00", "10:00", AllocationType::HalfB),
            ],
        );
        assert_eq!(displays(&slots), vec!["10:00 - 11:00"]);
        assert!(!slots[0].partially_occupied);
    }

    #[test]
    fn test_shared_court_one_half_marks_partial() {
        let slots = generate_slots(
            true,
            &[iv("09:00", "11:00")],
            &[booked("09:00", "10:00", AllocationType::HalfA)],
        );
        assert_eq!(displays(&slots), vec!["09:00 - 10:00", "10:00 - 11:00"]);
        assert!(slots[0].partially_occupied);
        assert!(!slots[1].partially_occupied);
    }

    #[test]
    fn test_shared_court_same_half_twice_still_counts_as_two() {
        let slots = generate_slots(
            true,
            &[iv("09:00", "10:00")],
            &[
                booked("09:00", "10:00", AllocationType::HalfA),
                booked("09:00", "10:00", AllocationType::HalfA),
            ],
        );
        assert!(slots.is_empty());
    }

    #[test]
    fn test_shared_court_full_booking_excludes_slot() {
        let slots = generate_slots(
            true,
            &[iv("09:00", "11:00")],
            &[booked("10:00", "11:00", AllocationType::Full)],
        );
        assert_eq!(displays(&slots), vec!["09:00 - 10:00"]);
    }

    #[test]
    fn test_half_booking_on_unshared_court_blocks_slot() {
        let slots = generate_slots(
            false,
            &[iv("09:00", "10:00")],
            &[booked("09:00", "10:00", AllocationType::HalfB)],
        );
        assert!(slots.is_empty());
    }

    #[test]
    fn test_windows_with_gap_emitted_in_order() {
        let slots = generate_slots(false, &[iv("13:00", "15:00"), iv("09:00", "11:00")], &[]);
        assert_eq!(
            displays(&slots),
            vec!["09:00 - 10:00", "10:00 - 11:00", "13:00 - 14:00", "14:00 - 15:00"]
        );
    }

    #[test]
    fn test_can_book_rules() {
        let half = [booked("09:00", "10:00", AllocationType::HalfA)];
        let hour = iv("09:00", "10:00");
        assert!(can_book(true, &hour, AllocationType::HalfB, &half));
        assert!(!can_book(true, &hour, AllocationType::Full, &half));
        assert!(!can_book(false, &hour, AllocationType::Full, &half));
        assert!(can_book(true, &iv("10:00", "11:00"), AllocationType::Full, &half));

        let both = [
            booked("09:00", "10:00", AllocationType::HalfA),
            booked("09:00", "10:00", AllocationType::HalfB),
        ];
        assert!(!can_book(true, &hour, AllocationType::HalfA, &both));
    }

    #[test]
    fn test_no_windows_is_empty_not_error() {
        assert!(generate_slots(true, &[], &[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_generation_is_deterministic_and_sorted(
            windows in prop::collection::vec((0i64..20, 1i64..8), 0..4),
            bookings in prop::collection::vec((0i64..40, 1i64..4, 0u8..3), 0..6),
            shared in any::<bool>(),
        ) {
            let base = dt("2025-06-16 06:00");
            let windows: Vec<TimeInterval> = windows
                .into_iter()
                .map(|(s, len)| TimeInterval {
                    start: base + Duration::minutes(30 * s),
                    end: base + Duration::minutes(30 * (s + len * 2)),
                })
                .collect();
            let bookings: Vec<BookedInterval> = bookings
                .into_iter()
                .map(|(s, len, kind)| BookedInterval {
                    start_time: base + Duration::minutes(30 * s),
                    end_time: base + Duration::minutes(30 * (s + len)),
                    allocation_type: match kind {
                        0 => AllocationType::Full,
                        1 => AllocationType::HalfA,
                        _ => AllocationType::HalfB,
                    },
                })
                .collect();

            let first = generate_slots(shared, &windows, &bookings);
            let second = generate_slots(shared, &windows, &bookings);
            prop_assert_eq!(&first, &second);

            for pair in first.windows(2) {
                prop_assert!(pair[0].interval.start < pair[1].interval.start);
            }
            for slot in &first {
                prop_assert_eq!(slot.interval.duration(), Duration::hours(1));
                prop_assert!(windows.iter().any(|w| w.start <= slot.interval.start && slot.interval.end <= w.end));
                prop_assert!(!slot.partially_occupied || shared);
            }
        }
    }
}
