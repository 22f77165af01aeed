use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

// Clock-rounding slack allowed between two slots that should touch.
pub const ADJACENCY_TOLERANCE_SECS: i64 = 60;

pub fn adjacency_tolerance() -> Duration {
    Duration::seconds(ADJACENCY_TOLERANCE_SECS)
}

// Half-open `[start, end)` span of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeInterval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> anyhow::Result<Self> {
        anyhow::ensure!(start < end, "interval start {start} must be before end {end}");
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration().num_seconds() as f64 / 3600.0
    }

    // Smallest interval covering every interval in `intervals`.
    pub fn span<'a, I>(intervals: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a TimeInterval>,
    {
        intervals.into_iter().fold(None, |acc: Option<TimeInterval>, iv| {
            Some(match acc {
                None => *iv,
                Some(a) => TimeInterval {
                    start: a.start.min(iv.start),
                    end: a.end.max(iv.end),
                },
            })
        })
    }

    pub fn display(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

// True iff `a` and `b` share an instant. Intervals that only touch do not overlap.
pub fn overlaps(a: &TimeInterval, b: &TimeInterval) -> bool {
    (a.start >= b.start && a.start < b.end)
        || (a.end > b.start && a.end <= b.end)
        || (a.start <= b.start && a.end >= b.end)
}

// True iff either interval ends within `tolerance` of the other's start.
pub fn adjacent(a: &TimeInterval, b: &TimeInterval, tolerance: Duration) -> bool {
    let tol = tolerance.num_seconds();
    (a.end - b.start).num_seconds().abs() <= tol || (b.end - a.start).num_seconds().abs() <= tol
}
