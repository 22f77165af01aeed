use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::interval::TimeInterval;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningSlot {
    pub day: String,
    pub start: String,
    pub end: String,
}

// Weekly opening hours of a court, stored as JSON on the court row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningHours {
    pub slots: Vec<OpeningSlot>,
}

impl OpeningHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: OpeningHours = serde_json::from_str(s)?;
        for slot in &hours.slots {
            parse_weekday(&slot.day)?;
            let start = parse_time(&slot.start)?;
            let end = parse_time(&slot.end)?;
            anyhow::ensure!(
                start < end,
                "opening slot {} {}-{} ends before it starts",
                slot.day,
                slot.start,
                slot.end
            );
        }
        Ok(hours)
    }

    pub fn windows_on(&self, date: NaiveDate) -> Vec<TimeInterval> {
        let weekday = date.format("%a").to_string().to_lowercase();
        let mut windows: Vec<TimeInterval> = self
            .slots
            .iter()
            .filter(|slot| slot.day.to_lowercase() == weekday)
            .filter_map(|slot| {
                let start = parse_time(&slot.start).ok()?;
                let end = parse_time(&slot.end).ok()?;
                TimeInterval::new(date.and_time(start), date.and_time(end)).ok()
            })
            .collect();
        windows.sort_by_key(|w| w.start);
        windows
    }

    pub fn to_human_readable(&self) -> String {
        if self.slots.is_empty() {
            return String::new();
        }

        let mut sorted_slots = self.slots.clone();
        sorted_slots.sort_by(|a, b| {
            day_index(&a.day)
                .cmp(&day_index(&b.day))
                .then_with(|| a.start.cmp(&b.start))
        });

        sorted_slots
            .iter()
            .map(|s| {
                let day = capitalize(&s.day);
                format!("{day}: {}-{}", s.start, s.end)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn day_index(day: &str) -> usize {
    const DAY_ORDER: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];
    DAY_ORDER
        .iter()
        .position(|d| *d == day.to_lowercase())
        .unwrap_or(DAY_ORDER.len())
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + &c.as_str().to_lowercase(),
    }
}

fn parse_weekday(s: &str) -> anyhow::Result<()> {
    match s.to_lowercase().as_str() {
        "mon" | "tue" | "wed" | "thu" | "fri" | "sat" | "sun" => Ok(()),
        _ => Err(anyhow::anyhow!("invalid weekday: {s}")),
    }
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| anyhow::anyhow!("invalid time: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_valid_json() {
        let json = r#"{"slots":[{"day":"mon","start":"09:00","end":"12:00"},{"day":"mon","start":"13:00","end":"17:00"}]}"#;
        let hours = OpeningHours::from_json(json).unwrap();
        assert_eq!(hours.slots.len(), 2);
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(OpeningHours::from_json("not json").is_err());
    }

    #[test]
    fn test_parse_invalid_day() {
        let json = r#"{"slots":[{"day":"xyz","start":"09:00","end":"17:00"}]}"#;
        assert!(OpeningHours::from_json(json).is_err());
        let json = r#"{"slots":[{"day":"monday","start":"09:00","end":"17:00"}]}"#;
        assert!(OpeningHours::from_json(json).is_err());
    }

    #[test]
    fn test_parse_invalid_time() {
        let json = r#"{"slots":[{"day":"mon","start":"25:00","end":"17:00"}]}"#;
        assert!(OpeningHours::from_json(json).is_err());
    }

    #[test]
    fn test_parse_inverted_slot() {
        let json = r#"{"slots":[{"day":"mon","start":"17:00","end":"09:00"}]}"#;
        assert!(OpeningHours::from_json(json).is_err());
    }

    #[test]
    fn test_windows_on_matching_day_with_lunch_gap() {
        let json = r#"{"slots":[{"day":"mon","start":"13:00","end":"17:00"},{"day":"mon","start":"09:00","end":"12:00"},{"day":"tue","start":"09:00","end":"17:00"}]}"#;
        let hours = OpeningHours::from_json(json).unwrap();
        // 2025-06-16 is a Monday
        let windows = hours.windows_on(date("2025-06-16"));
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].display(), "09:00 - 12:00");
        assert_eq!(windows[1].display(), "13:00 - 17:00");
    }

    #[test]
    fn test_windows_on_closed_day() {
        let json = r#"{"slots":[{"day":"mon","start":"09:00","end":"17:00"}]}"#;
        let hours = OpeningHours::from_json(json).unwrap();
        // 2025-06-15 is a Sunday
        assert!(hours.windows_on(date("2025-06-15")).is_empty());
    }

    #[test]
    fn test_to_human_readable() {
        let json = r#"{"slots":[{"day":"fri","start":"10:00","end":"16:00"},{"day":"mon","start":"09:00","end":"17:00"}]}"#;
        let hours = OpeningHours::from_json(json).unwrap();
        assert_eq!(hours.to_human_readable(), "Mon: 09:00-17:00, Fri: 10:00-16:00");
    }
}
