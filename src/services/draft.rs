use crate::models::{AllocationType, BookingDraft, Court, GuestDetails};
use crate::services::pricing::{price_allocation, price_selection};
use crate::services::selection::SelectionSet;

const MAX_NAME_LEN: usize = 100;
const MAX_NOTES_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("please select at least one time slot")]
    EmptySelection,

    #[error("please choose a court first")]
    MissingCourt,

    #[error("{field}: {message}")]
    InvalidField {
        field: &'static str,
        message: &'static str,
    },

    #[error("half-court booking is only available on shared courts")]
    HalfAllocationUnavailable,

    #[error("half of the court is already taken at {0}, book a half court instead")]
    FullCourtUnavailable(String),
}

impl ValidationError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::InvalidField { field, .. } => Some(field),
            ValidationError::EmptySelection => Some("selection"),
            ValidationError::MissingCourt => Some("court"),
            ValidationError::HalfAllocationUnavailable
            | ValidationError::FullCourtUnavailable(_) => Some("allocation_type"),
        }
    }
}

// Builds the reservation request for the booking store. `Full` is priced per
// selected slot, a half allocation over the span at half rate.
pub fn assemble(
    selection: &SelectionSet,
    court: Option<&Court>,
    guest: &GuestDetails,
    allocation: AllocationType,
) -> Result<BookingDraft, ValidationError> {
    let court = court.ok_or(ValidationError::MissingCourt)?;
    let interval = selection.span().ok_or(ValidationError::EmptySelection)?;

    if allocation.is_half() && !court.shared_allocation {
        return Err(ValidationError::HalfAllocationUnavailable);
    }
    if !allocation.is_half() {
        if let Some(slot) = selection.slots().iter().find(|s| s.partially_occupied) {
            return Err(ValidationError::FullCourtUnavailable(slot.display.clone()));
        }
    }

    let guest_name = validate_name(&guest.name)?;
    let guest_email = validate_email(&guest.email)?;
    let guest_phone = validate_phone(&guest.phone)?;
    let notes = validate_notes(guest.notes.as_deref())?;

    let total_price = if allocation.is_half() {
        price_allocation(court, &interval, allocation)
    } else {
        price_selection(court, selection)
    };

    Ok(BookingDraft {
        court_id: court.id.clone(),
        interval,
        allocation_type: allocation,
        guest_name,
        guest_email,
        guest_phone,
        notes,
        total_price,
    })
}

fn invalid(field: &'static str, message: &'static str) -> ValidationError {
    ValidationError::InvalidField { field, message }
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("guest_name", "name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid("guest_name", "name is too long"));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    let malformed = invalid("guest_email", "enter a valid email address");
    if email.chars().any(char::is_whitespace) {
        return Err(malformed);
    }
    let (local, domain) = email.split_once('@').ok_or_else(|| malformed.clone())?;
    if local.is_empty() || domain.contains('@') {
        return Err(malformed);
    }
    let dot_ok = domain
        .rsplit_once('.')
        .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
        .unwrap_or(false);
    if !dot_ok {
        return Err(malformed);
    }
    Ok(email.to_string())
}

fn validate_phone(phone: &str) -> Result<String, ValidationError> {
    let phone = phone.trim();
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
    {
        return Err(invalid("guest_phone", "phone number contains invalid characters"));
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err(invalid("guest_phone", "phone number must have 7 to 15 digits"));
    }
    Ok(phone.to_string())
}

fn validate_notes(notes: Option<&str>) -> Result<Option<String>, ValidationError> {
    match notes.map(str::trim).filter(|n| !n.is_empty()) {
        None => Ok(None),
        Some(n) if n.chars().count() > MAX_NOTES_LEN => {
            Err(invalid("notes", "notes are too long"))
        }
        Some(n) => Ok(Some(n.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateSlot, TimeInterval};
    use chrono::{Duration, NaiveDateTime};

    fn court(shared: bool) -> Court {
        Court {
            id: "court-7".to_string(),
            name: "Court 7".to_string(),
            sport_type: "futsal".to_string(),
            hourly_rate: 30.0,
            shared_allocation: shared,
        }
    }

    fn guest() -> GuestDetails {
        GuestDetails {
            name: "  Alice Example ".to_string(),
            email: "alice@example.com".to_string(),
            phone: "+1 (555) 123-4567".to_string(),
            notes: Some("   ".to_string()),
        }
    }

    fn selection(hours: &[u32]) -> SelectionSet {
        selection_with_partial(hours, &[])
    }

    fn selection_with_partial(hours: &[u32], partial: &[u32]) -> SelectionSet {
        let mut set = SelectionSet::new();
        for h in hours {
            let start = NaiveDateTime::parse_from_str(
                &format!("2025-06-16 {h:02}:00"),
                "%Y-%m-%d %H:%M",
            )
            .unwrap();
            set.toggle(CandidateSlot::new(
                TimeInterval {
                    start,
                    end: start + Duration::hours(1),
                },
                partial.contains(h),
            ))
            .unwrap();
        }
        set
    }

    #[test]
    fn test_assemble_full_booking() {
        let draft = assemble(&selection(&[9, 10]), Some(&court(false)), &guest(), AllocationType::Full)
            .unwrap();
        assert_eq!(draft.court_id, "court-7");
        assert_eq!(draft.interval.display(), "09:00 - 11:00");
        assert_eq!(draft.guest_name, "Alice Example");
        assert_eq!(draft.notes, None);
        assert_eq!(draft.total_price, 60.0);
    }

    #[test]
    fn test_assemble_half_booking_on_shared_court() {
        let draft = assemble(&selection(&[9]), Some(&court(true)), &guest(), AllocationType::HalfB)
            .unwrap();
        assert_eq!(draft.allocation_type, AllocationType::HalfB);
        assert_eq!(draft.total_price, 15.0);
    }

    #[test]
    fn test_half_booking_rejected_on_unshared_court() {
        let err = assemble(&selection(&[9]), Some(&court(false)), &guest(), AllocationType::HalfA)
            .unwrap_err();
        assert_eq!(err, ValidationError::HalfAllocationUnavailable);
    }

    #[test]
    fn test_full_court_refused_over_half_booked_slot() {
        let set = selection_with_partial(&[9, 10], &[10]);
        let err = assemble(&set, Some(&court(true)), &guest(), AllocationType::Full).unwrap_err();
        assert_eq!(err, ValidationError::FullCourtUnavailable("10:00 - 11:00".to_string()));
        assert_eq!(err.field(), Some("allocation_type"));

        let draft = assemble(&set, Some(&court(true)), &guest(), AllocationType::HalfB).unwrap();
        assert_eq!(draft.total_price, 30.0);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let err = assemble(&SelectionSet::new(), Some(&court(false)), &guest(), AllocationType::Full)
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptySelection);
    }

    #[test]
    fn test_missing_court_rejected() {
        let err = assemble(&selection(&[9]), None, &guest(), AllocationType::Full).unwrap_err();
        assert_eq!(err, ValidationError::MissingCourt);
    }

    #[test]
    fn test_invalid_guest_fields() {
        let cases = [
            (GuestDetails { name: " ".into(), ..guest() }, "guest_name"),
            (GuestDetails { email: "alice.example.com".into(), ..guest() }, "guest_email"),
            (GuestDetails { email: "@example.com".into(), ..guest() }, "guest_email"),
            (GuestDetails { email: "alice@localhost".into(), ..guest() }, "guest_email"),
            (GuestDetails { email: "al ice@example.com".into(), ..guest() }, "guest_email"),
            (GuestDetails { phone: "12345".into(), ..guest() }, "guest_phone"),
            (GuestDetails { phone: "555-CALL-NOW".into(), ..guest() }, "guest_phone"),
            (GuestDetails { notes: Some("x".repeat(501)), ..guest() }, "notes"),
        ];
        for (g, field) in cases {
            let err = assemble(&selection(&[9]), Some(&court(false)), &g, AllocationType::Full)
                .unwrap_err();
            assert_eq!(err.field(), Some(field), "{g:?}");
        }
    }

    #[test]
    fn test_notes_trimmed_and_kept() {
        let g = GuestDetails {
            notes: Some("  bring a ball  ".to_string()),
            ..guest()
        };
        let draft = assemble(&selection(&[9]), Some(&court(false)), &g, AllocationType::Full).unwrap();
        assert_eq!(draft.notes.as_deref(), Some("bring a ball"));
    }
}
