use crate::models::{Booking, Court};

pub fn generate_ics(booking: &Booking, court: &Court) -> String {
    let dtstart = booking.interval.start.format("%Y%m%dT%H%M%S").to_string();
    let dtend = booking.interval.end.format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = booking.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@courtbook", booking.id);

    let summary = format!(
        "{} court booking ({})",
        capitalize(&court.sport_type),
        booking.booking_reference
    );
    let location = if court.name.is_empty() {
        court.id.as_str()
    } else {
        court.name.as_str()
    };
    let description = booking
        .notes
        .as_deref()
        .unwrap_or("No additional notes");

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Courtbook//Court Reservations//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         LOCATION:{location}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + c.as_str(),
    }
}
