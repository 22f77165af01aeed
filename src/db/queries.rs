use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    AllocationType, Booking, Court, OpeningHours, PaymentMethod, PaymentStatus, TimeInterval,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Courts ──

pub fn list_courts(conn: &Connection) -> anyhow::Result<Vec<Court>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, sport_type, hourly_rate, shared_allocation FROM courts ORDER BY name ASC",
    )?;

    let rows = stmt.query_map([], parse_court_row)?;

    let mut courts = vec![];
    for row in rows {
        courts.push(row?);
    }
    Ok(courts)
}

pub fn get_court(conn: &Connection, id: &str) -> anyhow::Result<Option<Court>> {
    let court = conn
        .query_row(
            "SELECT id, name, sport_type, hourly_rate, shared_allocation FROM courts WHERE id = ?1",
            params![id],
            parse_court_row,
        )
        .optional()?;
    Ok(court)
}

pub fn get_opening_hours(conn: &Connection, court_id: &str) -> anyhow::Result<Option<OpeningHours>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT opening_hours FROM courts WHERE id = ?1",
            params![court_id],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|json| OpeningHours::from_json(&json)).transpose()
}

pub fn save_court(conn: &Connection, court: &Court, hours: &OpeningHours) -> anyhow::Result<()> {
    let hours_json = serde_json::to_string(hours)?;
    conn.execute(
        "INSERT INTO courts (id, name, sport_type, hourly_rate, shared_allocation, opening_hours)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            sport_type = excluded.sport_type,
            hourly_rate = excluded.hourly_rate,
            shared_allocation = excluded.shared_allocation,
            opening_hours = excluded.opening_hours",
        params![
            court.id,
            court.name,
            court.sport_type,
            court.hourly_rate,
            court.shared_allocation,
            hours_json,
        ],
    )?;
    Ok(())
}

fn parse_court_row(row: &rusqlite::Row) -> rusqlite::Result<Court> {
    Ok(Court {
        id: row.get(0)?,
        name: row.get(1)?,
        sport_type: row.get(2)?,
        hourly_rate: row.get(3)?,
        shared_allocation: row.get(4)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, booking_reference, court_id, start_time, end_time, allocation_type, \
     guest_name, guest_email, guest_phone, notes, total_price, payment_status, payment_method, created_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let created_at = booking.created_at.format(TS_FORMAT).to_string();

    conn.execute(
        "INSERT INTO bookings (id, booking_reference, court_id, start_time, end_time, allocation_type,
            guest_name, guest_email, guest_phone, notes, total_price, payment_status, payment_method,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
        params![
            booking.id,
            booking.booking_reference,
            booking.court_id,
            booking.interval.start.format(TS_FORMAT).to_string(),
            booking.interval.end.format(TS_FORMAT).to_string(),
            booking.allocation_type.as_str(),
            booking.guest_name,
            booking.guest_email,
            booking.guest_phone,
            booking.notes,
            booking.total_price,
            booking.payment_status.as_str(),
            booking.payment_method.map(|m| m.as_str()),
            created_at,
        ],
    )?;
    Ok(())
}

// Bookings on `court_id` overlapping `[start, end)`.
pub fn get_bookings_overlapping(
    conn: &Connection,
    court_id: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<Vec<Booking>> {
    let start_str = start.format(TS_FORMAT).to_string();
    let end_str = end.format(TS_FORMAT).to_string();

    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE court_id = ?1 AND start_time < ?3 AND end_time > ?2 AND status != 'cancelled'
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(params![court_id, start_str, end_str], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_payment(
    conn: &Connection,
    id: &str,
    method: PaymentMethod,
    status: PaymentStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET payment_method = ?1, payment_status = ?2, updated_at = ?3 WHERE id = ?4",
        params![method.as_str(), status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

// Cancelled bookings stop counting against availability. Returns false when
// there is no active booking with this id.
pub fn cancel_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = 'cancelled', updated_at = ?1 WHERE id = ?2 AND status != 'cancelled'",
        params![now, id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let start_str: String = row.get(3)?;
    let end_str: String = row.get(4)?;
    let allocation_str: String = row.get(5)?;
    let status_str: String = row.get(11)?;
    let method_str: Option<String> = row.get(12)?;
    let created_at_str: String = row.get(13)?;

    let start = NaiveDateTime::parse_from_str(&start_str, TS_FORMAT)?;
    let end = NaiveDateTime::parse_from_str(&end_str, TS_FORMAT)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TS_FORMAT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id: row.get(0)?,
        booking_reference: row.get(1)?,
        court_id: row.get(2)?,
        interval: TimeInterval::new(start, end)?,
        allocation_type: AllocationType::parse(&allocation_str),
        guest_name: row.get(6)?,
        guest_email: row.get(7)?,
        guest_phone: row.get(8)?,
        notes: row.get(9)?,
        total_price: row.get(10)?,
        payment_status: PaymentStatus::parse(&status_str),
        payment_method: method_str.as_deref().and_then(PaymentMethod::parse),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn booking(id: &str, start: &str, end: &str) -> Booking {
        Booking {
            id: id.to_string(),
            booking_reference: format!("CB-{id}"),
            court_id: "tennis-1".to_string(),
            interval: TimeInterval::new(dt(start), dt(end)).unwrap(),
            allocation_type: AllocationType::Full,
            guest_name: "Alice".to_string(),
            guest_email: "alice@example.com".to_string(),
            guest_phone: "+15551110000".to_string(),
            notes: None,
            total_price: 20.0,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            created_at: dt("2025-06-10 12:00"),
        }
    }

    #[test]
    fn test_seeded_courts() {
        let conn = setup_db();
        let courts = list_courts(&conn).unwrap();
        assert_eq!(courts.len(), 3);
        let futsal = get_court(&conn, "futsal-1").unwrap().unwrap();
        assert!(futsal.shared_allocation);
        assert!(get_court(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn test_opening_hours_roundtrip() {
        let conn = setup_db();
        let court = Court {
            id: "squash-1".to_string(),
            name: "Squash".to_string(),
            sport_type: "squash".to_string(),
            hourly_rate: 15.0,
            shared_allocation: false,
        };
        let hours = OpeningHours::from_json(
            r#"{"slots":[{"day":"mon","start":"09:00","end":"10:30"}]}"#,
        )
        .unwrap();
        save_court(&conn, &court, &hours).unwrap();

        assert_eq!(get_court(&conn, "squash-1").unwrap(), Some(court));
        let loaded = get_opening_hours(&conn, "squash-1").unwrap().unwrap();
        assert_eq!(loaded.to_human_readable(), "Mon: 09:00-10:30");
        assert!(get_opening_hours(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn test_overlap_query_excludes_touching() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "2025-06-16 09:00", "2025-06-16 10:00")).unwrap();
        create_booking(&conn, &booking("b2", "2025-06-16 11:00", "2025-06-16 12:00")).unwrap();

        let hits = get_bookings_overlapping(
            &conn,
            "tennis-1",
            &dt("2025-06-16 10:00"),
            &dt("2025-06-16 11:00"),
        )
        .unwrap();
        assert!(hits.is_empty());

        let hits = get_bookings_overlapping(
            &conn,
            "tennis-1",
            &dt("2025-06-16 09:30"),
            &dt("2025-06-16 11:30"),
        )
        .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "b1");
    }

    #[test]
    fn test_cancelled_booking_frees_the_slot() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "2025-06-16 09:00", "2025-06-16 10:00")).unwrap();

        assert!(cancel_booking(&conn, "b1").unwrap());
        assert!(!cancel_booking(&conn, "b1").unwrap());
        assert!(!cancel_booking(&conn, "missing").unwrap());

        let hits = get_bookings_overlapping(
            &conn,
            "tennis-1",
            &dt("2025-06-16 09:00"),
            &dt("2025-06-16 10:00"),
        )
        .unwrap();
        assert!(hits.is_empty());
        assert!(get_booking_by_id(&conn, "b1").unwrap().is_some());
    }

    #[test]
    fn test_update_payment() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "2025-06-16 09:00", "2025-06-16 10:00")).unwrap();

        assert!(update_payment(&conn, "b1", PaymentMethod::Card, PaymentStatus::Paid).unwrap());
        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.payment_status, PaymentStatus::Paid);
        assert_eq!(loaded.payment_method, Some(PaymentMethod::Card));

        assert!(!update_payment(&conn, "missing", PaymentMethod::Cash, PaymentStatus::Paid).unwrap());
        assert!(get_booking_by_id(&conn, "missing").unwrap().is_none());
    }
}
