use crate::models::Booking;

const ICS_TIME: &str = "%Y%m%dT%H%M%S";

pub fn generate_ics(booking: &Booking, workshop_name: &str) -> String {
    let dtstart = booking.starts_at().format(ICS_TIME).to_string();
    let dtend = booking.ends_at().format(ICS_TIME).to_string();
    let dtstamp = booking.created_at.format(ICS_TIME).to_string();
    let uid = format!("{}@workshop", booking.ref_number);

    let summary = escape(&format!("Service appointment at {workshop_name}"));
    let description = escape(&match booking.customer_notes.as_deref() {
        Some(notes) => format!("Booking {}: {notes}", booking.ref_number),
        None => format!("Booking {}", booking.ref_number),
    });

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Workshop//Service Booking//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n",
        status = if booking.status.as_str() == "cancelled" { "CANCELLED" } else { "CONFIRMED" },
    )
}

/// TEXT value escaping.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}
