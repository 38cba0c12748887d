//! iCalendar invites for meetings.
//!
//! `UID` is derived from the meeting id and `SEQUENCE` from the meeting's
//! revision counter, so clients replace earlier copies of the same invite.

use crate::model::{id::MeetingId, meeting::Meeting, time::TimeRange};
use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CalendarMethod {
    Request,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRecipient {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInvite {
    pub method: CalendarMethod,
    pub meeting_id: MeetingId,
    pub sequence: i32,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub range: TimeRange,
    pub organizer: String,
    pub recipients: Vec<InviteRecipient>,
}

const ICS_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

impl CalendarInvite {
    /// `None` when the meeting has no resolved time range.
    pub fn for_meeting(meeting: &Meeting, method: CalendarMethod, organizer: &str) -> Option<Self> {
        let range = meeting.time_range()?;
        Some(Self {
            method,
            meeting_id: meeting.id,
            sequence: meeting.sequence,
            title: meeting.title.clone(),
            description: meeting.purpose.clone(),
            location: meeting.room.as_ref().map(|r| r.room_name.clone()),
            range,
            organizer: organizer.to_string(),
            recipients: meeting
                .attendees
                .iter()
                .map(|a| InviteRecipient {
                    name: a.name.clone(),
                    email: a.email.clone(),
                })
                .collect(),
        })
    }

    pub fn uid(&self) -> String {
        format!("{}@event-planner", self.meeting_id)
    }

    pub fn subject(&self) -> String {
        match self.method {
            CalendarMethod::Request => format!("Invitation: {}", self.title),
            CalendarMethod::Cancel => format!("Canceled: {}", self.title),
        }
    }

    pub fn to_ics(&self, stamp: DateTime<Utc>) -> String {
        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            "PRODID:-//event-planner//meetings//EN".to_string(),
            "CALSCALE:GREGORIAN".to_string(),
            format!("METHOD:{}", self.method),
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}", self.uid()),
            format!("SEQUENCE:{}", self.sequence),
            format!("DTSTAMP:{}", stamp.format(ICS_DATE_FORMAT)),
            format!("DTSTART:{}", self.range.start().format(ICS_DATE_FORMAT)),
            format!("DTEND:{}", self.range.end().format(ICS_DATE_FORMAT)),
            format!("SUMMARY:{}", escape_text(&self.title)),
        ];
        if let Some(description) = &self.description {
            lines.push(format!("DESCRIPTION:{}", escape_text(description)));
        }
        if let Some(location) = &self.location {
            lines.push(format!("LOCATION:{}", escape_text(location)));
        }
        lines.push(format!("ORGANIZER:mailto:{}", self.organizer));
        for r in &self.recipients {
            lines.push(format!(
                "ATTENDEE;CN={};ROLE=REQ-PARTICIPANT;RSVP=TRUE:mailto:{}",
                quote_param(&r.name),
                r.email
            ));
        }
        lines.push(match self.method {
            CalendarMethod::Request => "STATUS:CONFIRMED".to_string(),
            CalendarMethod::Cancel => "STATUS:CANCELLED".to_string(),
        });
        lines.push("END:VEVENT".to_string());
        lines.push("END:VCALENDAR".to_string());

        let mut out = String::new();
        for line in lines {
            out.push_str(&fold_line(&line));
            out.push_str("\r\n");
        }
        out
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}

fn quote_param(value: &str) -> String {
    let cleaned = value.replace('"', "'");
    if cleaned.contains([';', ':', ',']) {
        format!("\"{cleaned}\"")
    } else {
        cleaned
    }
}

// RFC 5545: 75 オクテットを超える行は折り返す
fn fold_line(line: &str) -> String {
    const LIMIT: usize = 75;
    if line.len() <= LIMIT {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / LIMIT * 3);
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > LIMIT {
            out.push_str("\r\n ");
            // 継続行の先頭スペースも 1 オクテットとして数える
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out
}
