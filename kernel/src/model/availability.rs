//! Conflict detection for room and attendee bookings.
//!
//! Everything here is a pure computation over a slice of [`Booking`]s that
//! the store loaded for the relevant window, so the same rules run inside the
//! write transaction and behind the advisory pre-check endpoint.

use crate::model::{
    id::{AttendeeId, EventId, MeetingId, RoomId},
    time::TimeRange,
};
use shared::error::{AppError, AppResult};

/// An existing meeting that occupies a resolved time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub meeting_id: MeetingId,
    pub event_id: EventId,
    pub range: TimeRange,
    pub room: Option<BookedRoom>,
    pub attendees: Vec<BookedAttendee>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedRoom {
    pub room_id: RoomId,
    pub room_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedAttendee {
    pub attendee_id: AttendeeId,
    pub name: String,
}

/// The booking being asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub room_id: Option<RoomId>,
    pub range: TimeRange,
    pub attendee_ids: Vec<AttendeeId>,
    pub exclude_meeting_id: Option<MeetingId>,
}

impl Candidate {
    pub fn with_range(&self, range: TimeRange) -> Self {
        Self {
            range,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    RoomBusy { room_id: RoomId, room_name: String },
    AttendeesBusy { names: Vec<String> },
}

impl Conflict {
    pub fn message(&self) -> String {
        match self {
            Conflict::RoomBusy { room_name, .. } => {
                format!("Room '{room_name}' is already booked at this time")
            }
            Conflict::AttendeesBusy { names } => format!(
                "Attendees already booked at this time: {}",
                names.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub conflicts: Vec<Conflict>,
}

impl AvailabilityReport {
    pub fn is_available(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn room_busy(&self) -> bool {
        self.conflicts
            .iter()
            .any(|c| matches!(c, Conflict::RoomBusy { .. }))
    }

    pub fn messages(&self) -> Vec<String> {
        self.conflicts.iter().map(Conflict::message).collect()
    }

    /// Blocking form used on create and update.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(AppError::Conflict(self.messages().join("; ")))
        }
    }
}

pub fn check_availability(candidate: &Candidate, bookings: &[Booking]) -> AvailabilityReport {
    let overlapping: Vec<&Booking> = bookings
        .iter()
        .filter(|b| Some(b.meeting_id) != candidate.exclude_meeting_id)
        .filter(|b| b.range.overlaps(&candidate.range))
        .collect();

    let mut conflicts = Vec::new();

    if let Some(room_id) = candidate.room_id {
        let busy = overlapping
            .iter()
            .filter_map(|b| b.room.as_ref())
            .find(|r| r.room_id == room_id);
        if let Some(room) = busy {
            conflicts.push(Conflict::RoomBusy {
                room_id,
                room_name: room.room_name.clone(),
            });
        }
    }

    // 参加者ごとではなく、名前をまとめて一件の競合にする
    let mut names: Vec<String> = Vec::new();
    for attendee_id in &candidate.attendee_ids {
        let busy = overlapping
            .iter()
            .flat_map(|b| b.attendees.iter())
            .find(|a| a.attendee_id == *attendee_id);
        if let Some(attendee) = busy {
            if !names.contains(&attendee.name) {
                names.push(attendee.name.clone());
            }
        }
    }
    if !names.is_empty() {
        conflicts.push(Conflict::AttendeesBusy { names });
    }

    AvailabilityReport { conflicts }
}

/// Checks bookings that are written together, each against the stored
/// bookings and the ones accepted before it. Stored bookings that the batch
/// rewrites are ignored.
pub fn check_batch(batch: &[Booking], stored: &[Booking]) -> AppResult<()> {
    let rewritten: Vec<MeetingId> = batch.iter().map(|b| b.meeting_id).collect();
    let mut accepted: Vec<Booking> = stored
        .iter()
        .filter(|b| !rewritten.contains(&b.meeting_id))
        .cloned()
        .collect();

    for booking in batch {
        let candidate = Candidate {
            room_id: booking.room.as_ref().map(|r| r.room_id),
            range: booking.range,
            attendee_ids: booking.attendees.iter().map(|a| a.attendee_id).collect(),
            exclude_meeting_id: Some(booking.meeting_id),
        };
        check_availability(&candidate, &accepted).into_result()?;
        accepted.push(booking.clone());
    }
    Ok(())
}

/// Room ids occupied by any booking overlapping `range`.
pub fn busy_rooms(range: &TimeRange, bookings: &[Booking], exclude: Option<MeetingId>) -> Vec<RoomId> {
    let mut rooms: Vec<RoomId> = bookings
        .iter()
        .filter(|b| Some(b.meeting_id) != exclude)
        .filter(|b| b.range.overlaps(range))
        .filter_map(|b| b.room.as_ref().map(|r| r.room_id))
        .collect();
    rooms.sort();
    rooms.dedup();
    rooms
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub(crate) fn range(start: (u32, u32), end: (u32, u32)) -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2025, 12, 25, start.0, start.1, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 25, end.0, end.1, 0).unwrap(),
        )
        .unwrap()
    }

    pub(crate) fn booking(
        range: TimeRange,
        room: Option<(RoomId, &str)>,
        attendees: &[(AttendeeId, &str)],
    ) -> Booking {
        Booking {
            meeting_id: MeetingId::new(),
            event_id: EventId::default(),
            range,
            room: room.map(|(room_id, name)| BookedRoom {
                room_id,
                room_name: name.into(),
            }),
            attendees: attendees
                .iter()
                .map(|(attendee_id, name)| BookedAttendee {
                    attendee_id: *attendee_id,
                    name: (*name).into(),
                })
                .collect(),
        }
    }

    #[test]
    fn scenario_room_attendee_and_boundary() {
        let r = RoomId::new();
        let other_room = RoomId::new();
        let a = AttendeeId::new();
        let m1 = booking(range((10, 0), (11, 0)), Some((r, "R")), &[(a, "A")]);
        let bookings = vec![m1];

        let m2 = Candidate {
            room_id: Some(r),
            range: range((10, 30), (11, 30)),
            attendee_ids: vec![],
            exclude_meeting_id: None,
        };
        let report = check_availability(&m2, &bookings);
        assert_eq!(
            report.conflicts,
            vec![Conflict::RoomBusy {
                room_id: r,
                room_name: "R".into()
            }]
        );

        let m3 = Candidate {
            room_id: Some(other_room),
            attendee_ids: vec![a],
            ..m2.clone()
        };
        let err = check_availability(&m3, &bookings).into_result().unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains('A'));

        let m4 = Candidate {
            room_id: Some(r),
            range: range((11, 0), (12, 0)),
            attendee_ids: vec![a],
            exclude_meeting_id: None,
        };
        assert!(check_availability(&m4, &bookings).is_available());
    }

    #[test]
    fn excluded_meeting_never_conflicts_with_itself() {
        let r = RoomId::new();
        let a = AttendeeId::new();
        let existing = booking(range((9, 0), (10, 0)), Some((r, "R")), &[(a, "A")]);
        let candidate = Candidate {
            room_id: Some(r),
            range: existing.range,
            attendee_ids: vec![a],
            exclude_meeting_id: Some(existing.meeting_id),
        };
        assert!(check_availability(&candidate, &[existing]).is_available());
    }

    #[test]
    fn attendee_names_are_collected_once() {
        let a = AttendeeId::new();
        let b = AttendeeId::new();
        let c = AttendeeId::new();
        let bookings = vec![
            booking(range((10, 0), (11, 0)), None, &[(a, "Alice"), (b, "Bob")]),
            booking(range((10, 30), (12, 0)), None, &[(a, "Alice")]),
        ];
        let candidate = Candidate {
            room_id: None,
            range: range((10, 45), (11, 15)),
            attendee_ids: vec![b, a, c],
            exclude_meeting_id: None,
        };
        let report = check_availability(&candidate, &bookings);
        assert_eq!(
            report.conflicts,
            vec![Conflict::AttendeesBusy {
                names: vec!["Bob".into(), "Alice".into()]
            }]
        );
        assert_eq!(
            report.messages(),
            vec!["Attendees already booked at this time: Bob, Alice".to_string()]
        );
    }

    #[test]
    fn check_is_idempotent() {
        let r = RoomId::new();
        let bookings = vec![booking(range((10, 0), (11, 0)), Some((r, "R")), &[])];
        let candidate = Candidate {
            room_id: Some(r),
            range: range((10, 0), (10, 30)),
            attendee_ids: vec![],
            exclude_meeting_id: None,
        };
        let first = check_availability(&candidate, &bookings);
        let second = check_availability(&candidate, &bookings);
        assert_eq!(first, second);
        assert!(first.room_busy());
    }

    #[test]
    fn batch_checks_against_stored_and_itself() {
        let r = RoomId::new();
        let a = AttendeeId::new();
        let stored = booking(range((10, 0), (11, 0)), Some((r, "Hall A")), &[]);

        // 上書きされる既存予約とは競合しない
        let rewrite = Booking {
            meeting_id: stored.meeting_id,
            ..stored.clone()
        };
        assert!(check_batch(&[rewrite], &[stored.clone()]).is_ok());

        let clash = booking(range((10, 0), (11, 0)), Some((r, "Hall A")), &[]);
        let err = check_batch(&[clash], &[stored.clone()]).unwrap_err();
        assert!(err.to_string().contains("Hall A"));

        let first = booking(range((13, 0), (14, 0)), None, &[(a, "Alice")]);
        let second = booking(range((13, 30), (14, 30)), None, &[(a, "Alice")]);
        let err = check_batch(&[first, second], &[stored]).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.to_string().contains("Alice"));
    }

    #[test]
    fn busy_rooms_are_deduplicated() {
        let r = RoomId::new();
        let bookings = vec![
            booking(range((10, 0), (11, 0)), Some((r, "R")), &[]),
            booking(range((10, 30), (11, 0)), Some((r, "R")), &[]),
            booking(range((13, 0), (14, 0)), Some((RoomId::new(), "S")), &[]),
        ];
        assert_eq!(busy_rooms(&range((10, 0), (12, 0)), &bookings, None), vec![r]);
    }
}
