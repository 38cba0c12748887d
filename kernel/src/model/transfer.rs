//! Export/import of events between environments.
//!
//! Imports never delete. Every incoming record is matched against what the
//! target already holds by its natural key (event name, room name within the
//! event, attendee email, meeting title + start) and takes over the target's
//! id when it matches, so the result can be written as plain upserts.

use crate::model::{
    attendee::Attendee,
    event::Event,
    id::{AttendeeId, EventId, MeetingId, RoomId},
    meeting::{Meeting, MeetingDraft},
    room::Room,
    settings::SystemSettings,
};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct EventSnapshot {
    pub event: Event,
    pub attendees: Vec<Attendee>,
    pub rooms: Vec<Room>,
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    pub settings: SystemSettings,
    pub events: Vec<EventSnapshot>,
}

/// Records to upsert, already carrying target ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSet {
    pub event: Event,
    pub rooms: Vec<Room>,
    pub attendees: Vec<Attendee>,
    pub meetings: Vec<MeetingDraft>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub events: usize,
    pub rooms: usize,
    pub attendees: usize,
    pub meetings: usize,
}

impl ImportSummary {
    pub fn add(&mut self, other: ImportSummary) {
        self.events += other.events;
        self.rooms += other.rooms;
        self.attendees += other.attendees;
        self.meetings += other.meetings;
    }
}

impl ImportSet {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            events: 1,
            rooms: self.rooms.len(),
            attendees: self.attendees.len(),
            meetings: self.meetings.len(),
        }
    }
}

/// What the target environment currently holds for the event being imported.
#[derive(Debug, Clone, Default)]
pub struct ImportTarget {
    pub event: Option<Event>,
    pub rooms: Vec<Room>,
    pub meetings: Vec<Meeting>,
    /// Attendees whose email appears in the incoming document.
    pub known_attendees: Vec<Attendee>,
}

/// Plans the upserts for one incoming event.
///
/// With `keep_target_event` the target event's own record keeps its identity
/// and fields and only gains vocabulary entries (per-event import); otherwise
/// incoming event fields win (whole-system import).
pub fn reconcile(incoming: EventSnapshot, target: ImportTarget, keep_target_event: bool) -> ImportSet {
    let EventSnapshot {
        event: incoming_event,
        attendees,
        rooms,
        meetings,
    } = incoming;

    let event = match target.event {
        Some(existing) if keep_target_event => {
            let mut event = existing;
            merge_vocabulary(&mut event.tags, &incoming_event.tags);
            merge_vocabulary(&mut event.meeting_types, &incoming_event.meeting_types);
            merge_vocabulary(&mut event.attendee_types, &incoming_event.attendee_types);
            event
        }
        Some(existing) => {
            let mut authorized = existing.authorized_user_ids.clone();
            for user in &incoming_event.authorized_user_ids {
                if !authorized.contains(user) {
                    authorized.push(*user);
                }
            }
            Event {
                id: existing.id,
                authorized_user_ids: authorized,
                ..incoming_event
            }
        }
        None => Event {
            id: EventId::new(),
            ..incoming_event
        },
    };

    let mut room_ids: HashMap<RoomId, RoomId> = HashMap::new();
    let rooms: Vec<Room> = rooms
        .into_iter()
        .map(|room| {
            let id = target
                .rooms
                .iter()
                .find(|r| r.name == room.name)
                .map(|r| r.id)
                .unwrap_or_else(RoomId::new);
            room_ids.insert(room.id, id);
            Room {
                id,
                event_id: event.id,
                ..room
            }
        })
        .collect();

    let mut attendee_ids: HashMap<AttendeeId, AttendeeId> = HashMap::new();
    let attendees: Vec<Attendee> = attendees
        .into_iter()
        .map(|attendee| {
            let id = target
                .known_attendees
                .iter()
                .find(|a| a.email == attendee.email)
                .map(|a| a.id)
                .unwrap_or_else(AttendeeId::new);
            attendee_ids.insert(attendee.id, id);
            Attendee { id, ..attendee }
        })
        .collect();

    let meetings = meetings
        .into_iter()
        .map(|meeting| {
            let existing = target
                .meetings
                .iter()
                .find(|m| m.title == meeting.title && m.starts_at == meeting.starts_at);
            let id = existing.map(|m| m.id).unwrap_or_else(MeetingId::new);
            let sequence = existing
                .map(|m| m.sequence.max(meeting.sequence))
                .unwrap_or(meeting.sequence);
            MeetingDraft {
                id,
                event_id: event.id,
                title: meeting.title,
                purpose: meeting.purpose,
                status: meeting.status,
                date: meeting.date,
                starts_at: meeting.starts_at,
                ends_at: meeting.ends_at,
                room_id: meeting
                    .room
                    .and_then(|r| room_ids.get(&r.room_id).copied()),
                attendee_ids: meeting
                    .attendees
                    .iter()
                    .filter_map(|a| attendee_ids.get(&a.attendee_id).copied())
                    .collect(),
                tags: meeting.tags,
                meeting_type: meeting.meeting_type,
                requester_email: meeting.requester_email,
                other_details: meeting.other_details,
                is_approved: meeting.is_approved,
                calendar_invite_sent: meeting.calendar_invite_sent,
                sequence,
                created_by: meeting.created_by,
            }
        })
        .collect();

    ImportSet {
        event,
        rooms,
        attendees,
        meetings,
    }
}

fn merge_vocabulary(into: &mut Vec<String>, from: &[String]) {
    for v in from {
        if !into.contains(v) {
            into.push(v.clone());
        }
    }
}
