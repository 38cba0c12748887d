//! Process-local store used for development without PostgreSQL and by the
//! HTTP tests. A single mutex stands in for the serializable transaction:
//! every check-then-write runs under one lock acquisition.

use async_trait::async_trait;
use kernel::model::{
    attendee::Attendee,
    availability::{check_availability, check_batch, BookedAttendee, BookedRoom, Booking},
    event::Event,
    id::{AttendeeId, EventId, MeetingId, RoomId, UserId},
    meeting::{event::UpdateMeeting, Meeting, MeetingAttendee, MeetingDraft, MeetingRoom},
    room::Room,
    settings::SystemSettings,
    time::TimeRange,
    transfer::{ImportSet, ImportSummary},
};
use kernel::repository::{
    attendee::AttendeeRepository, event::EventRepository, health::HealthCheckRepository,
    meeting::MeetingRepository, room::RoomRepository, settings::SettingsRepository,
    transfer::TransferRepository,
};
use shared::error::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

#[derive(Default, Clone)]
struct State {
    settings: Option<SystemSettings>,
    events: HashMap<EventId, Event>,
    rooms: HashMap<RoomId, Room>,
    attendees: HashMap<AttendeeId, Attendee>,
    memberships: HashSet<(EventId, AttendeeId)>,
    meetings: HashMap<MeetingId, MeetingDraft>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    fn ensure_unique_event(&self, event: &Event) -> AppResult<()> {
        for other in self.events.values().filter(|e| e.id != event.id) {
            if other.name == event.name {
                return Err(AppError::Conflict(
                    "An event with this name already exists".into(),
                ));
            }
            if other.slug == event.slug {
                return Err(AppError::Conflict(
                    "An event with this slug already exists".into(),
                ));
            }
        }
        Ok(())
    }

    fn ensure_unique_room(&self, room: &Room) -> AppResult<()> {
        let taken = self
            .rooms
            .values()
            .any(|r| r.id != room.id && r.event_id == room.event_id && r.name == room.name);
        if taken {
            return Err(AppError::Conflict(
                "A room with this name already exists in the event".into(),
            ));
        }
        Ok(())
    }

    fn upsert_attendee(&mut self, event_id: EventId, attendee: &Attendee) -> Attendee {
        let existing = self
            .attendees
            .values()
            .find(|a| a.email == attendee.email)
            .cloned();
        let stored = match existing {
            Some(current) => Attendee {
                id: current.id,
                name: attendee.name.clone(),
                email: current.email,
                title: attendee.title.clone().or(current.title),
                company: attendee.company.clone().or(current.company),
                company_description: attendee
                    .company_description
                    .clone()
                    .or(current.company_description),
                bio: attendee.bio.clone().or(current.bio),
                linkedin: attendee.linkedin.clone().or(current.linkedin),
                image_url: attendee.image_url.clone().or(current.image_url),
                is_external: attendee.is_external,
                attendee_type: attendee.attendee_type.clone().or(current.attendee_type),
            },
            None => attendee.clone(),
        };
        self.attendees.insert(stored.id, stored.clone());
        self.memberships.insert((event_id, stored.id));
        stored
    }

    fn materialize(&self, draft: &MeetingDraft) -> Meeting {
        let room = draft
            .room_id
            .and_then(|id| self.rooms.get(&id))
            .map(|r| MeetingRoom {
                room_id: r.id,
                room_name: r.name.clone(),
            });
        let mut attendees: Vec<MeetingAttendee> = draft
            .attendee_ids
            .iter()
            .filter_map(|id| self.attendees.get(id))
            .map(|a| MeetingAttendee {
                attendee_id: a.id,
                name: a.name.clone(),
                email: a.email.clone(),
            })
            .collect();
        attendees.sort_by(|a, b| a.name.cmp(&b.name));
        Meeting {
            id: draft.id,
            event_id: draft.event_id,
            title: draft.title.clone(),
            purpose: draft.purpose.clone(),
            status: draft.status,
            date: draft.date,
            starts_at: draft.starts_at,
            ends_at: draft.ends_at,
            room,
            attendees,
            tags: draft.tags.clone(),
            meeting_type: draft.meeting_type.clone(),
            requester_email: draft.requester_email.clone(),
            other_details: draft.other_details.clone(),
            is_approved: draft.is_approved,
            calendar_invite_sent: draft.calendar_invite_sent,
            sequence: draft.sequence,
            created_by: draft.created_by,
        }
    }

    fn booking_of(&self, draft: &MeetingDraft) -> Option<Booking> {
        let range = draft.time_range()?;
        let meeting = self.materialize(draft);
        Some(Booking {
            meeting_id: meeting.id,
            event_id: meeting.event_id,
            range,
            room: meeting.room.map(|r| BookedRoom {
                room_id: r.room_id,
                room_name: r.room_name,
            }),
            attendees: meeting
                .attendees
                .into_iter()
                .map(|a| BookedAttendee {
                    attendee_id: a.attendee_id,
                    name: a.name,
                })
                .collect(),
        })
    }

    fn bookings(&self, window: &TimeRange) -> Vec<Booking> {
        self.meetings
            .values()
            .filter_map(|draft| self.booking_of(draft))
            .filter(|b| b.range.overlaps(window))
            .collect()
    }

    fn check_draft(&self, draft: &MeetingDraft) -> AppResult<()> {
        let room = draft.room_id.and_then(|id| self.rooms.get(&id));
        let members: Vec<AttendeeId> = draft
            .attendee_ids
            .iter()
            .filter(|id| self.memberships.contains(&(draft.event_id, **id)))
            .copied()
            .collect();
        draft.ensure_references(room, &members)?;

        if let Some(candidate) = draft.candidate() {
            check_availability(&candidate, &self.bookings(&candidate.range)).into_result()?;
        }
        Ok(())
    }
}

fn not_found(kind: &str, id: impl std::fmt::Display) -> AppError {
    AppError::EntityNotFound(format!("{kind} ({id}) was not found"))
}

#[async_trait]
impl HealthCheckRepository for MemoryStore {
    async fn check_db(&self) -> bool {
        true
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn create(&self, event: Event) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_unique_event(&event)?;
        state.events.insert(event.id, event);
        Ok(())
    }

    async fn find_all(&self) -> AppResult<Vec<Event>> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state.events.values().cloned().collect();
        events.sort_by(|a, b| {
            (a.start_date.is_none(), a.start_date, &a.name)
                .cmp(&(b.start_date.is_none(), b.start_date, &b.name))
        });
        Ok(events)
    }

    async fn find_by_id(&self, event_id: EventId) -> AppResult<Option<Event>> {
        Ok(self.state.lock().await.events.get(&event_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Event>> {
        let state = self.state.lock().await;
        Ok(state.events.values().find(|e| e.name == name).cloned())
    }

    async fn update(&self, event: Event) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.events.contains_key(&event.id) {
            return Err(not_found("Event", event.id));
        }
        state.ensure_unique_event(&event)?;
        state.events.insert(event.id, event);
        Ok(())
    }

    async fn delete(&self, event_id: EventId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.events.remove(&event_id).is_none() {
            return Err(not_found("Event", event_id));
        }
        state.rooms.retain(|_, r| r.event_id != event_id);
        state.meetings.retain(|_, m| m.event_id != event_id);
        state.memberships.retain(|(e, _)| *e != event_id);
        Ok(())
    }

    async fn grant_access(&self, event_id: EventId, user_id: UserId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(event) = state.events.get_mut(&event_id) {
            if !event.authorized_user_ids.contains(&user_id) {
                event.authorized_user_ids.push(user_id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn create(&self, room: Room) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_unique_room(&room)?;
        state.rooms.insert(room.id, room);
        Ok(())
    }

    async fn find_by_event(&self, event_id: EventId) -> AppResult<Vec<Room>> {
        let state = self.state.lock().await;
        let mut rooms: Vec<Room> = state
            .rooms
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    async fn find_by_id(&self, room_id: RoomId) -> AppResult<Option<Room>> {
        Ok(self.state.lock().await.rooms.get(&room_id).cloned())
    }

    async fn update(&self, room: Room) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.rooms.contains_key(&room.id) {
            return Err(not_found("Room", room.id));
        }
        state.ensure_unique_room(&room)?;
        state.rooms.insert(room.id, room);
        Ok(())
    }

    async fn delete(&self, room_id: RoomId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let in_use = state
            .meetings
            .values()
            .filter(|m| m.room_id == Some(room_id))
            .count();
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Room is still assigned to {in_use} meeting(s)"
            )));
        }
        state
            .rooms
            .remove(&room_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Room", room_id))
    }
}

#[async_trait]
impl AttendeeRepository for MemoryStore {
    async fn upsert_into_event(&self, event_id: EventId, attendee: Attendee) -> AppResult<Attendee> {
        Ok(self.state.lock().await.upsert_attendee(event_id, &attendee))
    }

    async fn find_by_event(&self, event_id: EventId) -> AppResult<Vec<Attendee>> {
        let state = self.state.lock().await;
        let mut attendees: Vec<Attendee> = state
            .attendees
            .values()
            .filter(|a| state.memberships.contains(&(event_id, a.id)))
            .cloned()
            .collect();
        attendees.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(attendees)
    }

    async fn find_by_id(&self, attendee_id: AttendeeId) -> AppResult<Option<Attendee>> {
        Ok(self.state.lock().await.attendees.get(&attendee_id).cloned())
    }

    async fn find_by_emails(&self, emails: &[String]) -> AppResult<Vec<Attendee>> {
        let state = self.state.lock().await;
        Ok(state
            .attendees
            .values()
            .filter(|a| emails.contains(&a.email))
            .cloned()
            .collect())
    }

    async fn is_member(&self, event_id: EventId, attendee_id: AttendeeId) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .memberships
            .contains(&(event_id, attendee_id)))
    }

    async fn update(&self, attendee: Attendee) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.attendees.contains_key(&attendee.id) {
            return Err(not_found("Attendee", attendee.id));
        }
        if state
            .attendees
            .values()
            .any(|a| a.id != attendee.id && a.email == attendee.email)
        {
            return Err(AppError::Conflict(
                "An attendee with this email already exists".into(),
            ));
        }
        state.attendees.insert(attendee.id, attendee);
        Ok(())
    }

    async fn detach(&self, event_id: EventId, attendee_id: AttendeeId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.memberships.remove(&(event_id, attendee_id)) {
            return Err(AppError::EntityNotFound(format!(
                "Attendee ({attendee_id}) is not registered for this event"
            )));
        }
        for meeting in state
            .meetings
            .values_mut()
            .filter(|m| m.event_id == event_id)
        {
            meeting.attendee_ids.retain(|id| *id != attendee_id);
        }
        Ok(())
    }
}

#[async_trait]
impl MeetingRepository for MemoryStore {
    async fn create(&self, draft: MeetingDraft) -> AppResult<Meeting> {
        let mut state = self.state.lock().await;
        state.check_draft(&draft)?;
        let meeting = state.materialize(&draft);
        state.meetings.insert(draft.id, draft);
        Ok(meeting)
    }

    async fn update(&self, meeting_id: MeetingId, update: UpdateMeeting) -> AppResult<Meeting> {
        let mut state = self.state.lock().await;
        let current = state
            .meetings
            .get(&meeting_id)
            .map(|d| state.materialize(d))
            .ok_or_else(|| not_found("Meeting", meeting_id))?;
        let draft = update.apply_to(&current)?;
        state.check_draft(&draft)?;
        let meeting = state.materialize(&draft);
        state.meetings.insert(meeting_id, draft);
        Ok(meeting)
    }

    async fn delete(&self, meeting_id: MeetingId) -> AppResult<Meeting> {
        let mut state = self.state.lock().await;
        let draft = state
            .meetings
            .remove(&meeting_id)
            .ok_or_else(|| not_found("Meeting", meeting_id))?;
        Ok(state.materialize(&draft))
    }

    async fn find_by_id(&self, meeting_id: MeetingId) -> AppResult<Option<Meeting>> {
        let state = self.state.lock().await;
        Ok(state.meetings.get(&meeting_id).map(|d| state.materialize(d)))
    }

    async fn find_by_event(&self, event_id: EventId) -> AppResult<Vec<Meeting>> {
        let state = self.state.lock().await;
        let mut meetings: Vec<Meeting> = state
            .meetings
            .values()
            .filter(|m| m.event_id == event_id)
            .map(|d| state.materialize(d))
            .collect();
        meetings.sort_by(|a, b| {
            (a.starts_at.is_none(), a.starts_at, &a.title)
                .cmp(&(b.starts_at.is_none(), b.starts_at, &b.title))
        });
        Ok(meetings)
    }

    async fn find_bookings(&self, window: TimeRange) -> AppResult<Vec<Booking>> {
        Ok(self.state.lock().await.bookings(&window))
    }

    async fn mark_invite_sent(&self, meeting_id: MeetingId, sequence: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(draft) = state.meetings.get_mut(&meeting_id) {
            if draft.sequence == sequence {
                draft.calendar_invite_sent = true;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn get_or_create_default(&self) -> AppResult<SystemSettings> {
        let mut state = self.state.lock().await;
        Ok(state.settings.get_or_insert_with(SystemSettings::default).clone())
    }

    async fn update(&self, settings: SystemSettings) -> AppResult<()> {
        self.state.lock().await.settings = Some(settings);
        Ok(())
    }
}

#[async_trait]
impl TransferRepository for MemoryStore {
    async fn apply_import(&self, set: ImportSet) -> AppResult<ImportSummary> {
        let summary = set.summary();
        let ImportSet {
            event,
            rooms,
            attendees,
            meetings,
        } = set;

        let mut state = self.state.lock().await;
        // 複製に書き込み、検証が通ったときだけ差し替える
        let mut next = state.clone();
        next.ensure_unique_event(&event)?;
        for room in &rooms {
            next.ensure_unique_room(room)?;
        }

        let event_id = event.id;
        next.events.insert(event_id, event);
        for room in rooms {
            next.rooms.insert(room.id, Room { event_id, ..room });
        }
        let mut stored_ids = HashMap::new();
        for attendee in &attendees {
            let stored = next.upsert_attendee(event_id, attendee);
            stored_ids.insert(attendee.id, stored.id);
        }

        let stored_bookings: Vec<Booking> = next
            .meetings
            .values()
            .filter_map(|draft| next.booking_of(draft))
            .collect();
        let mut batch = Vec::new();
        for mut meeting in meetings {
            meeting.event_id = event_id;
            for id in meeting.attendee_ids.iter_mut() {
                if let Some(stored) = stored_ids.get(id) {
                    *id = *stored;
                }
            }
            batch.extend(next.booking_of(&meeting));
            next.meetings.insert(meeting.id, meeting);
        }
        check_batch(&batch, &stored_bookings)?;

        *state = next;
        Ok(summary)
    }

    async fn reset_all(&self) -> AppResult<()> {
        *self.state.lock().await = State::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::{
        attendee::event::CreateAttendee,
        event::event::CreateEvent,
        meeting::{event::CreateMeeting, MeetingStatus},
    };

    struct Fixture {
        store: MemoryStore,
        event: Event,
        rooms: Vec<Room>,
        alice: Attendee,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let event = CreateEvent {
            name: "Winter Summit".into(),
            ..Default::default()
        }
        .into_event(&SystemSettings::default(), UserId::new())
        .unwrap();
        EventRepository::create(&store, event.clone()).await.unwrap();

        let mut rooms = Vec::new();
        for name in ["R", "S"] {
            let room = Room {
                id: RoomId::new(),
                event_id: event.id,
                name: name.into(),
                capacity: 10,
            };
            RoomRepository::create(&store, room.clone()).await.unwrap();
            rooms.push(room);
        }

        let alice = store
            .upsert_into_event(
                event.id,
                CreateAttendee {
                    name: "A".into(),
                    email: "a@example.com".into(),
                    ..Default::default()
                }
                .into_attendee(),
            )
            .await
            .unwrap();

        Fixture {
            store,
            event,
            rooms,
            alice,
        }
    }

    fn draft(f: &Fixture, room: usize, start: &str, end: &str) -> MeetingDraft {
        CreateMeeting {
            status: Some(MeetingStatus::Completed),
            date: Some("2025-12-25".into()),
            start_time: Some(start.into()),
            end_time: Some(end.into()),
            room_id: Some(f.rooms[room].id),
            attendee_ids: vec![f.alice.id],
            ..CreateMeeting::new(f.event.id, "Sync", UserId::new())
        }
        .into_draft()
        .unwrap()
    }

    #[tokio::test]
    async fn concrete_schedule_scenario() {
        let f = fixture().await;
        MeetingRepository::create(&f.store, draft(&f, 0, "10:00", "11:00"))
            .await
            .unwrap();

        let m2 = MeetingRepository::create(&f.store, draft(&f, 0, "10:30", "11:30")).await;
        assert!(matches!(m2, Err(AppError::Conflict(msg)) if msg.contains("Room 'R'")));

        let m3 = MeetingRepository::create(&f.store, draft(&f, 1, "10:30", "11:30")).await;
        assert!(
            matches!(m3, Err(AppError::Conflict(msg)) if msg == "Attendees already booked at this time: A")
        );

        let m4 = MeetingRepository::create(&f.store, draft(&f, 0, "11:00", "12:00")).await;
        assert!(m4.is_ok());
    }

    #[tokio::test]
    async fn references_must_belong_to_the_event() {
        let f = fixture().await;
        let stranger = Attendee {
            id: AttendeeId::new(),
            ..f.alice.clone()
        };
        let mut d = draft(&f, 0, "10:00", "11:00");
        d.attendee_ids = vec![stranger.id];
        let res = MeetingRepository::create(&f.store, d).await;
        assert!(matches!(res, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn update_bumps_sequence_and_failed_update_does_not() {
        let f = fixture().await;
        let m1 = MeetingRepository::create(&f.store, draft(&f, 0, "10:00", "11:00"))
            .await
            .unwrap();
        MeetingRepository::create(&f.store, draft(&f, 0, "12:00", "13:00"))
            .await
            .unwrap();

        let moved = MeetingRepository::update(
            &f.store,
            m1.id,
            UpdateMeeting {
                title: Some("Moved".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.sequence, 1);

        let res = MeetingRepository::update(
            &f.store,
            m1.id,
            UpdateMeeting {
                start_time: Some(Some("12:30".into())),
                end_time: Some(Some("13:30".into())),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
        let stored = MeetingRepository::find_by_id(&f.store, m1.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.sequence, 1);
        assert_eq!(stored.title, "Moved");
    }

    #[tokio::test]
    async fn room_in_use_cannot_be_deleted() {
        let f = fixture().await;
        MeetingRepository::create(&f.store, draft(&f, 0, "10:00", "11:00"))
            .await
            .unwrap();
        let res = RoomRepository::delete(&f.store, f.rooms[0].id).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
        RoomRepository::delete(&f.store, f.rooms[1].id).await.unwrap();
    }

    #[tokio::test]
    async fn detach_removes_attendee_from_meetings() {
        let f = fixture().await;
        let m = MeetingRepository::create(&f.store, draft(&f, 0, "10:00", "11:00"))
            .await
            .unwrap();
        f.store.detach(f.event.id, f.alice.id).await.unwrap();
        let m = MeetingRepository::find_by_id(&f.store, m.id)
            .await
            .unwrap()
            .unwrap();
        assert!(m.attendees.is_empty());
        assert!(!f.store.is_member(f.event.id, f.alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn event_delete_cascades() {
        let f = fixture().await;
        MeetingRepository::create(&f.store, draft(&f, 0, "10:00", "11:00"))
            .await
            .unwrap();
        EventRepository::delete(&f.store, f.event.id).await.unwrap();
        assert!(MeetingRepository::find_by_event(&f.store, f.event.id)
            .await
            .unwrap()
            .is_empty());
        assert!(RoomRepository::find_by_event(&f.store, f.event.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn settings_are_created_once() {
        let store = MemoryStore::new();
        let first = store.get_or_create_default().await.unwrap();
        SettingsRepository::update(
            &store,
            SystemSettings {
                llm_model: "other".into(),
                ..first
            },
        )
        .await
        .unwrap();
        assert_eq!(store.get_or_create_default().await.unwrap().llm_model, "other");
    }
}

