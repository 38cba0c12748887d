use crate::model::{
    availability::{busy_rooms, check_availability, AvailabilityReport, Booking, Candidate},
    id::RoomId,
    room::Room,
    time::{clock_string, TimeRange},
};
use chrono::Duration;

pub const MAX_ROOM_SUGGESTIONS: usize = 3;
pub const TIME_SHIFT_HOURS: [i64; 3] = [1, 2, 3];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Room { label: String, room_id: RoomId },
    Time { label: String, range: TimeRange },
}

/// Window the store has to load bookings for so [`suggest`] can evaluate
/// every shifted slot.
pub fn search_window(candidate: &Candidate) -> TimeRange {
    let last = TIME_SHIFT_HOURS.iter().copied().max().unwrap_or(0);
    candidate
        .range
        .union(&candidate.range.shifted(Duration::hours(last)))
}

/// Proposes alternatives for a conflicting candidate. `rooms` are the rooms of
/// the candidate's event; `bookings` must cover [`search_window`].
pub fn suggest(
    candidate: &Candidate,
    report: &AvailabilityReport,
    rooms: &[Room],
    bookings: &[Booking],
) -> Vec<Suggestion> {
    if report.is_available() {
        return Vec::new();
    }

    let mut suggestions = Vec::new();

    if report.room_busy() {
        let busy = busy_rooms(&candidate.range, bookings, candidate.exclude_meeting_id);
        suggestions.extend(
            rooms
                .iter()
                .filter(|room| Some(room.id) != candidate.room_id)
                .filter(|room| !busy.contains(&room.id))
                .take(MAX_ROOM_SUGGESTIONS)
                .map(|room| Suggestion::Room {
                    label: format!("{} (capacity {})", room.name, room.capacity),
                    room_id: room.id,
                }),
        );
    }

    // 最初に空いている時間帯だけを返す
    let free_slot = TIME_SHIFT_HOURS
        .iter()
        .map(|h| candidate.range.shifted(Duration::hours(*h)))
        .find(|range| check_availability(&candidate.with_range(*range), bookings).is_available());
    if let Some(range) = free_slot {
        suggestions.push(Suggestion::Time {
            label: format!(
                "{} {}–{}",
                range.start().format("%Y-%m-%d"),
                clock_string(range.start()),
                clock_string(range.end())
            ),
            range,
        });
    }

    suggestions
}
