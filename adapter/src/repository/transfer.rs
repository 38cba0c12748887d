use super::{
    attendee::upsert_attendee,
    event::user_uuids,
    meeting::{fetch_bookings, replace_attendees},
};
use crate::database::{map_write_error, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    availability::{check_batch, BookedAttendee, BookedRoom, Booking},
    id::{AttendeeId, RoomId},
    meeting::MeetingDraft,
    time::TimeRange,
    transfer::{ImportSet, ImportSummary},
};
use kernel::repository::transfer::TransferRepository;
use shared::error::{AppError, AppResult};
use std::collections::HashMap;

#[derive(new)]
pub struct TransferRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl TransferRepository for TransferRepositoryImpl {
    async fn apply_import(&self, set: ImportSet) -> AppResult<ImportSummary> {
        let summary = set.summary();
        let ImportSet {
            event,
            rooms,
            attendees,
            mut meetings,
        } = set;

        let mut tx = self.db.begin_serializable().await?;

        sqlx::query(
            r#"
                INSERT INTO events (
                    event_id, name, slug, status, start_date, end_date, address, region,
                    budget, tags, meeting_types, attendee_types, password_hash,
                    authorized_user_ids
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ON CONFLICT (event_id) DO UPDATE SET
                    name = EXCLUDED.name,
                    slug = EXCLUDED.slug,
                    status = EXCLUDED.status,
                    start_date = EXCLUDED.start_date,
                    end_date = EXCLUDED.end_date,
                    address = EXCLUDED.address,
                    region = EXCLUDED.region,
                    budget = EXCLUDED.budget,
                    tags = EXCLUDED.tags,
                    meeting_types = EXCLUDED.meeting_types,
                    attendee_types = EXCLUDED.attendee_types,
                    password_hash = EXCLUDED.password_hash,
                    authorized_user_ids = EXCLUDED.authorized_user_ids
            "#,
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.slug)
        .bind(event.status.to_string())
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.address)
        .bind(&event.region)
        .bind(event.budget)
        .bind(&event.tags)
        .bind(&event.meeting_types)
        .bind(&event.attendee_types)
        .bind(&event.password_hash)
        .bind(user_uuids(&event.authorized_user_ids))
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        for room in &rooms {
            sqlx::query(
                r#"
                    INSERT INTO rooms (room_id, event_id, name, capacity)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (room_id) DO UPDATE SET
                        name = EXCLUDED.name,
                        capacity = EXCLUDED.capacity
                "#,
            )
            .bind(room.id)
            .bind(event.id)
            .bind(&room.name)
            .bind(room.capacity)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;
        }

        // メールアドレスで既存レコードに寄せられた場合は ID を差し替える
        let mut stored_ids: HashMap<AttendeeId, AttendeeId> = HashMap::new();
        for attendee in &attendees {
            let stored = upsert_attendee(&mut *tx, event.id, attendee).await?;
            stored_ids.insert(attendee.id, stored.id);
        }
        for meeting in meetings.iter_mut() {
            for id in meeting.attendee_ids.iter_mut() {
                if let Some(stored) = stored_ids.get(id) {
                    *id = *stored;
                }
            }
        }

        let room_names: HashMap<RoomId, String> =
            rooms.iter().map(|r| (r.id, r.name.clone())).collect();
        let attendee_names: HashMap<AttendeeId, String> = attendees
            .iter()
            .map(|a| (stored_ids.get(&a.id).copied().unwrap_or(a.id), a.name.clone()))
            .collect();
        let batch: Vec<Booking> = meetings
            .iter()
            .filter_map(|m| batch_booking(m, &room_names, &attendee_names))
            .collect();
        if let Some(window) = batch_window(&batch) {
            let stored = fetch_bookings(&mut *tx, window).await?;
            check_batch(&batch, &stored)?;
        }

        for meeting in &meetings {
            sqlx::query(
                r#"
                    INSERT INTO meetings (
                        meeting_id, event_id, title, purpose, status, meeting_date,
                        starts_at, ends_at, room_id, tags, meeting_type, requester_email,
                        other_details, is_approved, calendar_invite_sent, sequence, created_by
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                    ON CONFLICT (meeting_id) DO UPDATE SET
                        title = EXCLUDED.title,
                        purpose = EXCLUDED.purpose,
                        status = EXCLUDED.status,
                        meeting_date = EXCLUDED.meeting_date,
                        starts_at = EXCLUDED.starts_at,
                        ends_at = EXCLUDED.ends_at,
                        room_id = EXCLUDED.room_id,
                        tags = EXCLUDED.tags,
                        meeting_type = EXCLUDED.meeting_type,
                        requester_email = EXCLUDED.requester_email,
                        other_details = EXCLUDED.other_details,
                        is_approved = EXCLUDED.is_approved,
                        calendar_invite_sent = EXCLUDED.calendar_invite_sent,
                        sequence = EXCLUDED.sequence
                "#,
            )
            .bind(meeting.id)
            .bind(event.id)
            .bind(&meeting.title)
            .bind(&meeting.purpose)
            .bind(meeting.status.to_string())
            .bind(meeting.date)
            .bind(meeting.starts_at)
            .bind(meeting.ends_at)
            .bind(meeting.room_id)
            .bind(&meeting.tags)
            .bind(&meeting.meeting_type)
            .bind(&meeting.requester_email)
            .bind(&meeting.other_details)
            .bind(meeting.is_approved)
            .bind(meeting.calendar_invite_sent)
            .bind(meeting.sequence)
            .bind(meeting.created_by)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

            replace_attendees(&mut *tx, meeting.id, &meeting.attendee_ids).await?;
        }

        tx.commit().await.map_err(map_write_error)?;

        tracing::info!(
            event_id = %event.id,
            rooms = summary.rooms,
            attendees = summary.attendees,
            meetings = summary.meetings,
            "event imported"
        );
        Ok(summary)
    }

    async fn reset_all(&self) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        for sql in [
            "DELETE FROM events",
            "DELETE FROM attendees",
            "DELETE FROM system_settings",
        ] {
            sqlx::query(sql)
                .execute(&mut *tx)
                .await
                .map_err(AppError::SpecificOperationError)?;
        }
        tx.commit().await.map_err(AppError::TransactionError)?;
        Ok(())
    }
}

fn batch_booking(
    meeting: &MeetingDraft,
    room_names: &HashMap<RoomId, String>,
    attendee_names: &HashMap<AttendeeId, String>,
) -> Option<Booking> {
    let range = meeting.time_range()?;
    Some(Booking {
        meeting_id: meeting.id,
        event_id: meeting.event_id,
        range,
        room: meeting.room_id.map(|room_id| BookedRoom {
            room_id,
            room_name: room_names
                .get(&room_id)
                .cloned()
                .unwrap_or_else(|| room_id.to_string()),
        }),
        attendees: meeting
            .attendee_ids
            .iter()
            .map(|id| BookedAttendee {
                attendee_id: *id,
                name: attendee_names
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| id.to_string()),
            })
            .collect(),
    })
}

// 取り込む予約すべてを覆う区間
fn batch_window(batch: &[Booking]) -> Option<TimeRange> {
    let start = batch.iter().map(|b| b.range.start()).min()?;
    let end = batch.iter().map(|b| b.range.end()).max()?;
    TimeRange::new(start, end).ok()
}
