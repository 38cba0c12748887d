use crate::database::{
    map_write_error,
    model::{
        meeting::{MeetingAttendeeRow, MeetingRow},
        room::RoomRow,
    },
    ConnectionPool,
};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    availability::{check_availability, Booking},
    id::{AttendeeId, EventId, MeetingId},
    meeting::{event::UpdateMeeting, Meeting, MeetingDraft},
    room::Room,
    time::TimeRange,
};
use kernel::repository::meeting::MeetingRepository;
use shared::error::{AppError, AppResult};
use sqlx::PgConnection;
use uuid::Uuid;

const MEETING_SELECT: &str = r#"
    SELECT
        m.meeting_id, m.event_id, m.title, m.purpose, m.status, m.meeting_date,
        m.starts_at, m.ends_at, m.room_id, r.name AS room_name, m.tags,
        m.meeting_type, m.requester_email, m.other_details, m.is_approved,
        m.calendar_invite_sent, m.sequence, m.created_by
    FROM meetings AS m
    LEFT JOIN rooms AS r ON r.room_id = m.room_id
"#;

#[derive(new)]
pub struct MeetingRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl MeetingRepository for MeetingRepositoryImpl {
    async fn create(&self, draft: MeetingDraft) -> AppResult<Meeting> {
        let mut tx = self.db.begin_serializable().await?;

        // 参照整合性と空き状況の確認は書き込みと同じトランザクションで行う
        {
            ensure_references(&mut *tx, &draft).await?;
            ensure_available(&mut *tx, &draft).await?;
        }

        sqlx::query(
            r#"
                INSERT INTO meetings (
                    meeting_id, event_id, title, purpose, status, meeting_date,
                    starts_at, ends_at, room_id, tags, meeting_type, requester_email,
                    other_details, is_approved, calendar_invite_sent, sequence, created_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(draft.id)
        .bind(draft.event_id)
        .bind(&draft.title)
        .bind(&draft.purpose)
        .bind(draft.status.to_string())
        .bind(draft.date)
        .bind(draft.starts_at)
        .bind(draft.ends_at)
        .bind(draft.room_id)
        .bind(&draft.tags)
        .bind(&draft.meeting_type)
        .bind(&draft.requester_email)
        .bind(&draft.other_details)
        .bind(draft.is_approved)
        .bind(draft.calendar_invite_sent)
        .bind(draft.sequence)
        .bind(draft.created_by)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        replace_attendees(&mut *tx, draft.id, &draft.attendee_ids).await?;

        let meeting = fetch_meeting(&mut *tx, draft.id).await?.ok_or_else(|| {
            AppError::NoRowsAffectedError("No meeting record has been created".into())
        })?;

        tx.commit().await.map_err(map_write_error)?;

        Ok(meeting)
    }

    async fn update(&self, meeting_id: MeetingId, update: UpdateMeeting) -> AppResult<Meeting> {
        let mut tx = self.db.begin_serializable().await?;

        let current = fetch_meeting(&mut *tx, meeting_id)
            .await?
            .ok_or_else(|| meeting_not_found(meeting_id))?;
        let draft = update.apply_to(&current)?;

        {
            ensure_references(&mut *tx, &draft).await?;
            ensure_available(&mut *tx, &draft).await?;
        }

        // sequence は読み込んだ値と一致するときだけ進める
        let res = sqlx::query(
            r#"
                UPDATE meetings SET
                    title = $3,
                    purpose = $4,
                    status = $5,
                    meeting_date = $6,
                    starts_at = $7,
                    ends_at = $8,
                    room_id = $9,
                    tags = $10,
                    meeting_type = $11,
                    requester_email = $12,
                    other_details = $13,
                    is_approved = $14,
                    calendar_invite_sent = $15,
                    sequence = sequence + 1
                WHERE meeting_id = $1 AND sequence = $2
            "#,
        )
        .bind(meeting_id)
        .bind(current.sequence)
        .bind(&draft.title)
        .bind(&draft.purpose)
        .bind(draft.status.to_string())
        .bind(draft.date)
        .bind(draft.starts_at)
        .bind(draft.ends_at)
        .bind(draft.room_id)
        .bind(&draft.tags)
        .bind(&draft.meeting_type)
        .bind(&draft.requester_email)
        .bind(&draft.other_details)
        .bind(draft.is_approved)
        .bind(draft.calendar_invite_sent)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::Conflict(
                "The meeting was changed by someone else, please reload".into(),
            ));
        }

        replace_attendees(&mut *tx, meeting_id, &draft.attendee_ids).await?;

        let meeting = fetch_meeting(&mut *tx, meeting_id)
            .await?
            .ok_or_else(|| meeting_not_found(meeting_id))?;

        tx.commit().await.map_err(map_write_error)?;

        Ok(meeting)
    }

    async fn delete(&self, meeting_id: MeetingId) -> AppResult<Meeting> {
        let mut tx = self.db.begin().await?;

        let meeting = fetch_meeting(&mut *tx, meeting_id)
            .await?
            .ok_or_else(|| meeting_not_found(meeting_id))?;

        sqlx::query("DELETE FROM meetings WHERE meeting_id = $1")
            .bind(meeting_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(meeting)
    }

    async fn find_by_id(&self, meeting_id: MeetingId) -> AppResult<Option<Meeting>> {
        let mut conn = self
            .db
            .inner_ref()
            .acquire()
            .await
            .map_err(AppError::SpecificOperationError)?;
        fetch_meeting(&mut *conn, meeting_id).await
    }

    async fn find_by_event(&self, event_id: EventId) -> AppResult<Vec<Meeting>> {
        let mut conn = self
            .db
            .inner_ref()
            .acquire()
            .await
            .map_err(AppError::SpecificOperationError)?;

        let sql = format!(
            "{MEETING_SELECT} WHERE m.event_id = $1 ORDER BY m.starts_at NULLS LAST, m.title"
        );
        let rows: Vec<MeetingRow> = sqlx::query_as(&sql)
            .bind(event_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(AppError::SpecificOperationError)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.meeting_id.raw()).collect();
        let attendees = fetch_attendee_rows(&mut *conn, &ids).await?;

        rows.into_iter()
            .map(|row| row.into_meeting(&attendees))
            .collect()
    }

    async fn find_bookings(&self, window: TimeRange) -> AppResult<Vec<Booking>> {
        let mut conn = self
            .db
            .inner_ref()
            .acquire()
            .await
            .map_err(AppError::SpecificOperationError)?;
        fetch_bookings(&mut *conn, window).await
    }

    async fn mark_invite_sent(&self, meeting_id: MeetingId, sequence: i32) -> AppResult<()> {
        sqlx::query(
            r#"
                UPDATE meetings SET calendar_invite_sent = TRUE
                WHERE meeting_id = $1 AND sequence = $2
            "#,
        )
        .bind(meeting_id)
        .bind(sequence)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(())
    }
}

fn meeting_not_found(meeting_id: MeetingId) -> AppError {
    AppError::EntityNotFound(format!("Meeting ({meeting_id}) was not found"))
}

async fn fetch_attendee_rows(
    conn: &mut PgConnection,
    meeting_ids: &[Uuid],
) -> AppResult<Vec<MeetingAttendeeRow>> {
    if meeting_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as(
        r#"
            SELECT ma.meeting_id, a.attendee_id, a.name, a.email
            FROM meeting_attendees AS ma
            INNER JOIN attendees AS a ON a.attendee_id = ma.attendee_id
            WHERE ma.meeting_id = ANY($1)
            ORDER BY a.name
        "#,
    )
    .bind(meeting_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(AppError::SpecificOperationError)
}

pub(crate) async fn fetch_meeting(
    conn: &mut PgConnection,
    meeting_id: MeetingId,
) -> AppResult<Option<Meeting>> {
    let sql = format!("{MEETING_SELECT} WHERE m.meeting_id = $1");
    let row: Option<MeetingRow> = sqlx::query_as(&sql)
        .bind(meeting_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::SpecificOperationError)?;

    let Some(row) = row else {
        return Ok(None);
    };
    let attendees = fetch_attendee_rows(conn, &[meeting_id.raw()]).await?;
    row.into_meeting(&attendees).map(Some)
}

pub(crate) async fn fetch_bookings(conn: &mut PgConnection, window: TimeRange) -> AppResult<Vec<Booking>> {
    // 半開区間 [start, end) 同士の重なり
    let sql = format!(
        "{MEETING_SELECT} WHERE m.starts_at IS NOT NULL AND m.ends_at IS NOT NULL \
         AND m.starts_at < $2 AND $1 < m.ends_at"
    );
    let rows: Vec<MeetingRow> = sqlx::query_as(&sql)
        .bind(window.start())
        .bind(window.end())
        .fetch_all(&mut *conn)
        .await
        .map_err(AppError::SpecificOperationError)?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.meeting_id.raw()).collect();
    let attendees = fetch_attendee_rows(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| row.into_booking(&attendees))
        .collect())
}

async fn ensure_references(conn: &mut PgConnection, draft: &MeetingDraft) -> AppResult<()> {
    let room: Option<Room> = match draft.room_id {
        Some(room_id) => sqlx::query_as::<_, RoomRow>(
            "SELECT room_id, event_id, name, capacity FROM rooms WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::SpecificOperationError)?
        .map(Room::from),
        None => None,
    };

    let ids: Vec<Uuid> = draft.attendee_ids.iter().map(|id| id.raw()).collect();
    let members: Vec<AttendeeId> = sqlx::query_scalar(
        r#"
            SELECT attendee_id FROM event_attendees
            WHERE event_id = $1 AND attendee_id = ANY($2)
        "#,
    )
    .bind(draft.event_id)
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(AppError::SpecificOperationError)?;

    draft.ensure_references(room.as_ref(), &members)
}

async fn ensure_available(conn: &mut PgConnection, draft: &MeetingDraft) -> AppResult<()> {
    let Some(candidate) = draft.candidate() else {
        return Ok(());
    };
    let bookings = fetch_bookings(conn, candidate.range).await?;
    check_availability(&candidate, &bookings).into_result()
}

pub(crate) async fn replace_attendees(
    conn: &mut PgConnection,
    meeting_id: MeetingId,
    attendee_ids: &[AttendeeId],
) -> AppResult<()> {
    sqlx::query("DELETE FROM meeting_attendees WHERE meeting_id = $1")
        .bind(meeting_id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::SpecificOperationError)?;

    let ids: Vec<Uuid> = attendee_ids.iter().map(|id| id.raw()).collect();
    sqlx::query(
        r#"
            INSERT INTO meeting_attendees (meeting_id, attendee_id)
            SELECT $1, UNNEST($2::uuid[])
        "#,
    )
    .bind(meeting_id)
    .bind(ids)
    .execute(&mut *conn)
    .await
    .map_err(map_write_error)?;

    Ok(())
}
