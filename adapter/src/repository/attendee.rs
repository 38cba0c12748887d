use crate::database::{map_write_error, model::attendee::AttendeeRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    attendee::Attendee,
    id::{AttendeeId, EventId},
};
use kernel::repository::attendee::AttendeeRepository;
use shared::error::{AppError, AppResult};
use sqlx::PgConnection;

const ATTENDEE_COLUMNS: &str = r#"
    a.attendee_id, a.name, a.email, a.title, a.company, a.company_description,
    a.bio, a.linkedin, a.image_url, a.is_external, a.attendee_type
"#;

#[derive(new)]
pub struct AttendeeRepositoryImpl {
    db: ConnectionPool,
}

/// Upserts by email and links the stored record to the event. Used by both
/// attendee creation and import.
pub(crate) async fn upsert_attendee(
    conn: &mut PgConnection,
    event_id: EventId,
    attendee: &Attendee,
) -> AppResult<Attendee> {
    // 既存のプロフィールは送られてきた値がある項目だけ上書きする
    let row: AttendeeRow = sqlx::query_as(
        r#"
            INSERT INTO attendees AS a (
                attendee_id, name, email, title, company, company_description,
                bio, linkedin, image_url, is_external, attendee_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                title = COALESCE(EXCLUDED.title, a.title),
                company = COALESCE(EXCLUDED.company, a.company),
                company_description = COALESCE(EXCLUDED.company_description, a.company_description),
                bio = COALESCE(EXCLUDED.bio, a.bio),
                linkedin = COALESCE(EXCLUDED.linkedin, a.linkedin),
                image_url = COALESCE(EXCLUDED.image_url, a.image_url),
                is_external = EXCLUDED.is_external,
                attendee_type = COALESCE(EXCLUDED.attendee_type, a.attendee_type)
            RETURNING
                attendee_id, name, email, title, company, company_description,
                bio, linkedin, image_url, is_external, attendee_type
        "#,
    )
    .bind(attendee.id)
    .bind(&attendee.name)
    .bind(&attendee.email)
    .bind(&attendee.title)
    .bind(&attendee.company)
    .bind(&attendee.company_description)
    .bind(&attendee.bio)
    .bind(&attendee.linkedin)
    .bind(&attendee.image_url)
    .bind(attendee.is_external)
    .bind(&attendee.attendee_type)
    .fetch_one(&mut *conn)
    .await
    .map_err(map_write_error)?;

    sqlx::query(
        r#"
            INSERT INTO event_attendees (event_id, attendee_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
        "#,
    )
    .bind(event_id)
    .bind(row.attendee_id)
    .execute(&mut *conn)
    .await
    .map_err(map_write_error)?;

    Ok(row.into())
}

#[async_trait]
impl AttendeeRepository for AttendeeRepositoryImpl {
    async fn upsert_into_event(&self, event_id: EventId, attendee: Attendee) -> AppResult<Attendee> {
        let mut tx = self.db.begin().await?;
        let stored = upsert_attendee(&mut *tx, event_id, &attendee).await?;
        tx.commit().await.map_err(AppError::TransactionError)?;
        Ok(stored)
    }

    async fn find_by_event(&self, event_id: EventId) -> AppResult<Vec<Attendee>> {
        let sql = format!(
            r#"
                SELECT {ATTENDEE_COLUMNS}
                FROM attendees AS a
                INNER JOIN event_attendees AS ea ON ea.attendee_id = a.attendee_id
                WHERE ea.event_id = $1
                ORDER BY a.name
            "#
        );
        let rows: Vec<AttendeeRow> = sqlx::query_as(&sql)
            .bind(event_id)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(Attendee::from).collect())
    }

    async fn find_by_id(&self, attendee_id: AttendeeId) -> AppResult<Option<Attendee>> {
        let sql = format!("SELECT {ATTENDEE_COLUMNS} FROM attendees AS a WHERE a.attendee_id = $1");
        let row: Option<AttendeeRow> = sqlx::query_as(&sql)
            .bind(attendee_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        Ok(row.map(Attendee::from))
    }

    async fn find_by_emails(&self, emails: &[String]) -> AppResult<Vec<Attendee>> {
        let sql = format!("SELECT {ATTENDEE_COLUMNS} FROM attendees AS a WHERE a.email = ANY($1)");
        let rows: Vec<AttendeeRow> = sqlx::query_as(&sql)
            .bind(emails)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(Attendee::from).collect())
    }

    async fn is_member(&self, event_id: EventId, attendee_id: AttendeeId) -> AppResult<bool> {
        sqlx::query_scalar(
            r#"
                SELECT EXISTS (
                    SELECT 1 FROM event_attendees
                    WHERE event_id = $1 AND attendee_id = $2
                )
            "#,
        )
        .bind(event_id)
        .bind(attendee_id)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)
    }

    async fn update(&self, attendee: Attendee) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE attendees SET
                    name = $2,
                    email = $3,
                    title = $4,
                    company = $5,
                    company_description = $6,
                    bio = $7,
                    linkedin = $8,
                    image_url = $9,
                    is_external = $10,
                    attendee_type = $11
                WHERE attendee_id = $1
            "#,
        )
        .bind(attendee.id)
        .bind(&attendee.name)
        .bind(&attendee.email)
        .bind(&attendee.title)
        .bind(&attendee.company)
        .bind(&attendee.company_description)
        .bind(&attendee.bio)
        .bind(&attendee.linkedin)
        .bind(&attendee.image_url)
        .bind(attendee.is_external)
        .bind(&attendee.attendee_type)
        .execute(self.db.inner_ref())
        .await
        .map_err(map_write_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "Attendee ({}) was not found",
                attendee.id
            )));
        }
        Ok(())
    }

    async fn detach(&self, event_id: EventId, attendee_id: AttendeeId) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
                DELETE FROM meeting_attendees AS ma
                USING meetings AS m
                WHERE ma.meeting_id = m.meeting_id
                  AND m.event_id = $1
                  AND ma.attendee_id = $2
            "#,
        )
        .bind(event_id)
        .bind(attendee_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let res = sqlx::query("DELETE FROM event_attendees WHERE event_id = $1 AND attendee_id = $2")
            .bind(event_id)
            .bind(attendee_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "Attendee ({attendee_id}) is not registered for this event"
            )));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::event::EventRepositoryImpl;
    use kernel::model::{
        attendee::event::CreateAttendee, event::event::CreateEvent, id::UserId,
        settings::SystemSettings,
    };
    use kernel::repository::event::EventRepository;

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_upsert_keeps_one_record_per_email(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let events = EventRepositoryImpl::new(db.clone());
        let mut event_ids = Vec::new();
        for name in ["Expo", "Forum"] {
            let event = CreateEvent {
                name: name.into(),
                ..Default::default()
            }
            .into_event(&SystemSettings::default(), UserId::new())?;
            event_ids.push(event.id);
            events.create(event).await?;
        }

        let repo = AttendeeRepositoryImpl::new(db);
        let first = repo
            .upsert_into_event(
                event_ids[0],
                CreateAttendee {
                    name: "Alice".into(),
                    email: "alice@example.com".into(),
                    title: Some("CTO".into()),
                    ..Default::default()
                }
                .into_attendee(),
            )
            .await?;
        let second = repo
            .upsert_into_event(
                event_ids[1],
                CreateAttendee {
                    name: "Alice B.".into(),
                    email: "ALICE@example.com".into(),
                    ..Default::default()
                }
                .into_attendee(),
            )
            .await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.title.as_deref(), Some("CTO"));
        assert!(repo.is_member(event_ids[0], first.id).await?);
        assert!(repo.is_member(event_ids[1], first.id).await?);

        repo.detach(event_ids[0], first.id).await?;
        assert!(!repo.is_member(event_ids[0], first.id).await?);
        assert_eq!(repo.find_by_event(event_ids[1]).await?.len(), 1);
        Ok(())
    }
}
