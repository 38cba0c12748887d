use crate::database::{map_write_error, model::event::EventRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    event::Event,
    id::{EventId, UserId},
};
use kernel::repository::event::EventRepository;
use shared::error::{AppError, AppResult};
use uuid::Uuid;

pub(crate) const EVENT_COLUMNS: &str = r#"
    event_id, name, slug, status, start_date, end_date, address, region, budget,
    tags, meeting_types, attendee_types, password_hash, authorized_user_ids
"#;

#[derive(new)]
pub struct EventRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl EventRepository for EventRepositoryImpl {
    async fn create(&self, event: Event) -> AppResult<()> {
        sqlx::query(
            r#"
                INSERT INTO events (
                    event_id, name, slug, status, start_date, end_date, address, region,
                    budget, tags, meeting_types, attendee_types, password_hash,
                    authorized_user_ids
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
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
        .execute(self.db.inner_ref())
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn find_all(&self) -> AppResult<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY start_date NULLS LAST, name");
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn find_by_id(&self, event_id: EventId) -> AppResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = $1");
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(event_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        row.map(Event::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE name = $1");
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        row.map(Event::try_from).transpose()
    }

    async fn update(&self, event: Event) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE events SET
                    name = $2,
                    slug = $3,
                    status = $4,
                    start_date = $5,
                    end_date = $6,
                    address = $7,
                    region = $8,
                    budget = $9,
                    tags = $10,
                    meeting_types = $11,
                    attendee_types = $12,
                    password_hash = $13,
                    authorized_user_ids = $14
                WHERE event_id = $1
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
        .execute(self.db.inner_ref())
        .await
        .map_err(map_write_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "Event ({}) was not found",
                event.id
            )));
        }
        Ok(())
    }

    async fn delete(&self, event_id: EventId) -> AppResult<()> {
        // rooms / meetings / event_attendees は ON DELETE CASCADE で消える
        let res = sqlx::query("DELETE FROM events WHERE event_id = $1")
            .bind(event_id)
            .execute(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "Event ({event_id}) was not found"
            )));
        }
        Ok(())
    }

    async fn grant_access(&self, event_id: EventId, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            r#"
                UPDATE events
                SET authorized_user_ids = array_append(authorized_user_ids, $2)
                WHERE event_id = $1 AND NOT ($2 = ANY(authorized_user_ids))
            "#,
        )
        .bind(event_id)
        .bind(user_id.raw())
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(())
    }
}

pub(crate) fn user_uuids(ids: &[UserId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.raw()).collect()
}
