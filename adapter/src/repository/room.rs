use crate::database::{map_write_error, model::room::RoomRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{EventId, RoomId},
    room::Room,
};
use kernel::repository::room::RoomRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct RoomRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl RoomRepository for RoomRepositoryImpl {
    async fn create(&self, room: Room) -> AppResult<()> {
        sqlx::query(
            r#"
                INSERT INTO rooms (room_id, event_id, name, capacity)
                VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(room.id)
        .bind(room.event_id)
        .bind(&room.name)
        .bind(room.capacity)
        .execute(self.db.inner_ref())
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn find_by_event(&self, event_id: EventId) -> AppResult<Vec<Room>> {
        let rows: Vec<RoomRow> = sqlx::query_as(
            r#"
                SELECT room_id, event_id, name, capacity
                FROM rooms
                WHERE event_id = $1
                ORDER BY name
            "#,
        )
        .bind(event_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(Room::from).collect())
    }

    async fn find_by_id(&self, room_id: RoomId) -> AppResult<Option<Room>> {
        let row: Option<RoomRow> = sqlx::query_as(
            r#"
                SELECT room_id, event_id, name, capacity
                FROM rooms
                WHERE room_id = $1
            "#,
        )
        .bind(room_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.map(Room::from))
    }

    async fn update(&self, room: Room) -> AppResult<()> {
        let res = sqlx::query("UPDATE rooms SET name = $2, capacity = $3 WHERE room_id = $1")
            .bind(room.id)
            .bind(&room.name)
            .bind(room.capacity)
            .execute(self.db.inner_ref())
            .await
            .map_err(map_write_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "Room ({}) was not found",
                room.id
            )));
        }
        Ok(())
    }

    async fn delete(&self, room_id: RoomId) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meetings WHERE room_id = $1")
            .bind(room_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Room is still assigned to {in_use} meeting(s)"
            )));
        }

        let res = sqlx::query("DELETE FROM rooms WHERE room_id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;
        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "Room ({room_id}) was not found"
            )));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;
        Ok(())
    }
}
