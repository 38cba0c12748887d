use crate::model::{
    id::{EventId, RoomId},
    room::Room,
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create(&self, room: Room) -> AppResult<()>;
    async fn find_by_event(&self, event_id: EventId) -> AppResult<Vec<Room>>;
    async fn find_by_id(&self, room_id: RoomId) -> AppResult<Option<Room>>;
    async fn update(&self, room: Room) -> AppResult<()>;
    async fn delete(&self, room_id: RoomId) -> AppResult<()>;
}
