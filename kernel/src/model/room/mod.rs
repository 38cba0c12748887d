use crate::model::id::{EventId, RoomId};
use shared::error::{AppError, AppResult};

pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub event_id: EventId,
    pub name: String,
    pub capacity: i32,
}

impl Room {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("Room name is required".into()));
        }
        if self.capacity <= 0 {
            return Err(AppError::ValidationError(
                "Room capacity must be a positive integer".into(),
            ));
        }
        Ok(())
    }
}
