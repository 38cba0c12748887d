use kernel::model::{
    id::{EventId, RoomId},
    room::Room,
};

#[derive(sqlx::FromRow)]
pub struct RoomRow {
    pub room_id: RoomId,
    pub event_id: EventId,
    pub name: String,
    pub capacity: i32,
}

impl From<RoomRow> for Room {
    fn from(value: RoomRow) -> Self {
        let RoomRow {
            room_id,
            event_id,
            name,
            capacity,
        } = value;
        Room {
            id: room_id,
            event_id,
            name,
            capacity,
        }
    }
}
