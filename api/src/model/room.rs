use garde::Validate;
use kernel::model::{
    id::{EventId, RoomId},
    room::{
        event::{CreateRoom, UpdateRoom},
        Room,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(range(min = 1))]
    pub capacity: i32,
}

impl CreateRoomRequest {
    pub fn into_create(self, event_id: EventId) -> CreateRoom {
        CreateRoom::new(event_id, self.name, self.capacity)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomRequest {
    #[garde(length(min = 1))]
    pub name: Option<String>,
    #[garde(range(min = 1))]
    pub capacity: Option<i32>,
}

impl From<UpdateRoomRequest> for UpdateRoom {
    fn from(value: UpdateRoomRequest) -> Self {
        UpdateRoom::new(value.name, value.capacity)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub id: RoomId,
    pub event_id: EventId,
    pub name: String,
    pub capacity: i32,
}

impl From<Room> for RoomResponse {
    fn from(value: Room) -> Self {
        let Room {
            id,
            event_id,
            name,
            capacity,
        } = value;
        Self {
            id,
            event_id,
            name,
            capacity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomsResponse {
    pub items: Vec<RoomResponse>,
}

impl From<Vec<Room>> for RoomsResponse {
    fn from(value: Vec<Room>) -> Self {
        Self {
            items: value.into_iter().map(RoomResponse::from).collect(),
        }
    }
}
