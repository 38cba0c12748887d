use super::Room;
use crate::model::id::{EventId, RoomId};
use derive_new::new;
use shared::error::AppResult;

#[derive(Debug, new)]
pub struct CreateRoom {
    pub event_id: EventId,
    pub name: String,
    pub capacity: i32,
}

impl CreateRoom {
    pub fn into_room(self) -> AppResult<Room> {
        let room = Room {
            id: RoomId::new(),
            event_id: self.event_id,
            name: self.name.trim().to_string(),
            capacity: self.capacity,
        };
        room.validate()?;
        Ok(room)
    }
}

#[derive(Debug, new)]
pub struct UpdateRoom {
    pub name: Option<String>,
    pub capacity: Option<i32>,
}

impl UpdateRoom {
    pub fn apply_to(self, current: &Room) -> AppResult<Room> {
        let mut next = current.clone();
        if let Some(name) = self.name {
            next.name = name.trim().to_string();
        }
        if let Some(capacity) = self.capacity {
            next.capacity = capacity;
        }
        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_must_be_positive() {
        assert!(CreateRoom::new(EventId::new(), "Hall A".into(), 0)
            .into_room()
            .is_err());
        let room = CreateRoom::new(EventId::new(), " Hall A ".into(), 10)
            .into_room()
            .unwrap();
        assert_eq!(room.name, "Hall A");
        assert!(UpdateRoom::new(None, Some(-3)).apply_to(&room).is_err());
        let renamed = UpdateRoom::new(Some("Hall B".into()), None)
            .apply_to(&room)
            .unwrap();
        assert_eq!((renamed.name.as_str(), renamed.capacity), ("Hall B", 10));
    }
}
