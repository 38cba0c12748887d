use axum::{
    routing::{get, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::room::{delete_room, register_room, show_room_list, update_room};

pub fn build_room_routers() -> Router<AppRegistry> {
    Router::new()
        .route("/events/:event_id/rooms", get(show_room_list).post(register_room))
        .route("/rooms/:room_id", put(update_room).delete(delete_room))
}
