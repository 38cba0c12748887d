use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::meeting::{
    check_meeting_availability, delete_meeting, register_meeting, show_meeting,
    show_meeting_list, update_meeting,
};

pub fn build_meeting_routers() -> Router<AppRegistry> {
    let meetings_routers = Router::new()
        .route("/", post(register_meeting))
        .route("/check-availability", post(check_meeting_availability))
        .route(
            "/:meeting_id",
            get(show_meeting).put(update_meeting).delete(delete_meeting),
        );

    Router::new()
        .nest("/meetings", meetings_routers)
        .route("/events/:event_id/meetings", get(show_meeting_list))
}
