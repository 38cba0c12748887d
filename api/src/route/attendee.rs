use axum::{
    routing::{get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::attendee::{
    autocomplete_profile, delete_attendee, register_attendee, show_attendee_list,
    update_attendee, upload_attendee_image,
};

pub fn build_attendee_routers() -> Router<AppRegistry> {
    Router::new()
        .route(
            "/events/:event_id/attendees",
            get(show_attendee_list).post(register_attendee),
        )
        .route(
            "/events/:event_id/attendees/:attendee_id",
            put(update_attendee).delete(delete_attendee),
        )
        .route("/attendees/autocomplete", post(autocomplete_profile))
        .route(
            "/events/:event_id/attendees/:attendee_id/image",
            post(upload_attendee_image),
        )
}
