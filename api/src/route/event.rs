use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::event::{
    delete_event, grant_event_access, register_event, show_event, show_event_list, update_event,
};

pub fn build_event_routers() -> Router<AppRegistry> {
    Router::new()
        .route("/events", get(show_event_list).post(register_event))
        .route(
            "/events/:event_id",
            get(show_event).patch(update_event).delete(delete_event),
        )
        .route("/events/:event_id/access", post(grant_event_access))
}
