use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::admin::{
    export_event, export_system, import_event, import_system, reset_system,
    show_system_settings, update_system_settings,
};

pub fn build_admin_routers() -> Router<AppRegistry> {
    let admin_routers = Router::new()
        .route(
            "/system",
            get(show_system_settings).post(update_system_settings),
        )
        .route("/reset", post(reset_system))
        .route("/export", get(export_system))
        .route("/import", post(import_system));

    Router::new()
        .nest("/admin", admin_routers)
        .route("/events/:event_id/export", get(export_event))
        .route("/events/:event_id/import", post(import_event))
}
