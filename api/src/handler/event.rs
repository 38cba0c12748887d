use super::{accessible_event, find_event};
use crate::{
    extractor::{AuthorizedUser, JsonBody},
    model::{
        event::{
            CreateEventRequest, EventListItem, EventResponse, EventsResponse, GrantAccessRequest,
            UpdateEventRequest,
        },
        SuccessResponse,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::{
    event::{
        event::{CreateEvent, UpdateEvent},
        EventAccess,
    },
    id::EventId,
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn show_event_list(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<EventsResponse>> {
    let items = registry
        .event_repository()
        .find_all()
        .await?
        .into_iter()
        .map(|event| {
            let access = event.access_for(&user.identity);
            EventListItem::new(event, access)
        })
        .collect();
    Ok(Json(EventsResponse { items }))
}

pub async fn register_event(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<EventResponse>)> {
    user.identity.ensure_can_manage_events()?;
    req.validate(&())?;

    let settings = registry.settings_repository().get_or_create_default().await?;
    let event = CreateEvent::from(req).into_event(&settings, user.id())?;
    registry.event_repository().create(event.clone()).await?;

    tracing::info!(event_id = %event.id, name = %event.name, "event created");
    Ok((StatusCode::CREATED, Json(event.into())))
}

pub async fn show_event(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<EventResponse>> {
    accessible_event(&registry, &user, event_id)
        .await
        .map(EventResponse::from)
        .map(Json)
}

pub async fn update_event(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<UpdateEventRequest>,
) -> AppResult<Json<EventResponse>> {
    user.identity.ensure_can_manage_events()?;
    let current = accessible_event(&registry, &user, event_id).await?;
    // ロック判定はバリデーションより先
    current.ensure_update_allowed(req.status)?;
    req.validate(&())?;

    let next = UpdateEvent::from(req).apply_to(&current)?;
    registry.event_repository().update(next.clone()).await?;

    if current.status != next.status {
        tracing::info!(
            event_id = %event_id,
            from = %current.status,
            to = %next.status,
            "event status changed"
        );
    }
    Ok(Json(next.into()))
}

pub async fn delete_event(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SuccessResponse>> {
    user.identity.ensure_can_manage_events()?;
    let event = accessible_event(&registry, &user, event_id).await?;
    event.ensure_editable()?;

    registry.event_repository().delete(event_id).await?;
    tracing::info!(event_id = %event_id, "event deleted");
    Ok(Json(SuccessResponse::ok()))
}

/// Exchanges the event password for a permanent place on the allow list.
pub async fn grant_event_access(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<GrantAccessRequest>,
) -> AppResult<Json<EventResponse>> {
    req.validate(&())?;
    let mut event = find_event(&registry, event_id).await?;

    match event.access_for(&user.identity) {
        EventAccess::Granted => {}
        EventAccess::PasswordRequired if event.password_matches(&req.password) => {
            registry
                .event_repository()
                .grant_access(event_id, user.id())
                .await?;
            event.authorized_user_ids.push(user.id());
            tracing::info!(event_id = %event_id, user_id = %user.id(), "event access granted");
        }
        EventAccess::PasswordRequired => {
            return Err(AppError::Forbidden("Incorrect event password".into()))
        }
        EventAccess::Denied => {
            return Err(AppError::Forbidden(format!(
                "You do not have access to event '{}'",
                event.name
            )))
        }
    }
    Ok(Json(event.into()))
}
