use super::{accessible_event, editable_event};
use crate::{
    extractor::{AuthorizedUser, JsonBody},
    model::{
        room::{CreateRoomRequest, RoomResponse, RoomsResponse, UpdateRoomRequest},
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
    id::{EventId, RoomId},
    room::{event::UpdateRoom, Room},
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

async fn find_room(registry: &AppRegistry, room_id: RoomId) -> AppResult<Room> {
    registry
        .room_repository()
        .find_by_id(room_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound(format!("Room ({room_id}) was not found")))
}

pub async fn show_room_list(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<RoomsResponse>> {
    accessible_event(&registry, &user, event_id).await?;
    registry
        .room_repository()
        .find_by_event(event_id)
        .await
        .map(RoomsResponse::from)
        .map(Json)
}

pub async fn register_room(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<CreateRoomRequest>,
) -> AppResult<(StatusCode, Json<RoomResponse>)> {
    user.identity.ensure_can_create()?;
    editable_event(&registry, &user, event_id).await?;
    req.validate(&())?;

    let room = req.into_create(event_id).into_room()?;
    registry.room_repository().create(room.clone()).await?;
    Ok((StatusCode::CREATED, Json(room.into())))
}

pub async fn update_room(
    user: AuthorizedUser,
    Path(room_id): Path<RoomId>,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<UpdateRoomRequest>,
) -> AppResult<Json<RoomResponse>> {
    user.identity.ensure_can_write()?;
    let current = find_room(&registry, room_id).await?;
    editable_event(&registry, &user, current.event_id).await?;
    req.validate(&())?;

    let next = UpdateRoom::from(req).apply_to(&current)?;
    registry.room_repository().update(next.clone()).await?;
    Ok(Json(next.into()))
}

pub async fn delete_room(
    user: AuthorizedUser,
    Path(room_id): Path<RoomId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SuccessResponse>> {
    user.identity.ensure_can_write()?;
    let room = find_room(&registry, room_id).await?;
    editable_event(&registry, &user, room.event_id).await?;

    registry.room_repository().delete(room_id).await?;
    Ok(Json(SuccessResponse::ok()))
}
