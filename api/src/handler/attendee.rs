use super::editable_event;
use crate::{
    extractor::{AuthorizedUser, JsonBody},
    model::{
        attendee::{
            AttendeeResponse, AttendeesResponse, AutocompleteRequest, CreateAttendeeRequest,
            ProfileSuggestionResponse, UpdateAttendeeRequest,
        },
        SuccessResponse,
    },
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Json,
};
use garde::Validate;
use kernel::{
    gateway::image::ImageStorage,
    model::{
        attendee::{
            event::{CreateAttendee, UpdateAttendee},
            Attendee,
        },
        id::{AttendeeId, EventId},
    },
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn show_attendee_list(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AttendeesResponse>> {
    super::accessible_event(&registry, &user, event_id).await?;
    registry
        .attendee_repository()
        .find_by_event(event_id)
        .await
        .map(AttendeesResponse::from)
        .map(Json)
}

/// Registers the attendee for the event. An attendee that already exists
/// with the same email is reused and linked instead.
pub async fn register_attendee(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<CreateAttendeeRequest>,
) -> AppResult<(StatusCode, Json<AttendeeResponse>)> {
    user.identity.ensure_can_create()?;
    let event = editable_event(&registry, &user, event_id).await?;
    req.validate(&())?;

    let enrich = req.enrich;
    let mut attendee = CreateAttendee::from(req).into_attendee();
    attendee.validate(&event.attendee_types)?;

    let storage = registry.image_storage();
    if let Some(url) = attendee.image_url.clone().filter(|u| !storage.owns(u)) {
        attendee.image_url = Some(storage.fetch_and_upload(&url).await?);
    }
    if enrich && attendee.needs_enrichment() {
        enrich_profile(&registry, &mut attendee).await;
    }

    let stored = registry
        .attendee_repository()
        .upsert_into_event(event_id, attendee)
        .await?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

pub async fn update_attendee(
    user: AuthorizedUser,
    Path((event_id, attendee_id)): Path<(EventId, AttendeeId)>,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<UpdateAttendeeRequest>,
) -> AppResult<Json<AttendeeResponse>> {
    user.identity.ensure_can_write()?;
    let event = editable_event(&registry, &user, event_id).await?;
    req.validate(&())?;

    let repository = registry.attendee_repository();
    if !repository.is_member(event_id, attendee_id).await? {
        return Err(attendee_not_found(attendee_id));
    }
    let current = repository
        .find_by_id(attendee_id)
        .await?
        .ok_or_else(|| attendee_not_found(attendee_id))?;

    let mut update = UpdateAttendee::from(req);
    let storage = registry.image_storage();
    let external = update
        .external_image()
        .filter(|u| !storage.owns(u))
        .map(str::to_string);
    if let Some(url) = external {
        update.image_url = Some(Some(storage.fetch_and_upload(&url).await?));
    }

    let next = update.apply_to(&current);
    next.validate(&event.attendee_types)?;
    repository.update(next.clone()).await?;
    release_replaced_image(storage.as_ref(), current.image_url, next.image_url.as_deref()).await;

    Ok(Json(next.into()))
}

/// Removes the attendee from the event only; the record itself stays for
/// other events.
pub async fn delete_attendee(
    user: AuthorizedUser,
    Path((event_id, attendee_id)): Path<(EventId, AttendeeId)>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SuccessResponse>> {
    user.identity.ensure_can_write()?;
    editable_event(&registry, &user, event_id).await?;

    registry
        .attendee_repository()
        .detach(event_id, attendee_id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Profile suggestions are best effort: failures yield an empty suggestion.
pub async fn autocomplete_profile(
    _user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<AutocompleteRequest>,
) -> AppResult<Json<ProfileSuggestionResponse>> {
    req.validate(&())?;

    let settings = registry.settings_repository().get_or_create_default().await?;
    let suggestion = registry
        .profile_enricher()
        .suggest_profile(&settings, &req.name, req.company.as_deref())
        .await;
    match suggestion {
        Ok(s) => Ok(Json(s.into())),
        Err(e) => {
            tracing::warn!(error = %e, "profile suggestion failed");
            Ok(Json(ProfileSuggestionResponse::default()))
        }
    }
}

pub async fn upload_attendee_image(
    user: AuthorizedUser,
    Path((event_id, attendee_id)): Path<(EventId, AttendeeId)>,
    State(registry): State<AppRegistry>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<AttendeeResponse>> {
    user.identity.ensure_can_write()?;
    editable_event(&registry, &user, event_id).await?;

    let repository = registry.attendee_repository();
    if !repository.is_member(event_id, attendee_id).await? {
        return Err(attendee_not_found(attendee_id));
    }
    let current = repository
        .find_by_id(attendee_id)
        .await?
        .ok_or_else(|| attendee_not_found(attendee_id))?;
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::ValidationError("Content-Type header is required".into()))?;

    let storage = registry.image_storage();
    let url = storage.upload(body.to_vec(), content_type).await?;
    let next = Attendee {
        image_url: Some(url),
        ..current.clone()
    };
    repository.update(next.clone()).await?;
    release_replaced_image(storage.as_ref(), current.image_url, next.image_url.as_deref()).await;

    Ok(Json(next.into()))
}

fn attendee_not_found(attendee_id: AttendeeId) -> AppError {
    AppError::EntityNotFound(format!("Attendee ({attendee_id}) was not found"))
}

async fn enrich_profile(registry: &AppRegistry, attendee: &mut Attendee) {
    let settings = match registry.settings_repository().get_or_create_default().await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, "could not load settings for enrichment");
            return;
        }
    };
    if settings.llm_api_key.is_none() {
        return;
    }
    match registry
        .profile_enricher()
        .suggest_profile(&settings, &attendee.name, attendee.company.as_deref())
        .await
    {
        Ok(suggestion) => suggestion.fill_missing(attendee),
        Err(e) => tracing::warn!(email = %attendee.email, error = %e, "profile enrichment failed"),
    }
}

// 保存済みの旧画像は書き込み成功後に消す
async fn release_replaced_image(storage: &dyn ImageStorage, old: Option<String>, new: Option<&str>) {
    let Some(old) = old else {
        return;
    };
    if Some(old.as_str()) == new || !storage.owns(&old) {
        return;
    }
    if let Err(e) = storage.delete(&old).await {
        tracing::warn!(url = %old, error = %e, "could not delete replaced image");
    }
}
