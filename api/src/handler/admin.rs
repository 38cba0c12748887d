use super::{accessible_event, editable_event};
use crate::{
    extractor::{AuthorizedUser, JsonBody},
    model::{
        admin::{ImportSummaryResponse, SettingsResponse, UpdateSettingsRequest},
        transfer::{EventDocument, SystemDocument},
        SuccessResponse,
    },
};
use axum::{
    extract::{Path, State},
    Json,
};
use garde::Validate;
use kernel::model::{
    event::Event,
    id::EventId,
    settings::UpdateSettings,
    transfer::{reconcile, EventSnapshot, ImportSummary, ImportTarget, SystemSnapshot},
};
use registry::AppRegistry;
use shared::error::AppResult;

pub async fn show_system_settings(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SettingsResponse>> {
    user.identity.ensure_root()?;
    registry
        .settings_repository()
        .get_or_create_default()
        .await
        .map(SettingsResponse::from)
        .map(Json)
}

pub async fn update_system_settings(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<UpdateSettingsRequest>,
) -> AppResult<Json<SettingsResponse>> {
    user.identity.ensure_root()?;
    req.validate(&())?;

    let repository = registry.settings_repository();
    let current = repository.get_or_create_default().await?;
    let next = UpdateSettings::from(req).apply_to(&current);
    repository.update(next.clone()).await?;
    Ok(Json(next.into()))
}

/// Deletes every event, attendee and the settings row.
pub async fn reset_system(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SuccessResponse>> {
    user.identity.ensure_root()?;
    registry.transfer_repository().reset_all().await?;
    tracing::warn!(user_id = %user.id(), "system reset");
    Ok(Json(SuccessResponse::ok()))
}

pub async fn export_event(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<EventDocument>> {
    let event = accessible_event(&registry, &user, event_id).await?;
    let snapshot = snapshot_of(&registry, event).await?;
    Ok(Json(snapshot.into()))
}

/// Merges the document into the event in the path. The target keeps its own
/// identity and fields and only gains vocabulary entries.
pub async fn import_event(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
    JsonBody(doc): JsonBody<EventDocument>,
) -> AppResult<Json<ImportSummaryResponse>> {
    user.identity.ensure_can_write()?;
    let event = editable_event(&registry, &user, event_id).await?;

    let incoming = doc.into_snapshot()?;
    let target = import_target(&registry, Some(event), &incoming).await?;
    let summary = registry
        .transfer_repository()
        .apply_import(reconcile(incoming, target, true))
        .await?;
    Ok(Json(summary.into()))
}

pub async fn export_system(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SystemDocument>> {
    user.identity.ensure_root()?;

    let settings = registry.settings_repository().get_or_create_default().await?;
    let mut events = Vec::new();
    for event in registry.event_repository().find_all().await? {
        events.push(snapshot_of(&registry, event).await?);
    }
    Ok(Json(SystemSnapshot { settings, events }.into()))
}

/// Restores settings and upserts every event matched by name.
pub async fn import_system(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    JsonBody(doc): JsonBody<SystemDocument>,
) -> AppResult<Json<ImportSummaryResponse>> {
    user.identity.ensure_root()?;

    // 先に全件検証してから書き込む
    let snapshots = doc
        .events
        .into_iter()
        .map(EventDocument::into_snapshot)
        .collect::<AppResult<Vec<_>>>()?;

    registry
        .settings_repository()
        .update(doc.system_settings.into())
        .await?;

    let mut summary = ImportSummary::default();
    for incoming in snapshots {
        let existing = registry
            .event_repository()
            .find_by_name(&incoming.event.name)
            .await?;
        let target = import_target(&registry, existing, &incoming).await?;
        let applied = registry
            .transfer_repository()
            .apply_import(reconcile(incoming, target, false))
            .await?;
        summary.add(applied);
    }

    tracing::info!(
        events = summary.events,
        meetings = summary.meetings,
        "system import finished"
    );
    Ok(Json(summary.into()))
}

async fn snapshot_of(registry: &AppRegistry, event: Event) -> AppResult<EventSnapshot> {
    let attendees = registry.attendee_repository().find_by_event(event.id).await?;
    let rooms = registry.room_repository().find_by_event(event.id).await?;
    let meetings = registry.meeting_repository().find_by_event(event.id).await?;
    Ok(EventSnapshot {
        event,
        attendees,
        rooms,
        meetings,
    })
}

async fn import_target(
    registry: &AppRegistry,
    event: Option<Event>,
    incoming: &EventSnapshot,
) -> AppResult<ImportTarget> {
    let (rooms, meetings) = match &event {
        Some(event) => (
            registry.room_repository().find_by_event(event.id).await?,
            registry.meeting_repository().find_by_event(event.id).await?,
        ),
        None => (Vec::new(), Vec::new()),
    };
    let emails: Vec<String> = incoming.attendees.iter().map(|a| a.email.clone()).collect();
    let known_attendees = registry.attendee_repository().find_by_emails(&emails).await?;
    Ok(ImportTarget {
        event,
        rooms,
        meetings,
        known_attendees,
    })
}
