mod common;

use axum::http::StatusCode;
use common::{id_of, Caller, TestApp};
use kernel::model::role::Role;
use serde_json::json;

#[tokio::test]
async fn occurred_events_lock_their_children() {
    let app = TestApp::new();
    let event = app.create_event("Expo").await;
    let room = app.create_room(&event, "Hall A").await;
    let (_, meeting) = app
        .post(
            app.root,
            "/meetings",
            json!({ "eventId": event, "title": "Sync", "roomId": room }),
        )
        .await;
    let meeting_uri = format!("/meetings/{}", id_of(&meeting));
    let event_uri = format!("/events/{event}");

    let (status, body) = app.patch(app.root, &event_uri, json!({ "status": "OCCURRED" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["isEditable"], false);

    let (status, body) = app
        .post(
            app.root,
            &format!("/events/{event}/rooms"),
            json!({ "name": "Hall B", "capacity": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("locked"), "{body}");
    let (status, _) = app
        .put(app.root, &format!("/rooms/{room}"), json!({ "capacity": 20 }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.put(app.root, &meeting_uri, json!({ "title": "Late" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(app.root, &meeting_uri).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .post(
            app.root,
            "/meetings",
            json!({ "eventId": event, "title": "New" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.patch(app.root, &event_uri, json!({ "name": "Renamed" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(app.root, &event_uri).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // ロック解除でも COMMITTED の必須項目は検証される
    let (status, _) = app.patch(app.root, &event_uri, json!({ "status": "COMMITTED" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .patch(
            app.root,
            &event_uri,
            json!({
                "status": "COMMITTED",
                "startDate": "2025-12-24",
                "endDate": "2025-12-26",
                "address": "1 Harbour Road",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["isEditable"], true);

    let (status, _) = app.put(app.root, &meeting_uri, json!({ "title": "Back on" })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn event_names_and_slugs_are_unique() {
    let app = TestApp::new();
    let (status, body) = app.post(app.root, "/events", json!({ "name": "Spring Expo" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "spring-expo");
    assert_eq!(body["meetingTypes"], json!(["Meeting"]));

    let (status, _) = app.post(app.root, "/events", json!({ "name": "Spring Expo" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app
        .post(
            app.root,
            "/events",
            json!({ "name": "Another", "slug": "spring-expo" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app
        .post(
            app.root,
            "/events",
            json!({ "name": "Bad slug", "slug": "Not A Slug" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn committed_events_need_dates_and_venue() {
    let app = TestApp::new();
    let (status, body) = app
        .post(app.root, "/events", json!({ "name": "Gala", "status": "COMMITTED" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("address"));

    let event = app.create_event("Gala").await;
    let (status, body) = app
        .patch(
            app.root,
            &format!("/events/{event}"),
            json!({ "region": "EMEA", "budget": 1200.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["region"], "EMEA");

    let (status, body) = app
        .patch(app.root, &format!("/events/{event}"), json!({ "region": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["region"], json!(null));
    assert_eq!(body["budget"], 1200.5);
}

#[tokio::test]
async fn password_grants_permanent_access() {
    let app = TestApp::new();
    let marketing = Caller::new(Role::Marketing);
    let user = Caller::new(Role::User);

    let (status, event) = app
        .post(
            marketing,
            "/events",
            json!({ "name": "Private Dinner", "password": "secret" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{event}");
    assert_eq!(event["hasPassword"], true);
    let uri = format!("/events/{}", id_of(&event));

    let (status, _) = app.get(user, &uri).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, list) = app.get(user, "/events").await;
    assert_eq!(list["items"][0]["access"], "passwordRequired");

    let (status, body) = app
        .post(user, &format!("{uri}/access"), json!({ "password": "guess" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Incorrect event password");

    let (status, _) = app
        .post(user, &format!("{uri}/access"), json!({ "password": "secret" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(user, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = app.get(user, "/events").await;
    assert_eq!(list["items"][0]["access"], "granted");
}

#[tokio::test]
async fn events_without_password_stay_closed() {
    let app = TestApp::new();
    let admin = Caller::new(Role::Admin);
    let event = app.create_event("Board Meeting").await;
    let uri = format!("/events/{event}");

    let (status, _) = app.get(admin, &uri).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .post(admin, &format!("{uri}/access"), json!({ "password": "anything" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, list) = app.get(admin, "/events").await;
    assert_eq!(list["items"][0]["access"], "denied");

    // marketing は許可リストに関係なく参照できる
    let (status, _) = app.get(Caller::new(Role::Marketing), &uri).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn only_event_managers_create_events() {
    let app = TestApp::new();
    for role in [Role::Admin, Role::User] {
        let (status, _) = app
            .post(Caller::new(role), "/events", json!({ "name": "Nope" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
    }
}

#[tokio::test]
async fn deleting_an_event_removes_its_children() {
    let app = TestApp::new();
    let event = app.create_event("Short Lived").await;
    let room = app.create_room(&event, "Hall A").await;

    let (status, _) = app.delete(app.root, &format!("/events/{event}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(app.root, &format!("/events/{event}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .put(app.root, &format!("/rooms/{room}"), json!({ "capacity": 3 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rooms_in_use_cannot_be_deleted() {
    let app = TestApp::new();
    let event = app.create_event("Expo").await;
    let room = app.create_room(&event, "Hall A").await;
    let (status, _) = app
        .post(
            app.root,
            &format!("/events/{event}/rooms"),
            json!({ "name": "Hall A", "capacity": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app
        .post(
            app.root,
            &format!("/events/{event}/rooms"),
            json!({ "name": "Closet", "capacity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.post(
        app.root,
        "/meetings",
        json!({ "eventId": event, "title": "Sync", "roomId": room }),
    )
    .await;
    let (status, _) = app.delete(app.root, &format!("/rooms/{room}")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, rooms) = app.get(app.root, &format!("/events/{event}/rooms")).await;
    assert_eq!(rooms["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_endpoints_need_no_identity() {
    let app = TestApp::new();
    let (status, _) = app
        .send(None, axum::http::Method::GET, "/health", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(None, axum::http::Method::GET, "/health/db", None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
