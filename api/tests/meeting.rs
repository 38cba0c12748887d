mod common;

use axum::http::StatusCode;
use common::{id_of, Caller, TestApp};
use kernel::model::{calendar::CalendarMethod, role::Role};
use serde_json::json;

struct Venue {
    event: String,
    hall_a: String,
    hall_b: String,
    alice: String,
}

async fn venue(app: &TestApp) -> Venue {
    let event = app.create_event("Winter Summit").await;
    let hall_a = app.create_room(&event, "R").await;
    let hall_b = app.create_room(&event, "R2").await;
    let alice = app.create_attendee(&event, "A").await;
    Venue {
        event,
        hall_a,
        hall_b,
        alice,
    }
}

fn meeting(v: &Venue, title: &str, room: &str, start: &str, end: &str) -> serde_json::Value {
    json!({
        "eventId": v.event,
        "title": title,
        "date": "2025-12-25",
        "startTime": start,
        "endTime": end,
        "roomId": room,
        "attendeeIds": [v.alice],
    })
}

#[tokio::test]
async fn double_booking_is_rejected() {
    let app = TestApp::new();
    let v = venue(&app).await;

    let (status, m1) = app
        .post(app.root, "/meetings", meeting(&v, "M1", &v.hall_a, "10:00", "11:00"))
        .await;
    assert_eq!(status, StatusCode::OK, "{m1}");
    assert_eq!(m1["sequence"], 0);
    assert_eq!(m1["startTime"], "10:00");
    assert_eq!(m1["roomName"], "R");

    let (status, body) = app
        .post(app.root, "/meetings", meeting(&v, "M2", &v.hall_a, "10:30", "11:30"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("Room 'R'"), "{body}");

    let (status, body) = app
        .post(app.root, "/meetings", meeting(&v, "M3", &v.hall_b, "10:30", "11:30"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Attendees already booked at this time: A");

    // 終了時刻ちょうどに始まる会議は重ならない
    let (status, body) = app
        .post(app.root, "/meetings", meeting(&v, "M4", &v.hall_a, "11:00", "12:00"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn full_timestamps_are_accepted() {
    let app = TestApp::new();
    let v = venue(&app).await;

    let (status, body) = app
        .post(
            app.root,
            "/meetings",
            json!({
                "eventId": v.event,
                "title": "Instant",
                "startTime": "2025-12-25T10:00:00Z",
                "endTime": "2025-12-25T11:00:00Z",
                "roomId": v.hall_a,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["date"], "2025-12-25");

    let (status, _) = app
        .post(app.root, "/meetings", meeting(&v, "Clock", &v.hall_a, "10:30", "11:30"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn completed_meetings_need_a_room() {
    let app = TestApp::new();
    let v = venue(&app).await;

    let mut body = meeting(&v, "Wrap-up", &v.hall_a, "10:00", "11:00");
    body["roomId"] = json!(null);
    body["status"] = json!("COMPLETED");
    let (status, res) = app.post(app.root, "/meetings", body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["message"].as_str().unwrap().contains("Room"), "{res}");

    body["status"] = json!("STARTED");
    let (status, res) = app.post(app.root, "/meetings", body).await;
    assert_eq!(status, StatusCode::OK, "{res}");
    assert_eq!(res["roomId"], json!(null));
}

#[tokio::test]
async fn start_must_precede_end() {
    let app = TestApp::new();
    let v = venue(&app).await;

    let (status, _) = app
        .post(app.root, "/meetings", meeting(&v, "Backwards", &v.hall_a, "11:00", "10:00"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut untitled = meeting(&v, " ", &v.hall_a, "10:00", "11:00");
    untitled["title"] = json!("");
    let (status, body) = app.post(app.root, "/meetings", untitled).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Title is required");
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = TestApp::new();
    let v = venue(&app).await;

    let (status, body) = app
        .post(app.root, "/meetings", json!({ "eventId": v.event, "date": "2025-12-25" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Title is required");

    let mut bogus = meeting(&v, "Bogus", &v.hall_a, "10:00", "11:00");
    bogus["status"] = json!("BOGUS");
    let (status, body) = app.post(app.root, "/meetings", bogus).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "{body}");

    let (status, body) = app
        .post(app.root, &format!("/events/{}/rooms", v.event), json!({ "capacity": 3 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("name"), "{body}");
}

#[tokio::test]
async fn sequence_counts_successful_updates_only() {
    let app = TestApp::new();
    let v = venue(&app).await;

    let (_, m1) = app
        .post(app.root, "/meetings", meeting(&v, "M1", &v.hall_a, "10:00", "11:00"))
        .await;
    let (_, other) = app
        .post(app.root, "/meetings", meeting(&v, "Other", &v.hall_b, "14:00", "15:00"))
        .await;
    assert_eq!(other["sequence"], 0);
    let uri = format!("/meetings/{}", id_of(&m1));

    let (status, updated) = app.put(app.root, &uri, json!({ "title": "M1 renamed" })).await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["sequence"], 1);
    assert_eq!(updated["startTime"], "10:00");

    // Alice は 14:00 から別の会議に出席している
    let (status, _) = app
        .put(app.root, &uri, json!({ "startTime": "14:30", "endTime": "15:30" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.put(app.root, &uri, json!({ "title": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, current) = app.get(app.root, &uri).await;
    assert_eq!(current["sequence"], 1);
    assert_eq!(current["title"], "M1 renamed");

    let (status, updated) = app
        .put(app.root, &uri, json!({ "startTime": "12:00", "endTime": "13:00" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["sequence"], 2);
}

#[tokio::test]
async fn update_keeps_its_own_slot() {
    let app = TestApp::new();
    let v = venue(&app).await;

    let (_, m1) = app
        .post(app.root, "/meetings", meeting(&v, "M1", &v.hall_a, "10:00", "11:00"))
        .await;
    let uri = format!("/meetings/{}", id_of(&m1));

    let (status, body) = app
        .put(app.root, &uri, json!({ "endTime": "11:30", "purpose": "Planning" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["endTime"], "11:30");

    let (status, body) = app.put(app.root, &uri, json!({ "purpose": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purpose"], json!(null));
}

#[tokio::test]
async fn availability_check_suggests_free_alternatives() {
    let app = TestApp::new();
    let v = venue(&app).await;
    app.create_room(&v.event, "R3").await;
    app.post(app.root, "/meetings", meeting(&v, "M1", &v.hall_a, "10:00", "11:00"))
        .await;

    let (status, report) = app
        .post(
            app.root,
            "/meetings/check-availability",
            json!({
                "date": "2025-12-25",
                "startTime": "10:30",
                "endTime": "11:30",
                "roomId": v.hall_a,
                "attendeeIds": [],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{report}");
    assert_eq!(report["available"], false);
    assert_eq!(
        report["conflicts"],
        json!(["Room 'R' is already booked at this time"])
    );

    let suggestions = report["suggestions"].as_array().unwrap();
    let rooms: Vec<&str> = suggestions
        .iter()
        .filter(|s| s["type"] == "room")
        .map(|s| s["value"].as_str().unwrap())
        .collect();
    assert_eq!(rooms.len(), 2);
    assert!(!rooms.contains(&v.hall_a.as_str()));

    for room in rooms {
        let (_, recheck) = app
            .post(
                app.root,
                "/meetings/check-availability",
                json!({
                    "date": "2025-12-25",
                    "startTime": "10:30",
                    "endTime": "11:30",
                    "roomId": room,
                }),
            )
            .await;
        assert_eq!(recheck["available"], true, "{recheck}");
    }

    let time = suggestions.iter().find(|s| s["type"] == "time").unwrap();
    assert_eq!(time["value"]["start"], "2025-12-25T11:30:00Z");
    assert_eq!(time["value"]["end"], "2025-12-25T12:30:00Z");
}

#[tokio::test]
async fn availability_check_reports_busy_attendees_without_blocking() {
    let app = TestApp::new();
    let v = venue(&app).await;
    app.post(app.root, "/meetings", meeting(&v, "M1", &v.hall_a, "10:00", "11:00"))
        .await;

    let (status, report) = app
        .post(
            app.root,
            "/meetings/check-availability",
            json!({
                "eventId": v.event,
                "date": "2025-12-25",
                "startTime": "10:00",
                "endTime": "11:00",
                "roomId": v.hall_b,
                "attendeeIds": [v.alice],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        report["conflicts"],
        json!(["Attendees already booked at this time: A"])
    );
    assert!(report["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["type"] == "time"));
}

#[tokio::test]
async fn invites_follow_the_meeting_lifecycle() {
    let app = TestApp::new();
    let v = venue(&app).await;

    let (_, m1) = app
        .post(app.root, "/meetings", meeting(&v, "M1", &v.hall_a, "10:00", "11:00"))
        .await;
    let uri = format!("/meetings/{}", id_of(&m1));
    app.put(app.root, &uri, json!({ "title": "M1 moved" })).await;
    let (status, body) = app.delete(app.root, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let invites = app.outbox.invites();
    let sent: Vec<(CalendarMethod, i32)> =
        invites.iter().map(|i| (i.method, i.sequence)).collect();
    assert_eq!(
        sent,
        vec![
            (CalendarMethod::Request, 0),
            (CalendarMethod::Request, 1),
            (CalendarMethod::Cancel, 1),
        ]
    );
    assert_eq!(invites[0].recipients[0].email, "a@example.com");
    assert_eq!(invites[0].location.as_deref(), Some("R"));

    let (status, _) = app.get(app.root, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn meetings_without_a_slot_send_no_invite() {
    let app = TestApp::new();
    let v = venue(&app).await;

    let (status, _) = app
        .post(
            app.root,
            "/meetings",
            json!({ "eventId": v.event, "title": "Someday" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.outbox.invites().is_empty());
}

#[tokio::test]
async fn attendees_must_belong_to_the_event() {
    let app = TestApp::new();
    let v = venue(&app).await;
    let other = app.create_event("Elsewhere").await;
    let stranger = app.create_attendee(&other, "Stranger").await;

    let mut body = meeting(&v, "M1", &v.hall_a, "10:00", "11:00");
    body["attendeeIds"] = json!([stranger]);
    let (status, _) = app.post(app.root, "/meetings", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn roles_gate_meeting_writes() {
    let app = TestApp::new();
    let v = venue(&app).await;
    let marketing = Caller::new(Role::Marketing);
    let user = Caller::new(Role::User);

    let (status, _) = app
        .post(marketing, "/meetings", meeting(&v, "M1", &v.hall_a, "10:00", "11:00"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, m1) = app
        .post(app.root, "/meetings", meeting(&v, "M1", &v.hall_a, "10:00", "11:00"))
        .await;
    let uri = format!("/meetings/{}", id_of(&m1));
    let (status, _) = app.put(user, &uri, json!({ "title": "Nope" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.put(marketing, &uri, json!({ "title": "Yes" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = app.send(None, axum::http::Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn availability_check_is_scoped_to_an_accessible_event() {
    let app = TestApp::new();
    let v = venue(&app).await;
    app.post(app.root, "/meetings", meeting(&v, "M1", &v.hall_a, "10:00", "11:00"))
        .await;
    let slot = json!({
        "date": "2025-12-25",
        "startTime": "10:00",
        "endTime": "11:00",
        "attendeeIds": [v.alice],
    });

    let outsider = Caller::new(Role::User);
    let (status, body) = app
        .post(outsider, "/meetings/check-availability", slot.clone())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("conflicts").is_none());

    let mut scoped = slot.clone();
    scoped["eventId"] = json!(v.event);
    let (status, body) = app
        .post(outsider, "/meetings/check-availability", scoped)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.get("conflicts").is_none());

    // 別イベントの参加者の予定は問い合わせられない
    let other = app.create_event("Autumn Fair").await;
    let mut foreign = slot;
    foreign["eventId"] = json!(other);
    let (status, body) = app
        .post(app.root, "/meetings/check-availability", foreign)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("conflicts").is_none());
}
