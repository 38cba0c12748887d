#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use kernel::{
    gateway::calendar::CalendarOutbox,
    model::{calendar::CalendarInvite, id::UserId, role::Role},
};
use registry::AppRegistry;
use serde_json::{json, Value};
use shared::config::AppConfig;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Default)]
pub struct RecordingOutbox {
    invites: Mutex<Vec<CalendarInvite>>,
}

impl RecordingOutbox {
    pub fn invites(&self) -> Vec<CalendarInvite> {
        self.invites.lock().unwrap().clone()
    }
}

impl CalendarOutbox for RecordingOutbox {
    fn enqueue(&self, invite: CalendarInvite) {
        self.invites.lock().unwrap().push(invite);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(role: Role) -> Self {
        Self {
            id: UserId::new(),
            role,
        }
    }
}

pub struct TestApp {
    router: Router,
    pub outbox: Arc<RecordingOutbox>,
    pub root: Caller,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(|registry| registry)
    }

    /// Lets a test swap gateways before the router is built.
    pub fn with(customize: impl FnOnce(AppRegistry) -> AppRegistry) -> Self {
        let outbox = Arc::new(RecordingOutbox::default());
        let registry = customize(
            AppRegistry::in_memory(AppConfig::for_memory()).with_calendar_outbox(outbox.clone()),
        );
        Self {
            router: api::route::v1::routes().with_state(registry),
            outbox,
            root: Caller::new(Role::Root),
        }
    }

    pub async fn send(
        &self,
        caller: Option<Caller>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("/api/v1{uri}"));
        if let Some(caller) = caller {
            builder = builder
                .header("x-user-id", caller.id.to_string())
                .header("x-user-role", caller.role.to_string());
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn send_bytes(
        &self,
        caller: Caller,
        uri: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1{uri}"))
            .header("x-user-id", caller.id.to_string())
            .header("x-user-role", caller.role.to_string())
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(bytes))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, caller: Caller, uri: &str) -> (StatusCode, Value) {
        self.send(Some(caller), Method::GET, uri, None).await
    }

    pub async fn post(&self, caller: Caller, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Some(caller), Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, caller: Caller, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Some(caller), Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, caller: Caller, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Some(caller), Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, caller: Caller, uri: &str) -> (StatusCode, Value) {
        self.send(Some(caller), Method::DELETE, uri, None).await
    }

    pub async fn create_event(&self, name: &str) -> String {
        let (status, body) = self.post(self.root, "/events", json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }

    pub async fn create_room(&self, event_id: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                self.root,
                &format!("/events/{event_id}/rooms"),
                json!({ "name": name, "capacity": 10 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }

    pub async fn create_attendee(&self, event_id: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                self.root,
                &format!("/events/{event_id}/attendees"),
                json!({
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase()),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }
}

pub fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}
