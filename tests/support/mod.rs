#![allow(dead_code)]

use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use rooming_engine::booking_client::BookingClient;
use rooming_engine::layout_client::LayoutClient;
use rooming_engine::services::SyncCoordinator;

/// Записи бронирований с числовыми id `1..=count` и случайными именами.
pub fn booking_records(count: usize) -> Value {
    let records: Vec<Value> = (1..=count)
        .map(|i| {
            json!({
                "id": i,
                "name": Name().fake::<String>(),
                "email": SafeEmail().fake::<String>(),
                "pickup_point": "Piazza Garibaldi",
            })
        })
        .collect();
    Value::Array(records)
}

pub async fn mount_passengers(server: &MockServer, trip_id: &str, count: usize) {
    Mock::given(method("GET"))
        .and(path(format!("/trips/{}/passengers", trip_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(booking_records(count)))
        .mount(server)
        .await;
}

pub async fn mount_stored_layout(server: &MockServer, trip_id: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/trips/{}/rooms", trip_id)))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

pub fn coordinator(server: &MockServer) -> SyncCoordinator {
    coordinator_with_timeout(server, Duration::from_secs(5))
}

pub fn coordinator_with_timeout(server: &MockServer, timeout: Duration) -> SyncCoordinator {
    let layouts = LayoutClient::new(&server.uri(), timeout).unwrap();
    let bookings = BookingClient::new(&server.uri(), timeout).unwrap();
    SyncCoordinator::new(Arc::new(layouts), Arc::new(bookings))
}

/// Сервер раскладок: раздаёт номерам id начиная с 500 и возвращает их обратно.
/// Может переставить жильцов и ответить с задержкой.
#[derive(Default)]
pub struct EchoLayout {
    pub reverse_occupants: bool,
    pub delay: Option<Duration>,
}

impl Respond for EchoLayout {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let drafts: Vec<Value> = request.body_json().unwrap_or_default();
        let rooms: Vec<Value> = drafts
            .into_iter()
            .enumerate()
            .map(|(i, mut room)| {
                if self.reverse_occupants {
                    if let Some(Value::Array(occupants)) = room.get_mut("occupants") {
                        occupants.reverse();
                    }
                }
                room["id"] = json!(500 + i);
                room
            })
            .collect();

        let response = ResponseTemplate::new(200).set_body_json(rooms);
        match self.delay {
            Some(delay) => response.set_delay(delay),
            None => response,
        }
    }
}
