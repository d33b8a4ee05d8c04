mod support;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

use rooming_engine::{app, config::Config, AppState};

use support::{coordinator, mount_passengers, mount_stored_layout, EchoLayout};

async fn test_app(server: &MockServer) -> Router {
    let config = Config::load().unwrap();
    app(AppState::with_sync(config, coordinator(server)))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_and_room_classes() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, classes) = call(&app, "GET", "/api/room-classes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(classes.as_array().unwrap().len(), 5);
    assert_eq!(classes[4], json!({"class": "Quadrupla", "capacity": {"min": 3, "max": 4}}));
}

#[tokio::test]
async fn operator_flow_from_open_to_save() {
    let server = MockServer::start().await;
    mount_passengers(&server, "R1", 3).await;
    mount_stored_layout(&server, "R1", 404, Value::Null).await;
    Mock::given(method("PUT"))
        .and(path("/trips/R1/rooms"))
        .respond_with(EchoLayout::default())
        .expect(1)
        .mount(&server)
        .await;
    let app = test_app(&server).await;

    let (status, view) = call(&app, "POST", "/api/trips/R1/rooming/open", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["state"], "synced");
    assert_eq!(view["unassigned"].as_array().unwrap().len(), 3);

    let (status, created) = call(
        &app,
        "POST",
        "/api/trips/R1/rooming/rooms",
        Some(json!({"class": "doppia", "note": "piano terra"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let room_id = created["room_id"].as_str().unwrap().to_string();
    assert!(room_id.starts_with("tmp-"));
    assert_eq!(created["session"]["state"], "dirty");

    for passenger in ["1", "2"] {
        let (status, _) = call(
            &app,
            "PATCH",
            "/api/trips/R1/rooming/move",
            Some(json!({"passenger_id": passenger, "from": "pool", "to": room_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, rejected) = call(
        &app,
        "PATCH",
        "/api/trips/R1/rooming/move",
        Some(json!({"passenger_id": "3", "from": "pool", "to": room_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(rejected["message"].is_string());

    let (status, saved) = call(&app, "POST", "/api/trips/R1/rooming/save", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["save"]["outcome"], "saved");
    assert_eq!(saved["session"]["rooms"][0]["id"], "500");
    assert_eq!(saved["session"]["rooms"][0]["occupancy"], "full");
    assert_eq!(saved["session"]["dirty"], false);

    let (_, again) = call(&app, "POST", "/api/trips/R1/rooming/save", None).await;
    assert_eq!(again["save"]["outcome"], "skipped_clean");
}

#[tokio::test]
async fn room_edits_and_close() {
    let server = MockServer::start().await;
    mount_passengers(&server, "R2", 2).await;
    mount_stored_layout(
        &server,
        "R2",
        200,
        json!([{"id": 9, "class": "Tripla", "occupants": [2, 1]}]),
    )
    .await;
    let app = test_app(&server).await;

    let (status, view) = call(&app, "POST", "/api/trips/R2/rooming/open", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["rooms"][0]["occupancy"], "under_filled");
    assert_eq!(view["under_filled"], json!(["9"]));
    assert_eq!(view["rooms"][0]["occupants"][0]["id"], "1");

    let (status, view) = call(
        &app,
        "PATCH",
        "/api/trips/R2/rooming/rooms/9/note",
        Some(json!({"note": "letto aggiunto"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["rooms"][0]["note"], "letto aggiunto");
    assert_eq!(view["dirty"], true);

    let (status, view) = call(&app, "DELETE", "/api/trips/R2/rooming/rooms/9", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["unassigned"].as_array().unwrap().len(), 2);

    let (status, _) = call(&app, "DELETE", "/api/trips/R2/rooming/rooms/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, "DELETE", "/api/trips/R2/rooming", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", "/api/trips/R2/rooming", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_requests_are_rejected() {
    let server = MockServer::start().await;
    mount_passengers(&server, "R3", 1).await;
    mount_stored_layout(&server, "R3", 404, Value::Null).await;
    let app = test_app(&server).await;

    let (status, _) = call(&app, "POST", "/api/trips/R3/rooming/rooms", Some(json!({"class": "Doppia"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    call(&app, "POST", "/api/trips/R3/rooming/open", None).await;

    let (status, _) = call(&app, "POST", "/api/trips/R3/rooming/rooms", Some(json!({"class": "suite"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(
        &app,
        "PATCH",
        "/api/trips/R3/rooming/move",
        Some(json!({"passenger_id": "ghost", "from": "pool", "to": "pool"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
