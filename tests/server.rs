//! End-to-end tests over TCP.

use axum::http::StatusCode;
use std::time::Duration;
use switchback::dispatch::{handler_fn, Flow, HttpError};
use switchback::{App, AppConfig};

mod common;
use common::{client, reply, spawn_server};

fn test_app() -> App {
    let mut app = App::new();
    let router = app.router_mut();
    router.use_handler(switchback::middleware::json());
    router.get("/hello", reply("hello"));
    router.post(
        "/echo",
        handler_fn(|req, res, _next| {
            Box::pin(async move {
                let value: serde_json::Value = req.body_json()?;
                res.status(StatusCode::CREATED).json(&value)?;
                Ok(Flow::Halt)
            })
        }),
    );
    router.get(
        "/fail",
        handler_fn(|_req, _res, _next| {
            Box::pin(async move { Err(HttpError::with_status(StatusCode::SERVICE_UNAVAILABLE, "down")) })
        }),
    );
    app
}

#[tokio::test]
async fn test_serves_routes_and_terminal_responses() {
    let config = AppConfig::default();
    let (addr, shutdown) = spawn_server(test_app(), &config).await;
    let client = client();

    let res = client.get(format!("http://{addr}/hello")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "hello");

    let res = client.get(format!("http://{addr}/missing?q=1")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "Cannot GET /missing?q=1");

    let res = client.get(format!("http://{addr}/fail")).send().await.unwrap();
    assert_eq!(res.status(), 503);
    assert!(res.text().await.unwrap().contains("down"));

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_json_round_trip_and_bad_json() {
    let config = AppConfig::default();
    let (addr, shutdown) = spawn_server(test_app(), &config).await;
    let client = client();

    let res = client
        .post(format!("http://{addr}/echo"))
        .json(&serde_json::json!({ "name": "pen", "qty": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["qty"], 3);

    let res = client
        .post(format!("http://{addr}/echo"))
        .header("content-type", "application/json")
        .body("{broken")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = AppConfig::default();
    config.limits.max_body_bytes = 64;
    let (addr, shutdown) = spawn_server(test_app(), &config).await;

    let res = client()
        .post(format!("http://{addr}/echo"))
        .header("content-type", "application/json")
        .body(format!("\"{}\"", "x".repeat(1024)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE.as_u16());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_slow_handler_times_out() {
    let mut config = AppConfig::default();
    config.limits.request_timeout_secs = 1;

    let mut app = App::new();
    app.router_mut().get(
        "/slow",
        handler_fn(|_req, res, _next| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                res.send("late")?;
                Ok(Flow::Halt)
            })
        }),
    );
    let (addr, shutdown) = spawn_server(app, &config).await;

    let res = client().get(format!("http://{addr}/slow")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT.as_u16());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let config = AppConfig::default();
    let (addr, shutdown) = spawn_server(test_app(), &config).await;

    let res = client()
        .get(format!("http://{addr}/hello"))
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-123");

    let _ = shutdown.send(());
}
