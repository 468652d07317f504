//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use switchback::dispatch::{handler_fn, Flow, Handler};
use switchback::{App, AppConfig, HttpServer};

/// Ordered record of which handlers ran.
pub type Log = Arc<Mutex<Vec<&'static str>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

/// Handler that appends `tag` to `log` and continues.
pub fn record(log: &Log, tag: &'static str) -> impl Handler {
    let log = Arc::clone(log);
    handler_fn(move |_req, _res, next| {
        log.lock().unwrap().push(tag);
        Box::pin(async move { Ok(next.pass()) })
    })
}

/// Handler that answers `text` and ends the chain.
pub fn reply(text: &'static str) -> impl Handler {
    handler_fn(move |_req, res, _next| {
        Box::pin(async move {
            res.send(text)?;
            Ok(Flow::Halt)
        })
    })
}

/// A fresh, empty directory under the system temp dir.
pub fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("switchback-{tag}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Serve `app` on an ephemeral port. Dropping or firing the sender stops it.
pub async fn spawn_server(app: App, config: &AppConfig) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(app, config);
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let _ = server
            .run(listener, async move {
                let _ = rx.await;
            })
            .await;
    });

    (addr, tx)
}

/// Client that neither follows redirects nor uses a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
