//! Three routers nested `/a` → `/b` → `/c`, each answering `/` and `/foo`
//! with its own absolute path.

use axum::http::StatusCode;

use crate::dispatch::{handler_fn, Flow, Handler, Router};

fn reply(text: &'static str) -> impl Handler {
    handler_fn(move |_req, res, _next| {
        Box::pin(async move {
            res.status(StatusCode::OK).send(text)?;
            Ok(Flow::Halt)
        })
    })
}

pub fn c_router() -> Router {
    let mut c = Router::new();
    c.get("/", reply("/a/b/c")).get("/foo", reply("/a/b/c/foo"));
    c
}

pub fn b_router() -> Router {
    let mut b = Router::new();
    b.get("/", reply("/a/b")).get("/foo", reply("/a/b/foo"));
    b.mount("/c", c_router());
    b
}

pub fn a_router() -> Router {
    let mut a = Router::new();
    a.get("/", reply("/a")).get("/foo", reply("/a/foo"));
    a.mount("/b", b_router());
    a
}
