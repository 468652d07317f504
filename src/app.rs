//! Root of the routing tree.
//!
//! # Responsibilities
//! - Own the root `Router` and application settings (views directory)
//! - Dispatch each request exactly once with a fresh response
//! - Turn the router's completion into the terminal response:
//!   unmatched → `404`, unhandled error → its status (default `500`)
//!
//! # Design Decisions
//! - Composition instead of an App-is-a-Router hierarchy
//! - Terminal behaviour lives here, not in `Router`, so mounted routers
//!   always hand their completion back to the caller
//! - A response already sent by a handler is never overwritten

use axum::http::StatusCode;
use std::path::{Path, PathBuf};

use crate::dispatch::{Completion, HttpError, Router};
use crate::http::{Request, Response};
use crate::observability::metrics;

#[derive(Debug, Default)]
pub struct App {
    router: Router,
    views: Option<PathBuf>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The root router, for wiring handlers and mounts.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Directory `Response::render` resolves views against.
    pub fn set_views(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.views = Some(dir.into());
        self
    }

    pub fn views(&self) -> Option<&Path> {
        self.views.as_deref()
    }

    /// Dispatch `req` through the tree and produce its response.
    pub async fn handle(&self, mut req: Request) -> Response {
        let mut res = Response::for_request(&req).with_views(self.views.clone());
        let completion = self.router.dispatch(&mut req, &mut res).await;
        Self::terminate(completion, &req, &mut res);
        res
    }

    fn terminate(completion: Completion, req: &Request, res: &mut Response) {
        match completion {
            Completion::Done(None) if res.is_sent() => {}
            Completion::Done(None) => {
                metrics::record_not_found();
                tracing::debug!(method = %req.method(), url = %req.url(), "No layer answered");
                res.status(StatusCode::NOT_FOUND);
                Self::write(res, format!("Cannot {} {}", req.method(), req.url()));
            }
            Completion::Done(Some(err)) => {
                metrics::record_unhandled_error();
                tracing::error!(
                    method = %req.method(),
                    url = %req.url(),
                    status = %err.status_or_default(),
                    error = %err,
                    "Unhandled error reached the application"
                );
                if res.is_sent() {
                    return;
                }
                res.status(err.status_or_default());
                Self::write(res, Self::error_body(&err));
            }
            Completion::Halted => {
                if !res.is_sent() {
                    tracing::warn!(
                        method = %req.method(),
                        url = %req.url(),
                        "Handler stopped the chain without sending a response"
                    );
                }
            }
        }
    }

    /// The diagnostic trace when one was captured, else the message.
    fn error_body(err: &HttpError) -> String {
        err.trace().unwrap_or(err.message()).to_string()
    }

    fn write(res: &mut Response, body: String) {
        if let Err(err) = res.send(body) {
            tracing::warn!(error = %err, "Failed to write terminal response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{handler_fn, Flow};
    use axum::http::Method;

    #[tokio::test]
    async fn test_unmatched_is_404_with_method_and_url() {
        let app = App::new();
        let res = app.handle(Request::new(Method::PUT, "/nowhere?x=1")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.body_text(), "Cannot PUT /nowhere?x=1");
    }

    #[tokio::test]
    async fn test_unhandled_error_uses_status_or_500() {
        let mut app = App::new();
        app.router_mut()
            .get("/teapot", handler_fn(|_req, _res, next| {
                Box::pin(async move {
                    Ok(next.fail(HttpError::with_status(StatusCode::IM_A_TEAPOT, "short and stout")))
                })
            }))
            .get("/boom", handler_fn(|_req, _res, _next| {
                Box::pin(async move { Err(HttpError::new("boom").with_trace("trace: boom at line 1")) })
            }));

        let res = app.handle(Request::new(Method::GET, "/teapot")).await;
        assert_eq!(res.status_code(), StatusCode::IM_A_TEAPOT);
        assert!(res.body_text().contains("short and stout"));

        let res = app.handle(Request::new(Method::GET, "/boom")).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body_text(), "trace: boom at line 1");
    }

    #[tokio::test]
    async fn test_sent_response_is_kept() {
        let mut app = App::new();
        app.router_mut().use_handler(handler_fn(|_req, res, next| {
            Box::pin(async move {
                res.send("partial")?;
                Ok(next.fail(HttpError::new("late failure")))
            })
        }));

        let res = app.handle(Request::new(Method::GET, "/")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body_text(), "partial");
    }

    #[tokio::test]
    async fn test_halt_without_send_is_empty_200() {
        let mut app = App::new();
        app.router_mut()
            .use_handler(handler_fn(|_req, _res, _next| Box::pin(async move { Ok(Flow::Halt) })));
        let res = app.handle(Request::new(Method::GET, "/")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(!res.is_sent());
    }
}
