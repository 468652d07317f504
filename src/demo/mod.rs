//! Example application built on the engine.
//!
//! # Responsibilities
//! - Wire logging, body parsing and static files as root middleware
//! - Mount the nested demo routers and the catalog (categories, items)
//! - Answer unhandled errors with their status and trace-or-message
//!
//! # Design Decisions
//! - A missing static directory only disables static files; it does not
//!   prevent the app from starting

pub mod catalog;
pub mod nested;

use axum::http::StatusCode;
use std::sync::Arc;

use crate::app::App;
use crate::config::AppConfig;
use crate::dispatch::{error_handler_fn, handler_fn, Flow};
use crate::middleware::{json, request_logger, static_files, urlencoded};
use crate::store::Database;

/// Build the demo application.
pub fn build_app(config: &AppConfig, db: Arc<Database>) -> App {
    let mut app = App::new();
    if let Some(views) = &config.assets.views_dir {
        app.set_views(views);
    }

    let router = app.router_mut();
    router
        .use_handler(request_logger())
        .use_handler(json())
        .use_handler(urlencoded());

    if let Some(dir) = &config.assets.static_dir {
        if let Err(err) = static_files::mount_dir(router, &config.assets.static_mount, dir) {
            tracing::warn!(dir = %dir, error = %err, "Static directory unavailable");
        }
    }

    router.get(
        "/",
        handler_fn(|_req, res, _next| {
            Box::pin(async move {
                res.redirect("/items")?;
                Ok(Flow::Halt)
            })
        }),
    );

    router.mount("/a", nested::a_router());
    router.mount("/categories", catalog::categories_router(Arc::clone(&db)));
    router.mount("/items", catalog::items_router(db));

    router.use_error_handler(error_handler_fn(|err, _req, res, _next| {
        Box::pin(async move {
            if !res.is_sent() {
                let body = err.trace().unwrap_or(err.message()).to_string();
                res.status(err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
                    .send(body)?;
            }
            Ok(Flow::Halt)
        })
    }));

    router.set_yield_every(config.dispatch.yield_every);
    app
}
