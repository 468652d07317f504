//! Request logging middleware.

use crate::dispatch::{handler_fn, Handler};

/// Log the method and URL of every request, then continue.
pub fn request_logger() -> impl Handler {
    handler_fn(|req, _res, next| {
        Box::pin(async move {
            tracing::info!(
                method = %req.method(),
                url = %req.url(),
                request_id = req.request_id().unwrap_or("-"),
                "Request received"
            );
            Ok(next.pass())
        })
    })
}
