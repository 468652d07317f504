//! Handler traits and closure adapters.
//!
//! # Responsibilities
//! - Define the ordinary handler and error handler call shapes
//! - Adapt closures into trait objects a [`Layer`](crate::dispatch::Layer) can own
//!
//! # Design Decisions
//! - Two distinct traits instead of inferring the kind from a callable's shape
//! - Handlers borrow the request and response for the duration of their future
//! - `Err(e)` from a handler is the async rejection path; `Layer` folds it into `next(e)`

use futures_util::future::BoxFuture;

use crate::dispatch::error::HttpError;
use crate::dispatch::signal::{Flow, Next};
use crate::http::{Request, Response};

/// Result of a handler invocation.
pub type HandlerResult = Result<Flow, HttpError>;

/// An ordinary request handler or middleware.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// A handler that only runs while an error is in flight.
pub trait ErrorHandler: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        err: HttpError,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// Handler built from a closure. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap a closure returning a boxed future as a [`Handler`].
///
/// ```
/// use switchback::dispatch::handler_fn;
///
/// let hello = handler_fn(|_req, res, _next| {
///     Box::pin(async move {
///         res.send("hello")?;
///         Ok(switchback::dispatch::Flow::Halt)
///     })
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    HandlerFn { f }
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.f)(req, res, next)
    }
}

/// Error handler built from a closure. See [`error_handler_fn`].
#[derive(Clone)]
pub struct ErrorHandlerFn<F> {
    f: F,
}

/// Wrap a closure as an [`ErrorHandler`].
pub fn error_handler_fn<F>(f: F) -> ErrorHandlerFn<F>
where
    F: for<'a> Fn(HttpError, &'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    ErrorHandlerFn { f }
}

impl<F> ErrorHandler for ErrorHandlerFn<F>
where
    F: for<'a> Fn(HttpError, &'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        err: HttpError,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.f)(err, req, res, next)
    }
}
