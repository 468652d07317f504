//! One entry of a router's stack.
//!
//! # Responsibilities
//! - Hold an optional route pattern, a method, and exactly one behaviour
//!   (ordinary handler, error handler, or mounted router)
//! - Convert handler panics and `Err` results into `next(err)`
//!
//! # Design Decisions
//! - Built with consuming builder methods; immutable once pushed
//! - A layer with neither method nor behaviour is inert and never pushed
//! - The behaviour is a tagged enum, so "at most one of three" holds by construction

use futures_util::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;

use crate::dispatch::error::HttpError;
use crate::dispatch::handler::{ErrorHandler, Handler, HandlerResult};
use crate::dispatch::matcher::join_paths;
use crate::dispatch::router::Router;
use crate::dispatch::signal::{ControlSignal, Flow, Next};
use crate::http::{Request, Response};

/// Method a layer answers to. `All` matches every request method once the
/// path matches; `Use` marks a layer that is not bound to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
    All,
    Use,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Delete => "DELETE",
            RouteMethod::All => "ALL",
            RouteMethod::Use => "USE",
        }
    }

    /// Whether a request with `method` satisfies this layer. `Use` layers
    /// match on path alone.
    pub fn matches(&self, method: &axum::http::Method) -> bool {
        match self {
            RouteMethod::All | RouteMethod::Use => true,
            other => other.as_str() == method.as_str(),
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown method name.
#[derive(Debug, thiserror::Error)]
#[error("unsupported route method: {0}")]
pub struct UnknownMethod(String);

impl FromStr for RouteMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(RouteMethod::Get),
            "POST" => Ok(RouteMethod::Post),
            "PUT" => Ok(RouteMethod::Put),
            "DELETE" => Ok(RouteMethod::Delete),
            "ALL" => Ok(RouteMethod::All),
            "USE" => Ok(RouteMethod::Use),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

pub(crate) enum LayerKind {
    Handler(Box<dyn Handler>),
    ErrorHandler(Box<dyn ErrorHandler>),
    Router(Box<Router>),
}

/// Builds a [`Layer`] for a given mount path. Produced by collaborators such
/// as static directory expansion.
pub type LayerFactory = Box<dyn Fn(&str) -> Layer + Send + Sync>;

/// A stack entry: route-bound (pattern + method + behaviour) or plain middleware.
pub struct Layer {
    route: Option<String>,
    absolute: Option<String>,
    method: RouteMethod,
    kind: Option<LayerKind>,
    is_mod: bool,
}

impl Layer {
    pub fn new() -> Self {
        Self {
            route: None,
            absolute: None,
            method: RouteMethod::Use,
            kind: None,
            is_mod: false,
        }
    }

    /// Bind the layer to a route pattern (relative to its router's base).
    pub fn route(mut self, route: impl Into<String>) -> Self {
        let route = route.into();
        self.absolute = Some(join_paths("/", &route));
        self.route = Some(route);
        self
    }

    pub fn method(mut self, method: RouteMethod) -> Self {
        self.method = method;
        self.is_mod = true;
        self
    }

    pub fn handler(mut self, handler: impl Handler) -> Self {
        self.kind = Some(LayerKind::Handler(Box::new(handler)));
        self.is_mod = true;
        self
    }

    pub fn error_handler(mut self, handler: impl ErrorHandler) -> Self {
        self.kind = Some(LayerKind::ErrorHandler(Box::new(handler)));
        self.is_mod = true;
        self
    }

    /// Make this layer the mount point of `router`.
    pub fn router(mut self, router: Router) -> Self {
        self.kind = Some(LayerKind::Router(Box::new(router)));
        self.is_mod = true;
        self
    }

    /// True once a method or behaviour has been attached.
    pub fn is_mod(&self) -> bool {
        self.is_mod
    }

    /// True when the layer only runs for a matching path and method.
    pub fn handles_routes(&self) -> bool {
        self.route.is_some()
    }

    pub fn route_pattern(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// The route pattern prefixed with the owning router's base.
    pub fn absolute_route(&self) -> Option<&str> {
        self.absolute.as_deref()
    }

    /// Recompute the absolute route for a router answering under `base`.
    pub(crate) fn set_base(&mut self, base: &str) {
        if let Some(route) = &self.route {
            self.absolute = Some(join_paths(base, route));
        }
    }

    pub fn route_method(&self) -> RouteMethod {
        self.method
    }

    pub fn is_error_handler(&self) -> bool {
        matches!(self.kind, Some(LayerKind::ErrorHandler(_)))
    }

    pub fn is_mount(&self) -> bool {
        matches!(self.kind, Some(LayerKind::Router(_)))
    }

    pub(crate) fn kind(&self) -> Option<&LayerKind> {
        self.kind.as_ref()
    }

    pub(crate) fn kind_mut(&mut self) -> Option<&mut LayerKind> {
        self.kind.as_mut()
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Some(LayerKind::Handler(_)) => "handler",
            Some(LayerKind::ErrorHandler(_)) => "error_handler",
            Some(LayerKind::Router(_)) => "router",
            None => "none",
        };
        f.debug_struct("Layer")
            .field("route", &self.route)
            .field("method", &self.method)
            .field("kind", &kind)
            .finish()
    }
}

/// Run an ordinary handler, folding panics and `Err` into `next(err)`.
pub(crate) async fn invoke_handler(
    handler: &dyn Handler,
    req: &mut Request,
    res: &mut Response,
) -> Flow {
    let call = std::panic::catch_unwind(AssertUnwindSafe(move || {
        let (req, res) = (req, res);
        handler.call(req, res, Next::new())
    }));
    let outcome = match call {
        Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
        Err(payload) => Err(payload),
    };
    settle(outcome)
}

/// Run an error handler with the same folding as [`invoke_handler`].
pub(crate) async fn invoke_error_handler(
    handler: &dyn ErrorHandler,
    err: HttpError,
    req: &mut Request,
    res: &mut Response,
) -> Flow {
    let call = std::panic::catch_unwind(AssertUnwindSafe(move || {
        let (req, res) = (req, res);
        handler.call(err, req, res, Next::new())
    }));
    let outcome = match call {
        Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
        Err(payload) => Err(payload),
    };
    settle(outcome)
}

fn settle(outcome: Result<HandlerResult, Box<dyn Any + Send>>) -> Flow {
    match outcome {
        Ok(Ok(flow)) => flow,
        Ok(Err(err)) => Flow::Next(ControlSignal::Fail(err)),
        Err(payload) => {
            let err = HttpError::from_panic(payload);
            tracing::error!(error = %err, "Handler panicked");
            Flow::Next(ControlSignal::Fail(err))
        }
    }
}
