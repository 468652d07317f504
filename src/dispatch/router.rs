//! Ordered layer stack, dispatch loop, and mounting.
//!
//! # Responsibilities
//! - Append layers in priority order (never reordered, never removed)
//! - Run the stack against one request, honouring control signals
//! - Compose child routers under path prefixes
//!
//! # Design Decisions
//! - Dispatch is an iterative loop; only mounted routers recurse (bounded by tree depth)
//! - Cursor state is local to one `dispatch` call, so a router can serve
//!   concurrent requests through `&self`
//! - The loop yields to the scheduler every `yield_every` consecutive steps
//! - Mounting rewrites the child's base (and its descendants') once, at mount time
//! - A parent owns its mounted children; the stack's mount layers are the child list

use futures_util::future::BoxFuture;
use std::fmt;

use crate::dispatch::error::HttpError;
use crate::dispatch::handler::{ErrorHandler, Handler};
use crate::dispatch::layer::{
    invoke_error_handler, invoke_handler, Layer, LayerFactory, LayerKind, RouteMethod,
};
use crate::dispatch::matcher::{join_paths, match_pattern};
use crate::dispatch::signal::{ControlSignal, Flow};
use crate::http::{Request, Response};
use crate::observability::metrics;

/// Consecutive dispatch steps allowed before yielding to the scheduler.
pub const DEFAULT_YIELD_EVERY: usize = 100;

/// How one `dispatch` call ended.
#[must_use]
#[derive(Debug)]
pub enum Completion {
    /// The router invoked its `done` continuation, possibly with an unhandled error.
    Done(Option<HttpError>),
    /// A handler finished the request without calling `next`.
    Halted,
}

/// An ordered stack of layers answering under a path prefix.
pub struct Router {
    stack: Vec<Layer>,
    base: String,
    yield_every: usize,
}

impl Router {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            base: "/".to_string(),
            yield_every: DEFAULT_YIELD_EVERY,
        }
    }

    /// The prefix this router currently answers under.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.stack
    }

    /// Directly mounted child routers, in stack order.
    pub fn routers(&self) -> impl Iterator<Item = &Router> {
        self.stack.iter().filter_map(|layer| match layer.kind() {
            Some(LayerKind::Router(child)) => Some(child.as_ref()),
            _ => None,
        })
    }

    pub fn yield_every(&self) -> usize {
        self.yield_every
    }

    /// Set the yield interval for this router and every mounted descendant.
    pub fn set_yield_every(&mut self, steps: usize) -> &mut Self {
        self.yield_every = steps.max(1);
        for layer in &mut self.stack {
            if let Some(LayerKind::Router(child)) = layer.kind_mut() {
                child.set_yield_every(steps);
            }
        }
        self
    }

    /// Append a layer. Inert layers are dropped.
    pub fn push(&mut self, mut layer: Layer) -> &mut Self {
        if !layer.is_mod() {
            tracing::warn!(
                base = %self.base,
                route = ?layer.route_pattern(),
                "Dropping inert layer"
            );
            return self;
        }

        layer.set_base(&self.base);
        self.stack.push(layer);
        self
    }

    fn add_route(&mut self, method: RouteMethod, path: &str, handler: impl Handler) -> &mut Self {
        self.push(Layer::new().method(method).route(path).handler(handler))
    }

    pub fn get(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add_route(RouteMethod::Get, path, handler)
    }

    pub fn post(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add_route(RouteMethod::Post, path, handler)
    }

    pub fn put(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add_route(RouteMethod::Put, path, handler)
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add_route(RouteMethod::Delete, path, handler)
    }

    /// Register a handler for every method on `path`.
    pub fn all(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.add_route(RouteMethod::All, path, handler)
    }

    /// Append unconditional middleware.
    pub fn use_handler(&mut self, handler: impl Handler) -> &mut Self {
        self.push(Layer::new().method(RouteMethod::Use).handler(handler))
    }

    /// Append an unconditional error handler.
    pub fn use_error_handler(&mut self, handler: impl ErrorHandler) -> &mut Self {
        self.push(Layer::new().method(RouteMethod::Use).error_handler(handler))
    }

    /// Materialize layer factories against `mount` (relative to this router's
    /// base) and append them.
    pub fn use_factories<I>(&mut self, mount: &str, factories: I) -> &mut Self
    where
        I: IntoIterator<Item = LayerFactory>,
    {
        for factory in factories {
            self.push(factory(mount));
        }
        self
    }

    /// Mount `router` under `path`, rewriting its base and its descendants'.
    pub fn mount(&mut self, path: &str, mut router: Router) -> &mut Self {
        let prefix = join_paths(&self.base, path);
        router.rebase(&prefix);
        router.set_yield_every(self.yield_every);

        tracing::debug!(
            parent = %self.base,
            child = %router.base,
            layers = router.len(),
            "Mounted router"
        );

        self.push(Layer::new().method(RouteMethod::Use).router(router))
    }

    /// Mount an anonymous router at `path` and return it for chaining verbs.
    pub fn route(&mut self, path: &str) -> &mut Router {
        self.mount(path, Router::new());
        match self.stack.last_mut().and_then(Layer::kind_mut) {
            Some(LayerKind::Router(child)) => child.as_mut(),
            _ => unreachable!("mount always appends a router layer"),
        }
    }

    fn rebase(&mut self, prefix: &str) {
        self.base = join_paths(prefix, &self.base);
        for layer in &mut self.stack {
            layer.set_base(&self.base);
            if let Some(LayerKind::Router(child)) = layer.kind_mut() {
                child.rebase(prefix);
            }
        }
    }

    /// Run the stack against `req`.
    ///
    /// Resolves to [`Completion::Done`] when the stack is exhausted or left
    /// through `skip_router`, and to [`Completion::Halted`] when a handler
    /// returned without calling `next`.
    pub fn dispatch<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Completion> {
        self.run(req, res, None)
    }

    /// Dispatch with an error already in flight. Mount layers use this so the
    /// parent's error state crosses into the child.
    fn run<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        incoming: Option<HttpError>,
    ) -> BoxFuture<'a, Completion> {
        Box::pin(async move {
            if self.stack.is_empty() {
                return Completion::Done(incoming);
            }

            let mut idx = 0;
            let mut sync = 0;
            let mut signal = ControlSignal::from(incoming);
            let mut last_route: Option<usize> = None;

            loop {
                let error = match signal {
                    ControlSignal::SkipRouter => {
                        tracing::trace!(base = %self.base, "Leaving router early");
                        return Completion::Done(None);
                    }
                    ControlSignal::SkipRoute => {
                        if let Some(anchor) = last_route.take() {
                            idx = self.skip_chain(anchor, idx);
                        }
                        None
                    }
                    ControlSignal::Continue => None,
                    ControlSignal::Fail(err) => Some(err),
                };

                let Some(layer) = self.stack.get(idx) else {
                    return Completion::Done(error);
                };
                idx += 1;

                sync += 1;
                if sync > self.yield_every {
                    sync = 0;
                    metrics::record_dispatch_yield();
                    tokio::task::yield_now().await;
                }

                if layer.handles_routes() {
                    match Self::match_layer(layer, req) {
                        Some(params) => req.bind_params(params),
                        None => {
                            signal = error.into();
                            continue;
                        }
                    }
                }

                let flow = match (layer.kind(), error) {
                    (Some(LayerKind::Handler(handler)), None) => {
                        last_route = layer.handles_routes().then_some(idx - 1);
                        invoke_handler(handler.as_ref(), req, res).await
                    }
                    (Some(LayerKind::ErrorHandler(handler)), Some(err)) => {
                        last_route = layer.handles_routes().then_some(idx - 1);
                        invoke_error_handler(handler.as_ref(), err, req, res).await
                    }
                    (Some(LayerKind::Router(child)), error) => {
                        last_route = None;
                        match child.run(req, res, error).await {
                            Completion::Done(err) => Flow::Next(err.into()),
                            Completion::Halted => Flow::Halt,
                        }
                    }
                    (_, error) => {
                        signal = error.into();
                        continue;
                    }
                };

                match flow {
                    Flow::Halt => return Completion::Halted,
                    Flow::Next(next) => signal = next,
                }
            }
        })
    }

    fn match_layer(layer: &Layer, req: &Request) -> Option<Vec<(String, String)>> {
        if !layer.route_method().matches(req.method()) {
            return None;
        }
        match_pattern(layer.absolute_route()?, req.path())
    }

    /// Index just past the layers chained to the same route and method as `anchor`.
    fn skip_chain(&self, anchor: usize, mut idx: usize) -> usize {
        let anchor = &self.stack[anchor];
        while let Some(layer) = self.stack.get(idx) {
            let same_chain = layer.handles_routes()
                && layer.absolute_route() == anchor.absolute_route()
                && layer.route_method() == anchor.route_method();
            if !same_chain {
                break;
            }
            idx += 1;
        }
        tracing::trace!(
            route = ?anchor.absolute_route(),
            resume_at = idx,
            "Skipped route chain"
        );
        idx
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("base", &self.base)
            .field("stack", &self.stack)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::handler_fn;

    fn noop() -> impl Handler {
        handler_fn(|_req, _res, next| Box::pin(async move { Ok(next.pass()) }))
    }

    #[test]
    fn test_inert_layers_are_not_pushed() {
        let mut router = Router::new();
        router.push(Layer::new());
        router.push(Layer::new().route("/x"));
        assert!(router.is_empty());

        router.push(Layer::new().method(RouteMethod::Get).route("/x").handler(noop()));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_mount_rewrites_descendants() {
        let mut c = Router::new();
        c.get("/", noop());
        let mut b = Router::new();
        b.get("/foo", noop());
        b.mount("/c", c);
        let mut a = Router::new();
        a.mount("/b", b);

        let mut root = Router::new();
        root.mount("/a/", a);

        let a = root.routers().next().unwrap();
        assert_eq!(a.base(), "/a");
        let b = a.routers().next().unwrap();
        assert_eq!(b.base(), "/a/b");
        assert_eq!(b.layers()[0].absolute_route(), Some("/a/b/foo"));
        let c = b.routers().next().unwrap();
        assert_eq!(c.base(), "/a/b/c");
        assert_eq!(c.layers()[0].absolute_route(), Some("/a/b/c"));
    }

    #[test]
    fn test_route_mounts_under_current_base() {
        let mut root = Router::new();
        let api = root.route("/api");
        api.get("/", noop()).post("/", noop());
        let nested = api.route("/v1");
        nested.get("/ping", noop());

        let api = root.routers().next().unwrap();
        assert_eq!(api.len(), 3);
        let v1 = api.routers().next().unwrap();
        assert_eq!(v1.base(), "/api/v1");
        assert_eq!(v1.layers()[0].absolute_route(), Some("/api/v1/ping"));
    }

    #[test]
    fn test_yield_every_propagates() {
        let mut root = Router::new();
        root.route("/x").get("/", noop());
        root.set_yield_every(7);
        assert_eq!(root.routers().next().unwrap().yield_every(), 7);

        root.set_yield_every(0);
        assert_eq!(root.yield_every(), 1);
    }
}
