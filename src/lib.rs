//! Switchback: a small HTTP request-dispatch engine.
//!
//! Handlers are stacked on a [`Router`](dispatch::Router) in priority order,
//! routers mount under path prefixes to form a tree, and an [`App`] turns the
//! outcome of one dispatch into the final response. Each handler advances the
//! chain by consuming its [`Next`](dispatch::Next) token.

// Core engine
pub mod app;
pub mod dispatch;
pub mod http;

// Collaborators
pub mod middleware;
pub mod store;
pub mod demo;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use app::App;
pub use config::AppConfig;
pub use dispatch::{Completion, ControlSignal, Flow, HttpError, Next, Router};
pub use http::{HttpServer, Request, Response};
