//! Request dispatch engine.
//!
//! # Data Flow
//! ```text
//! App::handle(request)
//!     → Router::dispatch (iterative loop over the stack)
//!         → plain middleware: always runs
//!         → route-bound layer: runs when path and method match
//!         → mount layer: child Router::dispatch, error state carried across
//!     → Completion::Done(err?) | Completion::Halted
//!     → App terminal: 404 / error status / nothing
//! ```
//!
//! # Design Decisions
//! - Handlers advance the loop by consuming a `Next` token; control values are
//!   a closed enum instead of magic strings
//! - Handler failures (`Err` or panic) become `ControlSignal::Fail` in `Layer`
//! - Routers are built before serving and only read during dispatch

pub mod error;
pub mod handler;
pub mod layer;
pub mod matcher;
pub mod router;
pub mod signal;

pub use error::HttpError;
pub use handler::{error_handler_fn, handler_fn, ErrorHandler, Handler, HandlerResult};
pub use layer::{Layer, LayerFactory, RouteMethod};
pub use router::{Completion, Router, DEFAULT_YIELD_EVERY};
pub use signal::{ControlSignal, Flow, Next};
