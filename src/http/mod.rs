//! HTTP surface of the engine.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum + tower layers: limits, timeout, request ID, trace)
//!     → request.rs (buffered body, path, query)
//!     → App::handle (dispatch)
//!     → response.rs (status, headers, body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Body, Request, X_REQUEST_ID};
pub use response::{Response, ResponseError};
pub use server::HttpServer;
