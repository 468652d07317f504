//! Error value carried on the dispatch error channel.
//!
//! # Responsibilities
//! - Hold the message, optional HTTP status, and optional diagnostic trace of a failure
//! - Convert handler-side failures (I/O, JSON, panics) into a single type
//!
//! # Design Decisions
//! - Status is optional; the terminal handler falls back to 500
//! - The trace is only captured when `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` enable it

use axum::http::StatusCode;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};

/// An error travelling through a router's stack until an error handler consumes it.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HttpError {
    status: Option<StatusCode>,
    message: String,
    trace: Option<String>,
}

impl HttpError {
    /// Create an error without an explicit status.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let backtrace = Backtrace::capture();
        let trace = match backtrace.status() {
            BacktraceStatus::Captured => Some(format!("Error: {message}\n{backtrace}")),
            _ => None,
        };

        Self {
            status: None,
            message,
            trace,
        }
    }

    /// Create an error that should surface with the given status.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(message).at_status(status)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    /// Replace the status carried by this error.
    pub fn at_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach a diagnostic trace, replacing any captured backtrace.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The status a terminal handler should answer with.
    pub fn status_or_default(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    /// Convert a caught panic payload into an error.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        Self::new(format!("handler panicked: {detail}"))
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        let error = HttpError::new(err.to_string());
        match err.kind() {
            std::io::ErrorKind::NotFound => error.at_status(StatusCode::NOT_FOUND),
            _ => error,
        }
    }
}

// Handlers mostly meet serde_json while decoding client input.
impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::bad_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_500() {
        let err = HttpError::new("boom");
        assert_eq!(err.status(), None);
        assert_eq!(err.status_or_default(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_explicit_status_and_trace() {
        let err = HttpError::not_found("missing").with_trace("trace text");
        assert_eq!(err.status_or_default(), StatusCode::NOT_FOUND);
        assert_eq!(err.trace(), Some("trace text"));
        assert_eq!(err.message(), "missing");
    }

    #[test]
    fn test_from_panic_payloads() {
        let err = HttpError::from_panic(Box::new("static str"));
        assert_eq!(err.message(), "handler panicked: static str");

        let err = HttpError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err.message(), "handler panicked: owned");

        let err = HttpError::from_panic(Box::new(42_u32));
        assert_eq!(err.message(), "handler panicked: unknown panic payload");
    }

    #[test]
    fn test_io_not_found_maps_to_404() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = HttpError::from(io);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }
}
