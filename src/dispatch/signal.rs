//! Control values exchanged between handlers and the dispatch loop.
//!
//! A handler receives a [`Next`] token and either consumes it (producing
//! [`Flow::Next`] with a [`ControlSignal`]) or returns [`Flow::Halt`] after
//! finishing the response itself. `Next` is move-only, so a handler cannot
//! advance the loop twice.

use crate::dispatch::error::HttpError;

/// What the dispatch loop should do with the rest of the stack.
#[derive(Debug)]
pub enum ControlSignal {
    /// Move on to the next layer with no error in flight.
    Continue,
    /// Skip the remaining layers chained to the route that just ran.
    SkipRoute,
    /// Leave the current router; its caller continues with no error.
    SkipRouter,
    /// Propagate an error until an error handler consumes it.
    Fail(HttpError),
}

impl ControlSignal {
    pub fn is_failure(&self) -> bool {
        matches!(self, ControlSignal::Fail(_))
    }

    /// The in-flight error, if any. Sentinels carry none.
    pub fn into_error(self) -> Option<HttpError> {
        match self {
            ControlSignal::Fail(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Option<HttpError>> for ControlSignal {
    fn from(err: Option<HttpError>) -> Self {
        match err {
            Some(err) => ControlSignal::Fail(err),
            None => ControlSignal::Continue,
        }
    }
}

impl From<HttpError> for ControlSignal {
    fn from(err: HttpError) -> Self {
        ControlSignal::Fail(err)
    }
}

/// Outcome of running one handler.
#[must_use]
#[derive(Debug)]
pub enum Flow {
    /// The handler called `next` with this signal.
    Next(ControlSignal),
    /// The handler ended the chain without calling `next`.
    Halt,
}

/// Capability to advance the dispatch loop, consumed on use.
#[must_use = "a handler must either consume `next` or return `Flow::Halt`"]
#[derive(Debug)]
pub struct Next {
    _private: (),
}

impl Next {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }

    /// `next()`
    pub fn pass(self) -> Flow {
        Flow::Next(ControlSignal::Continue)
    }

    /// `next(err)`
    pub fn fail(self, err: impl Into<HttpError>) -> Flow {
        Flow::Next(ControlSignal::Fail(err.into()))
    }

    /// `next("route")`
    pub fn skip_route(self) -> Flow {
        Flow::Next(ControlSignal::SkipRoute)
    }

    /// `next("router")`
    pub fn skip_router(self) -> Flow {
        Flow::Next(ControlSignal::SkipRouter)
    }

    /// Advance with an arbitrary signal.
    pub fn signal(self, signal: ControlSignal) -> Flow {
        Flow::Next(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_consumers() {
        assert!(matches!(Next::new().pass(), Flow::Next(ControlSignal::Continue)));
        assert!(matches!(Next::new().skip_route(), Flow::Next(ControlSignal::SkipRoute)));
        assert!(matches!(Next::new().skip_router(), Flow::Next(ControlSignal::SkipRouter)));

        match Next::new().fail(HttpError::new("x")) {
            Flow::Next(signal) => assert!(signal.is_failure()),
            Flow::Halt => panic!("fail must advance the loop"),
        }
    }

    #[test]
    fn test_signal_from_optional_error() {
        assert!(matches!(ControlSignal::from(None), ControlSignal::Continue));

        let signal = ControlSignal::from(Some(HttpError::new("e")));
        assert_eq!(signal.into_error().map(|e| e.to_string()), Some("e".to_string()));

        assert!(ControlSignal::SkipRouter.into_error().is_none());
    }
}
