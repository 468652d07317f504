//! Collaborator middleware plugged into a router's stack.
//!
//! # Responsibilities
//! - Decode request bodies (`body`)
//! - Expand a static directory into `GET` layers (`static_files`)
//! - Render HTML views (`views`)
//! - Log incoming requests (`logger`)
//!
//! # Design Decisions
//! - Everything here is built on the public dispatch API; the engine has no
//!   knowledge of these modules

pub mod body;
pub mod logger;
pub mod static_files;
pub mod views;

pub use body::{json, urlencoded};
pub use logger::request_logger;
