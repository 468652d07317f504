//! Flat-file store used by the demo application.
//!
//! # Responsibilities
//! - Persist categories, items and instances in one JSON file
//! - Provide insert, lookup-by-id and list/join queries
//!
//! # Design Decisions
//! - The file is read on every operation; no in-memory cache
//! - Writes are serialized through an async mutex and replace the file atomically
//! - A missing file reads as an empty database

pub mod db;
pub mod models;

pub use db::{Database, StoreError};
pub use models::{Category, Instance, Item, ItemWithCount, JoinedInstance};
