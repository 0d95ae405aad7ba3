//! # Formats Module
//!
//! Persistence formats for durable harvester state.
//!
//! All transformations here are pure (bytes/strings in, values out); file
//! I/O lives in the app layer behind its storage adapter.

mod persistence;

pub use persistence::*;
