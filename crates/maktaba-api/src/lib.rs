//! Maktaba API
//!
//! HTTP layer: routing, handlers, state, and error rendering. Exposed as a
//! library so integration tests can build the router in-process.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod media;
pub mod setup;
pub mod state;
