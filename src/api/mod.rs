//! HTTP API.
//!
//! Handlers are thin: they validate the upload, then hand the blocking
//! pipeline work to `spawn_blocking` through `ApiContext::blocking`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;
pub mod upload;

pub use router::app_router;
pub use server::{serve, start_server, ApiServer, ServerError};
pub use types::ApiContext;
