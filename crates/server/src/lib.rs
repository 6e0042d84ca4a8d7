//! HTTP front end for the upload service.
//!
//! Thin plumbing over [`chunkport_service::UploadService`]: three routes,
//! a body-size guard on the upload path, and a mapping from the error
//! taxonomy to HTTP statuses. All invariants live in the service and
//! store crates.

pub mod routes;
mod server;

pub use server::serve;

/// Errors produced by the HTTP server itself.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("HTTP server error: {0}")]
    Hyper(#[from] hyper::Error),
}
