//! # filehub-api
//!
//! HTTP API layer for FileHub built on Axum.
//!
//! Provides the REST endpoints under `/api`, the bearer-token extractors,
//! request/response DTOs, error mapping and the middleware stack.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use state::{AppState, Stores};
