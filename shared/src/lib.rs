//! Shared types for the tab server
//!
//! Error types, response envelope, tab models and real-time event payloads
//! used by the server and its clients.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode, ErrorKind};
pub use message::TabEvent;
