//! Data models
//!
//! Shared between tab-server and its clients (via API and socket events).
//! All IDs are `i64` surrogate keys.

pub mod catalog;
pub mod tab;
pub mod view;

// Re-exports
pub use catalog::*;
pub use tab::*;
pub use view::*;
