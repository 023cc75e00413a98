//! Unified error system for the tab server
//!
//! - [`ErrorCode`]: standardized numeric error codes
//! - [`ErrorKind`]: stable machine-readable family of a code
//! - [`ErrorCategory`]: classification by code range
//! - [`AppError`]: error with code, message and details
//! - [`ApiResponse`]: unified API response envelope
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ErrorKind, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::TabClosed).with_detail("tab_id", 12);
//! assert_eq!(err.kind(), ErrorKind::TabClosed);
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(4004));
//! ```

mod category;
mod codes;
mod http;
mod kind;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use kind::ErrorKind;
pub use types::{ApiResponse, AppError, AppResult};
