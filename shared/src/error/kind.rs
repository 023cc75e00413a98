//! Stable error kinds exposed to clients

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse, machine-readable error family.
///
/// Clients branch on the kind; the numeric [`super::ErrorCode`] refines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    TabClosed,
    NotAvailable,
    InvalidPayment,
    Unauthenticated,
    Internal,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::TabClosed => "tab_closed",
            Self::NotAvailable => "not_available",
            Self::InvalidPayment => "invalid_payment",
            Self::Unauthenticated => "unauthenticated",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
