//! Unified error codes for the tab server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Catalog errors (restaurants, menu items)
//! - 4xxx: Tab errors
//! - 5xxx: Payment errors
//! - 6xxx: Chat errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

use super::kind::ErrorKind;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients in any language
/// can switch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Caller must manage the restaurant
    ManagerRequired = 2002,

    // ==================== 3xxx: Catalog ====================
    /// Restaurant not found
    RestaurantNotFound = 3001,
    /// Menu item not found
    MenuItemNotFound = 3002,
    /// Menu item is not available at this restaurant
    MenuItemNotAvailable = 3003,

    // ==================== 4xxx: Tab ====================
    /// Tab not found
    TabNotFound = 4001,
    /// Tab item not found
    TabItemNotFound = 4002,
    /// An open tab already exists for this user and restaurant
    TabAlreadyOpen = 4003,
    /// Tab is closed
    TabClosed = 4004,
    /// Tab is being modified by another request
    TabBusy = 4005,
    /// Quantity out of range
    InvalidQuantity = 4006,
    /// Price out of range
    InvalidPrice = 4007,

    // ==================== 5xxx: Payment ====================
    /// Payment method does not belong to the caller
    PaymentMethodInvalid = 5001,

    // ==================== 6xxx: Chat ====================
    /// Caller may not join this chat room
    ChatNotAllowed = 6001,
    /// Caller has not joined this chat room
    NotInChatRoom = 6002,
    /// Message is empty or too long
    MessageInvalid = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::ManagerRequired => "Restaurant manager role required",

            // Catalog
            ErrorCode::RestaurantNotFound => "Restaurant not found",
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemNotAvailable => "Menu item is not available at this restaurant",

            // Tab
            ErrorCode::TabNotFound => "Tab not found",
            ErrorCode::TabItemNotFound => "Tab item not found",
            ErrorCode::TabAlreadyOpen => "You already have an open tab at this restaurant",
            ErrorCode::TabClosed => "Tab is closed",
            ErrorCode::TabBusy => "Tab is being modified, please retry",
            ErrorCode::InvalidQuantity => "Quantity must be a positive integer",
            ErrorCode::InvalidPrice => "Price must not be negative",

            // Payment
            ErrorCode::PaymentMethodInvalid => "Invalid payment method",

            // Chat
            ErrorCode::ChatNotAllowed => "Not eligible to join this chat",
            ErrorCode::NotInChatRoom => "You must join the chat room first",
            ErrorCode::MessageInvalid => "Message is empty or too long",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }

    /// Stable machine-readable kind shared by a family of codes
    pub const fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidRequest
            | ErrorCode::RequiredField
            | ErrorCode::ValueOutOfRange
            | ErrorCode::InvalidQuantity
            | ErrorCode::InvalidPrice
            | ErrorCode::MessageInvalid => ErrorKind::Validation,

            ErrorCode::NotFound
            | ErrorCode::RestaurantNotFound
            | ErrorCode::MenuItemNotFound
            | ErrorCode::TabNotFound
            | ErrorCode::TabItemNotFound => ErrorKind::NotFound,

            ErrorCode::PermissionDenied
            | ErrorCode::ManagerRequired
            | ErrorCode::ChatNotAllowed
            | ErrorCode::NotInChatRoom => ErrorKind::Forbidden,

            ErrorCode::TabAlreadyOpen | ErrorCode::TabBusy => ErrorKind::Conflict,
            ErrorCode::TabClosed => ErrorKind::TabClosed,
            ErrorCode::MenuItemNotAvailable => ErrorKind::NotAvailable,
            ErrorCode::PaymentMethodInvalid => ErrorKind::InvalidPayment,

            ErrorCode::NotAuthenticated | ErrorCode::TokenExpired | ErrorCode::TokenInvalid => {
                ErrorKind::Unauthenticated
            }

            ErrorCode::Unknown
            | ErrorCode::InternalError
            | ErrorCode::DatabaseError
            | ErrorCode::ConfigError => ErrorKind::Internal,
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::ManagerRequired),

            // Catalog
            3001 => Ok(ErrorCode::RestaurantNotFound),
            3002 => Ok(ErrorCode::MenuItemNotFound),
            3003 => Ok(ErrorCode::MenuItemNotAvailable),

            // Tab
            4001 => Ok(ErrorCode::TabNotFound),
            4002 => Ok(ErrorCode::TabItemNotFound),
            4003 => Ok(ErrorCode::TabAlreadyOpen),
            4004 => Ok(ErrorCode::TabClosed),
            4005 => Ok(ErrorCode::TabBusy),
            4006 => Ok(ErrorCode::InvalidQuantity),
            4007 => Ok(ErrorCode::InvalidPrice),

            // Payment
            5001 => Ok(ErrorCode::PaymentMethodInvalid),

            // Chat
            6001 => Ok(ErrorCode::ChatNotAllowed),
            6002 => Ok(ErrorCode::NotInChatRoom),
            6003 => Ok(ErrorCode::MessageInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
