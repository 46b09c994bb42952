//! Error classification.
//!
//! Every failure that reaches the dispatch engine is normalized into a
//! [`ClassifiedError`] so that logging and the client-visible message are the
//! same no matter which layer failed.

use std::error::Error as StdError;
use std::fmt;

use axum::http::StatusCode;

/// Status recorded when a failure carries no HTTP status of its own.
pub const UNKNOWN_STATUS: i32 = -1;

/// Generic body sent for failures without a usable status.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// A failure that may carry an HTTP status.
pub trait StatusCarrier {
    /// The status attached to this failure, if it has one.
    fn status(&self) -> Option<StatusCode>;
}

/// A failure normalized for reporting.
pub struct ClassifiedError {
    /// Status taken from the cause, or [`UNKNOWN_STATUS`].
    pub status_code: i32,
    /// Terse message safe to send to the client.
    pub message: String,
    /// The original failure. Logged, never sent.
    pub cause: Box<dyn StdError + Send + Sync>,
}

impl ClassifiedError {
    /// Status written to the client. Unknown and out-of-range codes become 500.
    pub fn response_status(&self) -> StatusCode {
        u16::try_from(self.status_code)
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .filter(|status| status.is_client_error() || status.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Replace the client message, keeping status and cause.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl fmt::Debug for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifiedError")
            .field("status_code", &self.status_code)
            .field("message", &self.message)
            .field("cause", &self.cause.to_string())
            .finish()
    }
}

/// Normalize a failure into status, message and cause.
pub fn classify<E>(cause: E) -> ClassifiedError
where
    E: StdError + StatusCarrier + Send + Sync + 'static,
{
    let status_code = cause
        .status()
        .map(|status| i32::from(status.as_u16()))
        .unwrap_or(UNKNOWN_STATUS);

    let message = if status_code == UNKNOWN_STATUS {
        INTERNAL_SERVER_ERROR.to_string()
    } else {
        format!("Error {}", status_code)
    };

    ClassifiedError {
        status_code,
        message,
        cause: Box::new(cause),
    }
}
