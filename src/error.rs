//! Error taxonomy for the keypad link.
//!
//! Every public operation returns a `Result` carrying one of these kinds. The
//! integer codes returned by [`LinkError::code`] are the status values the
//! controller has always reported to host applications (0 is success).

use std::io;

pub const STATUS_SUCCESS: i32 = 0;
pub const STATUS_BAD_HANDLE: i32 = -1;
pub const STATUS_TRANSPORT: i32 = -2;
pub const STATUS_BAD_TIME_FORMAT: i32 = -3;
pub const STATUS_OPEN_FAILURE: i32 = -4;
pub const STATUS_BAD_POWER: i32 = -5;
pub const STATUS_DEVICE_REPORTED: i32 = -6;
pub const STATUS_UNKNOWN: i32 = -7;
pub const STATUS_TIMEOUT: i32 = -8;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The session is closed or the handle does not name a live session.
    #[error("invalid or closed session handle")]
    BadHandle,

    /// Write, read or disconnect at the byte-stream level.
    #[error("serial communication error: {0}")]
    Transport(#[from] io::Error),

    #[error("invalid time string '{input}' (expected MM:SS)")]
    BadTimeFormat { input: String },

    #[error("failed to open port {port}: {source}")]
    OpenFailure {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Reserved. Power input is normalized to 100% instead of rejected.
    #[error("invalid power level {0}")]
    BadPower(u8),

    /// Reserved for an `ERR:` line from the controller; not raised today.
    #[error("controller reported an error: {0}")]
    DeviceReported(String),

    #[error("no acknowledgment for '{command}' before the deadline")]
    Timeout { command: String },

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl LinkError {
    /// Stable integer status for this error kind.
    pub fn code(&self) -> i32 {
        match self {
            LinkError::BadHandle => STATUS_BAD_HANDLE,
            LinkError::Transport(_) => STATUS_TRANSPORT,
            LinkError::BadTimeFormat { .. } => STATUS_BAD_TIME_FORMAT,
            LinkError::OpenFailure { .. } => STATUS_OPEN_FAILURE,
            LinkError::BadPower(_) => STATUS_BAD_POWER,
            LinkError::DeviceReported(_) => STATUS_DEVICE_REPORTED,
            LinkError::Unknown(_) => STATUS_UNKNOWN,
            LinkError::Timeout { .. } => STATUS_TIMEOUT,
        }
    }

    pub(crate) fn bad_time(input: &str) -> Self {
        LinkError::BadTimeFormat {
            input: input.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;

/// Collapses an operation result into its integer status.
pub fn status_code<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => STATUS_SUCCESS,
        Err(e) => e.code(),
    }
}

/// Name of a status code, for host-side diagnostics.
pub fn describe_status(code: i32) -> &'static str {
    match code {
        STATUS_SUCCESS => "SUCCESS",
        STATUS_BAD_HANDLE => "BAD_HANDLE",
        STATUS_TRANSPORT => "SERIAL_FAIL",
        STATUS_BAD_TIME_FORMAT => "BAD_TIME_STR",
        STATUS_OPEN_FAILURE => "OPEN_FAIL",
        STATUS_BAD_POWER => "BAD_POWER",
        STATUS_DEVICE_REPORTED => "ARDUINO_ERR",
        STATUS_UNKNOWN => "UNKNOWN",
        STATUS_TIMEOUT => "TIMEOUT",
        _ => "UNRECOGNIZED",
    }
}
