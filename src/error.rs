// SPDX-License-Identifier: MIT

use std::fmt;

/// Error kinds surfaced by the session pipe, independent of wire transport.
///
/// Each variant corresponds to one row of the error-handling table: it
/// determines whether the session aborts, drains, or merely logs and
/// continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthFailed,
    ContainerNotFound,
    ForbiddenTarget,
    ExecCreateFailed,
    ExecStartFailed,
    PipeIoError,
    FrameDecodeError,
    Utf8PrefixZero,
    FeedbackTimeout,
    AlertFailed,
    WebsocketWriteError,
}

impl ErrorKind {
    /// Whether this error kind aborts session creation before any worker
    /// is spawned (as opposed to transitioning an already-running pipe into
    /// Draining).
    pub fn aborts_before_streaming(&self) -> bool {
        matches!(
            self,
            Self::AuthFailed
                | Self::ContainerNotFound
                | Self::ForbiddenTarget
                | Self::ExecCreateFailed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthFailed => "AUTH_FAILED",
            Self::ContainerNotFound => "CONTAINER_NOT_FOUND",
            Self::ForbiddenTarget => "FORBIDDEN_TARGET",
            Self::ExecCreateFailed => "EXEC_CREATE_FAILED",
            Self::ExecStartFailed => "EXEC_START_FAILED",
            Self::PipeIoError => "PIPE_IO_ERROR",
            Self::FrameDecodeError => "FRAME_DECODE_ERROR",
            Self::Utf8PrefixZero => "UTF8_PREFIX_ZERO",
            Self::FeedbackTimeout => "FEEDBACK_TIMEOUT",
            Self::AlertFailed => "ALERT_FAILED",
            Self::WebsocketWriteError => "WEBSOCKET_WRITE_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-visible failure rendered into the styled CLOSE payload the client
/// sees (red-inverse for errors, green for a normal farewell).
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Render as the red-inverse-styled CLOSE payload: `"\x1b[31m>>> <msg>\x1b[0m"`.
    pub fn styled_message(&self) -> String {
        format!("\x1b[31m>>> {}\x1b[0m", self.message)
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GatewayError {}

/// Green-styled farewell payload sent on a normal exit.
pub const FAREWELL_MESSAGE: &str = "\x1b[32m>>> You quit the container safely.\x1b[0m";

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
