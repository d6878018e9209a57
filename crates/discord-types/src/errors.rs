//! Discord REST error types.
//!
//! Handlers that call the Discord API surface failures as [`DiscordApiError`];
//! the interaction router maps it to an [`ErrorCategory`] and from there to a
//! message the invoking user can act on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the invoking user can do about a failed Discord call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    RateLimit,
    NotFound,
    PermissionDenied,
    PayloadTooLarge,
    InvalidInput,
    Unknown,
}

/// Discord JSON error codes an interaction handler is likely to hit.
///
/// Discriminants are the raw codes from
/// <https://discord.com/developers/docs/topics/opcodes-and-status-codes#json>.
/// [`RateLimited`](Self::RateLimited) and [`Unknown`](Self::Unknown) have no
/// JSON code of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DiscordErrorCode {
    UnknownChannel = 10003,
    UnknownGuild = 10004,
    UnknownMessage = 10008,
    UnknownWebhook = 10015,
    /// Token expired or already acknowledged.
    UnknownInteraction = 10062,
    SlowmodeRateLimit = 20016,
    MaxWebhooksReached = 30007,
    RequestEntityTooLarge = 40005,
    MissingAccess = 50001,
    CannotSendEmptyMessage = 50006,
    CannotSendToUser = 50007,
    MissingPermissions = 50013,
    InvalidFormBody = 50035,
    /// Also reported as 160005.
    ThreadLocked = 50083,
    RateLimited = 1,
    Unknown = 0,
}

const KNOWN_CODES: &[DiscordErrorCode] = &[
    DiscordErrorCode::UnknownChannel,
    DiscordErrorCode::UnknownGuild,
    DiscordErrorCode::UnknownMessage,
    DiscordErrorCode::UnknownWebhook,
    DiscordErrorCode::UnknownInteraction,
    DiscordErrorCode::SlowmodeRateLimit,
    DiscordErrorCode::MaxWebhooksReached,
    DiscordErrorCode::RequestEntityTooLarge,
    DiscordErrorCode::MissingAccess,
    DiscordErrorCode::CannotSendEmptyMessage,
    DiscordErrorCode::CannotSendToUser,
    DiscordErrorCode::MissingPermissions,
    DiscordErrorCode::InvalidFormBody,
    DiscordErrorCode::ThreadLocked,
];

impl DiscordErrorCode {
    pub fn from_raw(code: u32) -> Self {
        if code == 160005 {
            return Self::ThreadLocked;
        }
        KNOWN_CODES
            .iter()
            .copied()
            .find(|known| *known as u32 == code)
            .unwrap_or(Self::Unknown)
    }

    pub fn category(self) -> ErrorCategory {
        use DiscordErrorCode::*;
        match self {
            UnknownChannel | UnknownGuild | UnknownMessage | UnknownWebhook
            | UnknownInteraction => ErrorCategory::NotFound,
            MissingAccess | MissingPermissions | CannotSendToUser => {
                ErrorCategory::PermissionDenied
            }
            RateLimited | SlowmodeRateLimit => ErrorCategory::RateLimit,
            RequestEntityTooLarge => ErrorCategory::PayloadTooLarge,
            CannotSendEmptyMessage | InvalidFormBody | ThreadLocked | MaxWebhooksReached => {
                ErrorCategory::InvalidInput
            }
            Unknown => ErrorCategory::Unknown,
        }
    }
}

/// A failed Discord REST call: the HTTP status plus the JSON error body.
///
/// ```json
/// { "code": 50013, "message": "Missing Permissions" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordApiError {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub message: String,
    /// Per-field details that accompany `50035 Invalid Form Body`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl DiscordApiError {
    pub fn new(status: u16, code: u32, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            errors: None,
        }
    }

    /// 429 and 413 are decided by the HTTP status; anything else by the JSON code.
    pub fn error_code(&self) -> DiscordErrorCode {
        match self.status {
            429 => DiscordErrorCode::RateLimited,
            413 => DiscordErrorCode::RequestEntityTooLarge,
            _ => DiscordErrorCode::from_raw(self.code),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.error_code().category()
    }
}

impl fmt::Display for DiscordApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Discord returned {} (code {})", self.status, self.code)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for DiscordApiError {}
