//! Wire types for Discord HTTP interactions.
//!
//! Inbound interaction payloads, outbound interaction responses and the
//! Discord JSON error taxonomy. No I/O lives here.

pub mod errors;
pub mod interactions;
pub mod responses;

pub use errors::{DiscordApiError, DiscordErrorCode, ErrorCategory};
pub use interactions::*;
pub use responses::*;
