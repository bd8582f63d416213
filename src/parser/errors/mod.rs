//! Diagnostics for the TJP parser.
//!
//! Stable [`ErrorCode`]s, the [`Message`] record that pairs a code with a
//! source location and optional hint, the [`MessageLog`] collecting
//! warnings during a parse, and the [`ParseError`] the driver returns.

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::{Message, MessageLog, ParseError, Severity};
