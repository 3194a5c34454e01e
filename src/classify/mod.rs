/// Platform log kind to severity mapping
pub mod severity;

/// Best-effort extraction of an error class from log text
pub mod message_parser;

pub use message_parser::{parse_message, ParsedError};
pub use severity::map_severity;
