//! Conversions between caller types and the wire format

pub mod input;
pub mod messages;
pub mod response;

pub use input::{ChatInput, normalize};
pub use messages::format_messages;
