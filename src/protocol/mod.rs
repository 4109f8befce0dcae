//! FTP Protocol implementation
//!
//! Handles FTP command parsing, dispatch, and response generation.

pub mod handlers;
pub mod parser;
pub mod responses;

pub use handlers::{SessionFlow, handle_command};
pub use parser::{Command, parse_command};
pub use responses::send_reply;
