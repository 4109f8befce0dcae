//! Session management
//!
//! One `Session` per accepted control connection, plus the control loop
//! that drives it.

pub mod handler;
pub mod state;

pub use handler::handle_session;
pub use state::Session;
