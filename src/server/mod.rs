//! Server module
//!
//! Control-socket binding and the serial accept loop.

pub mod core;

pub use core::Server;
