//! Storage module
//!
//! Path policy checks for directory navigation.

pub mod guard;

pub use guard::is_illegal_path;
