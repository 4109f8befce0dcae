//! Transfer module
//!
//! Passive-mode data channel lifecycle, file streaming for RETR, and
//! the directory-listing writer for NLST.

pub mod data_channel;
pub mod file_ops;
pub mod listing;

pub use data_channel::DataChannel;
pub use file_ops::send_file;
pub use listing::list_entries;
