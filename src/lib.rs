//! Solo FTP Server library
//!
//! A single-client FTP server implementing a restricted subset of RFC 959:
//! fixed-username login, directory navigation, passive-mode data
//! connections, file retrieval and directory listing. One control
//! connection is served to completion before the next is accepted.

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;
pub mod transfer;

pub use crate::config::ServerConfig;
pub use crate::server::Server;
