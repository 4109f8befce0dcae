//! Configuration management for the Solo FTP server
//!
//! Everything except the listening port (which comes from the command
//! line) is configuration: coded defaults, overridden by an optional
//! `config.toml`, overridden in turn by `SOLO_FTP_*` environment
//! variables.

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration loaded once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the control connection
    pub bind_address: String,

    /// Directory the server serves from; captured as the session root
    pub server_root: String,

    /// The single accepted login identity (compared case-insensitively)
    pub username: String,

    /// Bounded wait for a peer on the passive data listener
    pub accept_timeout_secs: u64,

    /// Chunk size for streaming file content over the data connection
    pub buffer_size: usize,

    /// Maximum accepted FTP command line length
    pub max_command_length: usize,
}

impl ServerConfig {
    /// Load configuration from defaults, an optional config.toml, and
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", "0.0.0.0")?
            .set_default("server_root", ".")?
            .set_default("username", "cs317")?
            .set_default("accept_timeout_secs", 15i64)?
            .set_default("buffer_size", 512i64)?
            .set_default("max_command_length", 1024i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("SOLO_FTP"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::Message(
                "username cannot be empty".into(),
            ));
        }

        if self.server_root.is_empty() {
            return Err(ConfigError::Message(
                "server_root cannot be empty".into(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.accept_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "accept_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.max_command_length == 0 {
            return Err(ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get the server root as a PathBuf
    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    /// Get the data-connection accept timeout as a Duration
    pub fn accept_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.accept_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            server_root: ".".to_string(),
            username: "cs317".to_string(),
            accept_timeout_secs: 15,
            buffer_size: 512,
            max_command_length: 1024,
        }
    }
}
