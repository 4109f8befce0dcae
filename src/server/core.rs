//! Module `core`
//!
//! Binds the control listener and serves clients one at a time: each
//! accepted connection is handled to completion (QUIT, disconnect, or
//! control-socket error) before the next is accepted. No parallelism
//! between clients and no administrative shutdown; the process runs
//! until signaled.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use log::{error, info};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::session::handle_session;

pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    root: PathBuf,
}

impl Server {
    /// Binds the control listener on `config.bind_address` and the
    /// given port (numeric or service name) and resolves the server
    /// root that every session will be anchored at.
    pub async fn bind(port: &str, config: ServerConfig) -> Result<Self, ServerError> {
        let addr = format!("{}:{}", config.bind_address, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server bound to {}", addr);

        // The session root is captured once, absolute, so the path
        // guard's prefix anchor is stable.
        let root = tokio::fs::canonicalize(config.server_root_path())
            .await
            .map_err(|source| ServerError::InvalidRoot {
                path: config.server_root.clone(),
                source,
            })?;
        info!("Serving from {}", root.display());

        Ok(Self {
            listener,
            config,
            root,
        })
    }

    /// The bound control-socket address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts and fully serves one client at a time, forever.
    pub async fn start(&self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!("Accepted control connection from {}", peer_addr);
                    handle_session(stream, peer_addr, self.root.clone(), &self.config).await;
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}
