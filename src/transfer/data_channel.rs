//! Module `data_channel`
//!
//! Owns the passive-mode listening socket and the accepted data
//! connection for one session. At most one data channel exists per
//! session; every lifecycle transition goes through these operations,
//! and all of them are safe to repeat on already-closed handles so that
//! every error path can unconditionally clean up.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use crate::error::DataChannelError;

/// Passive-mode data channel: Closed until PASV binds a listener,
/// Listening until a peer is accepted, Connected until the transfer
/// finishes or fails.
pub struct DataChannel {
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
}

impl DataChannel {
    pub fn new() -> Self {
        Self {
            listener: None,
            stream: None,
        }
    }

    /// Whether a passive listener is open (Listening or Connected).
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Binds a fresh ephemeral-port listener and reports the address to
    /// announce: the control connection's local IPv4 plus the listener
    /// port. If a listener (or an accepted socket) already exists it is
    /// fully closed first, so a repeated PASV restarts passive mode
    /// without leaking descriptors.
    pub async fn open_passive(
        &mut self,
        control_addr: SocketAddr,
    ) -> Result<(Ipv4Addr, u16), DataChannelError> {
        if self.is_listening() {
            info!("Passive listener already open; rebinding");
        }
        self.close_all();

        // Data connections share the control connection's address family;
        // only IPv4 is served.
        let ip = match control_addr.ip() {
            IpAddr::V4(ip) => ip,
            IpAddr::V6(addr) => {
                return Err(DataChannelError::Query(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    format!("IPv6 control connection not supported: {}", addr),
                )));
            }
        };

        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(DataChannelError::Bind)?;
        let port = listener
            .local_addr()
            .map_err(DataChannelError::Query)?
            .port();

        debug!("Passive listener bound on port {}", port);
        self.listener = Some(listener);
        Ok((ip, port))
    }

    /// Waits for the client to connect to the passive listener, bounded
    /// by `window`. On success the channel becomes Connected; on any
    /// failure the caller is expected to close the channel.
    pub async fn accept_with_timeout(
        &mut self,
        window: Duration,
    ) -> Result<(), DataChannelError> {
        let listener = self
            .listener
            .as_ref()
            .ok_or(DataChannelError::NotListening)?;

        match timeout(window, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                debug!("Data connection accepted from {}", peer);
                self.stream = Some(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(DataChannelError::Accept(e)),
            Err(_) => Err(DataChannelError::AcceptTimeout),
        }
    }

    /// The accepted data connection, if the channel is Connected.
    pub fn stream_mut(&mut self) -> Option<&mut TcpStream> {
        self.stream.as_mut()
    }

    /// Shuts down the accepted socket so the peer sees EOF, then closes
    /// everything. Used on the success path of a transfer.
    pub async fn finish_transfer(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            if let Err(e) = stream.shutdown().await {
                warn!("Failed to shut down data connection: {}", e);
            }
        }
        self.close_all();
    }

    /// Closes the listener and any accepted socket and returns the
    /// channel to Closed. Idempotent; called on every exit path of a
    /// data-bearing command.
    pub fn close_all(&mut self) {
        if self.listener.take().is_some() {
            debug!("Passive listener closed");
        }
        if self.stream.take().is_some() {
            debug!("Data connection closed");
        }
    }
}

impl Default for DataChannel {
    fn default() -> Self {
        Self::new()
    }
}
