//! Module `state`
//!
//! Defines the `Session` struct holding per-connection state: login
//! status, the session root captured at session start, the current
//! directory, and the owned data channel. Exactly one `Session` exists
//! per control connection; it is threaded through the dispatch loop and
//! destroyed when the loop returns.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::transfer::DataChannel;

/// Per-connection FTP session state.
pub struct Session {
    control_addr: SocketAddr,
    root: PathBuf,
    current_dir: PathBuf,
    is_logged_in: bool,
    data_channel: DataChannel,
}

impl Session {
    /// Creates a session anchored at `root`, the directory captured at
    /// session start. `control_addr` is the local address of the
    /// control socket, reported by PASV.
    pub fn new(root: PathBuf, control_addr: SocketAddr) -> Self {
        Self {
            control_addr,
            current_dir: root.clone(),
            root,
            is_logged_in: false,
            data_channel: DataChannel::new(),
        }
    }

    /// Returns whether a successful USER has been received.
    pub fn is_logged_in(&self) -> bool {
        self.is_logged_in
    }

    /// Marks the session authenticated. Never unset; there is no logout.
    pub fn set_logged_in(&mut self) {
        self.is_logged_in = true;
    }

    /// The session root, immutable for the session's lifetime.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current working directory, starting at the session root.
    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn set_current_dir(&mut self, dir: PathBuf) {
        self.current_dir = dir;
    }

    /// Whether the current directory is the session root, the floor for
    /// upward navigation.
    pub fn at_root(&self) -> bool {
        self.current_dir == self.root
    }

    /// Local address of the control socket.
    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    pub fn data_channel(&self) -> &DataChannel {
        &self.data_channel
    }

    pub fn data_channel_mut(&mut self) -> &mut DataChannel {
        &mut self.data_channel
    }
}
