//! Session control loop
//!
//! Reads CRLF-terminated command lines from the control connection,
//! dispatches them in order, and tears the session down on QUIT, client
//! disconnect, or a control-socket error. Responses are sent strictly
//! in command order; there is no pipelining.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use log::{error, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::TcpStream;

use crate::config::ServerConfig;
use crate::protocol::{SessionFlow, handle_command, parse_command, responses, send_reply};
use crate::session::Session;

/// Serves one control connection to completion.
///
/// The session and its data channel live exactly as long as this
/// function; every exit path releases the data-channel resources.
pub async fn handle_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    root: PathBuf,
    config: &ServerConfig,
) {
    let control_addr = match stream.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to query control socket address: {}", e);
            return;
        }
    };

    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    let mut session = Session::new(root, control_addr);

    if send_reply(&mut writer, responses::GREETING).await.is_err() {
        warn!("Client {} left before the greeting", peer_addr);
        return;
    }

    // One byte past the limit is enough to detect an over-long line
    // without buffering the rest of it.
    let read_cap = (config.max_command_length + 1) as u64;

    loop {
        line.clear();
        match (&mut reader).take(read_cap).read_line(&mut line).await {
            Ok(0) => {
                info!("Client {} disconnected", peer_addr);
                break;
            }
            Ok(_) => {
                if line.len() > config.max_command_length {
                    warn!("Client {} sent an over-long command line", peer_addr);
                    if !line.ends_with('\n') && drain_line(&mut reader).await.is_err() {
                        break;
                    }
                    if send_reply(&mut writer, responses::COMMAND_TOO_LONG)
                        .await
                        .is_err()
                    {
                        break;
                    }
                    continue;
                }

                let command = parse_command(line.trim_end_matches(['\r', '\n']));
                info!("Client {} sent {} command", peer_addr, display_verb(&command.verb));

                match handle_command(&mut session, &command, &mut writer, config).await {
                    Ok(SessionFlow::Continue) => {}
                    Ok(SessionFlow::Quit) => {
                        info!("Client {} quit", peer_addr);
                        break;
                    }
                    Err(e) => {
                        error!("Control connection to {} failed: {}", peer_addr, e);
                        break;
                    }
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    // Same teardown on QUIT, EOF, and transport error.
    session.data_channel_mut().close_all();
    info!("Session with {} ended", peer_addr);
}

fn display_verb(verb: &str) -> &str {
    if verb.is_empty() { "(empty)" } else { verb }
}

/// Discards the remainder of an over-long command line, in bounded
/// chunks, up to and including its terminating newline (or EOF).
async fn drain_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut skipped = Vec::new();
        let n = (&mut *reader).take(512).read_until(b'\n', &mut skipped).await?;
        if n == 0 || skipped.ends_with(b"\n") {
            return Ok(());
        }
    }
}
