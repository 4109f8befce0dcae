//! Command handlers for the Solo FTP server.
//!
//! Dispatches each parsed command: the argument-count shape is checked
//! first (501), then the login state (530), then the verb's behavior.
//! Handlers translate every data-channel and filesystem error into a
//! protocol reply plus data-channel cleanup; only a failed write on the
//! control connection propagates out, which tears the session down.

use std::io;
use std::path::PathBuf;

use log::{error, info, warn};
use tokio::fs::File;
use tokio::io::AsyncWrite;

use crate::config::ServerConfig;
use crate::error::DataChannelError;
use crate::protocol::parser::Command;
use crate::protocol::responses::{self, send_reply};
use crate::session::Session;
use crate::storage::is_illegal_path;
use crate::transfer::{list_entries, send_file};

/// Whether the control loop keeps reading commands after a dispatch.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionFlow {
    Continue,
    Quit,
}

/// Dispatches one parsed command against the session.
///
/// Returns `Err` only for control-connection write failures; every
/// other error has already been reported to the client.
pub async fn handle_command<W>(
    session: &mut Session,
    command: &Command,
    writer: &mut W,
    config: &ServerConfig,
) -> io::Result<SessionFlow>
where
    W: AsyncWrite + Unpin,
{
    match command.verb.as_str() {
        "USER" => {
            if !command.has_one_arg() {
                send_reply(writer, responses::BAD_ARGUMENTS).await?;
            } else {
                handle_cmd_user(session, writer, config, &command.arg).await?;
            }
        }
        "QUIT" => {
            if !command.has_no_args() {
                send_reply(writer, responses::BAD_ARGUMENTS).await?;
            } else {
                send_reply(writer, responses::GOODBYE).await?;
                session.data_channel_mut().close_all();
                return Ok(SessionFlow::Quit);
            }
        }
        "CWD" => {
            if !command.has_one_arg() {
                send_reply(writer, responses::BAD_ARGUMENTS).await?;
            } else if !session.is_logged_in() {
                send_reply(writer, responses::NOT_LOGGED_IN).await?;
            } else {
                handle_cmd_cwd(session, writer, &command.arg).await?;
            }
        }
        "CDUP" => {
            // CDUP takes no argument; any trailing token is malformed.
            if !command.has_no_args() {
                send_reply(writer, responses::BAD_ARGUMENTS).await?;
            } else if !session.is_logged_in() {
                send_reply(writer, responses::NOT_LOGGED_IN).await?;
            } else {
                handle_cmd_cdup(session, writer).await?;
            }
        }
        "PASV" => {
            if !command.has_no_args() {
                send_reply(writer, responses::BAD_ARGUMENTS).await?;
            } else if !session.is_logged_in() {
                send_reply(writer, responses::NOT_LOGGED_IN).await?;
            } else {
                handle_cmd_pasv(session, writer).await?;
            }
        }
        "TYPE" => {
            if !command.has_one_arg() {
                send_reply(writer, responses::BAD_ARGUMENTS).await?;
            } else if !session.is_logged_in() {
                send_reply(writer, responses::NOT_LOGGED_IN).await?;
            } else {
                handle_cmd_type(writer, &command.arg).await?;
            }
        }
        "STRU" => {
            if !command.has_one_arg() {
                send_reply(writer, responses::BAD_ARGUMENTS).await?;
            } else if !session.is_logged_in() {
                send_reply(writer, responses::NOT_LOGGED_IN).await?;
            } else if command.arg == "F" {
                send_reply(writer, responses::COMMAND_OKAY).await?;
            } else {
                send_reply(writer, responses::NOT_IMPLEMENTED).await?;
            }
        }
        "MODE" => {
            if !command.has_one_arg() {
                send_reply(writer, responses::BAD_ARGUMENTS).await?;
            } else if !session.is_logged_in() {
                send_reply(writer, responses::NOT_LOGGED_IN).await?;
            } else if command.arg == "S" {
                send_reply(writer, responses::COMMAND_OKAY).await?;
            } else {
                send_reply(writer, responses::NOT_IMPLEMENTED).await?;
            }
        }
        "RETR" => {
            if !command.has_one_arg() {
                send_reply(writer, responses::BAD_ARGUMENTS).await?;
            } else if !session.is_logged_in() {
                send_reply(writer, responses::NOT_LOGGED_IN).await?;
            } else {
                handle_cmd_retr(session, writer, config, &command.arg).await?;
            }
        }
        "NLST" | "LIST" => {
            if command.has_one_arg() {
                send_reply(writer, responses::NLST_ARG_UNIMPLEMENTED).await?;
            } else if !command.has_no_args() {
                send_reply(writer, responses::SYNTAX_ERROR).await?;
            } else if !session.is_logged_in() {
                send_reply(writer, responses::NOT_LOGGED_IN).await?;
            } else {
                handle_cmd_nlst(session, writer, config).await?;
            }
        }
        _ => {
            send_reply(writer, responses::UNRECOGNIZED).await?;
        }
    }

    Ok(SessionFlow::Continue)
}

/// USER: case-insensitive compare against the single accepted identity.
/// A failed attempt after a successful login does not revoke it.
async fn handle_cmd_user<W>(
    session: &mut Session,
    writer: &mut W,
    config: &ServerConfig,
    username: &str,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if username.eq_ignore_ascii_case(&config.username) {
        session.set_logged_in();
        info!("User {} logged in", username);
        send_reply(writer, responses::LOGGED_IN).await
    } else {
        warn!("Rejected login attempt for {}", username);
        send_reply(writer, responses::BAD_USERNAME).await
    }
}

/// CWD: path guard first, then the target must be an existing
/// directory. The stored directory stays textual (no canonicalization)
/// so the guard's string-prefix anchor keeps its meaning.
async fn handle_cmd_cwd<W>(session: &mut Session, writer: &mut W, path: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if is_illegal_path(path, session.root()) {
        warn!("Refused directory change to {}", path);
        return send_reply(writer, responses::ACTION_NOT_PERMITTED).await;
    }

    let target = resolve_path(session, path);
    match tokio::fs::metadata(&target).await {
        Ok(meta) if meta.is_dir() => {
            info!("Directory changed to {}", target.display());
            session.set_current_dir(target);
            send_reply(writer, responses::DIRECTORY_CHANGED).await
        }
        Ok(_) => send_reply(writer, responses::NO_SUCH_DIRECTORY).await,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            send_reply(writer, responses::NO_PERMISSION).await
        }
        Err(_) => send_reply(writer, responses::NO_SUCH_DIRECTORY).await,
    }
}

/// CDUP: never ascends above the session root; refusing at the root is
/// idempotent and changes nothing.
async fn handle_cmd_cdup<W>(session: &mut Session, writer: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if session.at_root() {
        return send_reply(writer, responses::NO_PERMISSION).await;
    }

    let mut parent = session.current_dir().to_path_buf();
    if parent.pop() {
        info!("Directory changed to parent {}", parent.display());
        session.set_current_dir(parent);
        send_reply(writer, responses::PARENT_DIRECTORY).await
    } else {
        send_reply(writer, responses::ACTION_NOT_TAKEN).await
    }
}

/// PASV: opens a fresh passive listener, tearing down any previous
/// channel first. On bind failure the channel is left Closed and the
/// session continues.
async fn handle_cmd_pasv<W>(session: &mut Session, writer: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let control_addr = session.control_addr();
    match session.data_channel_mut().open_passive(control_addr).await {
        Ok((ip, port)) => {
            info!("Entering passive mode on {}:{}", ip, port);
            send_reply(writer, &responses::pasv_reply(ip, port)).await
        }
        Err(e) => {
            error!("Failed to enter passive mode: {}", e);
            session.data_channel_mut().close_all();
            send_reply(writer, responses::SERVICE_UNAVAILABLE).await
        }
    }
}

/// TYPE: only Image and ASCII are acknowledged; the argument itself is
/// matched case-sensitively as in RFC 959's grammar.
async fn handle_cmd_type<W>(writer: &mut W, arg: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match arg {
        "I" | "A" => send_reply(writer, responses::COMMAND_OKAY).await,
        "L" => send_reply(writer, responses::NOT_IMPLEMENTED).await,
        _ => send_reply(writer, responses::SYNTAX_ERROR).await,
    }
}

/// RETR: requires a Listening data channel; every exit path below the
/// 425 check returns the channel to Closed.
async fn handle_cmd_retr<W>(
    session: &mut Session,
    writer: &mut W,
    config: &ServerConfig,
    path: &str,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if !session.data_channel().is_listening() {
        return send_reply(writer, responses::NO_DATA_CONNECTION).await;
    }

    let target = resolve_path(session, path);
    let mut file = match File::open(&target).await {
        Ok(file) => file,
        Err(e) => {
            warn!("RETR {}: {}", target.display(), e);
            session.data_channel_mut().close_all();
            let reply = if e.kind() == io::ErrorKind::PermissionDenied {
                responses::FILE_NO_ACCESS
            } else {
                responses::FILE_NOT_FOUND
            };
            return send_reply(writer, reply).await;
        }
    };

    send_reply(writer, &responses::retr_opening(path)).await?;

    if let Err(reply) = accept_data_connection(session, config).await {
        return send_reply(writer, reply).await;
    }

    // Connected by construction after a successful accept.
    let Some(stream) = session.data_channel_mut().stream_mut() else {
        session.data_channel_mut().close_all();
        return send_reply(writer, responses::CONNECTION_FAILURE).await;
    };

    match send_file(stream, &mut file, config.buffer_size).await {
        Ok(bytes) => {
            info!("RETR {} complete ({} bytes)", target.display(), bytes);
            session.data_channel_mut().finish_transfer().await;
            send_reply(writer, responses::TRANSFER_COMPLETE).await
        }
        Err(e) => {
            error!("RETR {} aborted: {}", target.display(), e);
            session.data_channel_mut().close_all();
            send_reply(writer, responses::CONNECTION_FAILURE).await
        }
    }
}

/// NLST/LIST: lists the current directory over the data connection,
/// delegating formatting to the listing writer.
async fn handle_cmd_nlst<W>(
    session: &mut Session,
    writer: &mut W,
    config: &ServerConfig,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if !session.data_channel().is_listening() {
        return send_reply(writer, responses::NO_DATA_CONNECTION).await;
    }

    let dir = session.current_dir().to_path_buf();

    // Read access on the current directory, checked before the 150 mark.
    if let Err(e) = tokio::fs::read_dir(&dir).await {
        warn!("NLST {}: {}", dir.display(), e);
        session.data_channel_mut().close_all();
        return send_reply(writer, responses::DIRECTORY_NO_ACCESS).await;
    }

    send_reply(writer, responses::NLST_OPENING).await?;

    if let Err(reply) = accept_data_connection(session, config).await {
        return send_reply(writer, reply).await;
    }

    let Some(stream) = session.data_channel_mut().stream_mut() else {
        session.data_channel_mut().close_all();
        return send_reply(writer, responses::CONNECTION_FAILURE).await;
    };

    match list_entries(stream, &dir).await {
        Ok(()) => {
            session.data_channel_mut().finish_transfer().await;
            send_reply(writer, responses::TRANSFER_COMPLETE).await
        }
        Err(e) => {
            error!("NLST {} failed: {}", dir.display(), e);
            session.data_channel_mut().close_all();
            send_reply(writer, responses::LISTING_FAILED).await
        }
    }
}

/// Accepts the pending data connection within the configured window,
/// mapping failures to their protocol replies and closing the channel.
async fn accept_data_connection(
    session: &mut Session,
    config: &ServerConfig,
) -> Result<(), &'static str> {
    match session
        .data_channel_mut()
        .accept_with_timeout(config.accept_timeout())
        .await
    {
        Ok(()) => Ok(()),
        Err(DataChannelError::AcceptTimeout) => {
            warn!("Timed out waiting for the data connection");
            session.data_channel_mut().close_all();
            Err(responses::ACCEPT_TIMED_OUT)
        }
        Err(e) => {
            error!("Data connection failed: {}", e);
            session.data_channel_mut().close_all();
            Err(responses::CONNECTION_FAILURE)
        }
    }
}

/// Resolves a client-supplied path: absolute paths are used as given
/// (the guard has already vetted CWD arguments), relative paths are
/// joined to the current directory.
fn resolve_path(session: &Session, path: &str) -> PathBuf {
    if path.starts_with('/') {
        PathBuf::from(path)
    } else {
        session.current_dir().join(path)
    }
}
