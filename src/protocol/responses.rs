//! FTP response handling
//!
//! Reply lines sent on the control connection. Replies are single
//! CRLF-terminated lines; no multi-line continuations are produced.

use std::io;
use std::net::Ipv4Addr;

use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const GREETING: &str = "220 Welcome. Server is ready. Provide a username.\r\n";
pub const GOODBYE: &str = "221 Bye.\r\n";
pub const COMMAND_OKAY: &str = "200 Command okay.\r\n";
pub const LOGGED_IN: &str = "230 User logged in, proceed.\r\n";
pub const DIRECTORY_CHANGED: &str = "250 Directory change has been completed.\r\n";
pub const PARENT_DIRECTORY: &str = "200 Directory changed to the parent.\r\n";
pub const TRANSFER_COMPLETE: &str =
    "226 Closing data connection. Requested file action successful.\r\n";

pub const SERVICE_UNAVAILABLE: &str = "421 Service not available, closing control connection.\r\n";
pub const NO_DATA_CONNECTION: &str =
    "425 Can't open data connection. Enable passive mode first.\r\n";
pub const ACCEPT_TIMED_OUT: &str = "425 No connection was established.\r\n";
pub const CONNECTION_FAILURE: &str = "426 Connection failure.\r\n";
pub const LISTING_FAILED: &str = "451 Cannot read the directory.\r\n";

pub const UNRECOGNIZED: &str = "500 Syntax error, command unrecognized.\r\n";
pub const COMMAND_TOO_LONG: &str = "500 Command line too long.\r\n";
pub const BAD_ARGUMENTS: &str = "501 Syntax error, verify your input.\r\n";
pub const SYNTAX_ERROR: &str = "501 Syntax error.\r\n";
pub const NLST_ARG_UNIMPLEMENTED: &str = "502 NLST with arguments not implemented.\r\n";
pub const NOT_IMPLEMENTED: &str = "504 Not implemented.\r\n";

pub const NOT_LOGGED_IN: &str = "530 Not logged in.\r\n";
pub const BAD_USERNAME: &str = "530 Incorrect username, not logged in.\r\n";

pub const ACTION_NOT_PERMITTED: &str = "550 Action not permitted.\r\n";
pub const NO_PERMISSION: &str = "550 Action not taken, no permission.\r\n";
pub const NO_SUCH_DIRECTORY: &str = "550 No such file or directory.\r\n";
pub const ACTION_NOT_TAKEN: &str = "550 Action cannot be taken.\r\n";
pub const FILE_NOT_FOUND: &str = "550 File not found.\r\n";
pub const FILE_NO_ACCESS: &str = "550 No access to the file.\r\n";
pub const DIRECTORY_NO_ACCESS: &str = "550 No access to the directory.\r\n";

/// Format the 150 mark announcing a RETR data connection.
pub fn retr_opening(path: &str) -> String {
    format!(
        "150 File status okay. About to open data connection for {}.\r\n",
        path
    )
}

pub const NLST_OPENING: &str = "150 Directory status okay. About to open data connection.\r\n";

/// Format the 227 reply: IP octets plus the data port split into
/// high/low bytes (`port = p1 * 256 + p2`).
pub fn pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{})\r\n",
        h1,
        h2,
        h3,
        h4,
        port / 256,
        port % 256
    )
}

/// Write one reply line on the control connection and flush it.
pub async fn send_reply<W>(writer: &mut W, reply: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(reply.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pasv_reply_splits_port_into_bytes() {
        let reply = pasv_reply(Ipv4Addr::new(127, 0, 0, 1), 4096);
        assert_eq!(reply, "227 Entering Passive Mode (127,0,0,1,16,0)\r\n");
    }

    #[test]
    fn pasv_reply_low_byte_only() {
        let reply = pasv_reply(Ipv4Addr::new(10, 0, 42, 7), 255);
        assert_eq!(reply, "227 Entering Passive Mode (10,0,42,7,0,255)\r\n");
    }
}
