//! Module `listing`
//!
//! Writes the NLST directory listing over the data connection: one
//! entry name per CRLF-terminated line, in directory order.

use std::io;
use std::path::Path;

use log::debug;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Enumerates `dir` and writes each entry name to `writer`. Any
/// enumeration or write failure is reported to the caller, which maps
/// it to a 451 reply.
pub async fn list_entries<W>(writer: &mut W, dir: &Path) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count = 0usize;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        writer.write_all(name.to_string_lossy().as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        count += 1;
    }

    writer.flush().await?;
    debug!("Listed {} entries in {}", count, dir.display());
    Ok(())
}
