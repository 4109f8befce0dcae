//! Module `file_ops`
//!
//! Streams file content over the data connection for RETR. A failed
//! read or send is reported once and the transfer is abandoned; there
//! is no retry.

use std::io;

use log::info;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Streams `file` to `writer` in `buffer_size` chunks, returning the
/// number of bytes sent. Any I/O error aborts the transfer mid-stream.
pub async fn send_file<W>(writer: &mut W, file: &mut File, buffer_size: usize) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n]).await?;
        total += n as u64;
    }

    writer.flush().await?;
    info!("File transfer finished ({} bytes)", total);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn temp_file(name: &str, content: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("solo-ftp-{}-{}", std::process::id(), name));
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn streams_whole_file_in_small_chunks() {
        let content: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        let path = temp_file("chunks.bin", &content).await;

        let mut file = File::open(&path).await.unwrap();
        let mut sink = Vec::new();
        let sent = send_file(&mut sink, &mut file, 512).await.unwrap();

        assert_eq!(sent, content.len() as u64);
        assert_eq!(sink, content);
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn empty_file_sends_zero_bytes() {
        let path = temp_file("empty.bin", b"").await;

        let mut file = File::open(&path).await.unwrap();
        let mut sink = Vec::new();
        let sent = send_file(&mut sink, &mut file, 512).await.unwrap();

        assert_eq!(sent, 0);
        assert!(sink.is_empty());
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
