//! End-to-end tests over real sockets: one server per test, one client
//! driving the control connection and, for transfers, the passive data
//! connection.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use solo_ftp_server::{Server, ServerConfig};

static TEST_ID: AtomicUsize = AtomicUsize::new(0);

/// Creates a fresh server root under the system temp directory.
async fn make_root() -> PathBuf {
    let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
    let root = std::env::temp_dir().join(format!("solo-ftp-it-{}-{}", std::process::id(), id));
    let _ = tokio::fs::remove_dir_all(&root).await;
    tokio::fs::create_dir_all(&root).await.unwrap();
    root
}

/// Binds a server on an ephemeral port rooted at `root` and runs it in
/// the background.
async fn start_server(root: &PathBuf) -> SocketAddr {
    let config = ServerConfig {
        bind_address: "127.0.0.1".to_string(),
        server_root: root.to_string_lossy().into_owned(),
        accept_timeout_secs: 5,
        ..ServerConfig::default()
    };
    let server = Server::bind("0", config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move { server.start().await });
    addr
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    /// Connects and consumes the greeting line.
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer,
        };
        let greeting = client.reply().await;
        assert!(greeting.starts_with("220"), "greeting: {}", greeting);
        client
    }

    async fn reply(&mut self) -> String {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.unwrap();
        assert!(n > 0, "server closed the control connection");
        line
    }

    async fn send(&mut self, command: &str) {
        self.writer
            .write_all(format!("{}\r\n", command).as_bytes())
            .await
            .unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn cmd(&mut self, command: &str) -> String {
        self.send(command).await;
        self.reply().await
    }

    async fn login(&mut self) {
        let reply = self.cmd("USER cs317").await;
        assert!(reply.starts_with("230"), "login: {}", reply);
    }

    /// Issues PASV and returns the announced data address.
    async fn enter_passive(&mut self) -> SocketAddr {
        let reply = self.cmd("PASV").await;
        assert!(reply.starts_with("227"), "PASV: {}", reply);
        parse_pasv_reply(&reply)
    }
}

/// Parses `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`, checking
/// that all six fields are in octet range.
fn parse_pasv_reply(reply: &str) -> SocketAddr {
    let open = reply.find('(').expect("no opening paren");
    let close = reply.find(')').expect("no closing paren");
    let fields: Vec<u16> = reply[open + 1..close]
        .split(',')
        .map(|f| f.trim().parse::<u16>().expect("non-numeric PASV field"))
        .collect();
    assert_eq!(fields.len(), 6, "PASV fields: {}", reply);
    for field in &fields {
        assert!(*field <= 255, "field out of octet range: {}", reply);
    }
    format!(
        "{}.{}.{}.{}:{}",
        fields[0],
        fields[1],
        fields[2],
        fields[3],
        fields[4] * 256 + fields[5]
    )
    .parse()
    .unwrap()
}

#[tokio::test]
async fn login_is_required_and_case_insensitive() {
    let root = make_root().await;
    let addr = start_server(&root).await;
    let mut client = Client::connect(addr).await;

    // Login check precedes the path check.
    let reply = client.cmd("CWD ../secret").await;
    assert!(reply.starts_with("530"), "{}", reply);

    let reply = client.cmd("USER someone").await;
    assert!(reply.starts_with("530"), "{}", reply);

    let reply = client.cmd("USER CS317").await;
    assert!(reply.starts_with("230"), "{}", reply);

    // Same traversal attempt now fails on the path policy instead.
    let reply = client.cmd("CWD ../secret").await;
    assert!(reply.starts_with("550"), "{}", reply);
}

#[tokio::test]
async fn unrecognized_verb_keeps_the_session_usable() {
    let root = make_root().await;
    let addr = start_server(&root).await;
    let mut client = Client::connect(addr).await;

    let reply = client.cmd("FOO").await;
    assert_eq!(reply, "500 Syntax error, command unrecognized.\r\n");

    client.login().await;
    let reply = client.cmd("TYPE I").await;
    assert!(reply.starts_with("200"), "{}", reply);
}

#[tokio::test]
async fn retr_streams_the_file_and_closes_the_data_socket() {
    let root = make_root().await;
    let content: Vec<u8> = (0..4096u32).map(|i| (i % 241) as u8).collect();
    tokio::fs::write(root.join("blob.bin"), &content)
        .await
        .unwrap();
    let addr = start_server(&root).await;

    let mut client = Client::connect(addr).await;
    client.login().await;

    let data_addr = client.enter_passive().await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();

    let reply = client.cmd("RETR blob.bin").await;
    assert!(reply.starts_with("150"), "{}", reply);

    let mut received = Vec::new();
    data.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, content);

    let reply = client.reply().await;
    assert!(reply.starts_with("226"), "{}", reply);
}

#[tokio::test]
async fn nlst_lists_the_current_directory() {
    let root = make_root().await;
    tokio::fs::write(root.join("alpha.txt"), b"a").await.unwrap();
    tokio::fs::write(root.join("beta.txt"), b"b").await.unwrap();
    let addr = start_server(&root).await;

    let mut client = Client::connect(addr).await;
    client.login().await;

    let data_addr = client.enter_passive().await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();

    let reply = client.cmd("NLST").await;
    assert!(reply.starts_with("150"), "{}", reply);

    let mut listing = String::new();
    data.read_to_string(&mut listing).await.unwrap();
    assert!(listing.contains("alpha.txt"), "listing: {}", listing);
    assert!(listing.contains("beta.txt"), "listing: {}", listing);

    let reply = client.reply().await;
    assert!(reply.starts_with("226"), "{}", reply);
}

#[tokio::test]
async fn nlst_with_argument_is_rejected_as_unimplemented() {
    let root = make_root().await;
    let addr = start_server(&root).await;
    let mut client = Client::connect(addr).await;
    client.login().await;

    let reply = client.cmd("NLST pub").await;
    assert!(reply.starts_with("502"), "{}", reply);

    let reply = client.cmd("LIST a b").await;
    assert!(reply.starts_with("501"), "{}", reply);
}

#[tokio::test]
async fn failed_retr_closes_the_channel_and_pasv_recovers() {
    let root = make_root().await;
    let addr = start_server(&root).await;
    let mut client = Client::connect(addr).await;
    client.login().await;

    client.enter_passive().await;
    let reply = client.cmd("RETR missing.txt").await;
    assert!(reply.starts_with("550"), "{}", reply);

    // The data channel is back to Closed: RETR needs a fresh PASV...
    let reply = client.cmd("RETR missing.txt").await;
    assert!(reply.starts_with("425"), "{}", reply);

    // ...and a fresh PASV immediately succeeds.
    client.enter_passive().await;
}

#[tokio::test]
async fn pasv_twice_rebinds_and_data_commands_still_work() {
    let root = make_root().await;
    tokio::fs::write(root.join("file.txt"), b"hello").await.unwrap();
    let addr = start_server(&root).await;

    let mut client = Client::connect(addr).await;
    client.login().await;

    let first = client.enter_passive().await;
    let second = client.enter_passive().await;

    // Only the second listener is live.
    let mut data = TcpStream::connect(second).await.unwrap();
    let _ = first;

    let reply = client.cmd("RETR file.txt").await;
    assert!(reply.starts_with("150"), "{}", reply);

    let mut received = Vec::new();
    data.read_to_end(&mut received).await.unwrap();
    assert_eq!(received, b"hello");

    let reply = client.reply().await;
    assert!(reply.starts_with("226"), "{}", reply);
}

#[tokio::test]
async fn directory_navigation_respects_the_session_root() {
    let root = make_root().await;
    tokio::fs::create_dir_all(root.join("pub/inner")).await.unwrap();
    let addr = start_server(&root).await;

    let mut client = Client::connect(addr).await;
    client.login().await;

    // CDUP at the session root is always refused.
    let reply = client.cmd("CDUP").await;
    assert!(reply.starts_with("550"), "{}", reply);

    let reply = client.cmd("CWD pub/inner").await;
    assert!(reply.starts_with("250"), "{}", reply);

    let reply = client.cmd("CDUP").await;
    assert!(reply.starts_with("200"), "{}", reply);

    let reply = client.cmd("CDUP").await;
    assert!(reply.starts_with("200"), "{}", reply);

    // Back at the root, the refusal returns.
    let reply = client.cmd("CDUP").await;
    assert!(reply.starts_with("550"), "{}", reply);

    let reply = client.cmd("CWD nowhere").await;
    assert!(reply.starts_with("550"), "{}", reply);
}

#[tokio::test]
async fn quit_ends_the_session_and_the_next_client_is_served() {
    let root = make_root().await;
    let addr = start_server(&root).await;

    let mut client = Client::connect(addr).await;
    let reply = client.cmd("QUIT").await;
    assert!(reply.starts_with("221"), "{}", reply);

    // Control connection is closed after the goodbye.
    let mut line = String::new();
    let n = client.reader.read_line(&mut line).await.unwrap();
    assert_eq!(n, 0, "expected EOF, got {}", line);

    // The serial accept loop picks up the next client.
    let mut next = Client::connect(addr).await;
    let reply = next.cmd("USER cs317").await;
    assert!(reply.starts_with("230"), "{}", reply);
}

#[tokio::test]
async fn over_long_command_line_is_rejected_and_the_session_continues() {
    let root = make_root().await;
    let addr = start_server(&root).await;
    let mut client = Client::connect(addr).await;

    // Default limit is 1024 bytes; blow well past it in one line.
    let long_line = format!("RETR {}", "a".repeat(3000));
    let reply = client.cmd(&long_line).await;
    assert_eq!(reply, "500 Command line too long.\r\n");

    // The rest of the line was discarded, not parsed as commands.
    let reply = client.cmd("USER cs317").await;
    assert!(reply.starts_with("230"), "{}", reply);
    let reply = client.cmd("TYPE I").await;
    assert!(reply.starts_with("200"), "{}", reply);
}

#[tokio::test]
async fn argument_shape_is_checked_before_login() {
    let root = make_root().await;
    let addr = start_server(&root).await;
    let mut client = Client::connect(addr).await;

    // 501 for bad shapes even when not logged in.
    let reply = client.cmd("USER").await;
    assert!(reply.starts_with("501"), "{}", reply);
    let reply = client.cmd("CDUP extra").await;
    assert!(reply.starts_with("501"), "{}", reply);
    let reply = client.cmd("QUIT now").await;
    assert!(reply.starts_with("501"), "{}", reply);
    let reply = client.cmd("TYPE A N 8").await;
    assert!(reply.starts_with("501"), "{}", reply);
}
