//! Solo FTP Server - Entry Point
//!
//! A single-client FTP server implementing a restricted subset of RFC 959.

use std::process;

use log::info;

use solo_ftp_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    // Exactly one argument: the control-connection port (number or service name)
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "solo-ftp-server".to_string());
    let port = match (args.next(), args.next()) {
        (Some(port), None) => port,
        _ => {
            eprintln!("usage: {} <port>", program);
            process::exit(1);
        }
    };

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: configuration error: {}", program, e);
            process::exit(1);
        }
    };

    info!("Launching FTP server on port {}...", port);

    let server = match Server::bind(&port, config).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("{}: {}", program, e);
            process::exit(1);
        }
    };

    server.start().await;
}
