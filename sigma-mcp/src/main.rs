//! Sigma MCP Server
//!
//! JSON-RPC 2.0 over stdio, one request per line. Logs go to stderr;
//! stdout carries only protocol messages.
//!
//! Tools:
//! - solve: Solve a query with step-by-step output
//! - classify: Show the detected format and parse outcome of a query
//! - list_solvers: Describe the registered solvers

mod config;
mod handlers;

use config::ServerConfig;
use handlers::{McpRequest, McpResponse, Server, PROTOCOL_VERSION, SERVER_VERSION};
use std::io::{self, BufRead, Write};

fn init_logging(config: &ServerConfig) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

fn write_response(response: &McpResponse) -> io::Result<()> {
    let response_json = serde_json::to_string(response).map_err(io::Error::other)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", response_json)?;
    stdout.flush()
}

fn main() {
    let config = ServerConfig::from_env();
    init_logging(&config);

    tracing::info!(
        version = SERVER_VERSION,
        protocol = PROTOCOL_VERSION,
        max_input_size = config.max_input_size,
        max_steps = config.max_steps,
        "Sigma MCP Server started"
    );

    let server = Server::new(config);

    let stdin = io::stdin();
    let mut reader = io::BufReader::new(stdin.lock());

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                tracing::info!("client disconnected (EOF)");
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                tracing::debug!(bytes = line.len(), "received");

                let request: McpRequest = match serde_json::from_str(line) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed request");
                        if let Err(e) = write_response(&McpResponse::parse_error(e)) {
                            tracing::error!(error = %e, "error writing response");
                            break;
                        }
                        continue;
                    }
                };

                let response = server.handle_request(&request);

                // Notifications (no id) should NOT receive a response
                if request.id.is_none() {
                    tracing::debug!(method = %request.method, "notification processed");
                    continue;
                }

                if let Err(e) = write_response(&response) {
                    tracing::error!(error = %e, "error writing response");
                    break;
                }
                tracing::debug!(method = %request.method, "sent response");
            }
            Err(e) => {
                tracing::error!(error = %e, "error reading input");
                break;
            }
        }
    }

    tracing::info!("server shutting down");
}
