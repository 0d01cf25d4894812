use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{error, info, warn};

use crate::api::dto::{AnalyzeParams, CommandReq};
use crate::application::build_call_graph;
use crate::infrastructure::JsonProgramLoader;
use crate::ports::ProgramSource;

pub fn start_server(port: u16) -> Result<()> {
    let address = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&address).with_context(|| format!("Failed to bind to {}", address))?;

    info!("API server listening on {}", address);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream) {
                        warn!("Connection error: {}", e);
                    }
                });
            }
            Err(e) => error!("Accept error: {}", e),
        }
    }

    Ok(())
}

fn handle_connection(mut stream: TcpStream) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break; // Connection closed
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response_str = serde_json::to_string(&respond(trimmed))?;
        stream.write_all(response_str.as_bytes())?;
        stream.write_all(b"\n")?;

        if let Ok(req) = serde_json::from_str::<CommandReq>(trimmed) {
            if req.command == "SHUTDOWN" {
                info!("Shutdown requested.");
                std::process::exit(0);
            }
        }
    }
    Ok(())
}

/// Wrap the outcome of a request line in the response envelope.
pub fn respond(json_str: &str) -> serde_json::Value {
    match process_command(json_str) {
        Ok(data) => json!({
            "status": "success",
            "data": data
        }),
        Err(e) => json!({
            "status": "error",
            "message": format!("{:#}", e)
        }),
    }
}

pub fn process_command(json_str: &str) -> Result<serde_json::Value> {
    let req: CommandReq = serde_json::from_str(json_str).context("Invalid JSON format")?;

    match req.command.as_str() {
        "PING" => Ok(json!("PONG")),
        "ANALYZE" => handle_analyze(req.params),
        "SHUTDOWN" => Ok(json!("Shutting down...")),
        _ => anyhow::bail!("Unknown command: {}", req.command),
    }
}

fn handle_analyze(params: Option<serde_json::Value>) -> Result<serde_json::Value> {
    let params = params.ok_or_else(|| anyhow::anyhow!("Missing params for ANALYZE"))?;
    let params: AnalyzeParams = serde_json::from_value(params).context("Invalid ANALYZE params")?;

    if !Path::new(&params.path).exists() {
        anyhow::bail!("Program file not found: {}", params.path);
    }
    let config = params.to_config()?;

    info!("Analyzing: {} ({})", params.path, config.algorithm);

    let program = JsonProgramLoader::new(&params.path).load_program()?;
    let graph = build_call_graph(&program, &config)?;

    Ok(serde_json::to_value(graph)?)
}
