// src/main.rs

//! The main entry point for the linechat server application.

use anyhow::Result;
use linechat::config::Config;
use linechat::server;
use std::env;
use tracing::error;
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("linechat version {VERSION}");
        return Ok(());
    }

    // The configuration path can be provided via a --config flag. Without
    // the flag the server reads "config.toml" when present, and otherwise
    // runs on built-in defaults so it works out of the box.
    let explicit_config = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let mut config = match explicit_config {
        Some(path) => match Config::from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from \"{path}\": {e}");
                std::process::exit(1);
            }
        },
        None if std::path::Path::new("config.toml").exists() => {
            match Config::from_file("config.toml") {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("Failed to load configuration from \"config.toml\": {e}");
                    std::process::exit(1);
                }
            }
        }
        None => Config::default(),
    };

    // Override host and port if provided as command-line arguments.
    if let Some(host_index) = args.iter().position(|arg| arg == "--host") {
        match args.get(host_index + 1) {
            Some(host) => config.host = host.clone(),
            None => {
                eprintln!("--host flag requires a value");
                std::process::exit(1);
            }
        }
    }
    if let Some(port_index) = args.iter().position(|arg| arg == "--port") {
        match args.get(port_index + 1) {
            Some(port_str) => match port_str.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => {
                    eprintln!("Invalid port number: {port_str}");
                    std::process::exit(1);
                }
            },
            None => {
                eprintln!("--port flag requires a value");
                std::process::exit(1);
            }
        }
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Log level from the environment, falling back to the configured level.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .compact()
        .with_ansi(true)
        .init();

    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {}", e);
        return Err(e);
    }

    Ok(())
}
