// src/bin/linechat-client.rs

//! Interactive terminal client for the linechat server.
//!
//! Prompts for a nickname, then relays terminal input to the server and
//! prints every frame the server sends back. A thin protocol wrapper: all
//! routing decisions live on the server.

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use linechat::config::Config;
use linechat::core::commands::QUIT_TOKEN;
use linechat::core::protocol::LineCodec;
use std::env;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let defaults = Config::default();
    let host = flag_value(&args, "--host")
        .unwrap_or(defaults.host.as_str())
        .to_string();
    let port: u16 = match flag_value(&args, "--port") {
        Some(p) => p.parse().context("Invalid port number")?,
        None => defaults.port,
    };

    print!("Enter a nickname: ");
    std::io::stdout().flush()?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let nickname = match stdin.next_line().await? {
        Some(line) => line.trim().to_string(),
        None => String::new(),
    };
    if nickname.is_empty() {
        eprintln!("A nickname is required.");
        return Ok(());
    }

    let stream = TcpStream::connect((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to connect to {host}:{port}"))?;
    let mut framed = Framed::new(stream, LineCodec::default());

    // The first frame registers the nickname.
    framed.send(nickname).await?;
    println!("Connected. '{QUIT_TOKEN}' to leave, '/w <nickname> <message>' to whisper.");

    loop {
        tokio::select! {
            incoming = framed.next() => {
                match incoming {
                    Some(Ok(line)) => println!("{line}"),
                    Some(Err(e)) => {
                        eprintln!("Connection error: {e}");
                        break;
                    }
                    None => {
                        println!("Server closed the connection.");
                        break;
                    }
                }
            }
            line = stdin.next_line() => {
                // EOF on the terminal quits gracefully.
                let line = line?.unwrap_or_else(|| QUIT_TOKEN.to_string());
                if line.is_empty() {
                    continue;
                }
                let quitting = line.trim() == QUIT_TOKEN;
                framed.send(line).await?;
                if quitting {
                    // Print the server's farewell before exiting.
                    if let Some(Ok(farewell)) = framed.next().await {
                        println!("{farewell}");
                    }
                    break;
                }
            }
        }
    }

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
