// Host binary: moderates `sender: text` lines read from stdin

use anyhow::Result;
use log::{error, info, warn};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use chatgate::prelude::*;

const DEFAULT_CONFIG_PATH: &str = "config/moderation.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables and initialize logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("Starting chatgate v{}", chatgate::VERSION);

    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var("CHATGATE_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config_manager = ConfigurationManager::new(&config_path);
    if let Err(e) = config_manager.initialize().await {
        error!("Failed to load moderation settings: {}", e);
        return Err(e);
    }
    let settings = config_manager.get_settings().await;

    let gate = Arc::new(ModerationGate::new(&settings)?);

    if let Err(e) = config_manager.watch().await {
        warn!("Hot-reload disabled, could not watch {}: {}", config_path.display(), e);
    }
    let _binding = config_manager.bind_gate(gate.clone());

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let sweeper = Sweeper::spawn_following(gate.clone(), shutdown_rx);

    info!("Reading messages from stdin as 'sender: text'");
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();

    loop {
        tokio::select! {
            line = read_line_lossy(&mut stdin, &mut buf) => {
                match line {
                    Ok(Some(line)) => {
                        if let Some(json) = handle_line(&gate, &line) {
                            println!("{}", json);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(());
    if let Err(e) = sweeper.await {
        error!("Sweeper task failed: {}", e);
    }

    info!("Final stats: {}", serde_json::to_string(&gate.stats())?);
    Ok(())
}

/// Read one line, replacing invalid UTF-8 instead of failing. `None` at EOF.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(buf);
    if matches!(line, std::borrow::Cow::Owned(_)) {
        warn!("Replaced invalid UTF-8 in input line");
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Moderate one input line and render its verdict as JSON
fn handle_line(gate: &ModerationGate, line: &str) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }

    let Some((sender, text)) = parse_line(line) else {
        warn!("Ignoring line without a sender prefix: {}", line);
        return None;
    };

    let report = gate.validate(text, sender).to_report(sender);
    match serde_json::to_string(&report) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("Failed to serialize verdict: {}", e);
            None
        }
    }
}

/// Split `sender: text`. Only the first colon separates the two.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (sender, text) = line.split_once(':')?;
    let sender = sender.trim();
    if sender.is_empty() {
        return None;
    }
    Some((sender, text.strip_prefix(' ').unwrap_or(text)))
}
