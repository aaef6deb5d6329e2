mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use console::{ConsoleCommand, HELP};
use dialoguer::Input;
use duet::RoomId;
use duet::client::{
    CallState, ClientConfig, LocalTrack, MediaConstraints, RoomCoordinator, SessionHandle,
    SessionSnapshot, SyntheticSource, TrackKind,
};
use duet::server::RelayConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duet")]
#[command(about = "Two-party audio/video calls over WebRTC")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        /// Listen address (overrides DUET_RELAY_ADDR).
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Join a room and drive a call from the terminal.
    Join {
        room: String,

        /// Relay base URL (overrides DUET_SIGNALING_URL).
        #[arg(long)]
        url: Option<String>,

        /// Join without local media; calls cannot be started until `media` succeeds.
        #[arg(long)]
        no_media: bool,

        /// Wait for `accept` instead of answering incoming calls.
        #[arg(long)]
        manual_answer: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Cli::parse().command {
        Commands::Serve { addr } => serve(addr).await,
        Commands::Join {
            room,
            url,
            no_media,
            manual_answer,
        } => join(room, url, no_media, manual_answer).await,
    }
}

async fn serve(addr: Option<SocketAddr>) -> Result<()> {
    let mut config = RelayConfig::from_env()?;
    if let Some(addr) = addr {
        config.addr = addr;
    }

    println!(
        "{} {}",
        "Relay listening on".green().bold(),
        config.addr.to_string().cyan()
    );
    duet::server::serve(config).await
}

async fn join(room: String, url: Option<String>, no_media: bool, manual_answer: bool) -> Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = url {
        config.signaling_url = url;
    }
    if no_media {
        config.media = MediaConstraints {
            audio: false,
            video: false,
        };
    }
    if manual_answer {
        config.auto_answer = false;
    }

    let (handle, mut task) =
        RoomCoordinator::join_with_config(RoomId::from(room.as_str()), &config, Arc::new(SyntheticSource::new()))
            .await
            .with_context(|| format!("Failed to join room '{room}' via {}", config.signaling_url))?;

    println!(
        "{} {} {} {}",
        "Joined room".green().bold(),
        room.cyan(),
        "as".green(),
        handle.local_id().to_string().dimmed()
    );
    println!("{}", "Type 'help' for commands.".dimmed());

    tokio::spawn(print_state_changes(handle.clone()));
    let mut lines = spawn_prompt();
    let mut extra_tracks = 0usize;

    loop {
        tokio::select! {
            _ = &mut task => {
                println!("{}", "Session finished.".yellow());
                return Ok(());
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("Prompt closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<ConsoleCommand>() {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", e.red());
                        continue;
                    }
                };
                if command == ConsoleCommand::Quit {
                    break;
                }
                run_command(&handle, command, &mut extra_tracks).await;
            }
        }
    }

    handle.end();
    if tokio::time::timeout(Duration::from_secs(2), task).await.is_err() {
        warn!("Session did not shut down in time");
    }
    Ok(())
}

async fn run_command(handle: &SessionHandle, command: ConsoleCommand, extra_tracks: &mut usize) {
    let res = match command {
        ConsoleCommand::Call => handle.call().await,
        ConsoleCommand::Accept => handle.accept().await,
        ConsoleCommand::Cancel => handle.cancel().await,
        ConsoleCommand::End => {
            handle.end();
            Ok(())
        }
        ConsoleCommand::Track => {
            *extra_tracks += 1;
            let stream_id = handle
                .snapshot()
                .local_stream_id
                .unwrap_or_else(|| "duet-extra".to_string());
            let track = LocalTrack::new(
                TrackKind::Video,
                format!("extra-video-{}", extra_tracks),
                stream_id,
            );
            handle.attach_track(track).await
        }
        ConsoleCommand::Media => {
            handle.retry_media();
            Ok(())
        }
        ConsoleCommand::Status => {
            print_snapshot(&handle.snapshot());
            Ok(())
        }
        ConsoleCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        ConsoleCommand::Quit => Ok(()),
    };

    if let Err(e) = res {
        println!("{} {}", "✗".red().bold(), e.to_string().red());
    }
}

/// Reads prompt lines on a plain thread; stdin blocks and must not hold up the runtime.
fn spawn_prompt() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            let line = Input::<String>::new()
                .with_prompt("duet")
                .allow_empty(true)
                .interact_text();
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}

async fn print_state_changes(handle: SessionHandle) {
    let mut rx = handle.subscribe();
    let mut last = rx.borrow_and_update().state;
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.state != last {
            last = snapshot.state;
            println!("{} {}", "→".bold(), paint(snapshot.state));
        }
    }
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    println!("  state:  {}", paint(snapshot.state));
    println!(
        "  remote: {}",
        snapshot
            .remote_peer_id
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "  local media:  {}",
        snapshot.local_stream_id.as_deref().unwrap_or("none")
    );
    println!(
        "  remote media: {} track(s)",
        snapshot
            .remote_stream
            .as_ref()
            .map(|s| s.tracks.len())
            .unwrap_or(0)
    );
}

fn paint(state: CallState) -> ColoredString {
    let label = state.to_string();
    match state {
        CallState::Connected => label.green().bold(),
        CallState::Calling | CallState::IncomingPending | CallState::Negotiating => label.yellow(),
        CallState::Ending | CallState::Ended => label.red(),
        CallState::Idle | CallState::WaitingForRemote => label.cyan(),
    }
}
