use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use huddle::client::{
    connect, ClientConfig, MediaConstraints, SessionEvent, SessionHandle,
};
use huddle::RoomCode;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Host or join a huddle room from the terminal")]
struct Cli {
    /// Signaling relay endpoint.
    #[arg(long, env = "HUDDLE_SERVER", default_value = "ws://127.0.0.1:3001/ws")]
    server: String,

    /// Skip the camera; publish audio only.
    #[arg(long)]
    audio_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a room and wait for participants.
    Host,
    /// Join an existing room by its 6-character code.
    Join {
        /// Room code; prompted for interactively when omitted.
        code: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let constraints = MediaConstraints {
        audio: true,
        video: !cli.audio_only,
    };

    println!("{}", "📡 Connecting to relay...".cyan());
    let (session, events) = connect(ClientConfig::new(&cli.server))
        .await
        .context("Failed to reach the signaling relay")?;

    let info = match cli.command {
        Commands::Host => session
            .start_session(constraints)
            .await
            .context("Failed to create a room")?,
        Commands::Join { code } => {
            let code = match code {
                Some(code) => code,
                None => prompt_for_code()?,
            };
            session
                .join_session(&code, constraints)
                .await
                .context("Failed to join the room")?
        }
    };

    println!(
        "{} {} {}",
        "🎙 In room".green().bold(),
        info.code.to_string().green().bold(),
        format!("as {} ({} inside)", info.role, info.participant_count).dimmed()
    );
    println!("{}", "Press Ctrl-C to leave.".dimmed());

    run_events(&session, events).await;

    session.leave_room().await.ok();
    session.disconnect().await.ok();
    println!("{}", "👋 Left the room.".yellow());
    Ok(())
}

fn prompt_for_code() -> Result<String> {
    let code: String = Input::new()
        .with_prompt("Room code")
        .validate_with(|input: &String| match RoomCode::parse(input) {
            Ok(_) => Ok(()),
            Err(err) => Err(err.to_string()),
        })
        .interact_text()?;
    Ok(code)
}

async fn run_events(session: &SessionHandle, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return,
            event = events.recv() => {
                let Some(event) = event else { return };
                if matches!(event, SessionEvent::TransportRestored) {
                    match session.resume().await {
                        Ok(info) => println!(
                            "{} {}",
                            "🔁 Rejoined".green(),
                            info.code.to_string().green().bold()
                        ),
                        Err(err) => println!("{} {}", "Could not rejoin:".red(), err),
                    }
                    continue;
                }
                print_event(&event);
                if matches!(
                    event,
                    SessionEvent::SessionEnded { .. } | SessionEvent::TransportFailed
                ) {
                    return;
                }
            }
        }
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::StatusChanged(status) => {
            println!("{} {}", "status:".bold(), status);
        }
        SessionEvent::ParticipantJoined {
            participant,
            participant_count,
        } => {
            println!(
                "{} {} ({} in room)",
                "joined:".green(),
                participant,
                participant_count
            );
        }
        SessionEvent::ParticipantLeft {
            participant,
            participant_count,
        } => {
            println!(
                "{} {} ({} in room)",
                "left:".yellow(),
                participant,
                participant_count
            );
        }
        SessionEvent::RoomUpdated { participant_count } => {
            println!("{} {} participants", "roster:".cyan(), participant_count);
        }
        SessionEvent::LinkChanged { participant, state } => {
            println!("{} {} is {}", "link:".cyan(), participant, state);
        }
        SessionEvent::RemoteTrack { participant, track } => {
            println!("{} {} published {}", "media:".cyan(), participant, track.kind);
        }
        SessionEvent::SessionEnded { message, .. } => {
            println!("{} {}", "ended:".red().bold(), message);
        }
        SessionEvent::TransportLost => {
            println!("{}", "⚠ relay connection lost, reconnecting...".red());
        }
        SessionEvent::TransportRestored => {}
        SessionEvent::TransportFailed => {
            println!("{}", "✖ relay connection failed for good".red().bold());
        }
        SessionEvent::Fault {
            participant,
            operation,
            detail,
        } => match participant {
            Some(participant) => println!(
                "{} {} with {}: {}",
                "fault:".red(),
                operation,
                participant,
                detail
            ),
            None => println!("{} {}: {}", "fault:".red(), operation, detail),
        },
    }
}
