use std::{io, process::ExitCode, time::Duration};

use clap::{Parser, Subcommand};
use rcon_client::{Listeners, RconError, RconSession};
use rcon_core::{DEFAULT_REPLY_TIMEOUT, SessionConfig, SessionIdentity};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rcon", about = "Websocket RCON client")]
struct Cli {
    #[arg(long, env = "RCON_HOST", default_value = "127.0.0.1")]
    host: String,
    #[arg(long, env = "RCON_PORT", default_value_t = 28016)]
    port: u16,
    #[arg(long, env = "RCON_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, env = "RCON_NAME", default_value = "rcon")]
    name: String,
    #[arg(long, default_value_t = DEFAULT_REPLY_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs one command and prints the reply.
    Send {
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },
    /// Prints broadcasts until interrupted.
    Listen,
    /// Reads commands from stdin and prints replies and broadcasts.
    Console,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Rcon(#[from] RconError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SessionConfig::new(SessionIdentity::new(
        cli.name,
        cli.host,
        cli.port,
        cli.password,
    ))
    .with_reply_timeout(Duration::from_millis(cli.timeout_ms));

    match cli.command {
        Command::Send { command } => {
            let session = RconSession::builder(config.with_connect_on_start(false)).spawn();
            let result = session.send_command(command.join(" ")).await;
            session.shutdown();
            println!("{}", result?);
            Ok(())
        }
        Command::Listen => {
            let session = RconSession::spawn(config, printing_listeners());
            info!(session = %session.identity().signature(), "listening for broadcasts");
            tokio::signal::ctrl_c().await?;
            session.shutdown();
            Ok(())
        }
        Command::Console => console(RconSession::spawn(config, printing_listeners())).await,
    }
}

async fn console(session: RconSession) -> Result<(), CliError> {
    info!(session = %session.identity().signature(), "console ready");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = line.trim();
                if command.is_empty() {
                    continue;
                }
                match session.send_command(command).await {
                    Ok(reply) => println!("{reply}"),
                    Err(err) => eprintln!("{err}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.shutdown();
    Ok(())
}

fn printing_listeners() -> Listeners {
    Listeners::new()
        .on_message(|text| println!("{text}"))
        .on_chat(|user_id, username, text| println!("[chat] {username} ({user_id}): {text}"))
}
