//! nd300: operator console for ND-300CM/KM bill dispensers
//!
//! Runs a single command (`payout`, `status`, `reset`) or, by default, an
//! interactive console on stdin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nd300_bridge::{Connection, Exchange, SerialConfig, Transport};
use nd300_core::Message;
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "nd300", version, about = "Drive an ND-300CM/KM bill dispenser over serial")]
struct Args {
    /// Serial device the dispenser is attached to
    #[arg(long, env = "ND300_DEVICE", default_value = nd300_bridge::serial::DEFAULT_DEVICE)]
    device: String,

    /// Read timeout per frame, in milliseconds
    #[arg(long, env = "ND300_TIMEOUT_MS", default_value_t = 2000)]
    timeout_ms: u64,

    /// Give up a payout after this many busy status polls
    #[arg(long, env = "ND300_MAX_POLLS")]
    max_polls: Option<u32>,

    /// Print exchanges as JSON, one object per line
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Pay out notes and wait for the dispenser to settle
    Payout {
        /// Number of notes
        quantity: u8,
    },
    /// Query the dispenser status
    Status,
    /// Reset the dispenser
    Reset,
    /// Interactive console (default)
    Console,
}

impl Args {
    fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            max_polls: self.max_polls,
            ..SerialConfig::with_device(self.device.clone())
        }
    }
}

/// What a command produced, for printing
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Report {
    Exchange(Exchange),
    Sent {
        #[serde(rename = "Sent")]
        sent: Message,
    },
}

impl Report {
    fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string(self)?);
            return Ok(());
        }
        match self {
            Report::Exchange(exchange) => {
                println!("{}", exchange.sent);
                println!("{}", exchange.received);
            }
            Report::Sent { sent } => println!("{}", sent),
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log filter")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.serial_config();
    let mut conn = Connection::open(&config)
        .with_context(|| format!("Failed to connect to dispenser at {}", config.device))?;
    info!("Connected to dispenser at {}", config.device);

    let result = match args.command.unwrap_or(Cmd::Console) {
        Cmd::Payout { quantity } => conn
            .payout(quantity)
            .await
            .map(Report::Exchange)
            .map_err(anyhow::Error::from)
            .and_then(|report| report.print(args.json)),
        Cmd::Status => conn
            .status()
            .await
            .map(Report::Exchange)
            .map_err(anyhow::Error::from)
            .and_then(|report| report.print(args.json)),
        Cmd::Reset => conn
            .reset_dispenser()
            .await
            .map(|sent| Report::Sent { sent })
            .map_err(anyhow::Error::from)
            .and_then(|report| report.print(args.json)),
        Cmd::Console => console(&mut conn, args.json).await,
    };

    finish(result, conn.close().await)
}

/// Prefer the command's own error; a failed close on top of it is only logged
fn finish(result: Result<()>, closed: nd300_core::Result<()>) -> Result<()> {
    match (result, closed) {
        (Err(e), Err(close_err)) => {
            warn!("Failed to close connection: {}", close_err);
            Err(e)
        }
        (Ok(()), Err(close_err)) => Err(close_err).context("Failed to close connection"),
        (result, Ok(())) => result,
    }
}

fn print_usage() {
    println!("p: payout bills");
    println!("r: reset dispenser");
    println!("s: machine status");
    println!("q: quit");
}

/// Interactive menu loop; exits on `q` or end of input
async fn console<T: Transport>(conn: &mut Connection<T>, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_usage();
        let Some(line) = lines.next_line().await? else {
            debug!("stdin closed, leaving console");
            return Ok(());
        };

        let report = match line.trim() {
            "p" => {
                let Some(quantity) = prompt_quantity(&mut lines).await? else {
                    continue;
                };
                conn.payout(quantity).await.map(Report::Exchange)
            }
            "s" => conn.status().await.map(Report::Exchange),
            "r" => conn.reset_dispenser().await.map(|sent| Report::Sent { sent }),
            "q" => return Ok(()),
            _ => continue,
        };

        match report {
            Ok(report) => report.print(json)?,
            Err(e) => eprintln!("Error: {}", e),
        }
    }
}

async fn prompt_quantity(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<u8>> {
    println!("How many bills do you want to payout?");
    let Some(line) = lines.next_line().await? else {
        return Ok(None);
    };
    match line.trim().parse::<u8>() {
        Ok(quantity) => Ok(Some(quantity)),
        Err(_) => {
            eprintln!("Not a quantity between 0 and 255: {}", line.trim());
            Ok(None)
        }
    }
}
