//! # Strata - window lifecycle shell driver
//!
//! Runs a [`Shell`] on headless surfaces and drives it with console commands,
//! either interactively from stdin (timers follow the wall clock) or from a
//! script file (time only moves on `advance`).

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use strata::console::{Command, Reply};
use strata::surface::HeadlessSurfaceFactory;
use strata::{Envelope, Shell, ShellConfig};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Window lifecycle and display coordination core of a mobile UI shell")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/strata/strata.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Run commands from a file instead of stdin, on a virtual clock
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Print notifications and status as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let loaded = ShellConfig::load(&cli.config);
    let debug = cli.debug || loaded.as_ref().map_or(false, |c| c.general.debug);

    // Initialize logging
    if debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("🚀 Starting Strata");
    info!(
        "📄 Version: {} ({} built {})",
        strata::VERSION,
        option_env!("GIT_COMMIT").unwrap_or("unknown commit"),
        option_env!("BUILD_DATE").unwrap_or("at an unknown date")
    );

    let config = match loaded {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            info!("📝 Using default configuration");
            ShellConfig::default()
        }
    };

    let mut shell = Shell::new(config, Box::new(HeadlessSurfaceFactory::new()))
        .context("Failed to start the shell")?;
    let json = cli.json;
    shell.subscribe(move |envelope| print_notification(envelope, json));

    match &cli.script {
        Some(path) => run_script(&mut shell, path, json).await,
        None => run_interactive(&mut shell, json).await,
    }
}

fn print_notification(envelope: &Envelope, json: bool) {
    if json {
        match serde_json::to_string(envelope) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("cannot serialize {}: {}", envelope.notification, e),
        }
    } else {
        println!("[{:>7}ms] {}", envelope.at.as_millis(), envelope.notification);
    }
}

fn print_reply(reply: &Reply, json: bool) {
    match reply {
        Reply::Created(id) => println!("-> {}", id),
        Reply::Nothing => println!("-> nothing"),
        Reply::Screenshot(Some(bytes)) => println!("-> {} bytes", bytes.len()),
        Reply::Screenshot(None) => println!("-> no screenshot"),
        Reply::Status(status) if json => match serde_json::to_string(status) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("cannot serialize status: {}", e),
        },
        Reply::Status(status) => print!("{}", status),
        Reply::Done | Reply::Quit => {}
    }
}

/// Run one line; returns false when the session should end
fn execute(shell: &mut Shell, line: &str, json: bool) -> bool {
    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(e) => {
            error!("❌ {:#}", e);
            return true;
        }
    };

    match command.apply(shell) {
        Ok(Reply::Quit) => false,
        Ok(reply) => {
            print_reply(&reply, json);
            true
        }
        Err(e) => {
            error!("❌ {:#}", e);
            true
        }
    }
}

async fn run_script(shell: &mut Shell, path: &Path, json: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    info!("📜 Running script {}", path.display());

    for line in contents.lines() {
        if !execute(shell, line, json) {
            break;
        }
    }
    Ok(())
}

/// Interactive session: the virtual clock follows tokio's clock
async fn run_interactive(shell: &mut Shell, json: bool) -> Result<()> {
    let started = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = shell
            .next_deadline()
            .map(|at| started + at)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            line = lines.next_line() => {
                shell.advance_to(started.elapsed());
                match line.context("Failed to read stdin")? {
                    Some(line) => {
                        if !execute(shell, &line, json) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                shell.advance_to(started.elapsed());
            }
        }
    }

    info!("👋 Shutting down");
    Ok(())
}
