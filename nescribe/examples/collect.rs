//! Collect inventory from a network element and log it.
//!
//! Logs in as admin, runs a few show commands, and writes every exchange to
//! `log-<host>-<date>.json` in the chosen directory, with parsed results for
//! commands that have templates.
//!
//! # Usage
//!
//! ```bash
//! NE_ADMIN_PASSWORD=secret cargo run --example collect -- --host 10.0.0.1 --templates ./cmd_templates
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use nescribe::{EventLog, LogConfig, OpenMode, Role, RunContext, SessionBuilder, SshConnector};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = LogConfig::new(&args.log_dir, &args.templates);
    let mode = if args.append { OpenMode::Append } else { OpenMode::Create };
    let log = EventLog::open(&args.host, mode, &config, RunContext::new())?.shared();

    let mut builder = SessionBuilder::new(&args.host)
        .role(Role::Admin)
        .read_timeout(Duration::from_secs(args.timeout));
    if let Some(port) = args.port {
        builder = builder.port(port);
    }

    println!("Connecting to {}...", args.host);
    let mut session = builder.open(&SshConnector::default(), log.clone()).await?;
    session.login_verification(Role::Admin).await;

    for command in ["show version", "show card", "show slot *"] {
        match session.execute(command).await {
            Ok(entry) => {
                println!("{} ({:.2}s)", command, entry.duration);
                for (template, records) in &entry.results {
                    println!("  {}: {} records", template, records.len());
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    session.close().await?;

    let mut log = log.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    log.close()?;
    println!("Wrote {} entries to {}", log.records_written(), log.path().display());

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: Option<u16>,
    log_dir: PathBuf,
    templates: PathBuf,
    timeout: u64,
    append: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: None,
            log_dir: PathBuf::from("."),
            templates: PathBuf::from("cmd_templates"),
            timeout: 60,
            append: false,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => parsed.host = value.unwrap_or(parsed.host),
                "--port" | "-p" => parsed.port = value.and_then(|v| v.parse().ok()),
                "--log-dir" | "-l" => parsed.log_dir = value.map(PathBuf::from).unwrap_or(parsed.log_dir),
                "--templates" | "-T" => parsed.templates = value.map(PathBuf::from).unwrap_or(parsed.templates),
                "--timeout" | "-t" => parsed.timeout = value.and_then(|v| v.parse().ok()).unwrap_or(60),
                "--append" | "-a" => {
                    parsed.append = true;
                    i += 1;
                    continue;
                }
                "--help" => {
                    println!(
                        "usage: collect [--host HOST] [--port PORT] [--log-dir DIR] [--templates DIR] [--timeout SECS] [--append]"
                    );
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {}", other);
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        parsed
    }
}
