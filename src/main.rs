#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use bridge::error::ERROR_CODES;
use bridge::protocol_runtime::{process_protocol_line, run_protocol_loop};
use bridge::{build_dispatcher, load_config, BridgeError, CommandDispatcher};
use cli::{parse_cli_args, CliAction, CliError, RunOptions};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
bridge: key-value command bridge

USAGE:
    bridge [--config PATH] [--json]          read one command per stdin line
    bridge [--config PATH] [--json] --line CSV
                                             run a single command
    bridge -h | --help
    bridge -v | --version

Each command line is a comma-separated key,value list carrying the routing
keys command, group, sender and identifier next to the command parameters:

    command,at,group,builders,identifier,r1,action,add,time,2030-01-01T09:00:00,data,hello

CONFIG (default .bridge/config.toml):
    services_timeout_ms = 5000
    workers = 8
    sensor_range = 64.0
    group.<name>.permissions = schedule,interact
    group.<name>.schedules = 10

ENVIRONMENT:
    BRIDGE_SERVICES_TIMEOUT_MS, BRIDGE_WORKERS, RUST_LOG
";

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&args).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("bridge: {error:#}");
            ExitCode::from(exit_code_for(&error))
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &[String]) -> Result<ExitCode> {
    match parse_cli_args(args)? {
        CliAction::ShowHelp => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        CliAction::ShowVersion => {
            println!("bridge {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        CliAction::RunProtocol(options) => {
            let dispatcher = Arc::new(dispatcher_for(&options).await?);
            let mut stdout = tokio::io::stdout();
            let processed =
                run_protocol_loop(dispatcher, tokio::io::stdin(), &mut stdout, options.format)
                    .await
                    .context("protocol loop failed")?;
            info!("Processed {} commands from stdin", processed);
            Ok(ExitCode::SUCCESS)
        }
        CliAction::RunLine { options, line } => {
            let dispatcher = dispatcher_for(&options).await?;
            let (rendered, succeeded) =
                process_protocol_line(&dispatcher, &line, options.format).await?;
            println!("{rendered}");
            Ok(if succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn dispatcher_for(options: &RunOptions) -> Result<CommandDispatcher> {
    let config = load_config(options.config.clone())
        .await
        .context("failed to load configuration")?;
    info!(
        "Loaded configuration with {} groups and {} workers",
        config.groups().count(),
        config.workers
    );
    Ok(build_dispatcher(Arc::new(config), None))
}

fn print_help() {
    print!("{USAGE}");
    println!("\nERROR CODES:");
    for (code, description, fix) in ERROR_CODES {
        println!("    {code:<20} {description}");
        println!("    {:<20} fix: {fix}", "");
    }
}

fn exit_code_for(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<CliError>().is_some() {
        return 64;
    }
    error
        .downcast_ref::<BridgeError>()
        .and_then(|error| u8::try_from(error.exit_code()).ok())
        .unwrap_or(1)
}
