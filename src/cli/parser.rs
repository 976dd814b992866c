#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::action::{CliAction, RunOptions};
use super::args::suggest_flag;
use bridge::OutputFormat;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CliError {
    #[error("Missing required argument: {}", arg)]
    MissingRequiredArg { arg: String },
    #[error("Unknown argument: {}{}", arg, hint)]
    UnknownArg { arg: String, hint: String },
}

/// Parses the arguments following the program name.
///
/// # Errors
/// Returns `CliError` for unknown flags or a flag missing its value.
pub fn parse_cli_args(args: &[String]) -> Result<CliAction, CliError> {
    let mut options = RunOptions::default();
    let mut line = None;
    let mut remaining = args.iter();

    while let Some(arg) = remaining.next() {
        match arg.as_str() {
            "--" => break,
            "-h" | "--help" => return Ok(CliAction::ShowHelp),
            "-v" | "--version" => return Ok(CliAction::ShowVersion),
            "--json" => options.format = OutputFormat::Json,
            "--config" => {
                options.config = Some(PathBuf::from(required_value(&mut remaining, "config")?));
            }
            "--line" => line = Some(required_value(&mut remaining, "line")?),
            other => return Err(unknown_arg(other)),
        }
    }

    Ok(match line {
        Some(line) => CliAction::RunLine { options, line },
        None => CliAction::RunProtocol(options),
    })
}

fn required_value<'a>(
    remaining: &mut impl Iterator<Item = &'a String>,
    name: &str,
) -> Result<String, CliError> {
    remaining
        .next()
        .filter(|value| !value.starts_with("--"))
        .cloned()
        .ok_or_else(|| CliError::MissingRequiredArg {
            arg: name.to_string(),
        })
}

fn unknown_arg(arg: &str) -> CliError {
    let hint = suggest_flag(arg)
        .map(|flag| format!(" (did you mean {flag}?)"))
        .unwrap_or_default();
    CliError::UnknownArg {
        arg: arg.to_string(),
        hint,
    }
}
