#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! Line protocol: one encoded command per input line, one outcome per
//! output line.

pub mod command;
pub mod dispatcher;
pub mod handlers;
pub mod outcome;

pub use command::{
    BridgeServices, Command, CommandContext, CommandHandler, Envelope, HandlerFuture,
};
pub use dispatcher::CommandDispatcher;
pub use outcome::{CommandOutcome, OutcomeError, OutcomeStatus};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::types::RequestId;
use crate::world::WorldClient;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, OwnedSemaphorePermit};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Builds a dispatcher with the built-in commands. `sensor` is only
/// available when a world client is supplied.
#[must_use]
pub fn build_dispatcher(
    config: Arc<BridgeConfig>,
    world: Option<Arc<dyn WorldClient>>,
) -> CommandDispatcher {
    let workers = config.workers;
    let services = Arc::new(BridgeServices::from_config(config));
    let dispatcher =
        CommandDispatcher::new(services, workers).with_command(handlers::schedule_command());

    match world {
        Some(world) => dispatcher.with_command(handlers::sensor_command(world)),
        None => dispatcher,
    }
}

/// # Errors
/// Returns `SerializationError` if JSON rendering fails.
pub fn render_outcome(outcome: &CommandOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(outcome.encode()),
        OutputFormat::Json => {
            serde_json::to_string(&outcome.to_envelope()).map_err(BridgeError::SerializationError)
        }
    }
}

/// Reads commands from `input` until it is exhausted, dispatching each line
/// as soon as it is read. Outcomes are written in completion order.
///
/// Reading pauses while the dispatcher's backlog is full; a slot is freed
/// once the outcome holding it has been written.
///
/// Returns the number of commands processed. Input without any command
/// produces a single `MISSING_PARAMETER` outcome.
///
/// # Errors
/// Returns an error if reading the input or writing the output fails.
pub async fn run_protocol_loop<R, W>(
    dispatcher: Arc<CommandDispatcher>,
    input: R,
    output: &mut W,
    format: OutputFormat,
) -> Result<usize>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (sender, mut receiver) =
        mpsc::unbounded_channel::<(CommandOutcome, OwnedSemaphorePermit)>();

    let reader = async move {
        let mut lines = BufReader::new(input).lines();
        let mut received = 0_usize;
        while let Some(line) = lines.next_line().await.map_err(BridgeError::IoError)? {
            if line.trim().is_empty() {
                continue;
            }
            received += 1;

            let admission = dispatcher.admit().await?;
            let dispatcher = Arc::clone(&dispatcher);
            let sender = sender.clone();
            tokio::spawn(async move {
                let outcome = dispatcher.dispatch_line(&line).await;
                if sender.send((outcome, admission)).is_err() {
                    debug!("Outcome dropped after the writer stopped");
                }
            });
        }
        Ok::<_, BridgeError>(received)
    };

    let writer = async {
        let mut written = 0_usize;
        while let Some((outcome, _admission)) = receiver.recv().await {
            write_line(output, &render_outcome(&outcome, format)?).await?;
            written += 1;
        }
        Ok::<_, BridgeError>(written)
    };

    let (received, written) = tokio::join!(reader, writer);
    let received = received?;
    let written = written?;

    if received == 0 {
        emit_no_input_outcome(output, format).await?;
    }
    output.flush().await.map_err(BridgeError::IoError)?;

    info!("Protocol loop processed {} commands", written);
    Ok(received)
}

/// Dispatches one line and renders its outcome.
///
/// # Errors
/// Returns `SerializationError` if JSON rendering fails.
pub async fn process_protocol_line(
    dispatcher: &CommandDispatcher,
    line: &str,
    format: OutputFormat,
) -> Result<(String, bool)> {
    let outcome = dispatcher.dispatch_line(line).await;
    Ok((render_outcome(&outcome, format)?, outcome.is_success()))
}

async fn emit_no_input_outcome<W>(output: &mut W, format: OutputFormat) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let error = BridgeError::MissingParameter("no command received on stdin".to_string());
    let outcome = CommandOutcome::failure("", RequestId::default(), &error);
    write_line(output, &render_outcome(&outcome, format)?).await
}

async fn write_line<W>(output: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output
        .write_all(text.as_bytes())
        .await
        .map_err(BridgeError::IoError)?;
    output.write_all(b"\n").await.map_err(BridgeError::IoError)
}
