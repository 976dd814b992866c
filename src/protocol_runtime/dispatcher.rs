use super::command::{BridgeServices, Command, CommandContext, Envelope};
use super::outcome::CommandOutcome;
use crate::error::{BridgeError, Result};
use crate::gate::PermissionGate;
use crate::types::{GroupId, ParameterSet, RequestId, ResultSet, SenderId};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

pub const COMMAND_KEY: &str = "command";
pub const GROUP_KEY: &str = "group";
pub const SENDER_KEY: &str = "sender";
pub const IDENTIFIER_KEY: &str = "identifier";
pub const ANONYMOUS_SENDER: &str = "anonymous";

const SUGGESTION_DISTANCE: usize = 3;
/// Admitted commands allowed per worker, running or waiting.
const PENDING_PER_WORKER: usize = 4;

/// Routes named commands to their handlers.
///
/// Every invocation is permission-checked before its handler runs and then
/// executed on a bounded pool of tokio tasks, so a failing or panicking
/// handler only ever produces an error outcome for its own command.
pub struct CommandDispatcher {
    commands: HashMap<String, Command>,
    gate: PermissionGate,
    services: Arc<BridgeServices>,
    workers: Arc<Semaphore>,
    backlog: Arc<Semaphore>,
}

impl CommandDispatcher {
    #[must_use]
    pub fn new(services: Arc<BridgeServices>, workers: usize) -> Self {
        let workers = workers.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            commands: HashMap::new(),
            gate: PermissionGate::new(services.group_directory()),
            services,
            workers: Arc::new(Semaphore::new(workers)),
            backlog: Arc::new(Semaphore::new(
                workers
                    .saturating_mul(PENDING_PER_WORKER)
                    .min(Semaphore::MAX_PERMITS),
            )),
        }
    }

    #[must_use]
    pub fn with_command(mut self, command: Command) -> Self {
        self.register(command);
        self
    }

    /// Registers `command`, replacing any command with the same name.
    pub fn register(&mut self, command: Command) {
        let key = command.name().to_ascii_lowercase();
        if self.commands.insert(key, command).is_some() {
            warn!("Replaced an existing command registration");
        }
    }

    #[must_use]
    pub fn command_names(&self) -> Vec<&str> {
        let mut names = self.commands.values().map(Command::name).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn services(&self) -> &BridgeServices {
        &self.services
    }

    /// Reserves a backlog slot for one command. Callers feeding the
    /// dispatcher from an unbounded source hold the permit until the
    /// command's outcome has been delivered.
    ///
    /// # Errors
    /// Returns `Internal` if the backlog has been closed.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.backlog)
            .acquire_owned()
            .await
            .map_err(|_| BridgeError::Internal("command backlog is closed".to_string()))
    }

    /// Case-insensitive exact lookup.
    ///
    /// # Errors
    /// Returns `UnknownCommand`, naming the closest registered command when
    /// one is within a few edits.
    pub fn lookup(&self, name: &str) -> Result<&Command> {
        self.commands
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| match self.suggest(name) {
                Some(suggestion) => {
                    BridgeError::UnknownCommand(format!("{name}; did you mean '{suggestion}'?"))
                }
                None => BridgeError::UnknownCommand(name.to_string()),
            })
    }

    fn suggest(&self, typo: &str) -> Option<&str> {
        let typo = typo.to_ascii_lowercase();
        self.commands
            .iter()
            .map(|(key, command)| (command.name(), strsim::levenshtein(&typo, key)))
            .filter(|(_, distance)| *distance <= SUGGESTION_DISTANCE)
            .min_by_key(|(_, distance)| *distance)
            .map(|(name, _)| name)
    }

    /// Dispatches `command` with the parameters carried by `envelope.message`.
    pub async fn dispatch(&self, command: &str, envelope: Envelope) -> CommandOutcome {
        let parameters = ParameterSet::decode(&envelope.message);
        self.dispatch_decoded(command, envelope, parameters).await
    }

    /// Dispatches one raw wire line whose routing keys travel alongside the
    /// command parameters.
    pub async fn dispatch_line(&self, raw: &str) -> CommandOutcome {
        let parameters = ParameterSet::decode(raw);
        let request_id = RequestId::new(parameters.get(IDENTIFIER_KEY).unwrap_or_default());

        let Some(command) = parameters.get_non_empty(COMMAND_KEY).map(str::to_string) else {
            let error = BridgeError::MissingParameter(COMMAND_KEY.to_string());
            warn!("Rejected line without a command key");
            return CommandOutcome::failure("", request_id, &error);
        };

        let envelope = Envelope::new(
            GroupId::new(parameters.get(GROUP_KEY).unwrap_or_default()),
            SenderId::new(
                parameters
                    .get_non_empty(SENDER_KEY)
                    .unwrap_or(ANONYMOUS_SENDER),
            ),
            request_id,
            raw,
        );
        self.dispatch_decoded(&command, envelope, parameters).await
    }

    /// Dispatches every line concurrently; outcomes come back in input order.
    pub async fn dispatch_batch<I, S>(&self, lines: I) -> Vec<CommandOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        join_all(
            lines
                .into_iter()
                .map(|line| async move { self.dispatch_line(line.as_ref()).await }),
        )
        .await
    }

    async fn dispatch_decoded(
        &self,
        command: &str,
        envelope: Envelope,
        parameters: ParameterSet,
    ) -> CommandOutcome {
        let started = Instant::now();
        let request_id = envelope.request_id.clone();
        let group = envelope.group.clone();

        let outcome = match self.invoke(command, envelope, parameters).await {
            Ok((name, result)) => {
                info!("Command {} for group {} succeeded", name, group);
                CommandOutcome::success(name, request_id, result)
            }
            Err(error) => {
                warn!(
                    "Command {} for group {} failed with {}: {}",
                    command,
                    group,
                    error.code(),
                    error
                );
                CommandOutcome::failure(command, request_id, &error)
            }
        };

        outcome.with_elapsed_ms(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX))
    }

    async fn invoke(
        &self,
        name: &str,
        envelope: Envelope,
        parameters: ParameterSet,
    ) -> Result<(String, ResultSet)> {
        let command = self.lookup(name)?;
        self.gate
            .require(&envelope.group, command.required_permission())?;

        let context = CommandContext::new(envelope, parameters);
        let handler = command.handler();
        let services = Arc::clone(&self.services);
        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| BridgeError::Internal("worker pool is closed".to_string()))?;
        debug!("Running command {} on the worker pool", command.name());

        let task = tokio::spawn(async move {
            let _permit = permit;
            handler.validate(&context)?;
            let mut result = ResultSet::new();
            handler.execute(&context, &services, &mut result).await?;
            Ok::<_, BridgeError>(result)
        });

        match task.await {
            Ok(result) => result.map(|result| (command.name().to_string(), result)),
            Err(join_error) => {
                error!("Handler for {} aborted: {}", command.name(), join_error);
                Err(BridgeError::Internal(format!(
                    "handler for {} aborted",
                    command.name()
                )))
            }
        }
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("commands", &self.command_names())
            .field("available_workers", &self.workers.available_permits())
            .field("available_backlog", &self.backlog.available_permits())
            .finish_non_exhaustive()
    }
}
