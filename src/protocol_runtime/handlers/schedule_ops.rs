use crate::codec;
use crate::error::{BridgeError, Result};
use crate::protocol_runtime::command::{
    BridgeServices, CommandContext, CommandHandler, HandlerFuture,
};
use crate::types::{parse_due_time, ParameterSet, ResultSet, ScheduleAction, ScheduledEntry};
use tracing::info;

const ACTION: &str = "action";
const TIME: &str = "time";
const DATA: &str = "data";
const INDEX: &str = "index";

/// The `at` command: add, get, remove and list deferred commands.
pub struct ScheduleHandler;

impl CommandHandler for ScheduleHandler {
    fn validate(&self, context: &CommandContext) -> Result<()> {
        action(context.parameters()).map(|_| ())
    }

    fn execute<'a>(
        &'a self,
        context: &'a CommandContext,
        services: &'a BridgeServices,
        result: &'a mut ResultSet,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            match action(context.parameters())? {
                ScheduleAction::Add => add(context, services).await,
                ScheduleAction::Get => get(context, services, result).await,
                ScheduleAction::Remove => remove(context, services).await,
                ScheduleAction::List => list(services, result).await,
            }
        })
    }
}

fn action(parameters: &ParameterSet) -> Result<ScheduleAction> {
    let raw = parameters
        .get_non_empty(ACTION)
        .ok_or_else(|| BridgeError::UnknownAction("no action given".to_string()))?;
    ScheduleAction::try_from(raw).map_err(BridgeError::UnknownAction)
}

fn parse_index(raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| BridgeError::malformed(INDEX, raw))
}

async fn add(context: &CommandContext, services: &BridgeServices) -> Result<()> {
    let parameters = context.parameters();
    let raw_time = parameters.require(TIME)?;
    let due = parse_due_time(raw_time).ok_or_else(|| BridgeError::malformed(TIME, raw_time))?;
    let payload = parameters.require(DATA)?;

    let entry = ScheduledEntry::new(
        context.group().clone(),
        due,
        context.sender().clone(),
        context.request_id().clone(),
        payload,
    );
    let limit = services.groups().schedule_limit(context.group());
    services.schedules().add(entry, limit).await?;
    info!(
        "Group {} scheduled a command due {}",
        context.group(),
        raw_time
    );
    Ok(())
}

async fn get(
    context: &CommandContext,
    services: &BridgeServices,
    result: &mut ResultSet,
) -> Result<()> {
    let index = context
        .parameters()
        .get_non_empty(INDEX)
        .map_or(Ok(0), parse_index)?;
    let entry = services.schedules().get(index).await?;
    result.insert(DATA, codec::encode(entry.fields()));
    Ok(())
}

async fn remove(context: &CommandContext, services: &BridgeServices) -> Result<()> {
    let index = parse_index(context.parameters().require(INDEX)?)?;
    let removed = services.schedules().remove(index).await?;
    info!(
        "Group {} removed the command scheduled by {}",
        context.group(),
        removed.sender()
    );
    Ok(())
}

async fn list(services: &BridgeServices, result: &mut ResultSet) -> Result<()> {
    let entries = services.schedules().list().await;
    if !entries.is_empty() {
        result.insert(
            DATA,
            codec::encode(entries.iter().flat_map(ScheduledEntry::fields)),
        );
    }
    Ok(())
}
