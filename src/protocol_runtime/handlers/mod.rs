//! Built-in command handlers.

pub mod schedule_ops;
pub mod sensor_ops;

use super::command::Command;
use crate::types::Permission;
use crate::world::WorldClient;
use std::sync::Arc;

pub const SCHEDULE_COMMAND: &str = "at";
pub const SENSOR_COMMAND: &str = "sensor";

#[must_use]
pub fn schedule_command() -> Command {
    Command::new(
        SCHEDULE_COMMAND,
        Permission::Schedule,
        Arc::new(schedule_ops::ScheduleHandler),
    )
}

#[must_use]
pub fn sensor_command(world: Arc<dyn WorldClient>) -> Command {
    Command::new(
        SENSOR_COMMAND,
        Permission::Interact,
        Arc::new(sensor_ops::SensorHandler::new(world)),
    )
}
