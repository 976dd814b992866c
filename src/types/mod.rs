mod identifiers;
mod parameters;
mod permission;
mod schedule;
mod sensor;

pub use identifiers::{CorrelationToken, GroupId, RequestId, SenderId};
pub use parameters::{ParameterSet, ResultSet};
pub use permission::{Permission, PermissionMask};
pub use schedule::{
    format_due_time, parse_due_time, ScheduleAction, ScheduledEntry, DUE_TIME_FORMAT,
};
pub use sensor::{Quaternion, SensorReply, SensorTypeFlags, Vector3};
