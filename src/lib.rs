pub mod codec;
pub mod config;
pub mod correlation;
pub mod error;
pub mod gate;
pub mod protocol_envelope;
pub mod protocol_runtime;
pub mod schedule_store;
pub mod types;
pub mod world;

pub use config::{load_config, BridgeConfig, GroupConfig};
pub use correlation::{CorrelatedEvent, CorrelatedWait, CorrelationBroker};
pub use error::{code, BridgeError, ErrorKind, Result};
pub use gate::{GroupDirectory, PermissionGate};
pub use protocol_runtime::{
    build_dispatcher, BridgeServices, Command, CommandDispatcher, CommandOutcome, OutputFormat,
};
pub use schedule_store::ScheduleStore;
pub use types::*;
pub use world::{SensorRequest, WorldClient};
