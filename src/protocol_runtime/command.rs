use crate::config::BridgeConfig;
use crate::correlation::CorrelationBroker;
use crate::error::Result;
use crate::gate::GroupDirectory;
use crate::schedule_store::ScheduleStore;
use crate::types::{
    GroupId, ParameterSet, Permission, RequestId, ResultSet, SenderId, SensorReply,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Behaviour behind one named command.
pub trait CommandHandler: Send + Sync + 'static {
    /// Cheap checks on the decoded parameters, run before `execute`.
    ///
    /// # Errors
    /// Returns the first failed precondition.
    fn validate(&self, _context: &CommandContext) -> Result<()> {
        Ok(())
    }

    fn execute<'a>(
        &'a self,
        context: &'a CommandContext,
        services: &'a BridgeServices,
        result: &'a mut ResultSet,
    ) -> HandlerFuture<'a>;
}

#[derive(Clone)]
pub struct Command {
    name: String,
    required_permission: Permission,
    handler: Arc<dyn CommandHandler>,
}

impl Command {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        required_permission: Permission,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            required_permission,
            handler,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn required_permission(&self) -> Permission {
        self.required_permission
    }

    #[must_use]
    pub fn handler(&self) -> Arc<dyn CommandHandler> {
        Arc::clone(&self.handler)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("required_permission", &self.required_permission)
            .finish_non_exhaustive()
    }
}

/// Who sent a message and how to answer it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub group: GroupId,
    pub sender: SenderId,
    pub request_id: RequestId,
    pub message: String,
}

impl Envelope {
    #[must_use]
    pub fn new(
        group: GroupId,
        sender: SenderId,
        request_id: RequestId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            group,
            sender,
            request_id,
            message: message.into(),
        }
    }
}

/// Per-invocation view handed to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    envelope: Envelope,
    parameters: ParameterSet,
}

impl CommandContext {
    #[must_use]
    pub const fn new(envelope: Envelope, parameters: ParameterSet) -> Self {
        Self {
            envelope,
            parameters,
        }
    }

    #[must_use]
    pub const fn group(&self) -> &GroupId {
        &self.envelope.group
    }

    #[must_use]
    pub const fn sender(&self) -> &SenderId {
        &self.envelope.sender
    }

    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.envelope.request_id
    }

    #[must_use]
    pub const fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }
}

/// Shared state and settings reachable from every handler.
pub struct BridgeServices {
    schedules: Arc<ScheduleStore>,
    sensor_replies: CorrelationBroker<SensorReply>,
    groups: Arc<dyn GroupDirectory>,
    services_timeout: Duration,
    sensor_range: f32,
}

impl BridgeServices {
    #[must_use]
    pub fn new(groups: Arc<dyn GroupDirectory>) -> Self {
        let defaults = BridgeConfig::default();
        Self {
            schedules: Arc::new(ScheduleStore::new()),
            sensor_replies: CorrelationBroker::new(),
            groups,
            services_timeout: defaults.services_timeout,
            sensor_range: defaults.sensor_range,
        }
    }

    #[must_use]
    pub fn from_config(config: Arc<BridgeConfig>) -> Self {
        let services_timeout = config.services_timeout;
        let sensor_range = config.sensor_range;
        Self::new(config)
            .with_services_timeout(services_timeout)
            .with_sensor_range(sensor_range)
    }

    #[must_use]
    pub fn with_services_timeout(mut self, timeout: Duration) -> Self {
        self.services_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_sensor_range(mut self, range: f32) -> Self {
        self.sensor_range = range;
        self
    }

    #[must_use]
    pub fn with_schedules(mut self, schedules: Arc<ScheduleStore>) -> Self {
        self.schedules = schedules;
        self
    }

    #[must_use]
    pub fn schedules(&self) -> &ScheduleStore {
        &self.schedules
    }

    #[must_use]
    pub const fn sensor_replies(&self) -> &CorrelationBroker<SensorReply> {
        &self.sensor_replies
    }

    #[must_use]
    pub fn groups(&self) -> &dyn GroupDirectory {
        self.groups.as_ref()
    }

    #[must_use]
    pub fn group_directory(&self) -> Arc<dyn GroupDirectory> {
        Arc::clone(&self.groups)
    }

    #[must_use]
    pub const fn services_timeout(&self) -> Duration {
        self.services_timeout
    }

    #[must_use]
    pub const fn sensor_range(&self) -> f32 {
        self.sensor_range
    }
}
