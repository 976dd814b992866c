use crate::codec;
use crate::error::{BridgeError, Result};
use crate::protocol_runtime::command::{
    BridgeServices, CommandContext, CommandHandler, HandlerFuture,
};
use crate::types::{ParameterSet, ResultSet, SensorTypeFlags};
use crate::world::{SensorRequest, WorldClient};
use std::f32::consts::PI;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// The `sensor` command: sweeps the world around an item and answers with
/// the first correlated reply.
pub struct SensorHandler {
    world: Arc<dyn WorldClient>,
}

impl SensorHandler {
    #[must_use]
    pub fn new(world: Arc<dyn WorldClient>) -> Self {
        Self { world }
    }
}

impl CommandHandler for SensorHandler {
    fn validate(&self, context: &CommandContext) -> Result<()> {
        let parameters = context.parameters();
        item(parameters)?;
        sensor_kind(parameters)?;
        float_or(parameters, "range", 0.0)?;
        float_or(parameters, "arc", PI)?;
        Ok(())
    }

    fn execute<'a>(
        &'a self,
        context: &'a CommandContext,
        services: &'a BridgeServices,
        result: &'a mut ResultSet,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let parameters = context.parameters();
            let requested_region = parameters.get_non_empty("region");
            let region = self.world.resolve_region(requested_region).ok_or_else(|| {
                BridgeError::NotFound(format!(
                    "region {}",
                    requested_region.unwrap_or("of the client")
                ))
            })?;

            let wait = services.sensor_replies().begin_wait();
            let request = SensorRequest {
                name: parameters.get("name").unwrap_or_default().to_string(),
                item: item(parameters)?,
                kind: sensor_kind(parameters)?,
                range: float_or(parameters, "range", services.sensor_range())?,
                arc: float_or(parameters, "arc", PI)?,
                token: wait.token(),
                region,
            };
            debug!(
                "Requesting sensor sweep {} in region {}",
                request.token, request.region
            );
            self.world.request_script_sensor(request).await?;

            let reply = wait.wait(services.services_timeout()).await?;
            result.insert("data", codec::encode(reply.fields()));
            Ok(())
        })
    }
}

fn item(parameters: &ParameterSet) -> Result<Uuid> {
    parameters.get_non_empty("item").map_or(Ok(Uuid::nil()), |raw| {
        Uuid::parse_str(raw.trim()).map_err(|_| BridgeError::malformed("item", raw))
    })
}

/// Requested type names are OR-ed onto `agent`.
fn sensor_kind(parameters: &ParameterSet) -> Result<SensorTypeFlags> {
    let Some(raw) = parameters.get_non_empty("type") else {
        return Ok(SensorTypeFlags::AGENT);
    };
    codec::decode(raw)
        .iter()
        .filter(|name| !name.trim().is_empty())
        .try_fold(SensorTypeFlags::AGENT, |kind, name| {
            SensorTypeFlags::from_name(name)
                .map(|flag| kind.union(flag))
                .ok_or_else(|| BridgeError::malformed("type", name.as_str()))
        })
}

fn float_or(parameters: &ParameterSet, key: &str, default: f32) -> Result<f32> {
    parameters.get_non_empty(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<f32>()
            .map_err(|_| BridgeError::malformed(key, raw))
    })
}
