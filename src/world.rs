//! Port to the external virtual-world client.
//!
//! The bridge never talks to the network itself; handlers that need the
//! client receive an implementation of [`WorldClient`].

use crate::error::Result;
use crate::types::{CorrelationToken, SensorTypeFlags};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorRequest {
    pub name: String,
    pub item: Uuid,
    pub kind: SensorTypeFlags,
    pub range: f32,
    pub arc: f32,
    pub token: CorrelationToken,
    pub region: String,
}

pub trait WorldClient: Send + Sync {
    /// Resolves a region by name, case-insensitively; `None` asks for the
    /// region the client currently occupies.
    fn resolve_region(&self, name: Option<&str>) -> Option<String>;

    /// Issues a sensor sweep. The reply arrives later, out of band, carrying
    /// `request.token`.
    fn request_script_sensor(&self, request: SensorRequest) -> PortFuture<'_, ()>;
}
