//! Port through which hosts create translator devices.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::device::DeviceObject;

/// Creates device objects from connection properties, e.g. a hub address
/// and credentials supplied by onboarding.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn create_device(&self, properties: Value) -> anyhow::Result<Arc<DeviceObject>>;
}
