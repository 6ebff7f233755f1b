//! Dynamic member access for OpenT2T translator devices.
//!
//! Translators expose a device as a [`DeviceObject`] whose members follow
//! naming conventions rather than a fixed trait. [`DeviceAccessor`] resolves
//! interface properties, methods and notifications against those members:
//!
//! - properties: field, `get<Name>` / `set<Name>`, then the `Async` variants
//! - methods: `<name>`, then `<name>Async`
//! - notifications: listeners on the device's [`NotificationHub`]
//!
//! Devices implementing several interfaces may route each interface to a
//! separate object through an interface selector.

pub mod accessor;
pub mod device;
pub mod error;
pub mod notify;
pub mod outcome;
pub mod telemetry;
pub mod translator;

pub use accessor::{DeviceAccessor, InterfaceName, Pending};
pub use device::{
    Callable, DeviceObject, DeviceObjectBuilder, Facet, InterfaceSelector, Member, async_name,
    getter_name, setter_name,
};
pub use error::{AccessError, AccessResult};
pub use notify::{Listener, Notification, NotificationHub};
pub use outcome::{DeferredValue, Outcome};
pub use telemetry::{LogFormat, TelemetryConfig, TelemetryError};
pub use translator::Translator;
