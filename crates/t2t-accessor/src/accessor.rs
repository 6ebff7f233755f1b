//! Dynamic access to the properties, methods and notifications of
//! translator devices.

use std::future::IntoFuture;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;
use t2t_protocol::{Characteristic, Interface};
use tracing::{debug, instrument, warn};

use crate::device::{Callable, DeviceObject, Facet, Member, async_name, getter_name, setter_name};
use crate::error::{AccessError, AccessResult};
use crate::notify::Listener;
use crate::outcome::Outcome;
use crate::translator::Translator;

/// Anything that names an interface: a plain name or an interface value.
pub trait InterfaceName {
    fn interface_name(&self) -> &str;
}

impl InterfaceName for str {
    fn interface_name(&self) -> &str {
        self
    }
}

impl InterfaceName for String {
    fn interface_name(&self) -> &str {
        self
    }
}

impl InterfaceName for Interface {
    fn interface_name(&self) -> &str {
        self.name()
    }
}

impl<T: InterfaceName + ?Sized> InterfaceName for Arc<T> {
    fn interface_name(&self) -> &str {
        (**self).interface_name()
    }
}

/// A resolved translator call waiting to be awaited.
///
/// Awaiting yields the value whether the translator completed immediately
/// or deferred; translator failures surface here as
/// [`AccessError::Adapter`].
#[must_use = "translator calls complete only when awaited"]
#[derive(Debug)]
pub struct Pending {
    interface: String,
    member: String,
    outcome: Outcome,
}

impl Pending {
    fn new(interface: &str, member: String, outcome: Outcome) -> Self {
        Self {
            interface: interface.to_owned(),
            member,
            outcome,
        }
    }

    /// Name of the device member that was resolved.
    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn is_deferred(&self) -> bool {
        self.outcome.is_deferred()
    }
}

impl IntoFuture for Pending {
    type Output = AccessResult<Value>;
    type IntoFuture = BoxFuture<'static, AccessResult<Value>>;

    fn into_future(self) -> Self::IntoFuture {
        let Self {
            interface,
            member,
            outcome,
        } = self;
        async move {
            outcome.settle().await.map_err(|error| {
                let message = format!("{error:#}");
                warn!(%interface, %member, error = %message, "translator call failed");
                AccessError::Adapter {
                    interface,
                    member,
                    message,
                }
            })
        }
        .boxed()
    }
}

/// Resolves interface members on translator devices.
///
/// Every operation first selects the object implementing the interface,
/// then validates the request and finds the member. Those checks fail
/// immediately; the returned [`Pending`] only fails if the translator does.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceAccessor;

impl DeviceAccessor {
    #[instrument(skip_all)]
    pub async fn create_device(
        translator: &dyn Translator,
        properties: Value,
    ) -> AccessResult<Arc<DeviceObject>> {
        let device = translator
            .create_device(properties)
            .await
            .map_err(|error| AccessError::DeviceCreation(format!("{error:#}")))?;
        debug!(device = device.label(), "device created");
        Ok(device)
    }

    /// Reads a property from a field, `get<Property>` or
    /// `get<Property>Async`, in that order.
    #[instrument(
        skip_all,
        fields(device = device.label(), interface = interface.interface_name(), property = %property)
    )]
    pub fn get_property<I: InterfaceName + ?Sized>(
        device: &Arc<DeviceObject>,
        interface: &I,
        property: &str,
    ) -> AccessResult<Pending> {
        let interface = interface.interface_name();
        let target = resolve_interface(device, interface)?;
        ensure_member_name(property)?;

        if let Some(value) = target.field_value(property) {
            debug!("property read from field");
            return Ok(Pending::new(
                interface,
                property.to_owned(),
                Outcome::Immediate(value),
            ));
        }

        let getter = getter_name(property);
        let async_getter = async_name(&getter);
        let (member, callable) = first_callable(&target, [getter, async_getter]).ok_or_else(|| {
            AccessError::PropertyGetterNotImplemented {
                interface: interface.to_owned(),
                property: property.to_owned(),
            }
        })?;
        let outcome = call(&callable, Vec::new());
        debug!(member = %member, deferred = outcome.is_deferred(), "property getter called");
        Ok(Pending::new(interface, member, outcome))
    }

    /// Writes a property to a field, `set<Property>` or
    /// `set<Property>Async`, in that order.
    #[instrument(
        skip_all,
        fields(device = device.label(), interface = interface.interface_name(), property = %property)
    )]
    pub fn set_property<I: InterfaceName + ?Sized>(
        device: &Arc<DeviceObject>,
        interface: &I,
        property: &str,
        value: Value,
    ) -> AccessResult<Pending> {
        let interface = interface.interface_name();
        let target = resolve_interface(device, interface)?;
        ensure_member_name(property)?;

        if matches!(target.member(property), Some(Member::Field(_))) {
            target.set_field_value(property, value);
            debug!("property written to field");
            return Ok(Pending::new(interface, property.to_owned(), Outcome::done()));
        }

        let setter = setter_name(property);
        let async_setter = async_name(&setter);
        let (member, callable) = first_callable(&target, [setter, async_setter]).ok_or_else(|| {
            AccessError::PropertySetterNotImplemented {
                interface: interface.to_owned(),
                property: property.to_owned(),
            }
        })?;
        let outcome = call(&callable, vec![value]);
        debug!(member = %member, deferred = outcome.is_deferred(), "property setter called");
        Ok(Pending::new(interface, member, outcome))
    }

    /// Invokes `<method>` or `<method>Async`. `args` must be a JSON array of
    /// positional arguments.
    #[instrument(
        skip_all,
        fields(device = device.label(), interface = interface.interface_name(), method = %method)
    )]
    pub fn invoke_method<I: InterfaceName + ?Sized>(
        device: &Arc<DeviceObject>,
        interface: &I,
        method: &str,
        args: Value,
    ) -> AccessResult<Pending> {
        let interface = interface.interface_name();
        let target = resolve_interface(device, interface)?;
        ensure_member_name(method)?;

        let Value::Array(args) = args else {
            return Err(AccessError::InvalidArguments {
                method: method.to_owned(),
                reason: format!("expected an array of arguments, got {}", json_kind(&args)),
            });
        };

        let (member, callable) =
            first_callable(&target, [method.to_owned(), async_name(method)]).ok_or_else(|| {
                AccessError::MethodNotImplemented {
                    interface: interface.to_owned(),
                    method: method.to_owned(),
                }
            })?;
        let outcome = call(&callable, args);
        debug!(member = %member, deferred = outcome.is_deferred(), "method called");
        Ok(Pending::new(interface, member, outcome))
    }

    #[instrument(
        skip_all,
        fields(device = device.label(), interface = interface.interface_name(), property = %property)
    )]
    pub fn add_property_listener<I: InterfaceName + ?Sized>(
        device: &Arc<DeviceObject>,
        interface: &I,
        property: &str,
        listener: Listener,
    ) -> AccessResult<()> {
        let interface = interface.interface_name();
        let target = resolve_interface(device, interface)?;
        ensure_member_name(property)?;

        let hub = target
            .notifications()
            .ok_or_else(|| AccessError::NotifierNotImplemented {
                interface: interface.to_owned(),
                property: property.to_owned(),
            })?;
        hub.add_listener(property, listener);
        debug!(listeners = hub.listener_count(property), "property listener added");
        Ok(())
    }

    /// Removes a listener previously added with the same handle. Returns
    /// whether it was registered.
    #[instrument(
        skip_all,
        fields(device = device.label(), interface = interface.interface_name(), property = %property)
    )]
    pub fn remove_property_listener<I: InterfaceName + ?Sized>(
        device: &Arc<DeviceObject>,
        interface: &I,
        property: &str,
        listener: &Listener,
    ) -> AccessResult<bool> {
        let interface = interface.interface_name();
        let target = resolve_interface(device, interface)?;
        ensure_member_name(property)?;

        let hub = target
            .notifications()
            .ok_or_else(|| AccessError::NotifierNotImplemented {
                interface: interface.to_owned(),
                property: property.to_owned(),
            })?;
        let removed = hub.remove_listener(property, listener);
        debug!(removed, "property listener removed");
        Ok(removed)
    }
}

fn resolve_interface(device: &Arc<DeviceObject>, interface: &str) -> AccessResult<Arc<DeviceObject>> {
    let Some(selector) = device.selector() else {
        return Ok(device.clone());
    };
    match selector(interface) {
        Some(Facet::Itself) => Ok(device.clone()),
        Some(Facet::Object(object)) => {
            debug!(facet = object.label(), "interface implemented by facet");
            Ok(object)
        }
        None => Err(AccessError::InterfaceNotImplemented {
            interface: interface.to_owned(),
        }),
    }
}

fn ensure_member_name(name: &str) -> AccessResult<()> {
    if name.is_empty() {
        return Err(AccessError::InvalidMemberName);
    }
    Ok(())
}

fn first_callable<const N: usize>(
    target: &DeviceObject,
    names: [String; N],
) -> Option<(String, Callable)> {
    names
        .into_iter()
        .find_map(|name| target.callable(&name).map(|callable| (name, callable)))
}

// A translator that fails while being called rejects on await, like one
// that fails later.
fn call(callable: &Callable, args: Vec<Value>) -> Outcome {
    callable(args).unwrap_or_else(Outcome::failed)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
