//! Translator-side device objects with dynamically named members.
//!
//! A device is a table of named members. Each member is either a plain
//! field or a callable, and the accessor resolves property and method names
//! against that table using the translator naming conventions:
//! `get<Property>`, `set<Property>`, and an `Async` suffix for members that
//! complete later.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::notify::NotificationHub;
use crate::outcome::Outcome;

/// A callable member. Receives the positional arguments of the call.
pub type Callable = Arc<dyn Fn(Vec<Value>) -> anyhow::Result<Outcome> + Send + Sync>;

/// Chooses the object implementing an interface, or `None` when the device
/// does not implement it.
pub type InterfaceSelector = Arc<dyn Fn(&str) -> Option<Facet> + Send + Sync>;

/// Result of interface selection.
#[derive(Clone)]
pub enum Facet {
    /// The device implements the interface on itself.
    Itself,
    /// A separate object implements the interface.
    Object(Arc<DeviceObject>),
}

pub enum Member {
    Field(RwLock<Value>),
    Callable(Callable),
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(value) => f.debug_tuple("Field").field(&*value.read()).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

pub struct DeviceObject {
    label: String,
    members: HashMap<String, Member>,
    selector: Option<InterfaceSelector>,
    notifications: Option<NotificationHub>,
}

impl DeviceObject {
    pub fn builder(label: impl Into<String>) -> DeviceObjectBuilder {
        DeviceObjectBuilder {
            label: label.into(),
            members: HashMap::new(),
            selector: None,
            notifications: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Current value of a field member.
    pub fn field_value(&self, name: &str) -> Option<Value> {
        match self.members.get(name)? {
            Member::Field(value) => Some(value.read().clone()),
            Member::Callable(_) => None,
        }
    }

    /// Replaces the value of a field member. Returns `false` when `name` is
    /// not a field.
    pub fn set_field_value(&self, name: &str, value: Value) -> bool {
        match self.members.get(name) {
            Some(Member::Field(slot)) => {
                *slot.write() = value;
                true
            }
            _ => false,
        }
    }

    pub fn callable(&self, name: &str) -> Option<Callable> {
        match self.members.get(name)? {
            Member::Callable(callable) => Some(callable.clone()),
            Member::Field(_) => None,
        }
    }

    pub fn selector(&self) -> Option<&InterfaceSelector> {
        self.selector.as_ref()
    }

    pub fn notifications(&self) -> Option<&NotificationHub> {
        self.notifications.as_ref()
    }

    /// Raises a property notification when the device has a hub. Returns how
    /// many listeners were called.
    pub fn notify(&self, property: &str, value: Value) -> usize {
        self.notifications
            .as_ref()
            .map_or(0, |hub| hub.emit(property, value))
    }
}

impl fmt::Debug for DeviceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut members: Vec<&str> = self.member_names().collect();
        members.sort_unstable();
        f.debug_struct("DeviceObject")
            .field("label", &self.label)
            .field("members", &members)
            .field("selector", &self.selector.is_some())
            .field("notifications", &self.notifications)
            .finish()
    }
}

pub struct DeviceObjectBuilder {
    label: String,
    members: HashMap<String, Member>,
    selector: Option<InterfaceSelector>,
    notifications: Option<NotificationHub>,
}

impl DeviceObjectBuilder {
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members
            .insert(name.into(), Member::Field(RwLock::new(value.into())));
        self
    }

    /// Registers a callable member under its exact name.
    pub fn function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(Vec<Value>) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        self.members
            .insert(name.into(), Member::Callable(Arc::new(function)));
        self
    }

    /// Registers `get<Property>`.
    pub fn getter<F>(self, property: &str, getter: F) -> Self
    where
        F: Fn() -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.function(getter_name(property), move |_| getter().map(Outcome::Immediate))
    }

    /// Registers `get<Property>Async`.
    pub fn async_getter<F, Fut>(self, property: &str, getter: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.function(async_name(&getter_name(property)), move |_| {
            Ok(Outcome::deferred(getter()))
        })
    }

    /// Registers `set<Property>`.
    pub fn setter<F>(self, property: &str, setter: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.function(setter_name(property), move |args| {
            setter(first_argument(args))?;
            Ok(Outcome::done())
        })
    }

    /// Registers `set<Property>Async`.
    pub fn async_setter<F, Fut>(self, property: &str, setter: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.function(async_name(&setter_name(property)), move |args| {
            let pending = setter(first_argument(args));
            Ok(Outcome::deferred(async move {
                pending.await.map(|()| Value::Null)
            }))
        })
    }

    pub fn method<F>(self, name: &str, method: F) -> Self
    where
        F: Fn(Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.function(name, move |args| method(args).map(Outcome::Immediate))
    }

    /// Registers `<name>Async`.
    pub fn async_method<F, Fut>(self, name: &str, method: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.function(async_name(name), move |args| Ok(Outcome::deferred(method(args))))
    }

    pub fn selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&str) -> Option<Facet> + Send + Sync + 'static,
    {
        self.selector = Some(Arc::new(selector));
        self
    }

    pub fn notifications(mut self, hub: NotificationHub) -> Self {
        self.notifications = Some(hub);
        self
    }

    pub fn build(self) -> Arc<DeviceObject> {
        Arc::new(DeviceObject {
            label: self.label,
            members: self.members,
            selector: self.selector,
            notifications: self.notifications,
        })
    }
}

pub fn getter_name(property: &str) -> String {
    format!("get{}", capitalize(property))
}

pub fn setter_name(property: &str) -> String {
    format!("set{}", capitalize(property))
}

pub fn async_name(member: &str) -> String {
    format!("{member}Async")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn first_argument(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::Null)
}
