//! Interface model: interfaces, properties, methods and parameters.
//!
//! Interfaces are composable. An interface may reference other interfaces,
//! and every property and method of a directly or indirectly referenced
//! interface is effectively part of the referencing one, much like interface
//! inheritance. Duplicate references are ignored; cycles are rejected when an
//! interface is constructed, so an [`Interface`] value is always acyclic.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Serialize, Serializer};

use crate::error::{SchemaError, SchemaResult};
use crate::types::TypeDescriptor;

/// Name and optional documentation shared by every element of the model.
pub trait Characteristic {
    /// Interface names are globally unique, typically reverse-DNS style.
    /// Member names may repeat across interfaces.
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
}

/// A property declared by an interface. Properties can be readable, writable
/// and/or notifying. A notify-only property is a signal: its type describes
/// the notification payload rather than a gettable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The interface that declared the property, which is the one that must
    /// be named when accessing it.
    pub interface_name: String,
    pub can_read: bool,
    pub can_write: bool,
    pub can_notify: bool,
    pub property_type: TypeDescriptor,
}

impl Property {
    /// A property with no capabilities; chain [`readable`](Self::readable),
    /// [`writable`](Self::writable) and [`notifying`](Self::notifying).
    pub fn new(
        interface_name: impl Into<String>,
        name: impl Into<String>,
        property_type: TypeDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            interface_name: interface_name.into(),
            can_read: false,
            can_write: false,
            can_notify: false,
            property_type,
        }
    }

    /// A notify-only property whose type is the notification payload.
    pub fn signal(
        interface_name: impl Into<String>,
        name: impl Into<String>,
        payload_type: TypeDescriptor,
    ) -> Self {
        Self::new(interface_name, name, payload_type).notifying()
    }

    pub fn readable(mut self) -> Self {
        self.can_read = true;
        self
    }

    pub fn writable(mut self) -> Self {
        self.can_write = true;
        self
    }

    pub fn notifying(mut self) -> Self {
        self.can_notify = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_signal(&self) -> bool {
        self.can_notify && !self.can_read && !self.can_write
    }

    /// Combines two declarations of the same property. Capabilities are
    /// OR-ed, the first available description wins and the types must match.
    pub fn combine(&self, other: &Property) -> SchemaResult<Property> {
        if self.property_type != other.property_type {
            return Err(SchemaError::InconsistentPropertyType {
                interface: self.interface_name.clone(),
                property: self.name.clone(),
            });
        }

        Ok(Property {
            name: self.name.clone(),
            description: self.description.clone().or_else(|| other.description.clone()),
            interface_name: self.interface_name.clone(),
            can_read: self.can_read || other.can_read,
            can_write: self.can_write || other.can_write,
            can_notify: self.can_notify || other.can_notify,
            property_type: self.property_type.clone(),
        })
    }
}

impl Characteristic for Property {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A parameter of a method. At most one parameter of a method is an out
/// parameter; it is the method's return value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameter_type: TypeDescriptor,
    pub is_out: bool,
}

impl Parameter {
    pub fn input(name: impl Into<String>, parameter_type: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameter_type,
            is_out: false,
        }
    }

    pub fn output(name: impl Into<String>, parameter_type: TypeDescriptor) -> Self {
        Self {
            is_out: true,
            ..Self::input(name, parameter_type)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Characteristic for Parameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A method declared by an interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The interface that declared the method.
    pub interface_name: String,
    pub parameters: Vec<Parameter>,
}

impl Method {
    pub fn new(interface_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            interface_name: interface_name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn input_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|parameter| !parameter.is_out)
    }

    pub fn return_parameter(&self) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.is_out)
    }

    fn validate(&self) -> SchemaResult<()> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "method" });
        }
        if self.parameters.iter().filter(|p| p.is_out).count() > 1 {
            return Err(SchemaError::MultipleOutParameters {
                interface: self.interface_name.clone(),
                method: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl Characteristic for Method {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// An interface that a translator can implement.
///
/// Constructed once (by a reader, a catalog or [`InterfaceBuilder`]) and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interface {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    properties: Vec<Property>,
    methods: Vec<Method>,
    #[serde(serialize_with = "serialize_reference_names")]
    references: Vec<Arc<Interface>>,
}

impl Interface {
    /// Builds an interface, validating names, out parameters and reference
    /// cycles. Repeated declarations of a member by the same declaring
    /// interface are combined into one entry.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        properties: Vec<Property>,
        methods: Vec<Method>,
        references: Vec<Arc<Interface>>,
    ) -> SchemaResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "interface" });
        }

        let mut explored = HashSet::new();
        for reference in &references {
            if let Some(mut path) = reference.path_to(&name, &mut explored) {
                path.insert(0, name.clone());
                return Err(SchemaError::CyclicReference { path });
            }
        }

        Ok(Self {
            properties: combine_properties(properties)?,
            methods: combine_methods(methods)?,
            name,
            description,
            references: dedup_references(references),
        })
    }

    pub fn builder(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder::new(name)
    }

    /// Merges interfaces into one containing the members of all of them and
    /// of everything they reference. The result has no references of its own.
    ///
    /// Members sharing a name stay distinct when they come from different
    /// declaring interfaces; declarations by the same interface are combined.
    pub fn merge<'a>(
        interfaces: impl IntoIterator<Item = &'a Interface>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> SchemaResult<Interface> {
        let mut properties = Vec::new();
        let mut methods = Vec::new();
        for interface in interfaces {
            properties.extend(interface.all_properties().into_iter().cloned());
            methods.extend(interface.all_methods().into_iter().cloned());
        }
        Interface::new(name, description, properties, methods, Vec::new())
    }

    /// Properties declared by this interface only.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Methods declared by this interface only.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Interfaces referenced directly by this interface.
    pub fn references(&self) -> &[Arc<Interface>] {
        &self.references
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// This interface followed by every directly or indirectly referenced
    /// interface, each name appearing once.
    pub fn all_references(&self) -> Vec<&Interface> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_references(&mut seen, &mut out);
        out
    }

    pub fn all_properties(&self) -> Vec<&Property> {
        self.all_references()
            .into_iter()
            .flat_map(|interface| interface.properties.iter())
            .collect()
    }

    pub fn all_methods(&self) -> Vec<&Method> {
        self.all_references()
            .into_iter()
            .flat_map(|interface| interface.methods.iter())
            .collect()
    }

    fn collect_references<'a>(&'a self, seen: &mut HashSet<&'a str>, out: &mut Vec<&'a Interface>) {
        if !seen.insert(self.name.as_str()) {
            return;
        }
        out.push(self);
        for reference in &self.references {
            reference.collect_references(seen, out);
        }
    }

    // Reference path from this interface to one named `target`, inclusive.
    // Interfaces in `explored` are known not to reach `target`.
    fn path_to<'a>(&'a self, target: &str, explored: &mut HashSet<&'a str>) -> Option<Vec<String>> {
        if self.name == target {
            return Some(vec![self.name.clone()]);
        }
        if !explored.insert(self.name.as_str()) {
            return None;
        }
        self.references.iter().find_map(|reference| {
            reference.path_to(target, explored).map(|mut path| {
                path.insert(0, self.name.clone());
                path
            })
        })
    }
}

impl Characteristic for Interface {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

fn combine_properties(properties: Vec<Property>) -> SchemaResult<Vec<Property>> {
    let mut combined: IndexMap<(String, String), Property> = IndexMap::new();
    for property in properties {
        if property.name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "property" });
        }
        match combined.entry((property.interface_name.clone(), property.name.clone())) {
            Entry::Occupied(mut entry) => {
                let merged = entry.get().combine(&property)?;
                entry.insert(merged);
            }
            Entry::Vacant(entry) => {
                entry.insert(property);
            }
        }
    }
    Ok(combined.into_values().collect())
}

fn combine_methods(methods: Vec<Method>) -> SchemaResult<Vec<Method>> {
    let mut combined: IndexMap<(String, String), Method> = IndexMap::new();
    for method in methods {
        method.validate()?;
        match combined.entry((method.interface_name.clone(), method.name.clone())) {
            Entry::Occupied(mut entry) => {
                if entry.get().parameters != method.parameters {
                    return Err(SchemaError::InconsistentMethod {
                        interface: method.interface_name,
                        method: method.name,
                    });
                }
                let existing = entry.get_mut();
                if existing.description.is_none() {
                    existing.description = method.description;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(method);
            }
        }
    }
    Ok(combined.into_values().collect())
}

fn dedup_references(references: Vec<Arc<Interface>>) -> Vec<Arc<Interface>> {
    let mut seen = HashSet::new();
    references
        .into_iter()
        .filter(|reference| seen.insert(reference.name.clone()))
        .collect()
}

fn serialize_reference_names<S: Serializer>(
    references: &[Arc<Interface>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(references.iter().map(|reference| reference.name.as_str()))
}

/// Incremental construction of an [`Interface`].
#[derive(Debug, Clone)]
pub struct InterfaceBuilder {
    name: String,
    description: Option<String>,
    properties: Vec<Property>,
    methods: Vec<Method>,
    references: Vec<Arc<Interface>>,
}

impl InterfaceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            properties: Vec::new(),
            methods: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn reference(mut self, interface: Arc<Interface>) -> Self {
        self.references.push(interface);
        self
    }

    pub fn build(self) -> SchemaResult<Interface> {
        Interface::new(
            self.name,
            self.description,
            self.properties,
            self.methods,
            self.references,
        )
    }
}
