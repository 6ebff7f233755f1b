//! Arena of interface declarations resolved into an acyclic interface graph.
//!
//! Declarations reference each other by name. [`InterfaceCatalog::build`]
//! walks the reference graph depth-first with a visiting set, so a cycle is
//! reported once at build time and never needs to be guarded against while
//! traversing the resulting [`Interface`]s.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{Characteristic, Interface, Method, Property};

/// An interface whose references are still names.
#[derive(Debug, Clone, Default)]
pub struct InterfaceDeclaration {
    pub name: String,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    pub methods: Vec<Method>,
    pub references: Vec<String>,
}

impl InterfaceDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn references<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references.extend(names.into_iter().map(Into::into));
        self
    }
}

impl From<Interface> for InterfaceDeclaration {
    fn from(interface: Interface) -> Self {
        Self {
            name: interface.name().to_owned(),
            description: interface.description().map(ToOwned::to_owned),
            properties: interface.properties().to_vec(),
            methods: interface.methods().to_vec(),
            references: interface
                .references()
                .iter()
                .map(|reference| reference.name().to_owned())
                .collect(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct InterfaceCatalog {
    declarations: IndexMap<String, InterfaceDeclaration>,
}

impl InterfaceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, declaration: InterfaceDeclaration) -> SchemaResult<()> {
        if declaration.name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "interface" });
        }
        if self.declarations.contains_key(&declaration.name) {
            return Err(SchemaError::DuplicateInterface(declaration.name));
        }
        self.declarations
            .insert(declaration.name.clone(), declaration);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Resolves every declaration. Either the whole catalog builds or the
    /// first error is returned and nothing is produced.
    pub fn build(&self) -> SchemaResult<IndexMap<String, Arc<Interface>>> {
        let mut built = IndexMap::new();
        let mut visiting = Vec::new();
        for name in self.declarations.keys() {
            self.resolve(name, &mut visiting, &mut built)?;
        }
        Ok(built)
    }

    fn resolve(
        &self,
        name: &str,
        visiting: &mut Vec<String>,
        built: &mut IndexMap<String, Arc<Interface>>,
    ) -> SchemaResult<Arc<Interface>> {
        if let Some(interface) = built.get(name) {
            return Ok(interface.clone());
        }

        if let Some(start) = visiting.iter().position(|visited| visited == name) {
            let mut path = visiting[start..].to_vec();
            path.push(name.to_owned());
            return Err(SchemaError::CyclicReference { path });
        }

        let declaration = self.declarations.get(name).ok_or_else(|| {
            SchemaError::UnknownReference {
                interface: visiting.last().cloned().unwrap_or_default(),
                reference: name.to_owned(),
            }
        })?;

        visiting.push(name.to_owned());
        let mut seen = HashSet::new();
        let mut references = Vec::new();
        for reference in &declaration.references {
            if seen.insert(reference.as_str()) {
                references.push(self.resolve(reference, visiting, built)?);
            }
        }
        visiting.pop();

        let interface = Arc::new(Interface::new(
            declaration.name.clone(),
            declaration.description.clone(),
            declaration.properties.clone(),
            declaration.methods.clone(),
            references,
        )?);
        built.insert(name.to_owned(), interface.clone());
        Ok(interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDescriptor;

    fn declared(name: &str, references: &[&str]) -> InterfaceDeclaration {
        let mut declaration = InterfaceDeclaration::new(name).references(references.iter().copied());
        declaration.properties.push(
            Property::new(name, format!("prop{name}"), TypeDescriptor::String).readable(),
        );
        declaration
    }

    #[test]
    fn builds_diamond_with_each_interface_once() {
        let mut catalog = InterfaceCatalog::new();
        catalog.declare(declared("X", &["Y", "W"])).unwrap();
        catalog.declare(declared("Y", &["Z"])).unwrap();
        catalog.declare(declared("W", &["Z"])).unwrap();
        catalog.declare(declared("Z", &[])).unwrap();

        let built = catalog.build().unwrap();
        assert_eq!(built.len(), 4);

        let x = &built["X"];
        let names: Vec<&str> = x.all_references().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["X", "Y", "Z", "W"]);
        assert_eq!(x.all_properties().len(), 4);
        assert!(Arc::ptr_eq(&built["Y"].references()[0], &built["Z"]));
    }

    #[test]
    fn chain_closure_contains_each_interface() {
        let mut catalog = InterfaceCatalog::new();
        catalog.declare(declared("X", &["Y"])).unwrap();
        catalog.declare(declared("Y", &["Z"])).unwrap();
        catalog.declare(declared("Z", &[])).unwrap();

        let built = catalog.build().unwrap();
        let mut names: Vec<&str> = built["X"].all_references().iter().map(|i| i.name()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn rejects_two_interface_cycle() {
        let mut catalog = InterfaceCatalog::new();
        catalog.declare(declared("X", &["Y"])).unwrap();
        catalog.declare(declared("Y", &["X"])).unwrap();

        let err = catalog.build().unwrap_err();
        assert_eq!(
            err,
            SchemaError::CyclicReference {
                path: vec!["X".to_owned(), "Y".to_owned(), "X".to_owned()]
            }
        );
    }

    #[test]
    fn rejects_unknown_reference() {
        let mut catalog = InterfaceCatalog::new();
        catalog.declare(declared("X", &["Missing"])).unwrap();

        let err = catalog.build().unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownReference {
                interface: "X".to_owned(),
                reference: "Missing".to_owned()
            }
        );
    }

    #[test]
    fn rejects_duplicate_declaration() {
        let mut catalog = InterfaceCatalog::new();
        catalog.declare(declared("X", &[])).unwrap();
        let err = catalog.declare(declared("X", &[])).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateInterface("X".to_owned()));
    }
}
