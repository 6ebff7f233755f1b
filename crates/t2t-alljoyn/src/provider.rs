//! Directory-backed interface provider.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use t2t_protocol::{Characteristic, Interface, InterfaceProvider, SchemaError, SchemaResult};
use tracing::{debug, instrument, warn};

use crate::reader::read_interfaces_from_file;

/// Loads interfaces from `<root>/<interface name>.<extension>` introspection
/// files.
#[derive(Debug, Clone)]
pub struct DirectoryInterfaceProvider {
    root: PathBuf,
    extension: String,
}

impl DirectoryInterfaceProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "xml".to_owned(),
        }
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{}", self.extension))
    }
}

#[async_trait]
impl InterfaceProvider for DirectoryInterfaceProvider {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn interface(&self, name: &str) -> SchemaResult<Arc<Interface>> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(SchemaError::Unavailable(format!(
                "invalid interface name '{name}'"
            )));
        }

        let path = self.file_path(name);
        let interfaces = read_interfaces_from_file(&path).await.map_err(|error| {
            warn!(%error, "interface file could not be read");
            SchemaError::Unavailable(format!("{name}: {error}"))
        })?;

        let interface = interfaces
            .into_iter()
            .find(|interface| interface.name() == name)
            .ok_or_else(|| {
                SchemaError::Unavailable(format!("{name}: not declared in {}", path.display()))
            })?;
        debug!("interface loaded");
        Ok(Arc::new(interface))
    }
}
