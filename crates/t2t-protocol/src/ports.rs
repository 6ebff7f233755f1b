//! Boundary ports through which interface definitions are obtained.
//!
//! Traits use `async-trait` so they stay object-safe behind `Arc<dyn _>`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SchemaResult;
use crate::schema::Interface;

/// Supplies interface definitions by name, e.g. from files on disk or a
/// package registry.
#[async_trait]
pub trait InterfaceProvider: Send + Sync {
    async fn interface(&self, name: &str) -> SchemaResult<Arc<Interface>>;

    /// Loads several interfaces, failing on the first one that cannot be
    /// provided.
    async fn interfaces(&self, names: &[&str]) -> SchemaResult<Vec<Arc<Interface>>> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            out.push(self.interface(name).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::SchemaError;

    struct InMemoryProvider(HashMap<String, Arc<Interface>>);

    #[async_trait]
    impl InterfaceProvider for InMemoryProvider {
        async fn interface(&self, name: &str) -> SchemaResult<Arc<Interface>> {
            self.0
                .get(name)
                .cloned()
                .ok_or_else(|| SchemaError::Unavailable(name.to_owned()))
        }
    }

    #[tokio::test]
    async fn interfaces_fails_on_first_missing_name() {
        let a = Arc::new(Interface::builder("A").build().unwrap());
        let provider = InMemoryProvider(HashMap::from([("A".to_owned(), a)]));

        let found = provider.interfaces(&["A"]).await.unwrap();
        assert_eq!(found.len(), 1);

        let err = provider.interfaces(&["A", "B"]).await.unwrap_err();
        assert_eq!(err, SchemaError::Unavailable("B".to_owned()));
    }
}
