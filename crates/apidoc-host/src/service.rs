//! Named service registry owned by a [`Host`](crate::Host).

use crate::error::ServiceRegistrationError;
use crate::provider::{DocumentProvider, DOCUMENT_PROVIDER_SERVICE};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A registered service.
///
/// Services are looked up by name rather than by type so that a registry
/// built inside a dynamically loaded module can be read by the tool without
/// relying on type identity across the library boundary.
#[derive(Clone)]
pub enum ServiceEntry {
    /// The document provider capability.
    DocumentProvider(Arc<dyn DocumentProvider>),
    /// An options block or any other plain configuration value.
    Value(serde_json::Value),
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceEntry::DocumentProvider(_) => f
                .debug_tuple("ServiceEntry::DocumentProvider")
                .field(&"DocumentProvider")
                .finish(),
            ServiceEntry::Value(value) => f.debug_tuple("ServiceEntry::Value").field(value).finish(),
        }
    }
}

/// Service catalogue of a host. Names are case-sensitive; iteration order is
/// stable.
#[derive(Debug, Default, Clone)]
pub struct ServiceRegistry {
    entries: BTreeMap<String, ServiceEntry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` under `name`. Fails if the name is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        entry: ServiceEntry,
    ) -> Result<(), ServiceRegistrationError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(ServiceRegistrationError::Duplicate { name });
        }
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Register the document provider under its well-known name.
    pub fn register_document_provider(
        &mut self,
        provider: Arc<dyn DocumentProvider>,
    ) -> Result<(), ServiceRegistrationError> {
        self.register(
            DOCUMENT_PROVIDER_SERVICE,
            ServiceEntry::DocumentProvider(provider),
        )
    }

    pub fn register_value(
        &mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), ServiceRegistrationError> {
        self.register(name, ServiceEntry::Value(value))
    }

    pub fn get(&self, name: &str) -> Option<&ServiceEntry> {
        self.entries.get(name)
    }

    /// The registered document provider, if any.
    pub fn document_provider(&self) -> Option<Arc<dyn DocumentProvider>> {
        match self.entries.get(DOCUMENT_PROVIDER_SERVICE) {
            Some(ServiceEntry::DocumentProvider(provider)) => Some(Arc::clone(provider)),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|name| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DocumentCatalog;
    use crate::ApiDocument;

    #[test]
    fn test_register_and_get_document_provider() {
        let mut services = ServiceRegistry::new();
        let catalog = DocumentCatalog::new().with_document("v1", ApiDocument::new("Pets", "1"));
        services.register_document_provider(Arc::new(catalog)).unwrap();

        let provider = services.document_provider().expect("provider registered");
        assert_eq!(provider.document_names(), vec!["v1"]);
        assert!(services.contains(DOCUMENT_PROVIDER_SERVICE));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut services = ServiceRegistry::new();
        services
            .register_value("swagger.options", serde_json::json!({ "a": 1 }))
            .unwrap();
        let err = services
            .register_value("swagger.options", serde_json::json!({ "a": 2 }))
            .unwrap_err();
        assert_eq!(
            err,
            ServiceRegistrationError::Duplicate {
                name: "swagger.options".to_string()
            }
        );
    }

    #[test]
    fn test_value_under_provider_name_is_not_a_provider() {
        let mut services = ServiceRegistry::new();
        services
            .register_value(DOCUMENT_PROVIDER_SERVICE, serde_json::json!(null))
            .unwrap();
        assert!(services.document_provider().is_none());
    }

    #[test]
    fn test_names_are_sorted() {
        let mut services = ServiceRegistry::new();
        services.register_value("b", serde_json::json!(1)).unwrap();
        services.register_value("a", serde_json::json!(2)).unwrap();
        assert_eq!(services.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(services.len(), 2);
    }
}
