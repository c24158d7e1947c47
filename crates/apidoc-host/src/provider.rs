//! Document provider capability.

use crate::document::ApiDocument;
use crate::error::ProviderError;
use std::collections::BTreeMap;

/// Produces API description documents on demand.
///
/// Applications register one provider in their host's
/// [`ServiceRegistry`](crate::ServiceRegistry) under
/// [`DOCUMENT_PROVIDER_SERVICE`]; apidoc looks it up there and asks it for a
/// document by name.
pub trait DocumentProvider: Send + Sync {
    /// Names of every document this provider can generate.
    fn document_names(&self) -> Vec<String>;

    /// Generate the named document.
    fn get_document(&self, name: &str) -> Result<ApiDocument, ProviderError>;
}

/// Registry name of the document provider service.
pub const DOCUMENT_PROVIDER_SERVICE: &str = "apidoc.document_provider";

/// A provider backed by documents built up front.
#[derive(Debug, Clone, Default)]
pub struct DocumentCatalog {
    documents: BTreeMap<String, ApiDocument>,
}

impl DocumentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: impl Into<String>, document: ApiDocument) -> Self {
        self.documents.insert(name.into(), document);
        self
    }
}

impl DocumentProvider for DocumentCatalog {
    fn document_names(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    fn get_document(&self, name: &str) -> Result<ApiDocument, ProviderError> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownDocument {
                name: name.to_string(),
                known: self.document_names(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_returns_named_document() {
        let catalog = DocumentCatalog::new()
            .with_document("v1", ApiDocument::new("Pets", "1.0"))
            .with_document("v2", ApiDocument::new("Pets", "2.0"));

        let doc = catalog.get_document("v2").unwrap();
        assert_eq!(doc.info.version, "2.0");
        assert_eq!(catalog.document_names(), vec!["v1", "v2"]);
    }

    #[test]
    fn test_catalog_unknown_document() {
        let catalog = DocumentCatalog::new().with_document("v1", ApiDocument::new("Pets", "1.0"));

        let err = catalog.get_document("v9").unwrap_err();
        match err {
            ProviderError::UnknownDocument { name, known } => {
                assert_eq!(name, "v9");
                assert_eq!(known, vec!["v1"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
