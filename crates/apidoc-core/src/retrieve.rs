//! Document retrieval from a built host.

use crate::error::RetrievalError;
use crate::obs::emit_document_retrieved;
use apidoc_host::{ApiDocument, DocumentProvider, Host, Server};
use std::sync::Arc;

/// Optional replacements for the servers a document advertises.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub base_path: Option<String>,
}

impl ServerOverrides {
    pub fn new(host: Option<String>, base_path: Option<String>) -> Self {
        Self { host, base_path }
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.base_path.is_none()
    }

    /// Replace the document's servers with a single `{host}{base_path}`
    /// server when either override is present. A no-op otherwise.
    pub fn apply(&self, document: &mut ApiDocument) {
        if self.is_empty() {
            return;
        }
        let url = format!(
            "{}{}",
            self.host.as_deref().unwrap_or_default(),
            self.base_path.as_deref().unwrap_or_default()
        );
        document.servers = vec![Server::new(url)];
    }
}

fn provider(host: &Host) -> Result<Arc<dyn DocumentProvider>, RetrievalError> {
    host.services()
        .document_provider()
        .ok_or_else(|| RetrievalError::ProviderNotRegistered {
            application: host.context().application_name.clone(),
        })
}

/// Generate the named document and apply the server overrides.
pub fn retrieve_document(
    host: &Host,
    document_name: &str,
    overrides: &ServerOverrides,
) -> Result<ApiDocument, RetrievalError> {
    let mut document = provider(host)?.get_document(document_name)?;
    overrides.apply(&mut document);

    emit_document_retrieved(document_name, document.paths.len(), document.operation_count());
    Ok(document)
}

/// Names of every document the host's provider can generate.
pub fn list_documents(host: &Host) -> Result<Vec<String>, RetrievalError> {
    Ok(provider(host)?.document_names())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_servers() {
        let mut doc = ApiDocument::new("Pets", "1")
            .with_server("https://old.example.com")
            .with_server("https://backup.example.com");

        ServerOverrides::new(Some("api.example.com".into()), Some("/v2".into())).apply(&mut doc);
        assert_eq!(doc.servers, vec![Server::new("api.example.com/v2")]);
    }

    #[test]
    fn test_single_override() {
        let mut doc = ApiDocument::new("Pets", "1");
        ServerOverrides::new(None, Some("/api".into())).apply(&mut doc);
        assert_eq!(doc.servers, vec![Server::new("/api")]);

        let mut doc = ApiDocument::new("Pets", "1");
        ServerOverrides::new(Some("localhost:8080".into()), None).apply(&mut doc);
        assert_eq!(doc.servers, vec![Server::new("localhost:8080")]);
    }

    #[test]
    fn test_no_overrides_keep_servers() {
        let mut doc = ApiDocument::new("Pets", "1").with_server("https://api.example.com");
        let before = doc.clone();
        ServerOverrides::default().apply(&mut doc);
        assert_eq!(doc, before);
    }
}
