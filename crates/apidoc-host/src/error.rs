//! Error types for the hosting SDK

use thiserror::Error;

/// Errors raised while composing or building a host.
#[derive(Error, Debug)]
pub enum HostError {
    /// A service name was registered twice
    #[error("service registration failed")]
    Service(#[from] ServiceRegistrationError),

    /// Application startup code rejected the configuration
    #[error("startup failed: {0}")]
    Startup(String),

    /// A custom host factory could not produce a host
    #[error("host factory failed: {0}")]
    Factory(String),
}

/// Registering a service under a name that is already taken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceRegistrationError {
    #[error("service `{name}` already registered")]
    Duplicate { name: String },
}

/// Errors produced by a [`DocumentProvider`](crate::DocumentProvider).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No document is registered under the requested name
    #[error("unknown document `{name}` (known documents: {})", known_list(.known))]
    UnknownDocument { name: String, known: Vec<String> },

    /// The provider failed while generating the document
    #[error("document generation failed: {0}")]
    Generation(String),
}

fn known_list(known: &[String]) -> String {
    if known.is_empty() {
        "none".to_string()
    } else {
        known.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_document_lists_known_names() {
        let err = ProviderError::UnknownDocument {
            name: "v3".to_string(),
            known: vec!["v1".to_string(), "v2".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("`v3`"));
        assert!(msg.contains("v1, v2"));
    }

    #[test]
    fn test_unknown_document_without_known_names() {
        let err = ProviderError::UnknownDocument {
            name: "v1".to_string(),
            known: Vec::new(),
        };
        assert!(err.to_string().contains("known documents: none"));
    }

    #[test]
    fn test_host_error_wraps_duplicate_service() {
        let err: HostError = ServiceRegistrationError::Duplicate {
            name: "apidoc.document_provider".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "service registration failed");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("already registered"));
    }
}
