//! apidoc-host: hosting SDK for applications inspected by apidoc
//!
//! Applications link this crate, describe their API through a
//! [`DocumentProvider`] registered in a [`ServiceRegistry`], and export a
//! [`ModuleDeclaration`] so that `apidoc` can load them, build a [`Host`],
//! and pull documents out of it without running a server.
//!
//! ## Capabilities
//!
//! - [`Startup`]: configures services on the default host path
//! - [`HostFactory`]: replaces default host construction entirely
//! - [`DocumentProvider`]: produces named API documents

pub mod document;
pub mod error;
pub mod host;
pub mod module;
pub mod provider;
pub mod service;

pub use document::{
    schema_ref, ApiDocument, Components, HttpMethod, Info, MediaType, Operation, Parameter,
    ParameterLocation, PathItem, RequestBody, Response, Server, Tag,
    COMPONENT_SCHEMA_REF_PREFIX,
};
pub use error::{HostError, ProviderError, ServiceRegistrationError};
pub use host::{
    Host, HostBuilder, HostContext, HostFactory, Startup, DEFAULT_ENVIRONMENT, ENVIRONMENT_VAR,
    HOST_CONTEXT_SERVICE,
};
pub use module::{
    HostFactoryConstructor, ModuleDeclaration, ModuleRegistrar, StartupConstructor, TypeExport,
    COMPILER_FINGERPRINT, MODULE_DECLARATION_SYMBOL, SDK_VERSION,
};
pub use provider::{DocumentCatalog, DocumentProvider, DOCUMENT_PROVIDER_SERVICE};
pub use service::{ServiceEntry, ServiceRegistry};
