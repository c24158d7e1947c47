//! apidoc-core: document retrieval pipeline
//!
//! Loads a compiled application module, finds or builds its host, asks the
//! host's document provider for a named API document and writes it out as
//! OpenAPI 3 or Swagger 2.
//!
//! ## Modules
//!
//! - [`loader`]: module loading into per-module load contexts
//! - [`resolver`]: custom host factory discovery
//! - [`bootstrap`]: host construction
//! - [`retrieve`]: document retrieval and server overrides
//! - [`serialize`]: OpenAPI 3 / Swagger 2, JSON / YAML, output sinks
//! - [`pipeline`]: the stages chained for the `_tofile` and `_list` commands

pub mod bootstrap;
pub mod error;
pub mod loader;
pub mod obs;
pub mod pipeline;
pub mod resolver;
pub mod retrieve;
pub mod serialize;
pub mod telemetry;

pub use bootstrap::{bootstrap_host, find_startup, HostSettings};
pub use error::{
    ApidocError, BootstrapError, ConfigurationError, LoadError, Result, RetrievalError,
    SerializeError,
};
pub use loader::{
    LoadContext, LoadedModule, ModuleLoader, ModuleSource, NativeModuleSource, StaticModuleSource,
};
pub use obs::{
    emit_document_retrieved, emit_document_written, emit_host_built, emit_host_factory_selected,
    emit_module_loaded, InvocationSpan,
};
pub use pipeline::{
    generate_document, run_list, run_to_file, start_application, write_document, Application,
    InvocationRequest, ListRequest,
};
pub use resolver::{resolve_host_factory, ResolvedHostFactory};
pub use retrieve::{list_documents, retrieve_document, ServerOverrides};
pub use serialize::{
    DocumentSerializer, OutputFormat, OutputSink, SchemaVersion, SwaggerDocument,
    OPENAPI_VERSION, SWAGGER_VERSION,
};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
