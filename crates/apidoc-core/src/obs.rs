//! Structured lifecycle events of a retrieval.
//!
//! Every stage of the pipeline reports one `info!` event with an `event`
//! field, inside the invocation span opened by the command.

use std::path::Path;
use tracing::info;

/// RAII guard entering a span tagged with the command and startup module.
///
/// ```ignore
/// let _span = InvocationSpan::enter("tofile", "bin/libpet_store.so");
/// ```
pub struct InvocationSpan {
    _span: tracing::span::EnteredSpan,
}

impl InvocationSpan {
    pub fn enter(command: &str, startup_module: &str) -> Self {
        let span = tracing::info_span!("apidoc.invocation", command = %command, module = %startup_module);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_module_loaded(module: &str, path: &Path, exported_types: usize) {
    info!(
        event = "module.loaded",
        module = %module,
        path = %path.display(),
        exported_types = exported_types,
    );
}

/// Emit event: a custom host factory replaces default host construction.
pub fn emit_host_factory_selected(module: &str, factory: &str) {
    info!(event = "host_factory.selected", module = %module, factory = %factory);
}

/// Emit event: host built, either by a factory or by the default builder.
pub fn emit_host_built(application: &str, environment: &str, custom_factory: bool, services: usize) {
    info!(
        event = "host.built",
        application = %application,
        environment = %environment,
        custom_factory = custom_factory,
        services = services,
    );
}

pub fn emit_document_retrieved(document: &str, paths: usize, operations: usize) {
    info!(
        event = "document.retrieved",
        document = %document,
        paths = paths,
        operations = operations,
    );
}

/// Emit event: document written. `destination` is the file path or `stdout`.
pub fn emit_document_written(document: &str, destination: &str, schema: &str, format: &str) {
    info!(
        event = "document.written",
        document = %document,
        destination = %destination,
        schema = %schema,
        format = %format,
    );
}
