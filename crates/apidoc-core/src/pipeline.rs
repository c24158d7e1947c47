//! The retrieval pipeline run inside the relaunched child process:
//! load the module, resolve its host factory, build the host, retrieve the
//! document and write it to the sink.

use crate::bootstrap::{bootstrap_host, HostSettings};
use crate::error::{ApidocError, Result, SerializeError};
use crate::loader::{LoadedModule, ModuleLoader, ModuleSource};
use crate::obs::emit_document_written;
use crate::resolver::{resolve_host_factory, ResolvedHostFactory};
use crate::retrieve::{list_documents, retrieve_document, ServerOverrides};
use crate::serialize::{DocumentSerializer, OutputFormat, OutputSink, SchemaVersion};
use apidoc_host::{ApiDocument, Host};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments of a `tofile` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub startup_module: PathBuf,
    pub document_name: String,
    pub output: Option<PathBuf>,
    pub host: Option<String>,
    pub base_path: Option<String>,
    pub schema_version: SchemaVersion,
    pub format: OutputFormat,
}

impl InvocationRequest {
    pub fn new(startup_module: impl Into<PathBuf>, document_name: impl Into<String>) -> Self {
        Self {
            startup_module: startup_module.into(),
            document_name: document_name.into(),
            output: None,
            host: None,
            base_path: None,
            schema_version: SchemaVersion::default(),
            format: OutputFormat::default(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_schema_version(mut self, version: SchemaVersion) -> Self {
        self.schema_version = version;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn overrides(&self) -> ServerOverrides {
        ServerOverrides::new(self.host.clone(), self.base_path.clone())
    }

    pub fn serializer(&self) -> DocumentSerializer {
        DocumentSerializer::new(self.schema_version, self.format)
    }
}

/// Arguments of a `list` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub startup_module: PathBuf,
    pub output: Option<PathBuf>,
}

impl ListRequest {
    pub fn new(startup_module: impl Into<PathBuf>) -> Self {
        Self {
            startup_module: startup_module.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// A loaded module together with the host built from it.
///
/// Drops the host first, then the factory, then the module handle.
#[derive(Debug)]
pub struct Application {
    host: Host,
    factory: Option<ResolvedHostFactory>,
    module: Arc<LoadedModule>,
}

impl Application {
    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn module(&self) -> &LoadedModule {
        &self.module
    }

    /// Type name of the custom host factory, if one built the host.
    pub fn factory_name(&self) -> Option<&str> {
        self.factory.as_ref().map(ResolvedHostFactory::type_name)
    }
}

/// Load `startup_module`, resolve its host factory and build the host.
pub fn start_application<S: ModuleSource>(
    loader: &mut ModuleLoader<S>,
    startup_module: &Path,
    settings: &HostSettings,
) -> Result<Application> {
    let module = loader.load(startup_module)?;
    let factory = resolve_host_factory(&module)?;
    let host = bootstrap_host(&module, factory.as_ref(), settings)?;

    Ok(Application {
        host,
        factory,
        module,
    })
}

/// Retrieve the requested document from a started application.
pub fn generate_document(application: &Application, request: &InvocationRequest) -> Result<ApiDocument> {
    Ok(retrieve_document(
        application.host(),
        &request.document_name,
        &request.overrides(),
    )?)
}

/// Serialize `document` to the request's sink. Returns the file written, or
/// `None` for stdout.
pub fn write_document(document: &ApiDocument, request: &InvocationRequest) -> Result<Option<PathBuf>> {
    let serializer = request.serializer();
    let (destination, written) = write_output(request.output.as_deref(), |sink| {
        serializer.write(document, sink)
    })?;

    emit_document_written(
        &request.document_name,
        &destination,
        &serializer.version().to_string(),
        &serializer.format().to_string(),
    );
    Ok(written)
}

/// Run `tofile` end to end against `loader`.
pub fn run_to_file<S: ModuleSource>(
    loader: &mut ModuleLoader<S>,
    request: &InvocationRequest,
    settings: &HostSettings,
) -> Result<Option<PathBuf>> {
    let application = start_application(loader, &request.startup_module, settings)?;
    let document = generate_document(&application, request)?;
    drop(application);

    write_document(&document, request)
}

/// Run `list` end to end: write every document name, one per line.
pub fn run_list<S: ModuleSource>(
    loader: &mut ModuleLoader<S>,
    request: &ListRequest,
    settings: &HostSettings,
) -> Result<Vec<String>> {
    let application = start_application(loader, &request.startup_module, settings)?;
    let names = list_documents(application.host())?;
    drop(application);

    write_output(request.output.as_deref(), |sink| {
        for name in &names {
            writeln!(sink, "{name}")?;
        }
        Ok(())
    })?;
    Ok(names)
}

/// Open the sink, fill it, flush it. Prints the confirmation line for file
/// sinks only, after a successful flush.
fn write_output<F>(output: Option<&Path>, fill: F) -> Result<(String, Option<PathBuf>)>
where
    F: FnOnce(&mut OutputSink) -> std::result::Result<(), SerializeError>,
{
    let mut sink = OutputSink::open(output).map_err(|source| ApidocError::Output {
        path: output.map_or_else(|| PathBuf::from("stdout"), Path::to_path_buf),
        source,
    })?;
    let destination = sink.describe();

    fill(&mut sink)?;
    let written = sink.finish().map_err(SerializeError::from)?;

    if let Some(path) = &written {
        println!("API document written to {}", path.display());
    }
    Ok((destination, written))
}
