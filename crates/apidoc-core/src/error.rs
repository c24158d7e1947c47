//! Error taxonomy for the retrieval pipeline.

use std::path::PathBuf;

/// The application module could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("startup module not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot resolve module path {path}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("native dependency `{dependency}` of {module} not found (searched: {})", display_dirs(.searched))]
    UnresolvedDependency {
        module: PathBuf,
        dependency: String,
        searched: Vec<PathBuf>,
    },

    #[error("failed to load library {path}")]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("{0} does not export an apidoc module declaration")]
    MissingDeclaration(PathBuf),

    #[error(
        "module {module} was built against SDK {module_sdk} with {module_compiler}; \
         this tool requires SDK {sdk} built with {compiler}"
    )]
    IncompatibleSdk {
        module: PathBuf,
        module_sdk: String,
        module_compiler: String,
        sdk: &'static str,
        compiler: &'static str,
    },
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_names(names: &[String]) -> String {
    names.join(", ")
}

/// The module's exported types are inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error(
        "multiple custom host factories found in module `{module}` ({}); at most one is allowed",
        display_names(.candidates)
    )]
    MultipleHostFactories {
        module: String,
        candidates: Vec<String>,
    },
}

/// No runnable host could be constructed.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(
        "a type named `Startup{environment}` or `Startup` could not be found in module `{module}`"
    )]
    StartupNotFound { module: String, environment: String },

    #[error("host construction failed")]
    Host(#[from] apidoc_host::HostError),
}

/// The document could not be obtained from the host.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error(
        "no document provider is registered in the host of `{application}`; \
         the application is not configured for document generation"
    )]
    ProviderNotRegistered { application: String },

    #[error(transparent)]
    Provider(#[from] apidoc_host::ProviderError),
}

/// Writing the document failed.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed")]
    Yaml(#[from] serde_yaml::Error),

    #[error("write failed")]
    Io(#[from] std::io::Error),
}

/// Any failure of the retrieval pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ApidocError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error("cannot open output {path}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Runtime(#[from] apidoc_runtime::RuntimeError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ApidocError>;
