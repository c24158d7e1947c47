//! Error types for apidoc-runtime

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving runtime descriptors or relaunching.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The startup module path has no file name to derive descriptors from
    #[error("not a module file path: {0}")]
    InvalidModulePath(PathBuf),

    /// A runtime descriptor file does not exist
    #[error("runtime descriptor not found: {0}")]
    DescriptorNotFound(PathBuf),

    /// A runtime descriptor file is not valid JSON for its schema
    #[error("invalid runtime descriptor {path}")]
    InvalidDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The module was built against an SDK this tool cannot host
    #[error("module requires SDK {required}, this tool provides {provided}")]
    IncompatibleSdk { required: String, provided: String },

    /// The path of the running executable could not be determined
    #[error("cannot locate the apidoc executable")]
    CurrentExe(#[source] std::io::Error),

    /// The child process could not be started
    #[error("failed to start {program}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
