//! apidoc-runtime: runtime descriptors and process relaunch
//!
//! The user-facing commands of apidoc never load the application module in
//! their own process. They derive the module's runtime descriptors and
//! relaunch apidoc as a child process running the internal form of the
//! command under those descriptors.
//!
//! ## Modules
//!
//! - [`descriptors`]: derive, read and check `*.deps.json` / `*.runtimeconfig.json`
//! - [`relaunch`]: build the child invocation, spawn it, propagate its exit code

pub mod descriptors;
pub mod error;
pub mod relaunch;

pub use descriptors::{
    ensure_sdk_matches, DependencyManifest, RuntimeConfig, RuntimeDescriptors,
    RuntimeEnvironment, DEPENDENCY_MANIFEST_EXTENSION, RUNTIME_CONFIG_EXTENSION,
};
pub use error::RuntimeError;
pub use relaunch::{
    escape_arg, internal_command, ChildInvocation, ProcessRelauncher, DEPSFILE_FLAG,
    INTERNAL_COMMAND_PREFIX, RUNTIMECONFIG_FLAG,
};

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
