//! Minimal runnable host.
//!
//! A [`Host`] is only ever built to expose its [`ServiceRegistry`]; it never
//! listens on a socket or serves a request. Applications either let
//! [`HostBuilder`] compose it from their [`Startup`] type, or take over
//! construction entirely by exporting a [`HostFactory`].

use crate::error::HostError;
use crate::service::ServiceRegistry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment name used when nothing else selects one.
pub const DEFAULT_ENVIRONMENT: &str = "Production";

/// Environment variable consulted for the host environment name.
pub const ENVIRONMENT_VAR: &str = "APIDOC_ENVIRONMENT";

/// Registry name of the host description registered by [`HostBuilder`].
pub const HOST_CONTEXT_SERVICE: &str = "apidoc.host_context";

/// Application-supplied replacement for default host construction.
///
/// Implementors are instantiated through `Default` and must not require any
/// state from apidoc.
pub trait HostFactory {
    fn build_host(&self) -> Result<Host, HostError>;
}

/// Application startup hook used by the default host path.
pub trait Startup {
    fn configure_services(
        &self,
        context: &HostContext,
        services: &mut ServiceRegistry,
    ) -> Result<(), HostError>;
}

/// Static facts about the host being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub application_name: String,
    pub environment: String,
    pub content_root: Option<PathBuf>,
    pub properties: BTreeMap<String, String>,
}

impl HostContext {
    pub fn is_environment(&self, name: &str) -> bool {
        self.environment.eq_ignore_ascii_case(name)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// A built host. Owns its service registry for the duration of one
/// retrieval.
#[derive(Debug)]
pub struct Host {
    context: HostContext,
    services: ServiceRegistry,
}

impl Host {
    /// Assemble a host from parts; used by custom factories.
    pub fn new(context: HostContext, services: ServiceRegistry) -> Self {
        Self { context, services }
    }

    pub fn context(&self) -> &HostContext {
        &self.context
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        debug!(
            application = %self.context.application_name,
            services = self.services.len(),
            "Host disposed"
        );
    }
}

type ConfigureFn = Box<dyn FnOnce(&HostContext, &mut ServiceRegistry) -> Result<(), HostError>>;

/// Default host construction.
pub struct HostBuilder {
    context: HostContext,
    startup: Option<Box<dyn Startup>>,
    configure: Vec<ConfigureFn>,
}

impl HostBuilder {
    /// Start a builder for the named application with framework defaults:
    /// environment from `APIDOC_ENVIRONMENT` or `Production`, no content
    /// root, no properties.
    pub fn new(application_name: impl Into<String>) -> Self {
        let environment = std::env::var(ENVIRONMENT_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        Self {
            context: HostContext {
                application_name: application_name.into(),
                environment,
                content_root: None,
                properties: BTreeMap::new(),
            },
            startup: None,
            configure: Vec::new(),
        }
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.context.environment = environment.into();
        self
    }

    pub fn content_root(mut self, path: impl AsRef<Path>) -> Self {
        self.context.content_root = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.properties.insert(key.into(), value.into());
        self
    }

    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in properties {
            self.context.properties.insert(key.into(), value.into());
        }
        self
    }

    /// Use `startup` to configure services. Replaces a previous startup.
    pub fn use_startup(mut self, startup: Box<dyn Startup>) -> Self {
        self.startup = Some(startup);
        self
    }

    /// Additional service configuration, run after the startup in
    /// registration order.
    pub fn configure_services<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&HostContext, &mut ServiceRegistry) -> Result<(), HostError> + 'static,
    {
        self.configure.push(Box::new(configure));
        self
    }

    pub fn context(&self) -> &HostContext {
        &self.context
    }

    pub fn build(self) -> Result<Host, HostError> {
        let HostBuilder {
            context,
            startup,
            configure,
        } = self;

        let mut services = ServiceRegistry::new();
        services.register_value(
            HOST_CONTEXT_SERVICE,
            serde_json::json!({
                "applicationName": context.application_name,
                "environment": context.environment,
                "contentRoot": context.content_root.as_ref().map(|root| root.display().to_string()),
            }),
        )?;

        if let Some(startup) = startup {
            startup.configure_services(&context, &mut services)?;
        }
        for step in configure {
            step(&context, &mut services)?;
        }

        debug!(
            application = %context.application_name,
            environment = %context.environment,
            services = services.len(),
            "Host built"
        );
        Ok(Host::new(context, services))
    }
}
