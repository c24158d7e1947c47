//! Host construction: a custom factory when the module exports one,
//! otherwise the default builder configured by the module's startup type.

use crate::error::BootstrapError;
use crate::loader::LoadedModule;
use crate::obs::emit_host_built;
use crate::resolver::ResolvedHostFactory;
use apidoc_host::{Host, HostBuilder, TypeExport};
use apidoc_runtime::RuntimeConfig;
use std::collections::BTreeMap;
use tracing::debug;

/// Settings the default host path takes from the runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSettings {
    /// Overrides `APIDOC_ENVIRONMENT` when set.
    pub environment: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl From<&RuntimeConfig> for HostSettings {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            environment: config.environment.clone(),
            properties: config.properties.clone(),
        }
    }
}

/// Build the host the document is retrieved from.
pub fn bootstrap_host(
    module: &LoadedModule,
    factory: Option<&ResolvedHostFactory>,
    settings: &HostSettings,
) -> Result<Host, BootstrapError> {
    if let Some(resolved) = factory {
        debug!(factory = %resolved.type_name(), "Building host through custom factory");
        let host = resolved.factory().build_host()?;
        report_built(&host, true);
        return Ok(host);
    }

    let mut builder = HostBuilder::new(module.name()).properties(settings.properties.clone());
    if let Some(environment) = &settings.environment {
        builder = builder.environment(environment.clone());
    }
    if let Some(root) = module.directory() {
        builder = builder.content_root(root);
    }

    let environment = builder.context().environment.clone();
    let startup = find_startup(module.exports(), &environment).ok_or_else(|| {
        BootstrapError::StartupNotFound {
            module: module.name().to_string(),
            environment: environment.clone(),
        }
    })?;
    debug!(startup = %startup.name(), environment = %environment, "Using startup type");

    let builder = match startup.new_startup() {
        Some(instance) => builder.use_startup(instance),
        None => builder,
    };
    let host = builder.build()?;
    report_built(&host, false);
    Ok(host)
}

/// Locate the startup type by convention: `Startup{environment}` first,
/// then `Startup`. Short names compare case-insensitively.
pub fn find_startup<'a>(exports: &'a [TypeExport], environment: &str) -> Option<&'a TypeExport> {
    let by_name = |wanted: &str| {
        exports
            .iter()
            .filter(|export| export.is_startup())
            .find(|export| export.short_name().eq_ignore_ascii_case(wanted))
    };

    by_name(&format!("Startup{environment}")).or_else(|| by_name("Startup"))
}

fn report_built(host: &Host, custom_factory: bool) {
    let context = host.context();
    emit_host_built(
        &context.application_name,
        &context.environment,
        custom_factory,
        host.services().len(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidoc_host::{HostContext, HostError, ServiceRegistry, Startup};

    #[derive(Default)]
    struct Noop;

    impl Startup for Noop {
        fn configure_services(
            &self,
            _context: &HostContext,
            _services: &mut ServiceRegistry,
        ) -> Result<(), HostError> {
            Ok(())
        }
    }

    fn exports() -> Vec<TypeExport> {
        vec![
            TypeExport::new("pets::Startup").startup::<Noop>(),
            TypeExport::new("pets::StartupDevelopment").startup::<Noop>(),
            TypeExport::new("pets::StartupStaging"),
        ]
    }

    #[test]
    fn test_environment_specific_startup_wins() {
        let exports = exports();
        let found = find_startup(&exports, "Development").unwrap();
        assert_eq!(found.name(), "pets::StartupDevelopment");

        let found = find_startup(&exports, "development").unwrap();
        assert_eq!(found.name(), "pets::StartupDevelopment");
    }

    #[test]
    fn test_falls_back_to_plain_startup() {
        let exports = exports();
        assert_eq!(find_startup(&exports, "Production").unwrap().name(), "pets::Startup");
        // StartupStaging exists but has no startup capability.
        assert_eq!(find_startup(&exports, "Staging").unwrap().name(), "pets::Startup");
    }

    #[test]
    fn test_no_startup() {
        let exports = vec![TypeExport::new("pets::Model")];
        assert!(find_startup(&exports, "Production").is_none());
    }

    #[test]
    fn test_settings_from_runtime_config() {
        let config = RuntimeConfig {
            sdk_version: "0.1.0".to_string(),
            environment: Some("Staging".to_string()),
            properties: BTreeMap::from([("title".to_string(), "Pets".to_string())]),
        };
        let settings = HostSettings::from(&config);
        assert_eq!(settings.environment.as_deref(), Some("Staging"));
        assert_eq!(settings.properties["title"], "Pets");
    }
}
