//! Host factory discovery.

use crate::error::ConfigurationError;
use crate::loader::LoadedModule;
use crate::obs::emit_host_factory_selected;
use apidoc_host::HostFactory;
use std::fmt;

/// The single host factory exported by a module, instantiated.
pub struct ResolvedHostFactory {
    type_name: String,
    factory: Box<dyn HostFactory>,
}

impl ResolvedHostFactory {
    /// Qualified name of the factory type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn factory(&self) -> &dyn HostFactory {
        self.factory.as_ref()
    }
}

impl fmt::Debug for ResolvedHostFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHostFactory")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Find the module's custom host factory.
///
/// Zero candidates is not an error: the default host path applies. Two or
/// more candidates fail with every candidate named.
pub fn resolve_host_factory(
    module: &LoadedModule,
) -> Result<Option<ResolvedHostFactory>, ConfigurationError> {
    let candidates: Vec<_> = module
        .exports()
        .iter()
        .filter_map(|export| {
            export
                .host_factory_constructor()
                .map(|construct| (export.name(), construct))
        })
        .collect();

    match candidates.as_slice() {
        [] => Ok(None),
        [(name, construct)] => {
            emit_host_factory_selected(module.name(), name);
            Ok(Some(ResolvedHostFactory {
                type_name: name.to_string(),
                factory: construct(),
            }))
        }
        _ => Err(ConfigurationError::MultipleHostFactories {
            module: module.name().to_string(),
            candidates: candidates
                .iter()
                .map(|(name, _)| name.to_string())
                .collect(),
        }),
    }
}
