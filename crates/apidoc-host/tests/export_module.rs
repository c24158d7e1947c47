use apidoc_host::{
    export_module, ApiDocument, DocumentCatalog, HostBuilder, HostContext, HostError,
    ModuleRegistrar, ServiceRegistry, Startup, TypeExport, SDK_VERSION,
};
use std::sync::Arc;

#[derive(Default)]
struct OrdersStartup;

impl Startup for OrdersStartup {
    fn configure_services(
        &self,
        context: &HostContext,
        services: &mut ServiceRegistry,
    ) -> Result<(), HostError> {
        if !context.is_environment("Production") {
            return Err(HostError::Startup(format!(
                "unexpected environment {}",
                context.environment
            )));
        }
        let catalog = DocumentCatalog::new().with_document("v1", ApiDocument::new("Orders", "1"));
        services.register_document_provider(Arc::new(catalog))?;
        Ok(())
    }
}

fn register(registrar: &mut dyn ModuleRegistrar) {
    registrar.export(TypeExport::new("export_module::Startup").startup::<OrdersStartup>());
}

export_module!(register);

#[test]
fn declaration_defaults_to_crate_name() {
    assert_eq!(APIDOC_MODULE.name, "export_module");
    assert_eq!(APIDOC_MODULE.sdk_version, SDK_VERSION);
}

#[test]
fn exported_startup_configures_a_host() {
    let mut exports: Vec<TypeExport> = Vec::new();
    (APIDOC_MODULE.register)(&mut exports);
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].short_name(), "Startup");

    let startup = exports[0].new_startup().unwrap();
    let host = HostBuilder::new(APIDOC_MODULE.name)
        .environment("Production")
        .use_startup(startup)
        .build()
        .unwrap();

    let provider = host.services().document_provider().unwrap();
    assert_eq!(provider.get_document("v1").unwrap().info.title, "Orders");
}

#[test]
fn startup_errors_surface_from_build() {
    let err = HostBuilder::new("orders")
        .environment("Development")
        .use_startup(Box::new(OrdersStartup))
        .build()
        .unwrap_err();
    assert!(matches!(err, HostError::Startup(_)));
}
