//! Pet store application module.
//!
//! Built as a native library and loaded by `apidoc` in the binary tests. It
//! exports a default `Startup` and a `StartupDevelopment` for the
//! `Development` environment.

use apidoc_host::{
    export_module, schema_ref, ApiDocument, DocumentCatalog, HostContext, HostError,
    HttpMethod, ModuleRegistrar, Operation, Parameter, RequestBody, Response, ServiceRegistry,
    Startup, TypeExport,
};
use serde_json::json;
use std::sync::Arc;

fn pet_store(title: &str) -> ApiDocument {
    ApiDocument::new(title, "1.0.0")
        .with_server("https://petstore.example.com/api")
        .with_schema(
            "Pet",
            json!({
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string" },
                    "tag": { "type": "string", "nullable": true }
                }
            }),
        )
        .with_operation(
            "/pets",
            HttpMethod::Get,
            Operation::new("listPets")
                .with_parameter(Parameter::query("limit", json!({ "type": "integer" })))
                .with_response(
                    "200",
                    Response::json("All pets", json!({ "type": "array", "items": schema_ref("Pet") })),
                ),
        )
        .with_operation(
            "/pets",
            HttpMethod::Post,
            Operation::new("createPet")
                .with_request_body(RequestBody::json(schema_ref("Pet")))
                .with_response("201", Response::json("Created", schema_ref("Pet"))),
        )
}

fn register_documents(
    context: &HostContext,
    services: &mut ServiceRegistry,
    title: &str,
) -> Result<(), HostError> {
    let title = context.property("title").unwrap_or(title);
    let catalog = DocumentCatalog::new()
        .with_document("v1", pet_store(title))
        .with_document("v2", ApiDocument::new(title, "2.0.0"));
    services.register_document_provider(Arc::new(catalog))?;
    Ok(())
}

#[derive(Default)]
pub struct PetStoreStartup;

impl Startup for PetStoreStartup {
    fn configure_services(
        &self,
        context: &HostContext,
        services: &mut ServiceRegistry,
    ) -> Result<(), HostError> {
        register_documents(context, services, "Pet Store")
    }
}

#[derive(Default)]
pub struct DevelopmentStartup;

impl Startup for DevelopmentStartup {
    fn configure_services(
        &self,
        context: &HostContext,
        services: &mut ServiceRegistry,
    ) -> Result<(), HostError> {
        register_documents(context, services, "Pet Store (Development)")
    }
}

fn register(registrar: &mut dyn ModuleRegistrar) {
    registrar.export(TypeExport::new("fixture_app::Pet"));
    registrar.export(TypeExport::new("fixture_app::Startup").startup::<PetStoreStartup>());
    registrar.export(
        TypeExport::new("fixture_app::StartupDevelopment").startup::<DevelopmentStartup>(),
    );
}

export_module!(register);
