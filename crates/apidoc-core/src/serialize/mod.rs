//! Document serialization: OpenAPI 3 or Swagger 2, as JSON or YAML.
//!
//! Output bytes depend only on the document, the schema version and the
//! format, never on the sink they are written to.

mod sink;
mod v2;

pub use sink::OutputSink;
pub use v2::{SwaggerDocument, SWAGGER_VERSION};

use crate::error::SerializeError;
use apidoc_host::ApiDocument;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// Version written to the `openapi` field of v3 output.
pub const OPENAPI_VERSION: &str = "3.0.1";

/// Schema the document is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaVersion {
    #[default]
    OpenApi3,
    Swagger2,
}

impl SchemaVersion {
    /// Map the `--serializeasv2` flag.
    pub fn from_legacy_flag(serialize_as_v2: bool) -> Self {
        if serialize_as_v2 {
            SchemaVersion::Swagger2
        } else {
            SchemaVersion::OpenApi3
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::OpenApi3 => write!(f, "openapi-{OPENAPI_VERSION}"),
            SchemaVersion::Swagger2 => write!(f, "swagger-{SWAGGER_VERSION}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

#[derive(Serialize)]
struct OpenApiDocument<'a> {
    openapi: &'static str,
    #[serde(flatten)]
    document: &'a ApiDocument,
}

/// Writes documents in one schema version and format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentSerializer {
    version: SchemaVersion,
    format: OutputFormat,
}

impl DocumentSerializer {
    pub fn new(version: SchemaVersion, format: OutputFormat) -> Self {
        Self { version, format }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn write<W: Write>(&self, document: &ApiDocument, writer: W) -> Result<(), SerializeError> {
        match self.version {
            SchemaVersion::OpenApi3 => self.write_value(
                &OpenApiDocument {
                    openapi: OPENAPI_VERSION,
                    document,
                },
                writer,
            ),
            SchemaVersion::Swagger2 => {
                self.write_value(&SwaggerDocument::from_document(document), writer)
            }
        }
    }

    /// Serialize into an in-memory buffer.
    pub fn to_bytes(&self, document: &ApiDocument) -> Result<Vec<u8>, SerializeError> {
        let mut buffer = Vec::new();
        self.write(document, &mut buffer)?;
        Ok(buffer)
    }

    fn write_value<T: Serialize, W: Write>(
        &self,
        value: &T,
        mut writer: W,
    ) -> Result<(), SerializeError> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, value)?;
                writer.write_all(b"\n")?;
            }
            OutputFormat::Yaml => serde_yaml::to_writer(&mut writer, value)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidoc_host::{HttpMethod, Operation, Response};
    use serde_json::Value;

    fn pets() -> ApiDocument {
        ApiDocument::new("Pets", "1.0")
            .with_server("https://api.example.com/v1")
            .with_operation(
                "/pets",
                HttpMethod::Get,
                Operation::new("listPets").with_response("200", Response::new("OK")),
            )
    }

    #[test]
    fn test_v3_json_starts_with_version() {
        let bytes = DocumentSerializer::default().to_bytes(&pets()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("{\n  \"openapi\": \"3.0.1\",\n  \"info\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_v2_json_has_swagger_field() {
        let serializer = DocumentSerializer::new(SchemaVersion::Swagger2, OutputFormat::Json);
        let value: Value = serde_json::from_slice(&serializer.to_bytes(&pets()).unwrap()).unwrap();

        assert_eq!(value["swagger"], "2.0");
        assert!(value.get("openapi").is_none());
        assert_eq!(value["host"], "api.example.com");
        assert_eq!(value["basePath"], "/v1");
    }

    #[test]
    fn test_yaml_output() {
        let serializer = DocumentSerializer::new(SchemaVersion::OpenApi3, OutputFormat::Yaml);
        let text = String::from_utf8(serializer.to_bytes(&pets()).unwrap()).unwrap();

        assert!(text.starts_with("openapi: "));
        let value: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(value["openapi"], serde_yaml::Value::from("3.0.1"));
        assert_eq!(value["info"]["title"], serde_yaml::Value::from("Pets"));
    }

    #[test]
    fn test_legacy_flag() {
        assert_eq!(SchemaVersion::from_legacy_flag(false), SchemaVersion::OpenApi3);
        assert_eq!(SchemaVersion::from_legacy_flag(true), SchemaVersion::Swagger2);
        assert_eq!(SchemaVersion::Swagger2.to_string(), "swagger-2.0");
    }
}
