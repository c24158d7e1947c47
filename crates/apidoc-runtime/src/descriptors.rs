//! Runtime descriptors of a startup module.
//!
//! A compiled application module `dir/name.<ext>` ships with two sibling
//! files: `dir/name.deps.json` (the dependency manifest: native libraries the
//! module needs loaded first and where to find them) and
//! `dir/name.runtimeconfig.json` (the runtime configuration: SDK version the
//! module targets, host environment, configuration properties).

use crate::error::RuntimeError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension replacing the module's own to name the dependency manifest.
pub const DEPENDENCY_MANIFEST_EXTENSION: &str = "deps.json";

/// Extension replacing the module's own to name the runtime configuration.
pub const RUNTIME_CONFIG_EXTENSION: &str = "runtimeconfig.json";

/// Paths of the two descriptor files belonging to a startup module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeDescriptors {
    pub dependency_manifest: PathBuf,
    pub runtime_config: PathBuf,
}

impl RuntimeDescriptors {
    /// Derive the descriptor paths for `module_path` by replacing its
    /// extension. Pure: touches no files.
    pub fn derive(module_path: &Path) -> Result<Self> {
        if module_path.file_name().is_none() {
            return Err(RuntimeError::InvalidModulePath(module_path.to_path_buf()));
        }

        Ok(Self {
            dependency_manifest: module_path.with_extension(DEPENDENCY_MANIFEST_EXTENSION),
            runtime_config: module_path.with_extension(RUNTIME_CONFIG_EXTENSION),
        })
    }

    /// Fail with [`RuntimeError::DescriptorNotFound`] unless both files exist.
    pub fn ensure_exist(&self) -> Result<()> {
        for path in [&self.dependency_manifest, &self.runtime_config] {
            if !path.is_file() {
                return Err(RuntimeError::DescriptorNotFound(path.clone()));
            }
        }
        Ok(())
    }
}

/// Contents of `*.deps.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyManifest {
    /// Expected module name, checked against the module's declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// SDK version recorded at build time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
    /// Native libraries loaded, in order, before the module itself.
    #[serde(default)]
    pub native_dependencies: Vec<String>,
    /// Extra directories searched for native dependencies, relative to the
    /// module directory unless absolute.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

impl DependencyManifest {
    pub fn read(path: &Path) -> Result<Self> {
        read_descriptor(path)
    }

    /// Directories searched for native dependencies: the module directory
    /// first, then every configured search path.
    pub fn search_dirs(&self, module_dir: &Path) -> Vec<PathBuf> {
        std::iter::once(module_dir.to_path_buf())
            .chain(self.search_paths.iter().map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    module_dir.join(dir)
                }
            }))
            .collect()
    }

    /// Locate a native dependency, or `None` if no search directory has it.
    pub fn locate(&self, dependency: &str, module_dir: &Path) -> Option<PathBuf> {
        let candidate = Path::new(dependency);
        if candidate.is_absolute() {
            return candidate.is_file().then(|| candidate.to_path_buf());
        }

        self.search_dirs(module_dir)
            .into_iter()
            .map(|dir| dir.join(candidate))
            .find(|path| path.is_file())
    }
}

/// Contents of `*.runtimeconfig.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// SDK version the module requires.
    pub sdk_version: String,
    /// Host environment name, e.g. `Development`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Configuration handed to the default host.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl RuntimeConfig {
    pub fn read(path: &Path) -> Result<Self> {
        read_descriptor(path)
    }

    /// Check that the running SDK is the one `self.sdk_version` names.
    pub fn check_sdk(&self) -> Result<()> {
        ensure_sdk_matches(&self.sdk_version, apidoc_host::SDK_VERSION)
    }
}

/// Descriptors of the startup module, parsed and checked. This is the
/// configuration the internal commands run under.
#[derive(Debug, Clone)]
pub struct RuntimeEnvironment {
    pub descriptors: RuntimeDescriptors,
    pub dependencies: DependencyManifest,
    pub config: RuntimeConfig,
}

impl RuntimeEnvironment {
    /// Read both descriptor files and verify the SDK version.
    pub fn load(dependency_manifest: &Path, runtime_config: &Path) -> Result<Self> {
        let descriptors = RuntimeDescriptors {
            dependency_manifest: dependency_manifest.to_path_buf(),
            runtime_config: runtime_config.to_path_buf(),
        };
        descriptors.ensure_exist()?;

        let dependencies = DependencyManifest::read(dependency_manifest)?;
        let config = RuntimeConfig::read(runtime_config)?;
        config.check_sdk()?;

        debug!(
            depsfile = %dependency_manifest.display(),
            runtimeconfig = %runtime_config.display(),
            sdk_version = %config.sdk_version,
            native_dependencies = dependencies.native_dependencies.len(),
            "Runtime descriptors loaded"
        );

        Ok(Self {
            descriptors,
            dependencies,
            config,
        })
    }
}

fn read_descriptor<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => RuntimeError::DescriptorNotFound(path.to_path_buf()),
        _ => RuntimeError::Io(err),
    })?;

    serde_json::from_slice(&content).map_err(|source| RuntimeError::InvalidDescriptor {
        path: path.to_path_buf(),
        source,
    })
}

/// Exact match: `provided` is the release named by `required`. Missing minor
/// or patch components count as zero; build metadata is ignored.
pub fn ensure_sdk_matches(required: &str, provided: &str) -> Result<()> {
    match (parse_version(required), parse_version(provided)) {
        (Some(req), Some(have)) if req == have => Ok(()),
        _ => Err(RuntimeError::IncompatibleSdk {
            required: required.to_string(),
            provided: provided.to_string(),
        }),
    }
}

fn parse_version(version: &str) -> Option<(u64, u64, u64, Option<&str>)> {
    let version = version.trim().split('+').next()?;
    let (core, pre_release) = match version.split_once('-') {
        Some((core, pre_release)) => (core, Some(pre_release)),
        None => (version, None),
    };
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch, pre_release))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_derive_replaces_extension() {
        let descriptors = RuntimeDescriptors::derive(Path::new("bin/libpet_store.so")).unwrap();
        assert_eq!(
            descriptors.dependency_manifest,
            PathBuf::from("bin/libpet_store.deps.json")
        );
        assert_eq!(
            descriptors.runtime_config,
            PathBuf::from("bin/libpet_store.runtimeconfig.json")
        );
    }

    #[test]
    fn test_derive_without_extension() {
        let descriptors = RuntimeDescriptors::derive(Path::new("app")).unwrap();
        assert_eq!(descriptors.dependency_manifest, PathBuf::from("app.deps.json"));
    }

    #[test]
    fn test_derive_rejects_directory_like_path() {
        assert!(matches!(
            RuntimeDescriptors::derive(Path::new("..")),
            Err(RuntimeError::InvalidModulePath(_))
        ));
    }

    #[test]
    fn test_ensure_exist_reports_missing_file() {
        let dir = tempdir().unwrap();
        let module = dir.path().join("app.so");
        std::fs::write(dir.path().join("app.deps.json"), "{}").unwrap();

        let descriptors = RuntimeDescriptors::derive(&module).unwrap();
        match descriptors.ensure_exist() {
            Err(RuntimeError::DescriptorNotFound(path)) => {
                assert_eq!(path, dir.path().join("app.runtimeconfig.json"));
            }
            other => panic!("expected missing runtime config, got {other:?}"),
        }
    }

    #[test]
    fn test_read_dependency_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.deps.json");
        std::fs::write(
            &path,
            r#"{"module":"pet_store","nativeDependencies":["libssl.so"],"searchPaths":["deps"]}"#,
        )
        .unwrap();

        let manifest = DependencyManifest::read(&path).unwrap();
        assert_eq!(manifest.module.as_deref(), Some("pet_store"));
        assert_eq!(manifest.native_dependencies, vec!["libssl.so"]);
        assert_eq!(
            manifest.search_dirs(Path::new("/m")),
            vec![PathBuf::from("/m"), PathBuf::from("/m/deps")]
        );
    }

    #[test]
    fn test_locate_searches_in_order() {
        let dir = tempdir().unwrap();
        let deps = dir.path().join("deps");
        std::fs::create_dir(&deps).unwrap();
        std::fs::write(deps.join("libextra.so"), b"").unwrap();

        let manifest = DependencyManifest {
            search_paths: vec![PathBuf::from("deps")],
            ..DependencyManifest::default()
        };
        assert_eq!(
            manifest.locate("libextra.so", dir.path()),
            Some(deps.join("libextra.so"))
        );
        assert_eq!(manifest.locate("libmissing.so", dir.path()), None);
    }

    #[test]
    fn test_invalid_runtime_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.runtimeconfig.json");
        std::fs::write(&path, r#"{"environment":"Development"}"#).unwrap();

        assert!(matches!(
            RuntimeConfig::read(&path),
            Err(RuntimeError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_sdk_must_match_exactly() {
        assert!(ensure_sdk_matches("0.1.3", "0.1.3").is_ok());
        assert!(ensure_sdk_matches("1", "1.0.0").is_ok());
        assert!(ensure_sdk_matches("0.1.3+build.7", "0.1.3").is_ok());
        assert!(ensure_sdk_matches("0.1.0", "0.1.3").is_err());
        assert!(ensure_sdk_matches("0.1.4", "0.1.3").is_err());
        assert!(ensure_sdk_matches("1.2.0", "1.5.0").is_err());
        assert!(ensure_sdk_matches("0.1.0-beta", "0.1.0").is_err());
        assert!(ensure_sdk_matches("latest", "0.1.0").is_err());
    }

    #[test]
    fn test_runtime_environment_load() {
        let dir = tempdir().unwrap();
        let deps = dir.path().join("app.deps.json");
        let config = dir.path().join("app.runtimeconfig.json");
        std::fs::write(&deps, "{}").unwrap();
        std::fs::write(
            &config,
            format!(
                r#"{{"sdkVersion":"{}","environment":"Staging","properties":{{"title":"Pets"}}}}"#,
                apidoc_host::SDK_VERSION
            ),
        )
        .unwrap();

        let env = RuntimeEnvironment::load(&deps, &config).unwrap();
        assert_eq!(env.config.environment.as_deref(), Some("Staging"));
        assert_eq!(env.config.properties["title"], "Pets");
        assert!(env.dependencies.native_dependencies.is_empty());
    }
}
