//! Loading application modules into isolated load contexts.
//!
//! A module is opened at most once per [`ModuleLoader`], keyed by its
//! absolute path. Each opened module owns a [`LoadContext`] holding the
//! library handles it needed (its native dependencies first, then the module
//! itself); the handles live exactly as long as the [`LoadedModule`].

use crate::error::LoadError;
use crate::obs::emit_module_loaded;
use apidoc_host::{
    ModuleDeclaration, TypeExport, COMPILER_FINGERPRINT, MODULE_DECLARATION_SYMBOL, SDK_VERSION,
};
use apidoc_runtime::DependencyManifest;
use libloading::Library;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Library handles backing one loaded module.
#[derive(Debug, Default)]
pub struct LoadContext {
    libraries: Vec<Library>,
}

impl LoadContext {
    /// A context without libraries, for modules linked into the process.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Open `path` and keep the handle alive for the lifetime of the context.
    pub fn load_library(&mut self, path: &Path) -> Result<&Library, LoadError> {
        let library = open_library(path).map_err(|source| LoadError::Library {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(library = %path.display(), "Library loaded");
        self.libraries.push(library);
        Ok(&self.libraries[self.libraries.len() - 1])
    }

    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }
}

impl Drop for LoadContext {
    fn drop(&mut self) {
        // Unload in reverse: the module goes before the libraries it links.
        while let Some(library) = self.libraries.pop() {
            drop(library);
        }
    }
}

#[cfg(unix)]
fn open_library(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
    // SAFETY: loading runs the library's initializers. Modules and their
    // native dependencies are trusted application code named by the user;
    // RTLD_GLOBAL makes preloaded dependencies visible to the module.
    unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL) }.map(Library::from)
}

#[cfg(not(unix))]
fn open_library(path: &Path) -> Result<Library, libloading::Error> {
    // SAFETY: see the unix variant.
    unsafe { Library::new(path) }
}

/// A module loaded into this process.
///
/// Field order matters: the exported types (which hold function pointers
/// into the module) drop before the load context unloads the libraries.
#[derive(Debug)]
pub struct LoadedModule {
    name: String,
    path: PathBuf,
    exports: Vec<TypeExport>,
    _context: LoadContext,
}

impl LoadedModule {
    /// Run a module declaration's registration and capture its exports.
    ///
    /// Only the identity fields are read until the module proves it was built
    /// from this exact SDK by the same compiler.
    pub fn from_declaration(
        path: impl Into<PathBuf>,
        declaration: &ModuleDeclaration,
        context: LoadContext,
    ) -> Result<Self, LoadError> {
        let path = path.into();
        if !declaration.matches_sdk() {
            return Err(LoadError::IncompatibleSdk {
                module: path,
                module_sdk: declaration.sdk_version.to_string(),
                module_compiler: declaration.compiler.to_string(),
                sdk: SDK_VERSION,
                compiler: COMPILER_FINGERPRINT,
            });
        }

        let mut exports: Vec<TypeExport> = Vec::new();
        (declaration.register)(&mut exports);

        Ok(Self {
            name: declaration.name.to_string(),
            path,
            exports,
            _context: context,
        })
    }

    /// Fully qualified module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the module file.
    pub fn directory(&self) -> Option<&Path> {
        self.path.parent()
    }

    /// Every public type the module exported.
    pub fn exports(&self) -> &[TypeExport] {
        &self.exports
    }
}

/// Opens a module file into a [`LoadedModule`].
pub trait ModuleSource {
    fn open(&self, path: &Path) -> Result<LoadedModule, LoadError>;
}

/// Opens native dynamic libraries, preloading the dependencies listed in the
/// module's dependency manifest.
#[derive(Debug, Clone, Default)]
pub struct NativeModuleSource {
    dependencies: DependencyManifest,
}

impl NativeModuleSource {
    pub fn new(dependencies: DependencyManifest) -> Self {
        Self { dependencies }
    }
}

impl ModuleSource for NativeModuleSource {
    fn open(&self, path: &Path) -> Result<LoadedModule, LoadError> {
        let module_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut context = LoadContext::default();

        for dependency in &self.dependencies.native_dependencies {
            let located = self
                .dependencies
                .locate(dependency, module_dir)
                .ok_or_else(|| LoadError::UnresolvedDependency {
                    module: path.to_path_buf(),
                    dependency: dependency.clone(),
                    searched: self.dependencies.search_dirs(module_dir),
                })?;
            context.load_library(&located)?;
        }

        let library = context.load_library(path)?;
        // SAFETY: the symbol is the `APIDOC_MODULE` static emitted by
        // `export_module!`, so it has type `ModuleDeclaration`. The
        // declaration is copied out while the library is still loaded.
        let declaration: ModuleDeclaration = unsafe {
            let symbol = library
                .get::<*const ModuleDeclaration>(MODULE_DECLARATION_SYMBOL)
                .map_err(|_| LoadError::MissingDeclaration(path.to_path_buf()))?;
            let pointer = *symbol;
            if pointer.is_null() {
                return Err(LoadError::MissingDeclaration(path.to_path_buf()));
            }
            *pointer
        };

        let module = LoadedModule::from_declaration(path, &declaration, context)?;
        if let Some(expected) = &self.dependencies.module {
            if expected != module.name() {
                warn!(
                    expected = %expected,
                    declared = %module.name(),
                    "Dependency manifest names a different module"
                );
            }
        }
        Ok(module)
    }
}

/// Serves modules linked into the current process, matched by file name.
///
/// Used to host applications compiled together with the tool, and as the
/// fixture source in tests.
#[derive(Debug, Default)]
pub struct StaticModuleSource {
    modules: HashMap<String, ModuleDeclaration>,
    opened: Cell<usize>,
}

impl StaticModuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, file_name: impl Into<String>, declaration: ModuleDeclaration) -> Self {
        self.modules.insert(file_name.into(), declaration);
        self
    }

    /// How many times a module was opened through this source.
    pub fn open_count(&self) -> usize {
        self.opened.get()
    }
}

impl ModuleSource for StaticModuleSource {
    fn open(&self, path: &Path) -> Result<LoadedModule, LoadError> {
        let declaration = path
            .file_name()
            .and_then(|name| self.modules.get(name.to_string_lossy().as_ref()))
            .ok_or_else(|| LoadError::MissingDeclaration(path.to_path_buf()))?;

        self.opened.set(self.opened.get() + 1);
        LoadedModule::from_declaration(path, declaration, LoadContext::empty())
    }
}

/// Loads modules, at most once per absolute path.
#[derive(Debug)]
pub struct ModuleLoader<S = NativeModuleSource> {
    source: S,
    loaded: HashMap<PathBuf, Arc<LoadedModule>>,
}

impl<S: ModuleSource> ModuleLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            loaded: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the module at `path`, resolved against the current directory.
    pub fn load(&mut self, path: &Path) -> Result<Arc<LoadedModule>, LoadError> {
        let absolute = absolute_path(path)?;

        if let Some(module) = self.loaded.get(&absolute) {
            debug!(module = %module.name(), "Module already loaded");
            return Ok(Arc::clone(module));
        }

        if !absolute.is_file() {
            return Err(LoadError::NotFound(absolute));
        }

        let module = Arc::new(self.source.open(&absolute)?);
        emit_module_loaded(module.name(), module.path(), module.exports().len());

        self.loaded.insert(absolute, Arc::clone(&module));
        Ok(module)
    }
}

fn absolute_path(path: &Path) -> Result<PathBuf, LoadError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| LoadError::Path {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(path))
}
