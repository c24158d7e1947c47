//! Module declaration and exported types.
//!
//! Every loadable application module exports one [`ModuleDeclaration`] under
//! the symbol named by [`MODULE_DECLARATION_SYMBOL`], normally through the
//! [`export_module!`](crate::export_module) macro. Loading the module runs
//! its `register` function against a [`ModuleRegistrar`], which is how the
//! tool discovers the module's public types and their capabilities.

use crate::host::{HostFactory, Startup};

/// Version of this SDK; modules record the version they were built against.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compiler and target this SDK was built with, e.g.
/// `rustc 1.80.0 (051478957 2024-07-21) x86_64-unknown-linux-gnu`.
pub const COMPILER_FINGERPRINT: &str = env!("APIDOC_COMPILER_FINGERPRINT");

/// Name of the exported declaration static.
pub const MODULE_DECLARATION_SYMBOL: &[u8] = b"APIDOC_MODULE\0";

/// Constructor of a host factory type.
pub type HostFactoryConstructor = fn() -> Box<dyn HostFactory>;

/// Constructor of a startup type.
pub type StartupConstructor = fn() -> Box<dyn Startup>;

/// Entry point of a loadable module.
///
/// The two identity fields come first and the layout is fixed, so a tool can
/// read them from any module before trusting the rest of the declaration.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ModuleDeclaration {
    /// SDK version the module was compiled against.
    pub sdk_version: &'static str,
    /// [`COMPILER_FINGERPRINT`] of the SDK copy linked into the module.
    pub compiler: &'static str,
    /// Fully qualified module name (the crate name).
    pub name: &'static str,
    /// Publishes the module's exported types.
    pub register: fn(&mut dyn ModuleRegistrar),
}

impl ModuleDeclaration {
    /// Declaration stamped with this SDK's version and compiler fingerprint.
    pub const fn new(name: &'static str, register: fn(&mut dyn ModuleRegistrar)) -> Self {
        Self {
            sdk_version: SDK_VERSION,
            compiler: COMPILER_FINGERPRINT,
            name,
            register,
        }
    }

    /// True when the module was built from this exact SDK version by the
    /// same compiler for the same target.
    pub fn matches_sdk(&self) -> bool {
        self.sdk_version == SDK_VERSION && self.compiler == COMPILER_FINGERPRINT
    }
}

impl std::fmt::Debug for ModuleDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDeclaration")
            .field("name", &self.name)
            .field("sdk_version", &self.sdk_version)
            .field("compiler", &self.compiler)
            .finish_non_exhaustive()
    }
}

/// Receives the exported types of a module during registration.
pub trait ModuleRegistrar {
    fn export(&mut self, export: TypeExport);
}

impl ModuleRegistrar for Vec<TypeExport> {
    fn export(&mut self, export: TypeExport) {
        self.push(export);
    }
}

/// A public type exported by a module, with the capabilities it implements.
#[derive(Debug, Clone)]
pub struct TypeExport {
    name: String,
    host_factory: Option<HostFactoryConstructor>,
    startup: Option<StartupConstructor>,
}

impl TypeExport {
    /// A plain exported type without capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_factory: None,
            startup: None,
        }
    }

    /// Mark the type as implementing [`HostFactory`].
    pub fn host_factory<T>(mut self) -> Self
    where
        T: HostFactory + Default + 'static,
    {
        self.host_factory = Some(construct_host_factory::<T>);
        self
    }

    /// Mark the type as implementing [`Startup`].
    pub fn startup<T>(mut self) -> Self
    where
        T: Startup + Default + 'static,
    {
        self.startup = Some(construct_startup::<T>);
        self
    }

    /// Qualified type name, e.g. `pet_store::Startup`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The last path segment of the type name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    pub fn is_host_factory(&self) -> bool {
        self.host_factory.is_some()
    }

    pub fn is_startup(&self) -> bool {
        self.startup.is_some()
    }

    pub fn host_factory_constructor(&self) -> Option<HostFactoryConstructor> {
        self.host_factory
    }

    pub fn startup_constructor(&self) -> Option<StartupConstructor> {
        self.startup
    }

    /// Instantiate the host factory through its default constructor.
    pub fn new_host_factory(&self) -> Option<Box<dyn HostFactory>> {
        self.host_factory.map(|construct| construct())
    }

    /// Instantiate the startup through its default constructor.
    pub fn new_startup(&self) -> Option<Box<dyn Startup>> {
        self.startup.map(|construct| construct())
    }
}

fn construct_host_factory<T: HostFactory + Default + 'static>() -> Box<dyn HostFactory> {
    Box::new(T::default())
}

fn construct_startup<T: Startup + Default + 'static>() -> Box<dyn Startup> {
    Box::new(T::default())
}

/// Declare the module entry point of an application crate.
///
/// ```ignore
/// fn register(registrar: &mut dyn apidoc_host::ModuleRegistrar) {
///     registrar.export(apidoc_host::TypeExport::new("pet_store::Startup").startup::<Startup>());
/// }
///
/// apidoc_host::export_module!(register);
/// ```
#[macro_export]
macro_rules! export_module {
    ($register:path) => {
        $crate::export_module!(env!("CARGO_CRATE_NAME"), $register);
    };
    ($name:expr, $register:path) => {
        #[no_mangle]
        pub static APIDOC_MODULE: $crate::ModuleDeclaration =
            $crate::ModuleDeclaration::new($name, $register);
    };
}
