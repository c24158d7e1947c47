//! apidoc - OpenAPI document retrieval from compiled applications
//!
//! ## Commands
//!
//! - `tofile`: write one API document of an application module to a file or stdout
//! - `list`: print the names of the documents an application module provides
//!
//! Both commands relaunch apidoc as a child process running under the
//! module's runtime descriptors; the hidden `_tofile` / `_list` commands are
//! what that child executes.

use anyhow::{anyhow, Context, Result};
use apidoc_core::{
    run_list, run_to_file, HostSettings, InvocationRequest, InvocationSpan, ListRequest,
    ModuleLoader, NativeModuleSource, OutputFormat, SchemaVersion,
};
use apidoc_runtime::{ProcessRelauncher, RuntimeEnvironment, DEPSFILE_FLAG, RUNTIMECONFIG_FLAG};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, Level};

#[derive(Parser, Debug)]
#[command(name = "apidoc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Retrieve OpenAPI documents from compiled applications", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "APIDOC_LOG_JSON")]
    json: bool,

    /// Dependency manifest of the startup module (set by the relauncher)
    #[arg(long = "depsfile", global = true, hide = true)]
    depsfile: Option<PathBuf>,

    /// Runtime configuration of the startup module (set by the relauncher)
    #[arg(long = "runtimeconfig", global = true, hide = true)]
    runtimeconfig: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an API document to a file or stdout
    Tofile(ToFileArgs),

    /// List the documents an application provides
    List(ListArgs),

    #[command(name = "_tofile", hide = true)]
    InternalToFile(ToFileArgs),

    #[command(name = "_list", hide = true)]
    InternalList(ListArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct ToFileArgs {
    /// Path to the compiled startup module of the application
    startup_module: PathBuf,

    /// Name of the document to retrieve, e.g. `v1`
    document_name: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Host to advertise in the document, e.g. `api.example.com`
    #[arg(long)]
    host: Option<String>,

    /// Base path to advertise in the document, e.g. `/v1`
    #[arg(long = "basepath")]
    base_path: Option<String>,

    /// Write Swagger 2.0 instead of OpenAPI 3
    #[arg(long = "serializeasv2")]
    serialize_as_v2: bool,

    /// Write YAML instead of JSON
    #[arg(long)]
    yaml: bool,
}

impl ToFileArgs {
    /// Arguments reproducing these options on the child's command line.
    fn forwarded(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.startup_module.clone().into(),
            self.document_name.clone().into(),
        ];
        if let Some(output) = &self.output {
            args.push("--output".into());
            args.push(output.clone().into());
        }
        if let Some(host) = &self.host {
            args.push("--host".into());
            args.push(host.into());
        }
        if let Some(base_path) = &self.base_path {
            args.push("--basepath".into());
            args.push(base_path.into());
        }
        if self.serialize_as_v2 {
            args.push("--serializeasv2".into());
        }
        if self.yaml {
            args.push("--yaml".into());
        }
        args
    }

    fn to_request(&self) -> InvocationRequest {
        let mut request = InvocationRequest::new(&self.startup_module, &self.document_name)
            .with_schema_version(SchemaVersion::from_legacy_flag(self.serialize_as_v2))
            .with_format(if self.yaml {
                OutputFormat::Yaml
            } else {
                OutputFormat::Json
            });
        request.output = self.output.clone();
        request.host = self.host.clone();
        request.base_path = self.base_path.clone();
        request
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct ListArgs {
    /// Path to the compiled startup module of the application
    startup_module: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ListArgs {
    fn forwarded(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![self.startup_module.clone().into()];
        if let Some(output) = &self.output {
            args.push("--output".into());
            args.push(output.clone().into());
        }
        args
    }

    fn to_request(&self) -> ListRequest {
        ListRequest {
            startup_module: self.startup_module.clone(),
            output: self.output.clone(),
        }
    }
}

/// Flags the child needs to log the way the parent does.
fn forwarded_globals(cli_verbose: bool, cli_json: bool) -> Vec<OsString> {
    let mut args = Vec::new();
    if cli_verbose {
        args.push("--verbose".into());
    }
    if cli_json {
        args.push("--json".into());
    }
    args
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    apidoc_core::init_tracing(cli.json, level);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Cli {
        verbose,
        json,
        depsfile,
        runtimeconfig,
        command,
    } = cli;
    let globals = forwarded_globals(verbose, json);

    match command {
        Commands::Tofile(args) => relaunch("tofile", &args.startup_module, globals, args.forwarded()),
        Commands::List(args) => relaunch("list", &args.startup_module, globals, args.forwarded()),
        Commands::InternalToFile(args) => {
            let environment = runtime_environment(depsfile.as_deref(), runtimeconfig.as_deref())?;
            cmd_tofile(environment, &args)
        }
        Commands::InternalList(args) => {
            let environment = runtime_environment(depsfile.as_deref(), runtimeconfig.as_deref())?;
            cmd_list(environment, &args)
        }
    }
}

/// Run the internal form of `command` in a child process and exit with its
/// exit code.
fn relaunch(
    command: &str,
    startup_module: &Path,
    globals: Vec<OsString>,
    args: Vec<OsString>,
) -> Result<ExitCode> {
    let relauncher = ProcessRelauncher::current().context("Failed to locate the apidoc executable")?;
    let code = relauncher
        .relaunch(command, startup_module, args.into_iter().chain(globals))
        .with_context(|| format!("Failed to relaunch for {}", startup_module.display()))?;

    debug!(command, exit_code = code, "Relaunched command finished");
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

fn runtime_environment(
    depsfile: Option<&Path>,
    runtimeconfig: Option<&Path>,
) -> Result<RuntimeEnvironment> {
    let (Some(depsfile), Some(runtimeconfig)) = (depsfile, runtimeconfig) else {
        return Err(anyhow!(
            "internal commands require {DEPSFILE_FLAG} and {RUNTIMECONFIG_FLAG}"
        ));
    };
    RuntimeEnvironment::load(depsfile, runtimeconfig).context("Failed to load runtime descriptors")
}

fn cmd_tofile(environment: RuntimeEnvironment, args: &ToFileArgs) -> Result<ExitCode> {
    let _span = InvocationSpan::enter("tofile", &args.startup_module.display().to_string());

    let settings = HostSettings::from(&environment.config);
    let mut loader = ModuleLoader::new(NativeModuleSource::new(environment.dependencies));

    run_to_file(&mut loader, &args.to_request(), &settings).with_context(|| {
        format!(
            "Failed to write document `{}` of {}",
            args.document_name,
            args.startup_module.display()
        )
    })?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_list(environment: RuntimeEnvironment, args: &ListArgs) -> Result<ExitCode> {
    let _span = InvocationSpan::enter("list", &args.startup_module.display().to_string());

    let settings = HostSettings::from(&environment.config);
    let mut loader = ModuleLoader::new(NativeModuleSource::new(environment.dependencies));

    let names = run_list(&mut loader, &args.to_request(), &settings).with_context(|| {
        format!("Failed to list documents of {}", args.startup_module.display())
    })?;
    debug!(documents = names.len(), "Documents listed");
    Ok(ExitCode::SUCCESS)
}
