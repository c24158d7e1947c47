//! Relaunch into a child process running under the startup module's
//! runtime descriptors.
//!
//! The parent never loads the application module. It hands the descriptor
//! paths to a fresh copy of itself, invoked with the internal (underscore
//! prefixed) form of the command, and waits for it to exit.

use crate::descriptors::RuntimeDescriptors;
use crate::error::RuntimeError;
use crate::Result;
use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, info};

/// Flag carrying the dependency manifest path to the child.
pub const DEPSFILE_FLAG: &str = "--depsfile";

/// Flag carrying the runtime configuration path to the child.
pub const RUNTIMECONFIG_FLAG: &str = "--runtimeconfig";

/// Prefix marking a command as internal.
pub const INTERNAL_COMMAND_PREFIX: &str = "_";

/// Name of the internal command backing a user-facing one.
pub fn internal_command(command: &str) -> String {
    format!("{INTERNAL_COMMAND_PREFIX}{command}")
}

/// Quote an argument that contains whitespace so it survives tokenization
/// of a flat command line. Inside the quotes, `"` and `\` are escaped with a
/// backslash. Arguments without whitespace are returned as-is.
pub fn escape_arg(arg: &str) -> Cow<'_, str> {
    if !arg.chars().any(char::is_whitespace) {
        return Cow::Borrowed(arg);
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

/// A fully prepared child process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ChildInvocation {
    /// The invocation as a single escaped command line, for diagnostics.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|arg| escape_arg(&arg.to_string_lossy()).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// Spawns the child and propagates its exit code.
#[derive(Debug, Clone)]
pub struct ProcessRelauncher {
    program: PathBuf,
}

impl ProcessRelauncher {
    /// Relaunch the currently running executable.
    pub fn current() -> Result<Self> {
        let program = std::env::current_exe().map_err(RuntimeError::CurrentExe)?;
        Ok(Self { program })
    }

    /// Relaunch an explicit program instead of the current executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the child invocation for `command` against `module_path`.
    ///
    /// Both descriptor files must exist. `forwarded` is appended after the
    /// internal command name, unchanged.
    pub fn prepare<I>(
        &self,
        command: &str,
        module_path: &Path,
        forwarded: I,
    ) -> Result<ChildInvocation>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let descriptors = RuntimeDescriptors::derive(module_path)?;
        descriptors.ensure_exist()?;

        let mut args: Vec<OsString> = vec![
            DEPSFILE_FLAG.into(),
            descriptors.dependency_manifest.into_os_string(),
            RUNTIMECONFIG_FLAG.into(),
            descriptors.runtime_config.into_os_string(),
            internal_command(command).into(),
        ];
        args.extend(forwarded.into_iter().map(Into::into));

        Ok(ChildInvocation {
            program: self.program.clone(),
            args,
        })
    }

    /// Start the child with inherited stdio, block until it exits and return
    /// its exit code.
    pub fn run(&self, invocation: &ChildInvocation) -> Result<i32> {
        debug!(command_line = %invocation.command_line(), "Relaunching");

        let mut child = invocation
            .to_command()
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let status = child.wait()?;
        let code = exit_code(status);
        info!(pid = child.id(), exit_code = code, "Child process exited");
        Ok(code)
    }

    /// [`prepare`](Self::prepare) then [`run`](Self::run).
    pub fn relaunch<I>(&self, command: &str, module_path: &Path, forwarded: I) -> Result<i32>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let invocation = self.prepare(command, module_path, forwarded)?;
        self.run(&invocation)
    }
}

/// Exit code of a finished child; signals map to the shell convention
/// `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn module_with_descriptors(dir: &Path, name: &str) -> PathBuf {
        let module = dir.join(format!("{name}.so"));
        std::fs::write(&module, b"").unwrap();
        std::fs::write(dir.join(format!("{name}.deps.json")), "{}").unwrap();
        std::fs::write(
            dir.join(format!("{name}.runtimeconfig.json")),
            r#"{"sdkVersion":"0.1.0"}"#,
        )
        .unwrap();
        module
    }

    #[test]
    fn test_escape_arg() {
        assert_eq!(escape_arg("out.json"), "out.json");
        assert_eq!(escape_arg("my docs/out.json"), "\"my docs/out.json\"");
        assert_eq!(escape_arg(""), "");
        assert_eq!(
            escape_arg(r#"my "beta" docs/out.json"#),
            r#""my \"beta\" docs/out.json""#
        );
        assert_eq!(
            escape_arg(r"C:\Program Files\app.dll"),
            r#""C:\\Program Files\\app.dll""#
        );
        assert_eq!(escape_arg(r"C:\apps\app.dll"), r"C:\apps\app.dll");
    }

    #[test]
    fn test_internal_command_name() {
        assert_eq!(internal_command("tofile"), "_tofile");
        assert_eq!(internal_command("list"), "_list");
    }

    #[test]
    fn test_prepare_orders_arguments() {
        let dir = tempdir().unwrap();
        let module = module_with_descriptors(dir.path(), "pets");
        let relauncher = ProcessRelauncher::with_program("/usr/bin/apidoc");

        let invocation = relauncher
            .prepare("tofile", &module, ["pets.so", "v1", "--serializeasv2"])
            .unwrap();

        let args: Vec<String> = invocation
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[0], "--depsfile");
        assert!(args[1].ends_with("pets.deps.json"));
        assert_eq!(args[2], "--runtimeconfig");
        assert!(args[3].ends_with("pets.runtimeconfig.json"));
        assert_eq!(&args[4..], ["_tofile", "pets.so", "v1", "--serializeasv2"]);
        assert_eq!(invocation.program, PathBuf::from("/usr/bin/apidoc"));
    }

    #[test]
    fn test_prepare_requires_descriptors() {
        let dir = tempdir().unwrap();
        let module = dir.path().join("bare.so");
        std::fs::write(&module, b"").unwrap();

        let err = ProcessRelauncher::with_program("apidoc")
            .prepare("tofile", &module, Vec::<OsString>::new())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::DescriptorNotFound(_)));
    }

    #[test]
    fn test_command_line_quotes_paths_with_spaces() {
        let invocation = ChildInvocation {
            program: PathBuf::from("/opt/my tools/apidoc"),
            args: vec!["_tofile".into(), "My App/app.so".into(), "v1".into()],
        };
        assert_eq!(
            invocation.command_line(),
            "\"/opt/my tools/apidoc\" _tofile \"My App/app.so\" v1"
        );
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let invocation = ChildInvocation {
            program: PathBuf::from("/nonexistent/apidoc-missing-binary"),
            args: Vec::new(),
        };
        let err = ProcessRelauncher::with_program(&invocation.program)
            .run(&invocation)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_child_exit_code_is_propagated() {
        let dir = tempdir().unwrap();
        let module = module_with_descriptors(dir.path(), "pets");

        let ok = ProcessRelauncher::with_program("true")
            .relaunch("tofile", &module, ["pets.so", "v1"])
            .unwrap();
        assert_eq!(ok, 0);

        let failed = ProcessRelauncher::with_program("false")
            .relaunch("tofile", &module, ["pets.so", "v1"])
            .unwrap();
        assert_eq!(failed, 1);
    }
}
