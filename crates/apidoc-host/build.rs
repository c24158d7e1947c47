//! Build script for apidoc-host.
//!
//! Records the compiler that builds the SDK. Modules carry this fingerprint
//! in their declaration, and the tool refuses modules whose fingerprint
//! differs from its own: Rust values only cross the library boundary safely
//! when both sides were laid out by the same compiler for the same target.

use std::env;
use std::process::Command;

fn main() {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let verbose_version = Command::new(&rustc)
        .arg("-vV")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).into_owned())
        .unwrap_or_default();

    let field = |name: &str| {
        verbose_version
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };
    let target = env::var("TARGET").unwrap_or_else(|_| field("host:"));

    println!(
        "cargo:rustc-env=APIDOC_COMPILER_FINGERPRINT=rustc {} ({}) {}",
        field("release:"),
        field("commit-hash:"),
        target
    );
    println!("cargo:rerun-if-env-changed=RUSTC");
    println!("cargo:rerun-if-changed=build.rs");
}
