use std::env;
use std::process::Command;

/// Exports build metadata consumed by `daybook_cli version`.
fn main() {
    for path in ["build.rs", ".git/HEAD", ".git/refs"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let hash = stdout_of("git", &["rev-parse", "--short", "HEAD"]).filter(|hash| !hash.is_empty());
    let status = match stdout_of("git", &["status", "--porcelain"]) {
        Some(porcelain) if porcelain.is_empty() => "clean",
        Some(_) => "dirty",
        None => "unknown",
    };
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let exports = [
        ("HASH", hash.unwrap_or_else(|| "unknown".into())),
        ("STATUS", status.to_string()),
        ("TIMESTAMP", timestamp),
        ("TARGET", env::var("TARGET").unwrap_or_else(|_| "unknown".into())),
        ("PROFILE", env::var("PROFILE").unwrap_or_else(|_| "unknown".into())),
        ("RUSTC", stdout_of("rustc", &["--version"]).unwrap_or_else(|| "unknown".into())),
    ];
    for (key, value) in exports {
        println!("cargo:rustc-env=DAYBOOK_BUILD_{key}={value}");
    }
}

/// Trimmed stdout of a successful command; `None` when it cannot run or fails.
fn stdout_of(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}
