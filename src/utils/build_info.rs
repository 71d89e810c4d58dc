use std::fmt;

/// Facts about the running binary, captured by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub tree: &'static str,
    pub built_at: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub compiler: &'static str,
}

macro_rules! build_env {
    ($key:literal) => {
        match option_env!(concat!("DAYBOOK_BUILD_", $key)) {
            Some(value) => value,
            None => "unknown",
        }
    };
}

pub const CURRENT: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    commit: build_env!("HASH"),
    tree: build_env!("STATUS"),
    built_at: build_env!("TIMESTAMP"),
    target: build_env!("TARGET"),
    profile: build_env!("PROFILE"),
    compiler: build_env!("RUSTC"),
};

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "daybook {}", self.version)?;
        writeln!(f, "commit   {} ({})", self.commit, self.tree)?;
        writeln!(f, "target   {} [{}]", self.target, self.profile)?;
        writeln!(f, "built    {}", self.built_at)?;
        write!(f, "compiler {}", self.compiler)
    }
}
