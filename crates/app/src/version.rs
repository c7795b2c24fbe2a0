use std::fmt;

/// Build metadata captured by `build.rs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub package_version: &'static str,
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            package_version: env!("CARGO_PKG_VERSION"),
            version: env!("REPO_VERSION"),
            build_profile: env!("BUILD_PROFILE"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rust_version: env!("RUST_VERSION"),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sealcid {} ({})", self.package_version, self.version)?;
        writeln!(f, "profile: {}", self.build_profile)?;
        writeln!(f, "built:   {}", self.build_timestamp)?;
        write!(f, "rustc:   {}", self.rust_version)
    }
}
