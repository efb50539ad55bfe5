//! Version and build information for lbscope
//!
//! Build metadata (commit SHA, build date, rustc version) is injected by `build.rs`.

/// Full version string including build metadata
///
/// Returns format: "lbscope {version} ({commit} {date}) rustc {rustc_version}"
pub fn version() -> String {
    format!(
        "lbscope {} ({} {}) rustc {}",
        package_version(),
        build_commit(),
        build_date(),
        rustc_version()
    )
}

/// Package version (e.g., "0.4.0")
pub fn package_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build commit SHA, or "unknown"
pub fn build_commit() -> &'static str {
    option_env!("LBSCOPE_COMMIT_SHA").unwrap_or("unknown")
}

/// Build date, or "unknown"
pub fn build_date() -> &'static str {
    option_env!("LBSCOPE_BUILD_DATE").unwrap_or("unknown")
}

/// Rust compiler version used for the build, or "unknown"
pub fn rustc_version() -> &'static str {
    option_env!("LBSCOPE_RUSTC_VERSION").unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_starts_with_crate_name() {
        let v = version();
        assert!(v.starts_with("lbscope "), "unexpected version string: {}", v);
        assert!(v.contains(package_version()));
    }
}
