//! Build metadata baked in by `build.rs`.

/// Package version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Short git commit hash, or `unknown` outside a checkout.
pub const GIT_HASH: &str = env!("GIT_HASH");

/// UTC build date.
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Multi-line version report for `board-relay version`.
pub fn version_report() -> String {
    format!(
        "Board Relay\n Version:\t{}\n Commit:\t{}\n Built:\t\t{}\n OS/Arch:\t{}/{}",
        VERSION,
        GIT_HASH,
        BUILD_DATE,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_report() {
        let report = version_report();
        assert!(report.starts_with("Board Relay"));
        assert!(report.contains(VERSION));
        assert!(!GIT_HASH.is_empty());
        assert!(report.contains(std::env::consts::OS));
    }
}
