// Version information for the StyleAI quota service

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-daily-quota-2026-08-06";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2026-08-06";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "daily-quota",
    "tiered-limits",
    "memory-store",
    "sqlite-store",
    "usage-api",
    "retention-sweep",
];
