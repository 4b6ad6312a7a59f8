//! Environment variable constants used throughout the application
//!
//! This module centralizes all environment variable names to ensure consistency
//! and make it easier to manage configuration across the codebase.

/// Logging configuration
pub mod logging {
    /// Log level configuration (e.g., "debug", "info", "warn", "error")
    pub const LOG_LEVEL: &str = "DOCCHAT_LOG_LEVEL";

    /// Log file path for file-based logging
    pub const LOG_FILE: &str = "DOCCHAT_LOG_FILE";

    /// Disable colored output (follows the NO_COLOR standard)
    pub const NO_COLOR: &str = "NO_COLOR";
}

/// External API configuration
pub mod apis {
    /// Anthropic API key, required for chat
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

    /// Overrides the generation model named in config.toml
    pub const MODEL: &str = "DOCCHAT_MODEL";
}

/// Storage locations
pub mod paths {
    /// Root directory for config and data files (replaces the platform dirs)
    pub const HOME: &str = "DOCCHAT_HOME";
}
