// ============================================================================
// vidprep-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types for the CLI
//
// The CLI reuses the core error type so every failure renders through the
// same Display path, whatever layer it came from.

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = vidprep_core::CoreResult<T>;
