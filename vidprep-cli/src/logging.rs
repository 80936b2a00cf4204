// ============================================================================
// vidprep-cli/src/logging.rs
// ============================================================================
//
// LOGGING: env_logger initialization
//
// The application uses the standard `log` facade with `env_logger` as the
// backend, honoring the RUST_LOG environment variable:
// - RUST_LOG=info (default): normal operation logs
// - RUST_LOG=debug: per-file probe and decode detail
// - RUST_LOG=trace: very verbose debugging information

use env_logger::Env;

/// Initializes logging with an info default, overridable through RUST_LOG.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
}
