/// Application-level constants
pub const APP_NAME: &str = "Clinscribe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable read by `init_logging` before falling back to the default filter.
pub const LOG_ENV_VAR: &str = "RUST_LOG";

/// Log filter used when `RUST_LOG` is unset or unparseable.
/// Extraction internals stay at `info`; per-field misses are `debug`.
pub fn default_log_filter() -> &'static str {
    "clinscribe_lib=info,warn"
}
