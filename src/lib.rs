pub mod config;
pub mod pipeline; // Transcript extraction engine

pub use pipeline::transcript::{
    calculate_overall_confidence, parse_transcript, ExtractionReport, ParserOptions,
    StructuredClinicalNote, TranscriptError, TranscriptParser,
};

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber honouring `RUST_LOG`.
///
/// Safe to call more than once, and a no-op when the embedding application
/// has already installed its own subscriber.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(config::LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
