pub mod models;
pub mod services;

pub use models::{
    AnalysisDetail, AnalysisListItem, AnalyzeResponse, AuthResponse, HealthResponse,
    ProblemDetails, Segment, StatsResponse, UserProfile,
};
pub use services::{
    merge_segments, partition_text, ApiClient, ApiError, ClientConfig, Download, MergedSegment,
    SessionStore, TextRun,
};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize console logging for binaries using this crate.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Safe to call once per
/// process; library code itself only emits `tracing` events.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}
