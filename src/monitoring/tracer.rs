/*!
 * Tracing
 * Subscriber initialization and operation spans
 */

use tracing::{info, span, Level, Span};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Set to `1` or `true` for JSON log lines
pub const TRACE_JSON_ENV: &str = "CONFINEFS_TRACE_JSON";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CONFINEFS_TRACE_JSON: Enable JSON output (default: false)
///
/// Does nothing if a global subscriber is already installed, so tests and
/// host applications may call it freely.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(TRACE_JSON_ENV)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "tracing initialized");
    }
}

/// Debug-level span around one filesystem operation
///
/// Only the virtual path is recorded.
pub fn span_operation(op: &'static str, path: &std::path::Path) -> Span {
    span!(Level::DEBUG, "vfs_op", op, path = %path.display())
}
