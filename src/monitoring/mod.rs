/*!
 * Monitoring
 * Tracing subscriber setup
 */

mod tracer;

pub use tracer::{init_tracing, span_operation, TRACE_JSON_ENV};
