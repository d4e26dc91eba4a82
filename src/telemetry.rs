use tracing::Span;
use uuid::Uuid;

/// Span wrapping one engine operation (`up`, `down`, `status`, ...).
///
/// Each invocation gets its own `run_id` so interleaved runs can be told
/// apart in aggregated logs.
pub fn create_run_span(operation: &'static str, collection: &str) -> Span {
    let run_id = Uuid::new_v4();
    tracing::info_span!(
        "migrate",
        operation = operation,
        collection = collection,
        run_id = %run_id
    )
}

pub fn create_db_span(operation: &str, collection: &str) -> Span {
    tracing::span!(
        tracing::Level::DEBUG,
        "database",
        operation = operation,
        collection = collection,
        db_type = "mongodb"
    )
}

pub fn create_script_span(script: &str, direction: &str) -> Span {
    tracing::span!(
        tracing::Level::INFO,
        "script",
        script = script,
        direction = direction
    )
}
