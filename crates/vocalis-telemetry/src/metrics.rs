//! Metric names and instrument accessors
//!
//! Instruments come from the global meter, so they are no-ops until
//! [`crate::init`] installs an exporting provider.

use std::time::Instant;

use opentelemetry::metrics::{Counter, Histogram};

const METER_NAME: &str = "vocalis";

// TTS metric names
pub const TTS_ENGINE_DURATION: &str = "tts.engine.duration";
pub const TTS_REQUEST_COUNT: &str = "tts.request.count";
pub const TTS_ARTIFACT_CLEANUP_FAILURES: &str = "tts.artifact.cleanup_failures";
pub const TTS_ARTIFACTS_SWEPT: &str = "tts.artifact.swept";

// Search metric names
pub const SEARCH_REQUEST_COUNT: &str = "search.request.count";
pub const SEARCH_CACHE_HITS: &str = "search.cache.hits";

/// Counter for a named event
pub fn counter(name: &'static str) -> Counter<u64> {
    opentelemetry::global::meter(METER_NAME).u64_counter(name).build()
}

/// Histogram in seconds for a named operation
pub fn duration_histogram(name: &'static str) -> Histogram<f64> {
    opentelemetry::global::meter(METER_NAME)
        .f64_histogram(name)
        .with_unit("s")
        .build()
}

/// Record a duration measurement on a histogram
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[opentelemetry::KeyValue]) {
    histogram.record(start.elapsed().as_secs_f64(), attributes);
}
