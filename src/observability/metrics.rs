//! Metrics helpers for the tap, organized per pipeline phase.
//!
//! Recording goes through the `metrics` facade; a recorder/exporter is the
//! embedding process's concern.

/// Metrics for requests against the source API
pub mod http {
    pub fn request_success(endpoint: &str, duration_secs: f64) {
        ::metrics::counter!("tap_http_requests_success_total", "endpoint" => endpoint.to_string())
            .increment(1);
        ::metrics::histogram!("tap_http_request_duration_seconds").record(duration_secs);
    }

    pub fn request_error(endpoint: &str) {
        ::metrics::counter!("tap_http_requests_error_total", "endpoint" => endpoint.to_string())
            .increment(1);
    }

    pub fn request_retried(endpoint: &str) {
        ::metrics::counter!("tap_http_requests_retried_total", "endpoint" => endpoint.to_string())
            .increment(1);
    }
}

/// Metrics for the normalization and emission phase
pub mod records {
    pub fn record_emitted(stream: &str) {
        ::metrics::counter!("tap_records_emitted_total", "stream" => stream.to_string())
            .increment(1);
    }

    pub fn record_failed(stream: &str) {
        ::metrics::counter!("tap_records_failed_total", "stream" => stream.to_string())
            .increment(1);
    }

    pub fn problem_logged(stream: &str, code: &str) {
        ::metrics::counter!(
            "tap_validation_problems_total",
            "stream" => stream.to_string(),
            "code" => code.to_string()
        )
        .increment(1);
    }
}
