use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Metric name prefix for all media-styles metrics
const PREFIX: &str = "media_styles";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Derivative Metrics
    pub static ref DERIVATIVES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_derivatives_total"), "Derivative lookups by style and outcome"),
        &["style", "outcome"]
    ).expect("Failed to create derivatives_total metric");

    pub static ref PROCESSOR_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_processor_duration_seconds"),
            "Image processor call duration in seconds"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["backend", "operation"]
    ).expect("Failed to create processor_duration_seconds metric");

    pub static ref STYLES_CONFIGURED: Gauge = Gauge::new(
        format!("{PREFIX}_styles_configured"),
        "Number of configured image styles"
    ).expect("Failed to create styles_configured metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(DERIVATIVES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESSOR_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(STYLES_CONFIGURED.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn init_style_metrics(num_styles: usize) {
    STYLES_CONFIGURED.set(num_styles as f64);
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record the outcome of a derivative lookup
pub fn record_derivative(style: &str, outcome: &str) {
    DERIVATIVES_TOTAL.with_label_values(&[style, outcome]).inc();
}

/// Record a successful image processor call
pub fn record_processor_call(backend: &str, operation: &str, duration: Duration) {
    PROCESSOR_DURATION_SECONDS
        .with_label_values(&[backend, operation])
        .observe(duration.as_secs_f64());
}

/// Collapses request paths into a small set of labels so that every media
/// file does not become its own time series.
pub fn categorize_endpoint(path: &str) -> &'static str {
    if path.starts_with("/media/") {
        "media"
    } else if path.starts_with("/v1/styles") {
        "styles"
    } else if path == "/metrics" {
        "metrics"
    } else if path == "/" {
        "home"
    } else {
        "other"
    }
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // Parse the RSS (Resident Set Size) in kB
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<f64>() {
                            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
