//! # Handler de Métricas
//! src/handlers/metrics.rs

use crate::http::{Request, Response};
use crate::metrics::MetricsCollector;
use crate::router::HandlerResult;

/// Handler para `GET /metrics`
///
/// # Ejemplo de response
/// ```json
/// {
///   "uptime_secs": 12,
///   "total_requests": 42,
///   "active_connections": 1,
///   "peak_connections": 4,
///   "status_codes": {"200": 40, "404": 2},
///   "requests_per_path": {"/students": 30, "/ping": 12},
///   "latency_us": {"p50": 180, "p95": 900, "p99": 1500, "avg": 250, "samples": 42}
/// }
/// ```
pub fn metrics_handler(_req: &Request, metrics: &MetricsCollector) -> HandlerResult {
    Ok(Response::json(&metrics.to_json()?))
}
