//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta y agrega métricas del servidor en tiempo real.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Máximo de latencias a guardar (para calcular percentiles)
const MAX_LATENCIES: usize = 10_000;

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

#[derive(Default)]
struct MetricsData {
    total_requests: u64,

    /// Requests por código de estado
    status_codes: BTreeMap<u16, u64>,

    /// Últimas latencias registradas (en microsegundos)
    latencies: VecDeque<u64>,

    requests_per_path: BTreeMap<String, u64>,

    /// Conexiones que un worker está procesando ahora mismo
    active_connections: u64,

    /// Máximo de `active_connections` observado
    peak_connections: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData::default())),
            start_time: Instant::now(),
        }
    }

    /// Un panic en otro thread no debe dejar las métricas inutilizables
    fn data(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registra un request respondido
    pub fn record_request(&self, path: &str, status_code: u16, latency: Duration) {
        let mut data = self.data();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;

        if data.latencies.len() >= MAX_LATENCIES {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);

        *data.requests_per_path.entry(path.to_string()).or_insert(0) += 1;
    }

    /// Un worker tomó una conexión
    pub fn connection_started(&self) {
        let mut data = self.data();
        data.active_connections += 1;
        data.peak_connections = data.peak_connections.max(data.active_connections);
    }

    /// Un worker terminó con una conexión
    pub fn connection_finished(&self) {
        let mut data = self.data();
        data.active_connections = data.active_connections.saturating_sub(1);
    }

    pub fn active_connections(&self) -> u64 {
        self.data().active_connections
    }

    pub fn peak_connections(&self) -> u64 {
        self.data().peak_connections
    }

    /// Obtiene un snapshot de las métricas
    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.data();
        let (p50, p95, p99, avg) = calculate_percentiles(&data.latencies);

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total_requests: data.total_requests,
            active_connections: data.active_connections,
            peak_connections: data.peak_connections,
            status_codes: data.status_codes.clone(),
            requests_per_path: data.requests_per_path.clone(),
            latency_us: LatencySummary {
                p50,
                p95,
                p99,
                avg,
                samples: data.latencies.len(),
            },
        }
    }

    /// Métricas actuales en formato JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentiles de latencia: (p50, p95, p99, avg)
fn calculate_percentiles(latencies: &VecDeque<u64>) -> (u64, u64, u64, u64) {
    if latencies.is_empty() {
        return (0, 0, 0, 0);
    }

    let mut sorted: Vec<u64> = latencies.iter().copied().collect();
    sorted.sort_unstable();

    let len = sorted.len();
    let p50 = sorted[len * 50 / 100];
    let p95 = sorted[len * 95 / 100];
    let p99 = sorted[len * 99 / 100];
    let avg = sorted.iter().sum::<u64>() / len as u64;

    (p50, p95, p99, avg)
}

/// Snapshot de métricas (para uso externo y para `/metrics`)
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub active_connections: u64,
    pub peak_connections: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub requests_per_path: BTreeMap<String, u64>,
    pub latency_us: LatencySummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub avg: u64,
    pub samples: usize,
}
