//! # Gateway
//! src/gateway/mod.rs
//!
//! Colaborador remoto detrás de `/api/gateway/*`: combina un servicio de
//! sensores y uno de analytics.
//!
//! ```text
//! GET /api/gateway/data
//!     ├─► SensorSource::fetch()          (GET <sensor_url>)
//!     └─► AnalyticsSource::analyze(data) (POST <analytics_url>/api/analytics/analyze)
//!          └─► {"sensor_data": ..., "analytics": ...}
//! ```

pub mod client;
pub mod models;
pub mod service;

pub use client::{HttpAnalyticsClient, HttpSensorClient};
pub use models::{Alert, AnalyticsResponse, GatewayResponse, SensorData, Stats};
pub use service::Gateway;

use thiserror::Error;

/// Falla al hablar con un servicio downstream
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Conexión, timeout o JSON inválido
    #[error("downstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("downstream answered with status {0}")]
    Status(u16),
}

/// Fuente de lecturas de sensores
pub trait SensorSource: Send + Sync {
    fn fetch(&self) -> Result<SensorData, GatewayError>;
}

/// Servicio que analiza una lectura
pub trait AnalyticsSource: Send + Sync {
    fn analyze(&self, data: &SensorData) -> Result<AnalyticsResponse, GatewayError>;
}
