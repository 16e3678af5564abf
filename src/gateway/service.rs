//! # Fan-out del Gateway
//! src/gateway/service.rs
//!
//! Pide una lectura al servicio de sensores, la manda a analytics y une
//! las dos respuestas. Cada servicio falla por separado: si uno no
//! responde se usa su placeholder y la respuesta combinada igual sale.

use super::models::{AnalyticsResponse, GatewayResponse, SensorData};
use super::{AnalyticsSource, SensorSource};

pub struct Gateway {
    sensor: Box<dyn SensorSource>,
    analytics: Box<dyn AnalyticsSource>,
}

impl Gateway {
    pub fn new(sensor: Box<dyn SensorSource>, analytics: Box<dyn AnalyticsSource>) -> Self {
        Self { sensor, analytics }
    }

    /// Lectura actual, o el placeholder si el servicio falla
    pub fn sensor_data(&self) -> SensorData {
        match self.sensor.fetch() {
            Ok(data) => {
                tracing::debug!(sensor_id = %data.sensor_id, "lectura recibida");
                data
            }
            Err(e) => {
                tracing::error!(error = %e, "servicio de sensores no disponible");
                SensorData::unavailable()
            }
        }
    }

    /// Analytics de una lectura, o el placeholder si el servicio falla
    pub fn analyze(&self, data: &SensorData) -> AnalyticsResponse {
        match self.analytics.analyze(data) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "servicio de analytics no disponible");
                AnalyticsResponse::unavailable(data)
            }
        }
    }

    /// Lectura + analytics de esa lectura
    pub fn combined(&self) -> GatewayResponse {
        let sensor_data = self.sensor_data();
        let analytics = self.analyze(&sensor_data);
        GatewayResponse {
            sensor_data,
            analytics,
        }
    }
}
