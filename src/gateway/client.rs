//! # Clientes HTTP de los Servicios Downstream
//! src/gateway/client.rs
//!
//! Clientes bloqueantes (`reqwest::blocking`): se llaman desde un worker
//! del pool, que ya es un thread dedicado a la conexión.

use super::models::{AnalyticsResponse, SensorData};
use super::{AnalyticsSource, GatewayError, SensorSource};
use reqwest::blocking::{Client, Response};
use std::time::Duration;

fn build_client(timeout: Duration) -> Result<Client, GatewayError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GatewayError::Status(status.as_u16()))
    }
}

/// `GET <sensor_url>` → [`SensorData`]
pub struct HttpSensorClient {
    client: Client,
    url: String,
}

impl HttpSensorClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.to_string(),
        })
    }
}

impl SensorSource for HttpSensorClient {
    fn fetch(&self) -> Result<SensorData, GatewayError> {
        tracing::debug!(url = %self.url, "consultando servicio de sensores");
        let response = check_status(self.client.get(&self.url).send()?)?;
        Ok(response.json()?)
    }
}

/// `POST <analytics_url>/api/analytics/analyze` con la lectura como JSON
pub struct HttpAnalyticsClient {
    client: Client,
    analyze_url: String,
}

impl HttpAnalyticsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(timeout)?,
            analyze_url: format!("{}/api/analytics/analyze", base_url.trim_end_matches('/')),
        })
    }
}

impl AnalyticsSource for HttpAnalyticsClient {
    fn analyze(&self, data: &SensorData) -> Result<AnalyticsResponse, GatewayError> {
        tracing::debug!(url = %self.analyze_url, sensor_id = %data.sensor_id, "enviando lectura a analytics");
        let response = check_status(self.client.post(&self.analyze_url).json(data).send()?)?;
        Ok(response.json()?)
    }
}
