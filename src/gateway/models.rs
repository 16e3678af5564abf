//! # Modelos del Gateway
//! src/gateway/models.rs
//!
//! Formato JSON compartido con los servicios de sensores y analytics
//! (snake_case en el cable). Los campos faltantes toman su valor por
//! defecto, igual de tolerante que los servicios downstream.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lectura de un sensor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorData {
    pub sensor_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: String,
    pub status: String,
}

impl SensorData {
    /// Lectura que se devuelve cuando el servicio de sensores no responde
    pub fn unavailable() -> Self {
        Self {
            sensor_id: "ERROR".to_string(),
            temperature: 0.0,
            humidity: 0.0,
            timestamp: utc_timestamp(SystemTime::now()),
            status: "Sensor service unavailable".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub average_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub average_humidity: f64,
    pub min_humidity: f64,
    pub max_humidity: f64,
    pub total_readings: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    /// HIGH_TEMPERATURE, LOW_HUMIDITY, ERROR, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub sensor_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsResponse {
    pub status: String,
    pub stats: Stats,
    pub alerts: Vec<Alert>,
    pub data: Option<SensorData>,
}

impl AnalyticsResponse {
    /// Respuesta que se devuelve cuando el servicio de analytics no responde
    pub fn unavailable(input: &SensorData) -> Self {
        let sensor_id = if input.sensor_id.is_empty() {
            "unknown".to_string()
        } else {
            input.sensor_id.clone()
        };

        Self {
            status: "error".to_string(),
            stats: Stats::default(),
            alerts: vec![Alert {
                kind: "ERROR".to_string(),
                message: "Analytics service unavailable".to_string(),
                sensor_id,
            }],
            data: Some(input.clone()),
        }
    }
}

/// Respuesta combinada de `/api/gateway/data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub sensor_data: SensorData,
    pub analytics: AnalyticsResponse,
}

/// `YYYY-MM-DDTHH:MM:SSZ` en UTC
fn utc_timestamp(at: SystemTime) -> String {
    let secs = at.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// Días desde 1970-01-01 → (año, mes, día) del calendario gregoriano
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
