//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables
//! de entorno. Cada flag tiene su variable equivalente.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./raw_http_server --port 8080 \
//!   --workers 8 \
//!   --grace-period-ms 5000 \
//!   --students-file /var/lib/students.txt
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 WORKERS=8 ./raw_http_server
//! ```
//!
//! ### Gateway
//! ```bash
//! ./raw_http_server \
//!   --sensor-url http://localhost:8081/api/sensor/data \
//!   --analytics-url http://localhost:8082
//! ```

use crate::http::{Limits, MAX_HEADERS, MAX_LINE_LEN};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuración inválida
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("workers must be >= 1")]
    NoWorkers,

    #[error("grace period must be > 0 ms")]
    ZeroGracePeriod,

    #[error("max body bytes must be > 0")]
    ZeroMaxBody,

    #[error("gateway needs both --sensor-url and --analytics-url (only {given} was set)")]
    IncompleteGateway { given: &'static str },
}

/// Configuración del servidor HTTP/1.1
#[derive(Debug, Clone, Parser)]
#[command(name = "raw_http_server")]
#[command(about = "Servidor HTTP/1.1 concurrente sobre sockets crudos")]
#[command(version)]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor (0 = efímero)
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    // === Pool ===

    /// Número de workers (conexiones atendidas en paralelo)
    #[arg(short, long, default_value = "4", env = "WORKERS")]
    pub workers: usize,

    /// Tiempo máximo para drenar conexiones al apagar, en milisegundos
    #[arg(long = "grace-period-ms", default_value = "3000", env = "GRACE_PERIOD_MS")]
    pub grace_period_ms: u64,

    // === Conexiones ===

    /// Deadline de lectura por conexión en milisegundos (0 = sin límite)
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Deadline de escritura por conexión en milisegundos (0 = sin límite)
    #[arg(long = "write-timeout-ms", default_value = "5000", env = "WRITE_TIMEOUT_MS")]
    pub write_timeout_ms: u64,

    /// Content-Length máximo aceptado
    #[arg(long = "max-body-bytes", default_value = "1048576", env = "MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    // === Storage ===

    /// Archivo del store de estudiantes
    #[arg(long = "students-file", default_value = "./data/students.txt", env = "STUDENTS_FILE")]
    pub students_file: PathBuf,

    /// Archivo JSON con los usuarios registrados
    #[arg(long = "users-file", default_value = "./data/users.json", env = "USERS_FILE")]
    pub users_file: PathBuf,

    // === Gateway ===

    /// URL del servicio de sensores (sin ella no se registran las rutas del gateway)
    #[arg(long = "sensor-url", env = "SENSOR_URL")]
    pub sensor_url: Option<String>,

    /// URL base del servicio de analytics
    #[arg(long = "analytics-url", env = "ANALYTICS_URL")]
    pub analytics_url: Option<String>,

    /// Timeout de cada llamada a un servicio downstream en milisegundos
    #[arg(long = "upstream-timeout-ms", default_value = "2000", env = "UPSTREAM_TIMEOUT_MS")]
    pub upstream_timeout_ms: u64,
}

impl Config {
    /// Parsea argumentos CLI (y variables de entorno)
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use raw_http_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.grace_period_ms == 0 {
            return Err(ConfigError::ZeroGracePeriod);
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::ZeroMaxBody);
        }

        match (&self.sensor_url, &self.analytics_url) {
            (Some(_), None) => Err(ConfigError::IncompleteGateway { given: "--sensor-url" }),
            (None, Some(_)) => Err(ConfigError::IncompleteGateway { given: "--analytics-url" }),
            _ => Ok(()),
        }
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis_or_none(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis_or_none(self.write_timeout_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Límites del decoder
    pub fn limits(&self) -> Limits {
        Limits {
            max_line_len: MAX_LINE_LEN,
            max_headers: MAX_HEADERS,
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// URLs del gateway, solo si están las dos
    pub fn gateway_urls(&self) -> Option<(&str, &str)> {
        match (&self.sensor_url, &self.analytics_url) {
            (Some(sensor), Some(analytics)) => Some((sensor.as_str(), analytics.as_str())),
            _ => None,
        }
    }

    /// Loguea un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            workers = self.workers,
            grace_period_ms = self.grace_period_ms,
            read_timeout_ms = self.read_timeout_ms,
            write_timeout_ms = self.write_timeout_ms,
            max_body_bytes = self.max_body_bytes,
            students_file = %self.students_file.display(),
            users_file = %self.users_file.display(),
            "configuración"
        );

        match self.gateway_urls() {
            Some((sensor, analytics)) => tracing::info!(
                sensor,
                analytics,
                upstream_timeout_ms = self.upstream_timeout_ms,
                "gateway habilitado"
            ),
            None => tracing::info!("gateway deshabilitado"),
        }
    }
}

fn millis_or_none(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl Default for Config {
    /// Configuración por defecto (los mismos valores que los defaults de clap)
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 4,
            grace_period_ms: 3_000,
            read_timeout_ms: 5_000,
            write_timeout_ms: 5_000,
            max_body_bytes: 1_048_576,
            students_file: PathBuf::from("./data/students.txt"),
            users_file: PathBuf::from("./data/users.json"),
            sensor_url: None,
            analytics_url: None,
            upstream_timeout_ms: 2_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["raw_http_server"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.workers, 4);
        assert_eq!(config.grace_period(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_address() {
        let config = Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..Config::default()
        };
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_cli_flags() {
        let config = parse(&[
            "--port",
            "9000",
            "-w",
            "8",
            "--read-timeout-ms",
            "0",
            "--students-file",
            "/tmp/s.txt",
            "--users-file",
            "/tmp/u.json",
        ]);

        assert_eq!(config.port, 9000);
        assert_eq!(config.workers, 8);
        assert_eq!(config.read_timeout(), None);
        assert_eq!(config.write_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.students_file, PathBuf::from("/tmp/s.txt"));
        assert_eq!(config.users_file, PathBuf::from("/tmp/u.json"));
    }

    #[test]
    fn test_cli_rejects_garbage() {
        let result = Config::try_parse_from(["raw_http_server", "--port", "not-a-port"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_limits_follow_max_body() {
        let config = Config {
            max_body_bytes: 64,
            ..Config::default()
        };
        let limits = config.limits();
        assert_eq!(limits.max_body_bytes, 64);
        assert_eq!(limits.max_line_len, MAX_LINE_LEN);
    }

    // ==================== Validation ====================

    #[test]
    fn test_validate_zero_workers() {
        let config = Config {
            workers: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoWorkers));
    }

    #[test]
    fn test_validate_zero_grace_period() {
        let config = Config {
            grace_period_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroGracePeriod));
    }

    #[test]
    fn test_validate_zero_max_body() {
        let config = Config {
            max_body_bytes: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxBody));
    }

    #[test]
    fn test_validate_half_configured_gateway() {
        let config = Config {
            sensor_url: Some("http://localhost:8081/api/sensor/data".to_string()),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("--sensor-url"));
        assert!(config.gateway_urls().is_none());
    }

    #[test]
    fn test_gateway_urls() {
        let config = parse(&[
            "--sensor-url",
            "http://s/data",
            "--analytics-url",
            "http://a",
        ]);
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway_urls(), Some(("http://s/data", "http://a")));
    }
}
