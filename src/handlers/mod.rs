//! # Handlers del Servidor
//! src/handlers/mod.rs
//!
//! Handlers concretos que se registran en el [`Router`] al arrancar.
//!
//! ## Categorías
//!
//! - **basic**: `/`, `/ping`, `/health`, `/echo`
//! - **students**: `/students`, `/count` (store en archivo)
//! - **auth**: `/api/auth/register`, `/api/auth/login`
//! - **metrics**: `/metrics`
//! - **gateway**: `/api/gateway/*` (solo si el gateway está configurado)
//!
//! Los handlers que necesitan un colaborador lo reciben como segundo
//! argumento; `build_router` los envuelve en closures que capturan un `Arc`.

pub mod auth;
pub mod basic;
pub mod gateway;
pub mod metrics;
pub mod students;

use crate::config::Config;
use crate::gateway::{Gateway, GatewayError, HttpAnalyticsClient, HttpSensorClient};
use crate::metrics::MetricsCollector;
use crate::router::Router;
use crate::store::StudentStore;
use crate::users::AuthService;
use std::sync::Arc;

/// Arma el gateway con los clientes HTTP, si la configuración lo habilita
pub fn build_gateway(config: &Config) -> Result<Option<Gateway>, GatewayError> {
    let Some((sensor_url, analytics_url)) = config.gateway_urls() else {
        return Ok(None);
    };

    let timeout = config.upstream_timeout();
    let sensor = HttpSensorClient::new(sensor_url, timeout)?;
    let analytics = HttpAnalyticsClient::new(analytics_url, timeout)?;

    Ok(Some(Gateway::new(Box::new(sensor), Box::new(analytics))))
}

/// Registra todas las rutas del servidor
pub fn build_router(
    store: Arc<dyn StudentStore>,
    auth_service: Arc<AuthService>,
    collector: MetricsCollector,
    gateway: Option<Arc<Gateway>>,
) -> Router {
    let mut router = Router::new();

    router.get("/", basic::root_handler);
    router.get("/ping", basic::ping_handler);
    router.get("/health", basic::health_handler);
    router.post("/echo", basic::echo_handler);

    {
        let s = Arc::clone(&store);
        router.get("/students", move |req| students::list_handler(req, s.as_ref()));
        let s = Arc::clone(&store);
        router.post("/students", move |req| students::add_handler(req, s.as_ref()));
        let s = Arc::clone(&store);
        router.delete("/students", move |req| students::delete_handler(req, s.as_ref()));
        let s = store;
        router.get("/count", move |req| students::count_handler(req, s.as_ref()));
    }

    {
        let a = Arc::clone(&auth_service);
        router.post("/api/auth/register", move |req| auth::register_handler(req, &a));
        let a = auth_service;
        router.post("/api/auth/login", move |req| auth::login_handler(req, &a));
    }

    router.get("/metrics", move |req| metrics::metrics_handler(req, &collector));

    if let Some(gw) = gateway {
        router.get("/api/gateway/health", gateway::health_handler);

        let g = Arc::clone(&gw);
        router.get("/api/gateway/sensor", move |req| gateway::sensor_handler(req, &g));
        let g = Arc::clone(&gw);
        router.get("/api/gateway/data", move |req| gateway::data_handler(req, &g));
        let g = gw;
        router.post("/api/gateway/analytics", move |req| gateway::analytics_handler(req, &g));
    }

    tracing::debug!(routes = router.len(), "router armado");
    router
}
