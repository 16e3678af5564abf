//! # Raw HTTP Server - Entry Point
//! src/main.rs
//!
//! 1. Logging
//! 2. Configuración (CLI + entorno), validada
//! 3. Stores, gateway y router
//! 4. Bind y accept loop hasta SIGINT/SIGTERM

use raw_http_server::config::Config;
use raw_http_server::handlers::{build_gateway, build_router};
use raw_http_server::logging;
use raw_http_server::metrics::MetricsCollector;
use raw_http_server::server::{watch_signals, Server};
use raw_http_server::store::FileStudentStore;
use raw_http_server::users::{AuthService, FileUserRepository};
use std::process;
use std::sync::Arc;

fn main() {
    logging::init();

    let config = Config::new();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "configuración inválida");
        process::exit(2);
    }
    config.log_summary();

    let store = match FileStudentStore::open(&config.students_file) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, path = %config.students_file.display(), "no se pudo abrir el store");
            process::exit(1);
        }
    };

    let auth_service = match FileUserRepository::open(&config.users_file) {
        Ok(users) => Arc::new(AuthService::new(Arc::new(users))),
        Err(e) => {
            tracing::error!(error = %e, path = %config.users_file.display(), "no se pudo abrir el store de usuarios");
            process::exit(1);
        }
    };

    let gateway = match build_gateway(&config) {
        Ok(gateway) => gateway.map(Arc::new),
        Err(e) => {
            tracing::error!(error = %e, "no se pudo crear el gateway");
            process::exit(1);
        }
    };

    let metrics = MetricsCollector::new();
    let router = build_router(store, auth_service, metrics.clone(), gateway);

    let server = match Server::bind(&config, router, metrics) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "error fatal");
            process::exit(1);
        }
    };

    if let Err(e) = watch_signals(server.shutdown_handle()) {
        tracing::warn!(error = %e, "sin handler de señales; el servidor no se podrá apagar ordenadamente");
    }

    match server.run() {
        Ok(report) => tracing::info!(graceful = report.graceful, "servidor detenido"),
        Err(e) => {
            tracing::error!(error = %e, "error fatal");
            process::exit(1);
        }
    }
}
