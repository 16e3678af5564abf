//! # Raw HTTP Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 concurrente implementado sobre sockets TCP crudos:
//! parser propio, tabla de rutas inmutable y un pool fijo de workers con
//! backpressure.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: wire codec (decodificar requests, codificar responses)
//! - `router`: tabla de rutas `(método, path)` → handler
//! - `server`: accept loop, pool de workers, manejo de conexiones y shutdown
//! - `handlers`: endpoints concretos (students, gateway, métricas)
//! - `store`: store de estudiantes en archivo
//! - `users`: registro, login y hashing de contraseñas
//! - `gateway`: clientes de los servicios de sensores y analytics
//! - `metrics`: recolección de métricas y observabilidad
//! - `config`: configuración por CLI y variables de entorno
//! - `logging`: inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use raw_http_server::config::Config;
//! use raw_http_server::http::Response;
//! use raw_http_server::metrics::MetricsCollector;
//! use raw_http_server::router::Router;
//! use raw_http_server::server::Server;
//!
//! let mut router = Router::new();
//! router.get("/ping", |_req| Ok(Response::text("pong")));
//!
//! let server = Server::bind(&Config::default(), router, MetricsCollector::new())?;
//! server.run()?;
//! # Ok::<(), raw_http_server::server::ServerError>(())
//! ```

pub mod config;
pub mod gateway;
pub mod handlers;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod server;
pub mod store;
pub mod users;
