//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Accept loop en un thread de control + pool fijo de workers.
//!
//! ```text
//!   listener.accept() ──► WorkerPool (k workers) ──► handle_connection
//!          ▲                     │
//!          └── espera un slot ───┘   (backpressure)
//! ```
//!
//! Antes de cada `accept()` el loop espera a que haya un worker libre; con
//! todos ocupados el cliente siguiente queda en el backlog del kernel hasta
//! que se libere uno. Nunca se descarta una conexión aceptada.

use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::router::Router;
use crate::server::connection::{handle_connection, ConnectionContext};
use crate::server::pool::{DrainReport, WorkerPool};
use crate::server::shutdown::ShutdownHandle;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Pausa después de un error de `accept()` (ej: sin file descriptors)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Errores fatales del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Servidor HTTP/1.1 con pool de workers acotado
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    workers: usize,
    grace_period: Duration,
    context: Arc<ConnectionContext>,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Abre el socket de escucha
    ///
    /// `metrics` debe ser el mismo collector que usa el handler de
    /// `/metrics` registrado en `router`, si lo hay.
    pub fn bind(config: &Config, router: Router, metrics: MetricsCollector) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
        let local_addr = listener.local_addr()?;

        let context = ConnectionContext {
            router: Arc::new(router),
            metrics,
            limits: config.limits(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        };

        Ok(Self {
            listener,
            local_addr,
            workers: config.workers,
            grace_period: config.grace_period(),
            context: Arc::new(context),
            shutdown: ShutdownHandle::new(local_addr),
        })
    }

    /// Dirección real de escucha (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle para pedir el shutdown desde otro thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn metrics(&self) -> MetricsCollector {
        self.context.metrics.clone()
    }

    /// Corre el accept loop hasta que se pida el shutdown
    ///
    /// Al salir el listener ya está cerrado y el pool drenado (o cancelado
    /// si el grace period venció).
    pub fn run(self) -> Result<DrainReport, ServerError> {
        let Server {
            listener,
            local_addr,
            workers,
            grace_period,
            context,
            shutdown,
        } = self;

        let pool = {
            let context = Arc::clone(&context);
            WorkerPool::new(workers, move |stream| handle_connection(stream, &context))?
        };

        tracing::info!(addr = %local_addr, workers = pool.size(), "servidor escuchando");

        loop {
            if !pool.wait_for_slot(|| shutdown.is_triggered()) {
                break;
            }

            match listener.accept() {
                Ok((stream, peer)) => {
                    // Puede ser la conexión que despierta al loop
                    if shutdown.is_triggered() {
                        drop(stream);
                        break;
                    }
                    tracing::trace!(peer = %peer, "conexión aceptada");
                    if pool.execute(stream).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    if shutdown.is_triggered() {
                        break;
                    }
                    tracing::error!(error = %e, "error aceptando conexión");
                    thread::sleep(ACCEPT_ERROR_BACKOFF);
                }
            }
        }

        // Primero se cierra el listener: desde acá no entra ninguna conexión
        drop(listener);
        tracing::info!(
            in_flight = pool.in_flight(),
            grace_ms = grace_period.as_millis() as u64,
            "listener cerrado, drenando conexiones"
        );

        let report = pool.shutdown(grace_period);
        if report.graceful {
            tracing::info!("todas las conexiones terminaron");
        } else {
            tracing::warn!(
                dropped = report.dropped,
                cancelled = report.cancelled,
                detached = report.detached,
                "shutdown forzado"
            );
        }

        Ok(report)
    }
}
