//! # Coordinación de Shutdown
//! src/server/shutdown.rs
//!
//! `ShutdownHandle` es la señal compartida entre el accept loop y quien
//! pide apagar el servidor (señales del SO, tests).
//!
//! El accept loop pasa casi todo su tiempo bloqueado en `accept()`, que no
//! se puede interrumpir desde otro thread con la librería estándar. Por eso
//! `trigger()` marca el flag y después abre una conexión a la propia
//! dirección del listener: `accept()` retorna, el loop ve el flag, descarta
//! esa conexión y sale.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const WAKE_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle clonable para pedir el shutdown del servidor
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    pub(crate) fn new(local_addr: SocketAddr) -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            wake_addr: wake_address(local_addr),
        }
    }

    /// Pide el shutdown. Llamarlo más de una vez no tiene efecto.
    pub fn trigger(&self) {
        if self.requested.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("shutdown solicitado");

        // Despertar al accept loop
        if let Err(e) = TcpStream::connect_timeout(&self.wake_addr, WAKE_CONNECT_TIMEOUT) {
            tracing::debug!(error = %e, "no se pudo despertar al accept loop");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Un listener en 0.0.0.0 / [::] se despierta por loopback
fn wake_address(local: SocketAddr) -> SocketAddr {
    let ip = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local.port())
}

/// Lanza un thread que espera SIGINT (Ctrl-C) o SIGTERM y dispara el shutdown
///
/// Las señales se esperan con un runtime de tokio de un solo thread; el
/// resto del servidor es bloqueante y no lo usa.
pub fn watch_signals(handle: ShutdownHandle) -> io::Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            match runtime.block_on(shutdown_signal()) {
                Ok(()) => handle.trigger(),
                Err(e) => tracing::error!(error = %e, "no se pudieron instalar los handlers de señales"),
            }
        })
}

/// Resuelve con la primera señal de apagado que reciba el proceso
async fn shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    let sigterm = async move {
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        () = sigterm => Ok(()),
    }
}
