//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! 1. `tcp`: escucha en un puerto y acepta conexiones
//! 2. `pool`: reparte las conexiones entre un número fijo de workers
//! 3. `connection`: lee el request, lo despacha y escribe la respuesta
//! 4. `shutdown`: cierre ordenado (señales del SO o handle explícito)

pub mod connection;
pub mod pool;
pub mod shutdown;
pub mod tcp;

pub use connection::{dispatch, ConnectionContext};
pub use pool::{DrainReport, WorkerPool};
pub use shutdown::{watch_signals, ShutdownHandle};
pub use tcp::{Server, ServerError};
