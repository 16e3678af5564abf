//! # Pool de Workers Acotado
//! src/server/pool.rs
//!
//! Un número fijo de threads procesa conexiones de una cola compartida.
//!
//! La cola cuenta los trabajos *en vuelo* (encolados + en ejecución) y nunca
//! deja que superen la cantidad de workers: cuando todos están ocupados,
//! quien encola se bloquea hasta que uno termine. Así el accept loop frena
//! en vez de descartar conexiones o acumularlas sin límite.
//!
//! ## Shutdown
//!
//! 1. `close()`: la cola rechaza trabajo nuevo; los workers terminan lo que
//!    ya estaba encolado.
//! 2. Se espera hasta el grace period a que no quede nada en vuelo.
//! 3. Si el plazo vence: se descartan las conexiones encoladas y se hace
//!    `shutdown(Both)` sobre los sockets abiertos, lo que desbloquea a los
//!    workers que estén leyendo o escribiendo.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::{Shutdown, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Cada cuánto el accept loop revisa el flag de shutdown mientras espera un slot
const SLOT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cuánto esperar a los workers después de cancelar sus sockets
const FORCED_JOIN_WAIT: Duration = Duration::from_millis(500);

/// Cola bloqueante con límite de trabajos en vuelo
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,

    /// Hay trabajo nuevo o la cola se cerró
    available: Condvar,

    /// Un trabajo terminó (o la cola se cerró)
    slot_freed: Condvar,

    capacity: usize,
}

struct QueueState<T> {
    pending: VecDeque<T>,

    /// Encolados + en ejecución
    in_flight: usize,

    closed: bool,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                in_flight: 0,
                closed: false,
            }),
            available: Condvar::new(),
            slot_freed: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un trabajo, bloqueando mientras la cola esté saturada
    ///
    /// Retorna `Err(item)` si la cola está (o queda) cerrada.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.lock();

        while state.in_flight >= self.capacity && !state.closed {
            state = self.slot_freed.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.closed {
            return Err(item);
        }

        state.pending.push_back(item);
        state.in_flight += 1;
        self.available.notify_one();
        Ok(())
    }

    /// Espera a que haya un slot libre
    ///
    /// Retorna `false` si la cola se cerró o `should_stop` pasó a `true`.
    pub fn wait_for_slot<F: Fn() -> bool>(&self, should_stop: F) -> bool {
        let mut state = self.lock();

        while state.in_flight >= self.capacity && !state.closed {
            if should_stop() {
                return false;
            }
            state = self
                .slot_freed
                .wait_timeout(state, SLOT_POLL_INTERVAL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        !state.closed && !should_stop()
    }

    /// Desencola el siguiente trabajo
    ///
    /// Bloquea hasta que haya uno. `None` significa cola cerrada y vacía.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();

        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self.available.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Marca como terminado un trabajo obtenido con `pop`
    pub fn complete(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        self.slot_freed.notify_all();
    }

    /// Deja de aceptar trabajo; lo encolado se sigue entregando
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.available.notify_all();
        self.slot_freed.notify_all();
    }

    /// Saca todo lo encolado que ningún worker tomó todavía
    pub fn drain_pending(&self) -> Vec<T> {
        let mut state = self.lock();
        let drained: Vec<T> = state.pending.drain(..).collect();
        state.in_flight = state.in_flight.saturating_sub(drained.len());
        self.slot_freed.notify_all();
        drained
    }

    /// Espera hasta `timeout` a que no quede nada en vuelo
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .slot_freed
            .wait_timeout_while(state, timeout, |s| s.in_flight > 0)
            .unwrap_or_else(PoisonError::into_inner);
        state.in_flight == 0
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Sockets que algún worker está atendiendo, para poder cancelarlos
#[derive(Default)]
struct OpenConnections {
    next_id: AtomicU64,
    registry: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    streams: HashMap<u64, TcpStream>,

    /// `cancel_all` ya corrió: todo socket que se registre después se corta
    cancelled: bool,
}

impl OpenConnections {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra el socket de una conexión que un worker acaba de tomar
    ///
    /// Un worker puede desencolar justo antes de la cancelación y registrar
    /// justo después; en ese caso el socket se corta acá mismo.
    fn register(&self, stream: &TcpStream) -> Option<u64> {
        let clone = stream.try_clone().ok()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut registry = self.lock();
        if registry.cancelled {
            let _ = clone.shutdown(Shutdown::Both);
        }
        registry.streams.insert(id, clone);
        Some(id)
    }

    fn unregister(&self, id: u64) {
        self.lock().streams.remove(&id);
    }

    /// Corta todos los sockets abiertos; retorna cuántos eran
    fn cancel_all(&self) -> usize {
        let mut registry = self.lock();
        registry.cancelled = true;
        for stream in registry.streams.values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        registry.streams.len()
    }
}

/// Resultado del shutdown del pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Todo terminó dentro del grace period
    pub graceful: bool,

    /// Conexiones encoladas que se descartaron sin atender
    pub dropped: usize,

    /// Conexiones en curso cuyo socket se cortó
    pub cancelled: usize,

    /// Workers que no terminaron ni después de la cancelación
    pub detached: usize,
}

type ConnectionJob = dyn Fn(TcpStream) + Send + Sync;

/// Pool fijo de workers que procesan conexiones
pub struct WorkerPool {
    queue: Arc<BoundedQueue<TcpStream>>,
    open: Arc<OpenConnections>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Lanza `size` workers que ejecutan `job` por cada conexión
    pub fn new<F>(size: usize, job: F) -> io::Result<Self>
    where
        F: Fn(TcpStream) + Send + Sync + 'static,
    {
        let size = size.max(1);
        let queue = Arc::new(BoundedQueue::new(size));
        let open = Arc::new(OpenConnections::default());
        let job: Arc<ConnectionJob> = Arc::new(job);

        let mut workers = Vec::with_capacity(size);
        for i in 0..size {
            let queue = Arc::clone(&queue);
            let open = Arc::clone(&open);
            let job = Arc::clone(&job);

            let handle = thread::Builder::new()
                .name(format!("worker-{}", i))
                .spawn(move || worker_loop(queue, open, job))?;
            workers.push(handle);
        }

        tracing::debug!(workers = size, "pool de workers iniciado");

        Ok(Self {
            queue,
            open,
            workers,
        })
    }

    /// Entrega una conexión a un worker, bloqueando si todos están ocupados
    pub fn execute(&self, stream: TcpStream) -> Result<(), TcpStream> {
        self.queue.push(stream)
    }

    /// Espera a que un worker quede libre (ver [`BoundedQueue::wait_for_slot`])
    pub fn wait_for_slot<F: Fn() -> bool>(&self, should_stop: F) -> bool {
        self.queue.wait_for_slot(should_stop)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Conexiones encoladas o en proceso
    pub fn in_flight(&self) -> usize {
        self.queue.in_flight()
    }

    /// Drena el pool con un grace period y cancela lo que quede
    pub fn shutdown(self, grace: Duration) -> DrainReport {
        self.queue.close();

        if self.queue.wait_idle(grace) {
            for worker in self.workers {
                let _ = worker.join();
            }
            return DrainReport {
                graceful: true,
                ..DrainReport::default()
            };
        }

        let dropped = self.queue.drain_pending().len();
        let cancelled = self.open.cancel_all();
        tracing::warn!(dropped, cancelled, "grace period vencido, cancelando conexiones");

        let deadline = Instant::now() + FORCED_JOIN_WAIT;
        let mut detached = 0;
        for worker in self.workers {
            while !worker.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if worker.is_finished() {
                let _ = worker.join();
            } else {
                detached += 1;
            }
        }
        if detached > 0 {
            tracing::warn!(detached, "workers ocupados en trabajo no cancelable");
        }

        DrainReport {
            graceful: false,
            dropped,
            cancelled,
            detached,
        }
    }
}

/// Loop principal del worker
fn worker_loop(queue: Arc<BoundedQueue<TcpStream>>, open: Arc<OpenConnections>, job: Arc<ConnectionJob>) {
    while let Some(stream) = queue.pop() {
        let id = open.register(&stream);

        // Un panic acá no puede matar al worker ni dejar el slot ocupado
        if panic::catch_unwind(AssertUnwindSafe(|| job(stream))).is_err() {
            tracing::error!("panic procesando una conexión");
        }

        if let Some(id) = id {
            open.unregister(id);
        }
        queue.complete();
    }

    tracing::debug!("worker terminado");
}
