//! # Manejo de una Conexión
//! src/server/connection.rs
//!
//! Una conexión = un request = una respuesta. Cada worker recorre:
//!
//! ```text
//! Idle → Parsing → Dispatching → Responding → Closed
//! ```
//!
//! Toda falla se resuelve acá: o se escribe una respuesta HTTP válida o se
//! cierra el socket sin escribir nada. Nada se propaga al pool ni al
//! accept loop.

use crate::http::{DecodeError, Limits, Method, Request, Response, StatusCode};
use crate::metrics::MetricsCollector;
use crate::router::{allow_header, RouteMatch, Router};
use std::io::{self, BufReader, ErrorKind, Read};
use std::net::{Shutdown, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Valor del header `Server`
pub const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Path con el que se registran en métricas los requests que no se pudieron decodificar
const MALFORMED_PATH: &str = "<malformed>";

/// Clave única en métricas para los paths que no existen en el router
const UNMATCHED_PATH: &str = "<unmatched>";

/// Cuánto descartar de entrada después de responder, antes de cerrar
const LINGER_MAX_BYTES: usize = 64 * 1024;
const LINGER_TIMEOUT: Duration = Duration::from_millis(100);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Todo lo que un worker necesita para atender conexiones
///
/// Se arma una vez y se comparte (solo lectura) entre todos los workers.
pub struct ConnectionContext {
    pub router: Arc<Router>,
    pub metrics: MetricsCollector,
    pub limits: Limits,

    /// `None` = sin deadline
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl ConnectionContext {
    pub fn new(router: Arc<Router>, metrics: MetricsCollector) -> Self {
        Self {
            router,
            metrics,
            limits: Limits::default(),
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// Marca la conexión como activa mientras vive
struct ActiveGuard<'a>(&'a MetricsCollector);

impl<'a> ActiveGuard<'a> {
    fn new(metrics: &'a MetricsCollector) -> Self {
        metrics.connection_started();
        Self(metrics)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.connection_finished();
    }
}

/// Atiende una conexión completa y la cierra
pub fn handle_connection(stream: TcpStream, ctx: &ConnectionContext) {
    let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let span = tracing::info_span!("connection", id, peer = %peer);
    let _entered = span.enter();
    let _active = ActiveGuard::new(&ctx.metrics);

    let start = Instant::now();
    let responded = serve(&stream, ctx);

    if let Some((path, status)) = responded {
        let latency = start.elapsed();
        ctx.metrics.record_request(&path, status.as_u16(), latency);
        tracing::debug!(
            status = status.as_u16(),
            latency_ms = latency.as_secs_f64() * 1000.0,
            "respuesta enviada"
        );
    }

    close(stream);
}

/// Parsing → Dispatching → Responding
///
/// Retorna el path y el status de lo que se intentó escribir, o `None` si
/// la conexión se cierra en silencio.
fn serve(stream: &TcpStream, ctx: &ConnectionContext) -> Option<(String, StatusCode)> {
    if let Err(e) = apply_timeouts(stream, ctx) {
        tracing::debug!(error = %e, "no se pudieron configurar los timeouts del socket");
    }

    let mut reader = BufReader::new(stream);
    let (path, response, is_head) = match Request::read_from(&mut reader, &ctx.limits) {
        Ok(request) => {
            tracing::debug!(method = %request.method(), path = request.path(), "request recibido");
            let response = dispatch(&ctx.router, &request);

            // Los paths que elige el cliente no pueden crecer el mapa de métricas
            let metric_path = if ctx.router.has_path(request.path()) {
                request.path()
            } else {
                UNMATCHED_PATH
            };
            (metric_path.to_string(), response, *request.method() == Method::HEAD)
        }
        Err(e) => match e.response_status() {
            Some(status) => {
                tracing::warn!(error = %e, status = status.as_u16(), "request inválido");
                (MALFORMED_PATH.to_string(), Response::generic(status), false)
            }
            None => {
                log_silent_close(&e);
                return None;
            }
        },
    };

    let mut response = finalize(response);
    if is_head {
        response = response.head_only();
    }
    let status = response.status();

    let mut out = stream;
    if let Err(e) = response.write_to(&mut out) {
        if is_timeout(&e) {
            tracing::warn!("timeout escribiendo la respuesta");
        } else {
            tracing::debug!(error = %e, "no se pudo escribir la respuesta");
        }
    }

    Some((path, status))
}

/// Dispatching → Responding para un request ya decodificado
///
/// Ruta inexistente → 404; path con otros métodos → 405 + `Allow`; un
/// handler que retorna `Err` o entra en panic → 500 genérico.
pub fn dispatch(router: &Router, request: &Request) -> Response {
    match router.route(request.method(), request.path()) {
        RouteMatch::Found(handler) => {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(request))) {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    tracing::error!(error = %e, path = request.path(), "el handler falló");
                    Response::generic(StatusCode::InternalServerError)
                }
                Err(payload) => {
                    tracing::error!(
                        panic = panic_message(&*payload),
                        path = request.path(),
                        "panic en el handler"
                    );
                    Response::generic(StatusCode::InternalServerError)
                }
            }
        }
        RouteMatch::MethodNotAllowed(allowed) => {
            Response::generic(StatusCode::MethodNotAllowed).with_header("Allow", &allow_header(&allowed))
        }
        RouteMatch::NotFound => Response::generic(StatusCode::NotFound),
    }
}

/// Headers que lleva toda respuesta
fn finalize(mut response: Response) -> Response {
    response.add_header("Server", SERVER_NAME);
    response.add_header("Connection", "close");
    response
}

fn apply_timeouts(stream: &TcpStream, ctx: &ConnectionContext) -> io::Result<()> {
    stream.set_read_timeout(ctx.read_timeout)?;
    stream.set_write_timeout(ctx.write_timeout)?;
    Ok(())
}

fn log_silent_close(error: &DecodeError) {
    match error {
        DecodeError::Io(e) if is_timeout(e) => {
            tracing::warn!("timeout de lectura, cerrando la conexión");
        }
        DecodeError::ClientDisconnected => {
            tracing::debug!("el cliente cerró sin mandar un request");
        }
        other => tracing::debug!(error = %other, "error leyendo el request"),
    }
}

/// Los timeouts de socket llegan como `WouldBlock` en Unix y `TimedOut` en Windows
fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}

/// Cierra la conexión sin pisar la respuesta con un RST
///
/// Si el cliente mandó más de lo que se leyó (por ejemplo un body
/// rechazado con 413), cerrar con datos pendientes en el buffer de entrada
/// hace que el kernel mande RST y el cliente puede perder la respuesta.
fn close(mut stream: TcpStream) {
    if stream.shutdown(Shutdown::Write).is_err() {
        return;
    }
    if stream.set_read_timeout(Some(LINGER_TIMEOUT)).is_err() {
        return;
    }

    let mut discarded = 0;
    let mut buf = [0u8; 4096];
    while discarded < LINGER_MAX_BYTES {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => discarded += n,
        }
    }
}
