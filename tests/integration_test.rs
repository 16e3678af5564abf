//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero, con un store
//! en un directorio temporal, y lo apaga al terminar.

use raw_http_server::config::Config;
use raw_http_server::handlers::build_router;
use raw_http_server::http::Response;
use raw_http_server::metrics::MetricsCollector;
use raw_http_server::router::Router;
use raw_http_server::server::{DrainReport, Server, ShutdownHandle};
use raw_http_server::store::FileStudentStore;
use raw_http_server::users::{AuthService, FileUserRepository};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Servidor corriendo en background
struct TestServer {
    addr: SocketAddr,
    metrics: MetricsCollector,
    shutdown: ShutdownHandle,
    running: JoinHandle<DrainReport>,
    _data: Option<TempDir>,
}

impl TestServer {
    /// Servidor con las rutas reales de la aplicación
    fn start_app(workers: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStudentStore::open(dir.path().join("students.txt")).unwrap());
        let users = FileUserRepository::open(dir.path().join("users.json")).unwrap();
        let auth_service = Arc::new(AuthService::new(Arc::new(users)));
        let metrics = MetricsCollector::new();
        let router = build_router(store, auth_service, metrics.clone(), None);

        let mut server = Self::start(config(workers), router, metrics);
        server._data = Some(dir);
        server
    }

    fn start(config: Config, router: Router, metrics: MetricsCollector) -> Self {
        let server = Server::bind(&config, router, metrics.clone()).unwrap();
        let addr = server.local_addr();
        let shutdown = server.shutdown_handle();
        let running = thread::spawn(move || server.run().unwrap());

        Self {
            addr,
            metrics,
            shutdown,
            running,
            _data: None,
        }
    }

    fn stop(self) -> DrainReport {
        self.shutdown.trigger();
        self.running.join().unwrap()
    }
}

fn config(workers: usize) -> Config {
    Config {
        port: 0,
        workers,
        grace_period_ms: 2_000,
        read_timeout_ms: 2_000,
        write_timeout_ms: 2_000,
        ..Config::default()
    }
}

/// Helper: envía bytes crudos y retorna la response completa
fn send_raw(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw).unwrap();
    stream.flush().unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

fn send_request(addr: SocketAddr, method: &str, target: &str, body: &str) -> String {
    let raw = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{}",
        method,
        target,
        body.len(),
        body
    );
    send_raw(addr, raw.as_bytes())
}

/// Helper: extrae el body de una response HTTP
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

fn status_line(response: &str) -> &str {
    response.lines().next().unwrap_or("")
}

// ==================== Codec + routing ====================

#[test]
fn test_ping_pong() {
    let server = TestServer::start_app(2);

    let response = send_raw(server.addr, b"GET /ping HTTP/1.1\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    assert!(response.contains("Content-Type: text/plain; charset=utf-8\r\n"));
    assert!(response.contains("Content-Length: 4\r\n"));
    assert_eq!(extract_body(&response), "pong");

    server.stop();
}

#[test]
fn test_unknown_path_is_404() {
    let server = TestServer::start_app(2);

    let response = send_raw(server.addr, b"GET /missing HTTP/1.1\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");

    server.stop();
}

#[test]
fn test_wrong_method_is_405_with_allow() {
    let server = TestServer::start_app(2);

    let response = send_raw(server.addr, b"PUT /students HTTP/1.1\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 405 Method Not Allowed");
    assert!(response.contains("Allow: GET, POST, DELETE\r\n"));

    server.stop();
}

#[test]
fn test_lf_only_request() {
    let server = TestServer::start_app(2);

    let response = send_raw(server.addr, b"GET /health HTTP/1.1\nHost: x\n\n");
    assert_eq!(extract_body(&response), "OK");

    server.stop();
}

#[test]
fn test_empty_connection_gets_no_response() {
    let server = TestServer::start_app(2);

    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.shutdown(std::net::Shutdown::Write).unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).unwrap();
    assert!(buf.is_empty());

    // El servidor sigue atendiendo
    let response = send_raw(server.addr, b"GET /ping HTTP/1.1\r\n\r\n");
    assert_eq!(extract_body(&response), "pong");

    server.stop();
}

#[test]
fn test_malformed_input_is_400() {
    let server = TestServer::start_app(2);

    let response = send_raw(server.addr, b"GET /ping HTTP/1.1\r\nno colon here\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");

    let response = send_raw(server.addr, b"garbage\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");

    let response = send_raw(server.addr, b"POST /echo HTTP/1.1\r\nContent-Length: nope\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");

    let response = send_raw(server.addr, b"GET /a b HTTP/1.1\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");

    server.stop();
}

#[test]
fn test_conflicting_content_lengths_are_400() {
    let server = TestServer::start_app(2);

    for _ in 0..20 {
        let response = send_raw(
            server.addr,
            b"POST /echo HTTP/1.1\r\nContent-Length: 2\r\ncontent-length: 5\r\n\r\nhello",
        );
        assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");
    }

    server.stop();
}

#[test]
fn test_head_response_has_no_body() {
    let server = TestServer::start_app(2);

    let response = send_raw(server.addr, b"HEAD /missing HTTP/1.1\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
    assert!(response.contains("Content-Length: 9\r\n"));
    assert_eq!(extract_body(&response), "");

    server.stop();
}

#[test]
fn test_lowercase_content_length_frames_body() {
    let server = TestServer::start_app(2);

    let response = send_raw(server.addr, b"POST /echo HTTP/1.1\r\ncontent-length: 5\r\n\r\nhello");
    assert_eq!(extract_body(&response), "Received POST data: hello");

    server.stop();
}

// ==================== Students ====================

#[test]
fn test_students_add_then_list() {
    let server = TestServer::start_app(2);

    let response = send_raw(
        server.addr,
        b"POST /students HTTP/1.1\r\nContent-Length: 27\r\n\r\nAna Popescu\nBogdan Ionescu\n",
    );
    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    assert_eq!(extract_body(&response), "ADDED 2\n");

    let response = send_request(server.addr, "GET", "/students", "");
    assert_eq!(
        extract_body(&response),
        "# Students (2)\n0: Ana Popescu\n1: Bogdan Ionescu\n"
    );

    let response = send_request(server.addr, "GET", "/count", "");
    assert_eq!(extract_body(&response), "2\n");

    server.stop();
}

#[test]
fn test_students_empty_post_is_400() {
    let server = TestServer::start_app(2);

    let response = send_request(server.addr, "POST", "/students", "\n  \n");
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");
    assert_eq!(extract_body(&response), "ERROR: request body is empty or invalid\n");

    server.stop();
}

#[test]
fn test_students_clear_twice() {
    let server = TestServer::start_app(2);
    send_request(server.addr, "POST", "/students", "Ana Popescu\n");

    for _ in 0..2 {
        let response = send_request(server.addr, "DELETE", "/students", "");
        assert_eq!(extract_body(&response), "CLEARED\n");

        let response = send_request(server.addr, "GET", "/students", "");
        assert_eq!(extract_body(&response), "# Students (0)\n(empty)\n");
    }

    server.stop();
}

#[test]
fn test_students_delete_by_index() {
    let server = TestServer::start_app(2);
    send_request(server.addr, "POST", "/students", "Ana Popescu\nBogdan Ionescu\n");

    let response = send_request(server.addr, "DELETE", "/students?i=0", "");
    assert_eq!(extract_body(&response), "DELETED 0\n");

    let response = send_request(server.addr, "DELETE", "/students?i=7", "");
    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");

    let response = send_request(server.addr, "GET", "/students", "");
    assert_eq!(extract_body(&response), "# Students (1)\n0: Bogdan Ionescu\n");

    server.stop();
}

// ==================== Metrics ====================

#[test]
fn test_metrics_endpoint() {
    let server = TestServer::start_app(2);
    send_request(server.addr, "GET", "/ping", "");
    send_request(server.addr, "GET", "/missing", "");

    let response = send_request(server.addr, "GET", "/metrics", "");
    assert!(response.contains("Content-Type: application/json\r\n"));

    let value: serde_json::Value = serde_json::from_str(extract_body(&response)).unwrap();
    assert_eq!(value["requests_per_path"]["/ping"], 1);
    assert_eq!(value["status_codes"]["404"], 1);

    server.stop();
}

#[test]
fn test_metrics_paths_bounded_for_unknown_targets() {
    let server = TestServer::start_app(4);

    for i in 0..300 {
        let response = send_request(server.addr, "GET", &format!("/random-{}", i), "");
        assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
    }
    send_request(server.addr, "GET", "/ping", "");

    let snapshot = server.metrics.snapshot();
    assert_eq!(snapshot.requests_per_path.len(), 2);
    assert_eq!(snapshot.requests_per_path.get("<unmatched>"), Some(&300));
    assert_eq!(snapshot.requests_per_path.get("/ping"), Some(&1));

    server.stop();
}

// ==================== Auth ====================

#[test]
fn test_register_then_login() {
    let server = TestServer::start_app(2);
    let register = r#"{"email":"ana@example.com","fullName":"Ana Popescu","password":"hunter22"}"#;

    let response = send_request(server.addr, "POST", "/api/auth/register", register);
    assert_eq!(status_line(&response), "HTTP/1.1 201 Created");
    let user: serde_json::Value = serde_json::from_str(extract_body(&response)).unwrap();
    assert_eq!(user["email"], "ana@example.com");
    assert!(user.get("passwordHash").is_none());

    let response = send_request(server.addr, "POST", "/api/auth/register", register);
    assert_eq!(status_line(&response), "HTTP/1.1 409 Conflict");

    let login = r#"{"email":"ana@example.com","password":"hunter22"}"#;
    let response = send_request(server.addr, "POST", "/api/auth/login", login);
    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    let value: serde_json::Value = serde_json::from_str(extract_body(&response)).unwrap();
    assert_eq!(value["authenticated"], true);
    assert_eq!(value["user"]["id"], user["id"]);

    let wrong = r#"{"email":"ana@example.com","password":"nope-nope"}"#;
    let response = send_request(server.addr, "POST", "/api/auth/login", wrong);
    assert_eq!(status_line(&response), "HTTP/1.1 401 Unauthorized");
    assert!(extract_body(&response).contains("Invalid credentials"));

    server.stop();
}

// ==================== Concurrency ====================

#[test]
fn test_pool_bounds_concurrency_without_dropping() {
    const WORKERS: usize = 3;
    const CLIENTS: usize = 12;

    let in_handler = Arc::new(AtomicUsize::new(0));
    let max_in_handler = Arc::new(AtomicUsize::new(0));

    let mut router = Router::new();
    {
        let in_handler = Arc::clone(&in_handler);
        let max_in_handler = Arc::clone(&max_in_handler);
        router.get("/slow", move |_req| {
            let now = in_handler.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_handler.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            in_handler.fetch_sub(1, Ordering::SeqCst);
            Ok(Response::text("done"))
        });
    }

    let server = TestServer::start(config(WORKERS), router, MetricsCollector::new());
    let addr = server.addr;

    let start = Instant::now();
    let clients: Vec<_> = (0..CLIENTS)
        .map(|_| thread::spawn(move || send_raw(addr, b"GET /slow HTTP/1.1\r\n\r\n")))
        .collect();

    for client in clients {
        assert_eq!(extract_body(&client.join().unwrap()), "done");
    }
    let elapsed = start.elapsed();

    assert!(max_in_handler.load(Ordering::SeqCst) <= WORKERS);
    assert!(server.metrics.peak_connections() <= WORKERS as u64);
    assert_eq!(server.metrics.snapshot().total_requests, CLIENTS as u64);

    // 12 clientes / 3 workers = 4 rondas de 100 ms como mínimo
    assert!(elapsed >= Duration::from_millis(380), "elapsed {:?}", elapsed);

    server.stop();
}

#[test]
fn test_handler_panic_does_not_kill_server() {
    let mut router = Router::new();
    router.get("/boom", |_req| panic!("handler bug"));
    router.get("/ping", |_req| Ok(Response::text("pong")));

    let server = TestServer::start(config(1), router, MetricsCollector::new());

    for _ in 0..3 {
        let response = send_raw(server.addr, b"GET /boom HTTP/1.1\r\n\r\n");
        assert_eq!(status_line(&response), "HTTP/1.1 500 Internal Server Error");
        assert!(!response.contains("handler bug"));
    }

    let response = send_raw(server.addr, b"GET /ping HTTP/1.1\r\n\r\n");
    assert_eq!(extract_body(&response), "pong");

    server.stop();
}

// ==================== Shutdown ====================

#[test]
fn test_graceful_shutdown_finishes_in_flight() {
    let mut router = Router::new();
    router.get("/slow", |_req| {
        thread::sleep(Duration::from_millis(300));
        Ok(Response::text("finished"))
    });

    let server = TestServer::start(config(2), router, MetricsCollector::new());
    let addr = server.addr;

    let client = thread::spawn(move || send_raw(addr, b"GET /slow HTTP/1.1\r\n\r\n"));
    thread::sleep(Duration::from_millis(100));

    let report = server.stop();
    assert!(report.graceful);
    assert_eq!(extract_body(&client.join().unwrap()), "finished");

    // Después del shutdown no se acepta nada
    assert!(TcpStream::connect(addr).is_err());
}

#[test]
fn test_shutdown_cancels_stuck_connection() {
    let mut config = config(1);
    config.grace_period_ms = 200;
    config.read_timeout_ms = 0;

    let server = TestServer::start(config, Router::new(), MetricsCollector::new());

    // Cliente que conecta y nunca manda nada
    let _silent = TcpStream::connect(server.addr).unwrap();
    thread::sleep(Duration::from_millis(100));

    let start = Instant::now();
    let report = server.stop();

    assert!(!report.graceful);
    assert_eq!(report.cancelled, 1);
    assert!(start.elapsed() < Duration::from_secs(2));
}

// ==================== Conformant client ====================

#[test]
fn test_reqwest_client_reads_response() {
    let server = TestServer::start_app(2);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let response = client.get(format!("http://{}/ping", server.addr)).send().unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().unwrap(), "pong");

    let response = client
        .post(format!("http://{}/students", server.addr))
        .body("Carla Rusu\n")
        .send()
        .unwrap();
    assert_eq!(response.text().unwrap(), "ADDED 1\n");

    server.stop();
}
