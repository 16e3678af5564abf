//! # Handlers Básicos
//! src/handlers/basic.rs
//!
//! - `GET /`: banner con los endpoints disponibles
//! - `GET /ping`: "pong"
//! - `GET /health`: "OK"
//! - `POST /echo`: devuelve el body recibido

use crate::http::{Request, Response};
use crate::router::HandlerResult;

const BANNER: &str = "\
# Student Manager
Raw HTTP/1.1 server with a bounded worker pool.

Available endpoints:
- GET    /ping              -> pong
- GET    /health            -> OK
- GET    /students          -> list students with indices
- POST   /students          -> add students (text/plain, one per line: \"First Last\")
- DELETE /students          -> clear all, or ?i=<index> to delete one
- GET    /count             -> total number of students
- POST   /echo              -> echo the request body
- POST   /api/auth/register -> register a user (JSON: email, fullName, password)
- POST   /api/auth/login    -> check credentials (JSON: email, password)
- GET    /metrics           -> server metrics (JSON)
- GET    /api/gateway/data  -> sensor reading + analytics (when configured)
";

pub fn root_handler(_req: &Request) -> HandlerResult {
    Ok(Response::text(BANNER))
}

pub fn ping_handler(_req: &Request) -> HandlerResult {
    Ok(Response::text("pong"))
}

pub fn health_handler(_req: &Request) -> HandlerResult {
    Ok(Response::text("OK"))
}

/// Handler para `POST /echo`
///
/// # Ejemplo de response
/// ```text
/// Received POST data: hola
/// ```
pub fn echo_handler(req: &Request) -> HandlerResult {
    let body = format!("Received POST data: {}", req.body_text());
    Ok(Response::text(&body))
}
