//! # Construcción y Codificación de Respuestas HTTP
//!
//! API para construir respuestas desde los handlers y serializarlas al
//! formato de cable.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/plain; charset=utf-8\r\n
//! Content-Length: 4\r\n
//! Connection: close\r\n
//! \r\n
//! pong
//! ```
//!
//! `Content-Length` siempre se calcula a partir del body, así los clientes
//! estrictos pueden delimitar la respuesta sin depender del cierre.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use raw_http_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_content_type("application/json")
//!     .with_body(r#"{"ok": true}"#);
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::StatusCode;
use std::io::{self, Write};

/// Content-Type por defecto de las respuestas de texto
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Content-Type de las respuestas JSON
pub const APPLICATION_JSON: &str = "application/json";

/// Representa una respuesta HTTP completa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,

    content_type: String,

    /// Headers adicionales (Allow, Connection, ...), en orden de inserción
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,

    /// Respuesta a un HEAD: se anuncia el largo pero no se escribe el body
    head_only: bool,
}

impl Response {
    /// Crea una respuesta `text/plain` sin body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
            head_only: false,
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Agrega un header a la respuesta
    ///
    /// Si ya existe un header con el mismo nombre, se sobrescribe.
    /// `Content-Type` y `Content-Length` se controlan con sus propios métodos.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de [`Response::with_header`]
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Marca la respuesta como contestación a un `HEAD`
    ///
    /// `Content-Length` sigue reflejando el body, pero el body no se escribe.
    pub fn head_only(mut self) -> Self {
        self.head_only = true;
        self
    }

    /// Respuesta 200 `text/plain`
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http_server::http::Response;
    ///
    /// let response = Response::text("pong");
    /// assert_eq!(response.body(), b"pong");
    /// ```
    pub fn text(body: &str) -> Self {
        Self::new(StatusCode::Ok).with_body(body)
    }

    /// Respuesta 200 `application/json`
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_content_type(APPLICATION_JSON)
            .with_body(body)
    }

    /// Respuesta de error en texto plano
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::BadRequest, "ERROR: request body is empty or invalid\n");
    /// assert_eq!(response.status(), StatusCode::BadRequest);
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::new(status).with_body(message)
    }

    /// Respuesta de error con el reason phrase como body
    ///
    /// Es la que se usa cuando no hay que filtrar detalles al cliente.
    pub fn generic(status: StatusCode) -> Self {
        Self::error(status, status.reason_phrase())
    }

    /// Serializa la respuesta completa
    ///
    /// Orden en el cable:
    /// 1. Status line: `HTTP/1.1 <code> <reason>\r\n`
    /// 2. `Content-Type` y `Content-Length`
    /// 3. Headers adicionales
    /// 4. Línea vacía
    /// 5. Body (salvo en respuestas a `HEAD`)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n",
            self.status,
            self.content_type,
            self.body.len()
        );
        result.extend_from_slice(head.as_bytes());

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        if !self.head_only {
            result.extend_from_slice(&self.body);
        }

        result
    }

    /// Escribe la respuesta en el stream y hace flush
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_text(&self) -> &'static str {
        self.status.reason_phrase()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Busca un header adicional (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
