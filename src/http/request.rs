//! # Decodificación de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Parser HTTP/1.1 escrito a mano que lee directamente del stream de la
//! conexión (cualquier `BufRead`), sin buffers de tamaño fijo.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /students?source=lab HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 27\r\n
//! \r\n
//! Ana Popescu\nBogdan Ionescu\n
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD target [version]`, separados por un espacio.
//!    La versión se guarda pero no se valida.
//! 2. **Headers**: `Name: Value` hasta la línea vacía (o fin del stream).
//! 3. **Body**: exactamente `Content-Length` bytes, nunca para GET/HEAD.
//!
//! Las líneas pueden terminar en `\r\n` o en `\n`.
//!
//! ## Limitaciones conocidas
//!
//! - `header()` compara nombres respetando mayúsculas. Solo el framing del
//!   body busca `Content-Length` sin distinguirlas.
//! - No hay chunked transfer-encoding: sin `Content-Length` el body es vacío.

use super::StatusCode;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{BufRead, Read};
use thiserror::Error;

/// Longitud máxima de la request line y de cada header
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Número máximo de headers por request
pub const MAX_HEADERS: usize = 100;

/// Tamaño máximo de body aceptado por defecto (1 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Métodos HTTP
///
/// El token se normaliza a mayúsculas al decodificar, así que
/// `get /ping` y `GET /ping` producen `Method::GET`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    PATCH,
    OPTIONS,
    /// Cualquier otro token válido (ya en mayúsculas)
    Other(String),
}

impl Method {
    /// Parsea un método desde el token de la request line
    ///
    /// Retorna `None` si el token está vacío o contiene caracteres que no
    /// son válidos en un token HTTP.
    pub fn parse(token: &str) -> Option<Self> {
        if token.is_empty() || !token.bytes().all(is_token_byte) {
            return None;
        }

        let upper = token.to_ascii_uppercase();
        let method = match upper.as_str() {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "PATCH" => Method::PATCH,
            "OPTIONS" => Method::OPTIONS,
            _ => Method::Other(upper),
        };
        Some(method)
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::OPTIONS => "OPTIONS",
            Method::Other(token) => token,
        }
    }

    /// GET y HEAD nunca llevan body, sin importar los headers
    pub fn allows_body(&self) -> bool {
        !matches!(self, Method::GET | Method::HEAD)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// tchar según RFC 7230
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Límites aplicados durante la decodificación
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_line_len: usize,
    pub max_headers: usize,
    pub max_body_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_len: MAX_LINE_LEN,
            max_headers: MAX_HEADERS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Errores que pueden ocurrir durante la decodificación
#[derive(Debug, Error)]
pub enum DecodeError {
    /// El cliente cerró (o no mandó nada) antes de la request line
    #[error("client disconnected before sending a request line")]
    ClientDisconnected,

    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("malformed header: {0:?}")]
    MalformedHeader(String),

    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("line longer than {0} bytes")]
    LineTooLong(usize),

    #[error("more than {0} header lines")]
    TooManyHeaders(usize),

    #[error("declared body of {declared} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { declared: usize, limit: usize },

    /// El stream terminó antes de `Content-Length` bytes
    #[error("body truncated: expected {expected} bytes, received {received}")]
    TruncatedBody { expected: usize, received: usize },

    /// Error del socket (incluye timeouts de lectura)
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Código de estado a responder, o `None` si la conexión se cierra
    /// sin escribir nada
    pub fn response_status(&self) -> Option<StatusCode> {
        match self {
            DecodeError::ClientDisconnected | DecodeError::Io(_) => None,
            DecodeError::BodyTooLarge { .. } => Some(StatusCode::PayloadTooLarge),
            DecodeError::MalformedRequestLine(_)
            | DecodeError::MalformedHeader(_)
            | DecodeError::InvalidContentLength(_)
            | DecodeError::LineTooLong(_)
            | DecodeError::TooManyHeaders(_)
            | DecodeError::TruncatedBody { .. } => Some(StatusCode::BadRequest),
        }
    }
}

/// Representa un request HTTP decodificado
///
/// Se construye una vez por conexión y nunca se modifica.
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP en mayúsculas
    method: Method,

    /// Path sin query string (ej: "/students")
    path: String,

    /// Query parameters en orden de aparición, ya decodificados
    query_pairs: Vec<(String, String)>,

    /// Vista last-value-wins de `query_pairs`
    query: HashMap<String, String>,

    /// Headers con el nombre tal como llegó
    headers: HashMap<String, String>,

    /// Versión HTTP si vino en la request line (se ignora)
    version: Option<String>,

    body: Vec<u8>,
}

impl Request {
    /// Decodifica un request completo desde un stream
    ///
    /// Bloquea hasta leer la request line, los headers y, si corresponde,
    /// exactamente `Content-Length` bytes de body.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use raw_http_server::http::{Limits, Request};
    ///
    /// let raw = b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
    /// let request = Request::read_from(&mut &raw[..], &Limits::default()).unwrap();
    ///
    /// assert_eq!(request.path(), "/echo");
    /// assert_eq!(request.body(), b"hello");
    /// ```
    pub fn read_from<R: BufRead>(reader: &mut R, limits: &Limits) -> Result<Self, DecodeError> {
        // 1. Request line
        let raw_line = match read_line(reader, limits.max_line_len)? {
            Some(line) => line,
            None => return Err(DecodeError::ClientDisconnected),
        };
        let line = String::from_utf8(raw_line).map_err(|e| {
            DecodeError::MalformedRequestLine(String::from_utf8_lossy(e.as_bytes()).into_owned())
        })?;
        if line.trim().is_empty() {
            return Err(DecodeError::ClientDisconnected);
        }
        let (method, path, query_pairs, version) = Self::parse_request_line(&line)?;

        // 2. Headers
        let (headers, content_length) = Self::read_headers(reader, limits)?;

        // 3. Body
        let body = Self::read_body(reader, &method, content_length.as_deref(), limits)?;

        let query = query_pairs.iter().cloned().collect();

        Ok(Request {
            method,
            path,
            query_pairs,
            query,
            headers,
            version,
            body,
        })
    }

    /// Decodifica un request desde un buffer en memoria con los límites por defecto
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http_server::http::Request;
    ///
    /// let request = Request::parse(b"GET /students?i=1 HTTP/1.1\r\n\r\n").unwrap();
    /// assert_eq!(request.path(), "/students");
    /// assert_eq!(request.query_param("i"), Some("1"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, DecodeError> {
        Self::read_from(&mut &buffer[..], &Limits::default())
    }

    /// Formato: `METHOD target [version]`
    #[allow(clippy::type_complexity)]
    fn parse_request_line(
        line: &str,
    ) -> Result<(Method, String, Vec<(String, String)>, Option<String>), DecodeError> {
        let mut parts = line.split(' ');
        let method_token = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();

        if method_token.is_empty() || target.is_empty() {
            return Err(DecodeError::MalformedRequestLine(line.to_string()));
        }

        let method = Method::parse(method_token)
            .ok_or_else(|| DecodeError::MalformedRequestLine(line.to_string()))?;
        let version = parts.next().filter(|v| !v.is_empty()).map(str::to_string);
        if parts.next().is_some() {
            return Err(DecodeError::MalformedRequestLine(line.to_string()));
        }
        let (path, query_pairs) = Self::parse_target(target);

        Ok((method, path, query_pairs, version))
    }

    /// Separa path y query en el primer '?'
    ///
    /// Ejemplo: "/students?i=2&x" → ("/students", [("i", "2"), ("x", "")])
    fn parse_target(target: &str) -> (String, Vec<(String, String)>) {
        match target.split_once('?') {
            Some((path, raw_query)) => {
                let pairs = url::form_urlencoded::parse(raw_query.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                (path.to_string(), pairs)
            }
            None => (target.to_string(), Vec::new()),
        }
    }

    /// Lee los headers hasta la línea vacía
    ///
    /// Además del mapa retorna el valor de `Content-Length` buscado sin
    /// distinguir mayúsculas. Si aparece más de una vez con valores
    /// distintos el framing es ambiguo y se rechaza.
    #[allow(clippy::type_complexity)]
    fn read_headers<R: BufRead>(
        reader: &mut R,
        limits: &Limits,
    ) -> Result<(HashMap<String, String>, Option<String>), DecodeError> {
        let mut headers = HashMap::new();
        let mut content_length: Option<String> = None;
        let mut count = 0;

        // Fin de stream también termina los headers
        while let Some(raw) = read_line(reader, limits.max_line_len)? {
            if raw.iter().all(u8::is_ascii_whitespace) {
                break;
            }

            count += 1;
            if count > limits.max_headers {
                return Err(DecodeError::TooManyHeaders(limits.max_headers));
            }

            let line = String::from_utf8(raw).map_err(|e| {
                DecodeError::MalformedHeader(String::from_utf8_lossy(e.as_bytes()).into_owned())
            })?;

            let Some((name, value)) = line.split_once(':') else {
                return Err(DecodeError::MalformedHeader(line));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(DecodeError::MalformedHeader(line));
            }

            let value = value.trim();
            if name.eq_ignore_ascii_case("Content-Length") {
                match &content_length {
                    Some(previous) if previous != value => {
                        return Err(DecodeError::InvalidContentLength(format!("{}, {}", previous, value)));
                    }
                    Some(_) => {}
                    None => content_length = Some(value.to_string()),
                }
            }

            headers.insert(name.to_string(), value.to_string());
        }

        Ok((headers, content_length))
    }

    fn read_body<R: BufRead>(
        reader: &mut R,
        method: &Method,
        content_length: Option<&str>,
        limits: &Limits,
    ) -> Result<Vec<u8>, DecodeError> {
        if !method.allows_body() {
            return Ok(Vec::new());
        }

        let Some(raw_len) = content_length else {
            return Ok(Vec::new());
        };
        let declared: usize = raw_len
            .parse()
            .map_err(|_| DecodeError::InvalidContentLength(raw_len.to_string()))?;

        if declared == 0 {
            return Ok(Vec::new());
        }
        if declared > limits.max_body_bytes {
            return Err(DecodeError::BodyTooLarge {
                declared,
                limit: limits.max_body_bytes,
            });
        }

        let mut body = Vec::with_capacity(declared);
        reader.by_ref().take(declared as u64).read_to_end(&mut body)?;

        if body.len() < declared {
            return Err(DecodeError::TruncatedBody {
                expected: declared,
                received: body.len(),
            });
        }

        Ok(body)
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters con semántica last-value-wins
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Obtiene un query parameter (el último si la clave se repite)
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|s| s.as_str())
    }

    /// Todos los valores de una clave, en orden de aparición
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query_pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header comparando el nombre exacto (sensible a mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene un header sin distinguir mayúsculas
    pub fn header_ignore_case(&self, name: &str) -> Option<&str> {
        find_ignore_case(&self.headers, name)
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body como texto (UTF-8 inválido se reemplaza)
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn find_ignore_case<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Lee una línea terminada en `\n` (o `\r\n`) sin el terminador.
///
/// `Ok(None)` indica fin de stream antes de cualquier byte.
fn read_line<R: BufRead>(reader: &mut R, limit: usize) -> Result<Option<Vec<u8>>, DecodeError> {
    let mut line = Vec::new();
    let read = reader.by_ref().take(limit as u64 + 1).read_until(b'\n', &mut line)?;

    if read == 0 {
        return Ok(None);
    }

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    } else if line.len() > limit {
        return Err(DecodeError::LineTooLong(limit));
    }

    Ok(Some(line))
}
