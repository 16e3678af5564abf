//! # Módulo HTTP
//!
//! Wire codec del servidor: convierte bytes del socket en un [`Request`]
//! y un [`Response`] de vuelta en bytes, sin ninguna noción de rutas ni
//! de lógica de negocio.
//!
//! - Decodificación de requests HTTP/1.1 (subconjunto)
//! - Construcción y codificación de responses
//! - Tabla de status codes
//!
//! ## Subconjunto soportado
//!
//! - Una request por conexión (sin keep-alive ni pipelining)
//! - Sin chunked transfer encoding
//! - Sin header folding
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```

pub mod request;
pub mod response;
pub mod status;

pub use request::{DecodeError, Limits, Method, Request, DEFAULT_MAX_BODY_BYTES, MAX_HEADERS, MAX_LINE_LEN};
pub use response::{Response, APPLICATION_JSON, TEXT_PLAIN};
pub use status::StatusCode;
