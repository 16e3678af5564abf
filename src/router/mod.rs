//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Tabla de rutas: mapea `(método, path)` exacto a un handler.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router::route → Handler → Response
//! ```
//!
//! Se arma una sola vez al arrancar y después solo se lee, así que se
//! comparte entre workers con un `Arc<Router>` sin ningún lock. No hay
//! wildcards ni prefijos: `/students` no matchea `/students/1`.

use crate::http::{Method, Request, Response};
use std::collections::HashMap;

/// Error opaco de un handler. Se loguea y el cliente recibe un 500 genérico.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = Result<Response, HandlerError>;

/// Tipo de función handler
///
/// Un handler recibe un Request y retorna una Response. Puede bloquear
/// (store en disco, servicios remotos).
pub type Handler = Box<dyn Fn(&Request) -> HandlerResult + Send + Sync>;

/// Resultado de buscar una ruta
pub enum RouteMatch<'a> {
    /// Hay handler para el par exacto
    Found(&'a Handler),

    /// El path existe pero con otros métodos (en orden de registro)
    MethodNotAllowed(Vec<&'a Method>),

    NotFound,
}

/// Router que mapea `(método, path)` a handlers
#[derive(Default)]
pub struct Router {
    /// path → handlers por método, en orden de registro
    routes: HashMap<String, Vec<(Method, Handler)>>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una ruta con su handler
    ///
    /// Si ya existía un handler para el mismo `(método, path)`, se reemplaza.
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http_server::http::{Method, Response};
    /// use raw_http_server::router::Router;
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/ping", |_req| Ok(Response::text("pong")));
    ///
    /// assert!(router.lookup(&Method::GET, "/ping").is_some());
    /// assert!(router.lookup(&Method::POST, "/ping").is_none());
    /// ```
    pub fn register<F>(&mut self, method: Method, path: &str, handler: F)
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        let entries = self.routes.entry(path.to_string()).or_default();

        match entries.iter_mut().find(|(m, _)| *m == method) {
            Some(entry) => {
                tracing::debug!(method = %method, path, "reemplazando handler existente");
                entry.1 = Box::new(handler);
            }
            None => entries.push((method, Box::new(handler))),
        }
    }

    pub fn get<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::GET, path, handler);
    }

    pub fn post<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::POST, path, handler);
    }

    pub fn delete<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::DELETE, path, handler);
    }

    /// Busca el handler del par exacto `(método, path)`
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&Handler> {
        self.routes
            .get(path)?
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, handler)| handler)
    }

    /// Métodos registrados para un path, en orden de registro
    pub fn allowed_methods(&self, path: &str) -> Vec<&Method> {
        self.routes
            .get(path)
            .map(|entries| entries.iter().map(|(m, _)| m).collect())
            .unwrap_or_default()
    }

    /// Indica si hay al menos un método registrado para el path
    pub fn has_path(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Decide entre handler, 405 o 404 para un request
    pub fn route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        if let Some(handler) = self.lookup(method, path) {
            return RouteMatch::Found(handler);
        }

        let allowed = self.allowed_methods(path);
        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed(allowed)
        }
    }

    /// Número de pares `(método, path)` registrados
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Valor del header `Allow`: "GET, POST"
pub fn allow_header(methods: &[&Method]) -> String {
    methods
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;

    fn call(router: &Router, raw: &[u8]) -> Option<Response> {
        let request = Request::parse(raw).unwrap();
        router
            .lookup(request.method(), request.path())
            .map(|handler| handler(&request).unwrap())
    }

    #[test]
    fn test_router_creation() {
        let router = Router::new();
        assert!(router.is_empty());
    }

    #[test]
    fn test_register_route() {
        let mut router = Router::new();
        router.get("/ping", |_| Ok(Response::text("pong")));
        router.post("/ping", |_| Ok(Response::text("posted")));

        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_route_found() {
        let mut router = Router::new();
        router.get("/ping", |_| Ok(Response::text("pong")));

        let response = call(&router, b"GET /ping HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body(), b"pong");
    }

    #[test]
    fn test_query_does_not_affect_match() {
        let mut router = Router::new();
        router.get("/students", |req| {
            Ok(Response::text(req.query_param("i").unwrap_or("none")))
        });

        let response = call(&router, b"GET /students?i=4 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(response.body(), b"4");
    }

    #[test]
    fn test_exact_match_only() {
        let mut router = Router::new();
        router.get("/students", |_| Ok(Response::text("list")));

        assert!(router.lookup(&Method::GET, "/students/").is_none());
        assert!(router.lookup(&Method::GET, "/students/1").is_none());
        assert!(router.lookup(&Method::GET, "/Students").is_none());
    }

    #[test]
    fn test_has_path_ignores_method() {
        let mut router = Router::new();
        router.post("/students", |_| Ok(Response::text("added")));

        assert!(router.has_path("/students"));
        assert!(!router.has_path("/students/1"));
    }

    #[test]
    fn test_later_registration_overwrites() {
        let mut router = Router::new();
        router.get("/ping", |_| Ok(Response::text("first")));
        router.get("/ping", |_| Ok(Response::text("second")));

        assert_eq!(router.len(), 1);
        let response = call(&router, b"GET /ping HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(response.body(), b"second");
    }

    #[test]
    fn test_route_not_found() {
        let router = Router::new();
        assert!(matches!(router.route(&Method::GET, "/missing"), RouteMatch::NotFound));
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let mut router = Router::new();
        router.get("/students", |_| Ok(Response::text("list")));
        router.post("/students", |_| Ok(Response::text("add")));

        match router.route(&Method::PUT, "/students") {
            RouteMatch::MethodNotAllowed(methods) => {
                assert_eq!(allow_header(&methods), "GET, POST");
            }
            _ => panic!("expected MethodNotAllowed"),
        }
    }

    #[test]
    fn test_extension_method() {
        let mut router = Router::new();
        router.register(Method::Other("PURGE".into()), "/cache", |_| Ok(Response::text("purged")));

        let response = call(&router, b"purge /cache HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(response.body(), b"purged");
    }
}
