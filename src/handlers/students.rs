//! # Handlers de Estudiantes
//! src/handlers/students.rs
//!
//! - `GET /students`: listado con índices
//! - `POST /students`: un estudiante por línea, "Nombre Apellido"
//! - `DELETE /students[?i=N]`: vacía el store o borra el índice N
//! - `GET /count`: cantidad de estudiantes
//!
//! Los errores de I/O del store se propagan con `?` y terminan en un 500.

use crate::http::{Request, Response, StatusCode};
use crate::router::HandlerResult;
use crate::store::{StoreError, StudentStore};
use std::fmt::Write;

const INVALID_BODY: &str = "ERROR: request body is empty or invalid\n";

/// Handler para `GET /students`
///
/// # Ejemplo de response
/// ```text
/// # Students (2)
/// 0: Ana Popescu
/// 1: Bogdan Ionescu
/// ```
pub fn list_handler(_req: &Request, store: &dyn StudentStore) -> HandlerResult {
    let students = store.list()?;

    let mut body = format!("# Students ({})\n", students.len());
    if students.is_empty() {
        body.push_str("(empty)\n");
    } else {
        for (i, student) in students.iter().enumerate() {
            writeln!(body, "{}: {} {}", i, student.first_name(), student.last_name())?;
        }
    }

    Ok(Response::text(&body))
}

/// Handler para `POST /students`
///
/// El body se parte en líneas (`\n` o `\r\n`); las líneas en blanco se
/// descartan. Sin líneas válidas → 400.
pub fn add_handler(req: &Request, store: &dyn StudentStore) -> HandlerResult {
    let text = req.body_text();
    let names: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    if names.is_empty() {
        return Ok(Response::error(StatusCode::BadRequest, INVALID_BODY));
    }

    let added = store.add_all(&names)?;
    tracing::info!(added, "estudiantes agregados");

    Ok(Response::text(&format!("ADDED {}\n", added)))
}

/// Handler para `DELETE /students?i=N`
///
/// Sin `i` vacía el store (idempotente). `i` no numérico → 400, fuera de
/// rango → 404.
pub fn delete_handler(req: &Request, store: &dyn StudentStore) -> HandlerResult {
    let Some(raw_index) = req.query_param("i") else {
        store.clear()?;
        tracing::info!("store vaciado");
        return Ok(Response::text("CLEARED\n"));
    };

    let index: usize = match raw_index.trim().parse() {
        Ok(i) => i,
        Err(_) => {
            return Ok(Response::error(
                StatusCode::BadRequest,
                "ERROR: parameter 'i' must be a non-negative integer\n",
            ));
        }
    };

    match store.delete_by_index(index) {
        Ok(removed) => {
            tracing::info!(index, student = %removed, "estudiante eliminado");
            Ok(Response::text(&format!("DELETED {}\n", index)))
        }
        Err(StoreError::IndexOutOfRange { index, len }) => Ok(Response::error(
            StatusCode::NotFound,
            &format!("ERROR: index {} out of range (0..{})\n", index, len),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Handler para `GET /count`
pub fn count_handler(_req: &Request, store: &dyn StudentStore) -> HandlerResult {
    let count = store.count()?;
    Ok(Response::text(&format!("{}\n", count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileStudentStore;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStudentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStudentStore::open(dir.path().join("students.txt")).unwrap();
        (dir, store)
    }

    fn body(response: &Response) -> String {
        String::from_utf8(response.body().to_vec()).unwrap()
    }

    fn post(body: &str) -> Request {
        let raw = format!(
            "POST /students HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        Request::parse(raw.as_bytes()).unwrap()
    }

    fn get(target: &str) -> Request {
        Request::parse(format!("GET {} HTTP/1.1\r\n\r\n", target).as_bytes()).unwrap()
    }

    fn delete(target: &str) -> Request {
        Request::parse(format!("DELETE {} HTTP/1.1\r\n\r\n", target).as_bytes()).unwrap()
    }

    // ==================== GET ====================

    #[test]
    fn test_list_empty() {
        let (_dir, store) = store();
        let response = list_handler(&get("/students"), &store).unwrap();
        assert_eq!(body(&response), "# Students (0)\n(empty)\n");
    }

    #[test]
    fn test_post_then_list() {
        let (_dir, store) = store();

        let response = add_handler(&post("Ana Popescu\nBogdan Ionescu\n"), &store).unwrap();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(body(&response), "ADDED 2\n");

        let response = list_handler(&get("/students"), &store).unwrap();
        assert_eq!(
            body(&response),
            "# Students (2)\n0: Ana Popescu\n1: Bogdan Ionescu\n"
        );
    }

    // ==================== POST ====================

    #[test]
    fn test_post_crlf_and_blank_lines() {
        let (_dir, store) = store();
        let response = add_handler(&post("\r\n  Ana Popescu  \r\n\r\nCarla\r\n"), &store).unwrap();
        assert_eq!(body(&response), "ADDED 2\n");
        assert_eq!(store.list().unwrap()[1].to_string(), "Carla ");
    }

    #[test]
    fn test_post_empty_body() {
        let (_dir, store) = store();
        let response = add_handler(&post(" \n\n"), &store).unwrap();
        assert_eq!(response.status(), StatusCode::BadRequest);
        assert_eq!(body(&response), INVALID_BODY);
    }

    // ==================== DELETE ====================

    #[test]
    fn test_delete_all_twice() {
        let (_dir, store) = store();
        store.add_all(&["Ana Popescu"]).unwrap();

        for _ in 0..2 {
            let response = delete_handler(&delete("/students"), &store).unwrap();
            assert_eq!(body(&response), "CLEARED\n");
            assert_eq!(store.count().unwrap(), 0);
        }
    }

    #[test]
    fn test_delete_by_index() {
        let (_dir, store) = store();
        store.add_all(&["Ana Popescu", "Bogdan Ionescu"]).unwrap();

        let response = delete_handler(&delete("/students?i=0"), &store).unwrap();
        assert_eq!(body(&response), "DELETED 0\n");
        assert_eq!(store.list().unwrap()[0].to_string(), "Bogdan Ionescu");
    }

    #[test]
    fn test_delete_bad_index() {
        let (_dir, store) = store();
        let response = delete_handler(&delete("/students?i=abc"), &store).unwrap();
        assert_eq!(response.status(), StatusCode::BadRequest);

        let response = delete_handler(&delete("/students?i=-1"), &store).unwrap();
        assert_eq!(response.status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_delete_out_of_range() {
        let (_dir, store) = store();
        let response = delete_handler(&delete("/students?i=3"), &store).unwrap();
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    // ==================== COUNT ====================

    #[test]
    fn test_count() {
        let (_dir, store) = store();
        assert_eq!(body(&count_handler(&get("/count"), &store).unwrap()), "0\n");

        store.add_all(&["Ana Popescu", "Bogdan Ionescu"]).unwrap();
        assert_eq!(body(&count_handler(&get("/count"), &store).unwrap()), "2\n");
    }
}
