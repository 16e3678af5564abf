//! # Handlers de Autenticación
//! src/handlers/auth.rs
//!
//! - `POST /api/auth/register`: `{"email", "fullName", "password"}` → 201 con el usuario
//! - `POST /api/auth/login`: `{"email", "password"}` → 200 `{"authenticated": true, "user": {...}}`
//!
//! Los errores de cliente se responden como `{"error": "<mensaje>"}`.

use crate::http::{Request, Response, StatusCode, APPLICATION_JSON};
use crate::router::HandlerResult;
use crate::users::{AuthError, AuthService, UserView};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[serde(default)]
    email: String,

    #[serde(default, alias = "full_name")]
    full_name: String,

    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,

    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    authenticated: bool,
    user: Option<UserView>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// `POST /api/auth/register`
pub fn register_handler(req: &Request, auth: &AuthService) -> HandlerResult {
    let body: RegisterRequest = match serde_json::from_slice(req.body()) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "registro con body inválido");
            return json_error(StatusCode::BadRequest, "body must be a JSON object");
        }
    };

    match auth.register(&body.email, &body.full_name, &body.password) {
        Ok(user) => json_response(StatusCode::Created, &UserView::from(&user)),
        Err(e) => auth_error_response(e),
    }
}

/// `POST /api/auth/login`
pub fn login_handler(req: &Request, auth: &AuthService) -> HandlerResult {
    let body: LoginRequest = match serde_json::from_slice(req.body()) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "login con body inválido");
            return json_error(StatusCode::BadRequest, "body must be a JSON object");
        }
    };

    match auth.login(&body.email, &body.password) {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "login correcto");
            let response = LoginResponse {
                authenticated: true,
                user: Some(UserView::from(&user)),
            };
            json_response(StatusCode::Ok, &response)
        }
        Err(e) => auth_error_response(e),
    }
}

/// Errores de cliente → 4xx con el mensaje; errores del store → 500
fn auth_error_response(error: AuthError) -> HandlerResult {
    let status = match error {
        AuthError::EmailTaken => StatusCode::Conflict,
        AuthError::InvalidCredentials => {
            tracing::warn!("credenciales inválidas");
            StatusCode::Unauthorized
        }
        AuthError::Invalid(_) => StatusCode::BadRequest,
        AuthError::Store(e) => return Err(e.into()),
    };
    json_error(status, &error.to_string())
}

fn json_error(status: StatusCode, message: &str) -> HandlerResult {
    json_response(status, &ErrorBody { error: message })
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HandlerResult {
    Ok(Response::new(status)
        .with_content_type(APPLICATION_JSON)
        .with_body(&serde_json::to_string(body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::FileUserRepository;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn auth() -> (TempDir, AuthService) {
        let dir = tempfile::tempdir().unwrap();
        let repository = FileUserRepository::open(dir.path().join("users.json")).unwrap();
        (dir, AuthService::new(Arc::new(repository)))
    }

    fn post(path: &str, body: &str) -> Request {
        let raw = format!(
            "POST {} HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            path,
            body.len(),
            body
        );
        Request::parse(raw.as_bytes()).unwrap()
    }

    fn json(response: &Response) -> serde_json::Value {
        assert_eq!(response.content_type(), APPLICATION_JSON);
        serde_json::from_slice(response.body()).unwrap()
    }

    const ANA: &str = r#"{"email":"ana@example.com","fullName":"Ana Popescu","password":"hunter22"}"#;

    // ==================== register ====================

    #[test]
    fn test_register_created() {
        let (_dir, auth) = auth();
        let response = register_handler(&post("/api/auth/register", ANA), &auth).unwrap();

        assert_eq!(response.status(), StatusCode::Created);
        let value = json(&response);
        assert_eq!(value["email"], "ana@example.com");
        assert_eq!(value["fullName"], "Ana Popescu");
        assert_eq!(value["roles"][0], "ROLE_USER");
        assert!(value.get("passwordHash").is_none());
    }

    #[test]
    fn test_register_duplicate_is_409() {
        let (_dir, auth) = auth();
        register_handler(&post("/api/auth/register", ANA), &auth).unwrap();

        let response = register_handler(&post("/api/auth/register", ANA), &auth).unwrap();
        assert_eq!(response.status(), StatusCode::Conflict);
        assert_eq!(json(&response)["error"], "Email already registered");
    }

    #[test]
    fn test_register_invalid_fields_is_400() {
        let (_dir, auth) = auth();
        let body = r#"{"email":"ana@example.com","fullName":"Ana Popescu","password":"abc"}"#;

        let response = register_handler(&post("/api/auth/register", body), &auth).unwrap();
        assert_eq!(response.status(), StatusCode::BadRequest);
        assert!(json(&response)["error"].as_str().unwrap().contains("password"));
    }

    #[test]
    fn test_register_bad_json_is_400() {
        let (_dir, auth) = auth();
        let response = register_handler(&post("/api/auth/register", "{nope"), &auth).unwrap();
        assert_eq!(response.status(), StatusCode::BadRequest);
    }

    // ==================== login ====================

    #[test]
    fn test_login_ok() {
        let (_dir, auth) = auth();
        register_handler(&post("/api/auth/register", ANA), &auth).unwrap();

        let body = r#"{"email":"ANA@example.com","password":"hunter22"}"#;
        let response = login_handler(&post("/api/auth/login", body), &auth).unwrap();

        assert_eq!(response.status(), StatusCode::Ok);
        let value = json(&response);
        assert_eq!(value["authenticated"], true);
        assert_eq!(value["user"]["email"], "ana@example.com");
    }

    #[test]
    fn test_login_wrong_password_is_401() {
        let (_dir, auth) = auth();
        register_handler(&post("/api/auth/register", ANA), &auth).unwrap();

        let body = r#"{"email":"ana@example.com","password":"wrong-one"}"#;
        let response = login_handler(&post("/api/auth/login", body), &auth).unwrap();

        assert_eq!(response.status(), StatusCode::Unauthorized);
        assert_eq!(json(&response)["error"], "Invalid credentials");
    }

    #[test]
    fn test_login_unknown_user_is_401() {
        let (_dir, auth) = auth();
        let body = r#"{"email":"ghost@example.com","password":"whatever"}"#;

        let response = login_handler(&post("/api/auth/login", body), &auth).unwrap();
        assert_eq!(response.status(), StatusCode::Unauthorized);
    }
}
