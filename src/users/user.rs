//! # Modelo de Usuario
//! src/users/user.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rol que recibe todo usuario recién registrado
pub const DEFAULT_ROLE: &str = "ROLE_USER";

/// Usuario tal como se persiste en el archivo JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,

    /// Ver [`crate::users::password`] para el formato
    pub password_hash: String,

    #[serde(default)]
    pub roles: Vec<String>,
}

impl User {
    /// Crea un usuario con id aleatorio y el rol por defecto
    pub fn create_new(email: &str, full_name: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_string(),
            full_name: full_name.trim().to_string(),
            password_hash,
            roles: vec![DEFAULT_ROLE.to_string()],
        }
    }

    /// Clave con la que se indexa el usuario
    pub fn email_key(&self) -> String {
        normalize_email(&self.email)
    }
}

/// Forma canónica de un email para comparar: sin espacios y en minúsculas
///
/// # Ejemplo
/// ```
/// use raw_http_server::users::normalize_email;
///
/// assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Lo que la API devuelve de un usuario (nunca el hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            roles: user.roles.clone(),
        }
    }
}
