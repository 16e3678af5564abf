//! # Usuarios y Autenticación
//! src/users/mod.rs
//!
//! Colaborador de dominio detrás de `/api/auth/*`: registro, login y hashing
//! de contraseñas. Igual que con el store de estudiantes, cada
//! implementación de [`UserRepository`] maneja su propia sincronización.

pub mod file;
pub mod password;
pub mod service;
pub mod user;

pub use file::FileUserRepository;
pub use service::AuthService;
pub use user::{normalize_email, User, UserView};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("user file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Ya hay un usuario con ese email (sin distinguir mayúsculas)
    #[error("email already registered: {0}")]
    EmailTaken(String),
}

/// Errores de registro y login
///
/// El mensaje de cada variante de cliente es el que ve quien llama a la API.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    /// Email desconocido o contraseña incorrecta, sin distinguir cuál
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Invalid(&'static str),

    #[error(transparent)]
    Store(UserStoreError),
}

impl From<UserStoreError> for AuthError {
    fn from(error: UserStoreError) -> Self {
        match error {
            UserStoreError::EmailTaken(_) => AuthError::EmailTaken,
            other => AuthError::Store(other),
        }
    }
}

/// Operaciones del repositorio de usuarios
///
/// Los emails se comparan normalizados (ver [`normalize_email`]).
pub trait UserRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    /// Guarda un usuario nuevo
    ///
    /// Falla con [`UserStoreError::EmailTaken`] si el email ya existe; el
    /// chequeo y la escritura son una sola operación.
    fn insert(&self, user: User) -> Result<User, UserStoreError>;

    fn find_all(&self) -> Result<Vec<User>, UserStoreError>;

    fn count(&self) -> Result<usize, UserStoreError> {
        Ok(self.find_all()?.len())
    }
}
