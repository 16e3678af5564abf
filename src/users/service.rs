//! # Servicio de Autenticación
//! src/users/service.rs
//!
//! Registro y login sobre un [`UserRepository`]. Las contraseñas se hashean
//! antes de tomar el lock del repositorio.

use super::password::{hash_password, verify_password};
use super::{AuthError, User, UserRepository};
use std::sync::Arc;

/// Largo permitido del nombre completo, en caracteres
const FULL_NAME_LEN: std::ops::RangeInclusive<usize> = 3..=80;

/// Largo permitido de la contraseña, en caracteres
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 6..=100;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Registra un usuario nuevo con el rol por defecto
    pub fn register(&self, email: &str, full_name: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim();
        let full_name = full_name.trim();
        validate_registration(email, full_name, password)?;

        if self.users.find_by_email(email)?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = User::create_new(email, full_name, hash_password(password));
        let user = self.users.insert(user)?;

        tracing::info!(user_id = %user.id, "usuario registrado");
        Ok(user)
    }

    /// Verifica email + contraseña
    ///
    /// Email desconocido y contraseña incorrecta producen el mismo error.
    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Some(user) = self.users.find_by_email(email)? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

fn validate_registration(email: &str, full_name: &str, password: &str) -> Result<(), AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::Invalid("email must be a valid address"));
    }
    if !FULL_NAME_LEN.contains(&full_name.chars().count()) {
        return Err(AuthError::Invalid("fullName must be between 3 and 80 characters"));
    }
    if password.trim().is_empty() || !PASSWORD_LEN.contains(&password.chars().count()) {
        return Err(AuthError::Invalid("password must be between 6 and 100 characters"));
    }
    Ok(())
}

/// `local@dominio`, sin espacios y con una sola `@`
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}
