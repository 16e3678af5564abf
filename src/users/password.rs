//! # Hashing de Contraseñas
//! src/users/password.rs
//!
//! SHA-256 iterado con salt aleatorio. El hash guardado lleva todo lo
//! necesario para verificarlo:
//!
//! ```text
//! sha256$<iteraciones>$<salt hex>$<digest hex>
//! ```
//!
//! Cambiar [`DEFAULT_ITERATIONS`] no invalida los hashes ya guardados.

use rand::Rng;
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";

/// Rondas de SHA-256 para los hashes nuevos
pub const DEFAULT_ITERATIONS: u32 = 10_000;

const SALT_LEN: usize = 16;

/// Hashea una contraseña con un salt nuevo
pub fn hash_password(raw: &str) -> String {
    hash_with_iterations(raw, DEFAULT_ITERATIONS)
}

pub fn hash_with_iterations(raw: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let salt_bytes: [u8; SALT_LEN] = rand::thread_rng().gen();
    let salt = to_hex(&salt_bytes);
    let digest = derive(raw, &salt, iterations);

    format!("{}${}${}${}", SCHEME, iterations, salt, digest)
}

/// Verifica una contraseña contra un hash guardado
///
/// Un hash con formato inválido nunca verifica.
///
/// # Ejemplo
/// ```
/// use raw_http_server::users::password::{hash_password, verify_password};
///
/// let stored = hash_password("hunter22");
/// assert!(verify_password("hunter22", &stored));
/// assert!(!verify_password("hunter23", &stored));
/// ```
pub fn verify_password(raw: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    constant_time_eq(derive(raw, salt, iterations).as_bytes(), expected.as_bytes())
}

fn derive(raw: &str, salt: &str, iterations: u32) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(raw.as_bytes())
        .finalize();

    for _ in 1..iterations {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(raw.as_bytes())
            .finalize();
    }

    format!("{:x}", digest)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Compara sin cortar en el primer byte distinto
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
