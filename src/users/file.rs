//! # Repositorio de Usuarios en Archivo
//! src/users/file.rs
//!
//! Los usuarios viven en memoria indexados por email normalizado, y cada
//! alta reescribe el archivo JSON completo (arreglo de usuarios, ordenado
//! por email) con el mismo reemplazo atómico que el store de estudiantes.

use super::{normalize_email, User, UserRepository, UserStoreError};
use crate::store::file::replace_file;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct FileUserRepository {
    path: PathBuf,
    users: Mutex<BTreeMap<String, User>>,
}

impl FileUserRepository {
    /// Abre el repositorio y carga los usuarios existentes
    ///
    /// Si el archivo no existe (o está vacío) se crea con `[]`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, UserStoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let existing = match fs::read(&path) {
            Ok(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                Some(serde_json::from_slice::<Vec<User>>(&bytes)?)
            }
            Ok(_) => None,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let repository = Self {
            path,
            users: Mutex::new(BTreeMap::new()),
        };

        match existing {
            Some(list) => {
                let mut users = repository.guard();
                for user in list {
                    users.insert(user.email_key(), user);
                }
            }
            None => repository.persist(&BTreeMap::new())?,
        }

        tracing::debug!(
            path = %repository.path.display(),
            users = repository.guard().len(),
            "store de usuarios abierto"
        );
        Ok(repository)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, BTreeMap<String, User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reescribe el archivo. Requiere tener el lock.
    fn persist(&self, users: &BTreeMap<String, User>) -> Result<(), UserStoreError> {
        let list: Vec<&User> = users.values().collect();

        replace_file(&self.path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, &list)?;
            writer.write_all(b"\n")
        })?;
        Ok(())
    }
}

impl UserRepository for FileUserRepository {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        Ok(self.guard().get(&normalize_email(email)).cloned())
    }

    fn insert(&self, user: User) -> Result<User, UserStoreError> {
        let key = user.email_key();
        let mut users = self.guard();

        if users.contains_key(&key) {
            return Err(UserStoreError::EmailTaken(user.email));
        }

        users.insert(key.clone(), user.clone());
        if let Err(e) = self.persist(&users) {
            // El archivo no cambió: la memoria tampoco
            users.remove(&key);
            return Err(e);
        }

        Ok(user)
    }

    fn find_all(&self) -> Result<Vec<User>, UserStoreError> {
        Ok(self.guard().values().cloned().collect())
    }
}
