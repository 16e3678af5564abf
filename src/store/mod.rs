//! # Store de Estudiantes
//! src/store/mod.rs
//!
//! Colaborador de dominio detrás de `/students` y `/count`. El servidor HTTP
//! no sabe nada de la sincronización del store: cada implementación de
//! [`StudentStore`] es responsable de la suya.

pub mod file;
pub mod student;

pub use file::FileStudentStore;
pub use student::Student;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index {index} out of range (store has {len} students)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Operaciones del store
///
/// Los índices son las posiciones en el orden de `list()`, desde 0.
pub trait StudentStore: Send + Sync {
    fn list(&self) -> Result<Vec<Student>, StoreError>;

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }

    /// Agrega nombres completos ("Nombre Apellido") al final
    ///
    /// Los nombres en blanco se ignoran. Retorna cuántos se agregaron.
    fn add_all(&self, names: &[&str]) -> Result<usize, StoreError>;

    /// Elimina y retorna el estudiante en `index`
    fn delete_by_index(&self, index: usize) -> Result<Student, StoreError>;

    /// Vacía el store. Vaciar un store vacío no es un error.
    fn clear(&self) -> Result<(), StoreError>;
}
