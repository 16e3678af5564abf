//! # Store en Archivo
//! src/store/file.rs
//!
//! Un estudiante por línea en UTF-8: `Nombre;Apellido`.
//!
//! Todas las operaciones pasan por un mutex, y cada escritura reemplaza el
//! archivo entero: se escribe `<archivo>.tmp` y se renombra encima
//! (atómico en sistemas Unix), así un lector nunca ve un archivo a medias.

use super::{Student, StoreError, StudentStore};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct FileStudentStore {
    path: PathBuf,

    /// Serializa lecturas y escrituras del archivo
    lock: Mutex<()>,
}

impl FileStudentStore {
    /// Abre el store, creando el directorio y un archivo vacío si hace falta
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            File::create(&path)?;
        }

        tracing::debug!(path = %path.display(), "store de estudiantes abierto");

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lee el archivo. Requiere tener el lock.
    fn read_all(&self) -> Result<Vec<Student>, StoreError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(content.lines().filter_map(Student::from_file_line).collect())
    }

    /// Reemplaza el archivo completo. Requiere tener el lock.
    fn write_all(&self, students: &[Student]) -> Result<(), StoreError> {
        replace_file(&self.path, |writer| {
            for student in students {
                writeln!(writer, "{}", student.to_file_line())?;
            }
            Ok(())
        })
        .map_err(StoreError::from)
    }
}

/// Reemplaza `path` entero: escribe `<path>.tmp` y lo renombra encima
///
/// Si algo falla el temporal se borra y el archivo original queda intacto.
pub(crate) fn replace_file<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let temp_path = temp_path_for(path);

    let result = (|| -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        write(&mut writer)?;
        writer.flush()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl StudentStore for FileStudentStore {
    fn list(&self) -> Result<Vec<Student>, StoreError> {
        let _guard = self.guard();
        self.read_all()
    }

    fn add_all(&self, names: &[&str]) -> Result<usize, StoreError> {
        let new: Vec<Student> = names.iter().filter_map(|n| Student::from_full_name(n)).collect();
        if new.is_empty() {
            return Ok(0);
        }

        let _guard = self.guard();
        let mut current = self.read_all()?;
        let added = new.len();
        current.extend(new);
        self.write_all(&current)?;

        Ok(added)
    }

    fn delete_by_index(&self, index: usize) -> Result<Student, StoreError> {
        let _guard = self.guard();
        let mut current = self.read_all()?;

        if index >= current.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: current.len(),
            });
        }

        let removed = current.remove(index);
        self.write_all(&current)?;
        Ok(removed)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.write_all(&[])
    }
}
