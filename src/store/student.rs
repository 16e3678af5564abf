//! # Modelo de Estudiante
//! src/store/student.rs

use std::fmt;

/// Un estudiante: nombre y apellido, siempre sin espacios en los bordes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    first_name: String,
    last_name: String,
}

impl Student {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        }
    }

    /// Parsea un nombre completo: "Ana Popescu"
    ///
    /// Se separa en el primer bloque de espacios; todo lo que sigue es el
    /// apellido. Retorna `None` si no queda nombre.
    ///
    /// # Ejemplo
    /// ```
    /// use raw_http_server::store::Student;
    ///
    /// let s = Student::from_full_name("  Maria  del Carmen ").unwrap();
    /// assert_eq!(s.first_name(), "Maria");
    /// assert_eq!(s.last_name(), "del Carmen");
    /// ```
    pub fn from_full_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (first, last) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
        Some(Self::new(first, last))
    }

    /// Parsea una línea del archivo: "Ana;Popescu"
    ///
    /// Líneas en blanco o vacías en ambos lados se ignoran.
    pub fn from_file_line(line: &str) -> Option<Self> {
        let (first, last) = line.split_once(';').unwrap_or((line, ""));
        let student = Self::new(first, last);

        if student.first_name.is_empty() && student.last_name.is_empty() {
            None
        } else {
            Some(student)
        }
    }

    pub fn to_file_line(&self) -> String {
        format!("{};{}", self.first_name, self.last_name)
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}
