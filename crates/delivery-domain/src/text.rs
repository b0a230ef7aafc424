//! Texto almacenable.
//!
//! Todo campo de texto de una entidad debe poder guardarse tal cual en
//! cualquiera de los dos backends. Postgres `TEXT` no admite U+0000.

use crate::error::DomainError;

/// Rechaza texto con caracteres NUL. `field` sólo se usa para el mensaje.
pub fn validate_stored_text(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.contains('\0') {
        return Err(DomainError::Validation(format!("{field} contains a NUL character")));
    }
    Ok(())
}
