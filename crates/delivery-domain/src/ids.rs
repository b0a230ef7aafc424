//! Identificadores lógicos.
//!
//! Un identificador lógico relaciona registros de etapas distintas sin clave
//! foránea. Formato aceptado: 1..=128 caracteres en `[A-Za-z0-9_.:-]`.

use crate::error::DomainError;

pub const MAX_LOGICAL_ID_LEN: usize = 128;

/// Valida un identificador lógico. `field` sólo se usa para el mensaje.
pub fn validate_logical_id(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::InvalidLogicalId { field,
                                                   reason: "empty".into() });
    }
    if value.len() > MAX_LOGICAL_ID_LEN {
        return Err(DomainError::InvalidLogicalId { field,
                                                   reason: format!("longer than {MAX_LOGICAL_ID_LEN} chars") });
    }
    if let Some(bad) = value.chars()
                            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
    {
        return Err(DomainError::InvalidLogicalId { field,
                                                   reason: format!("unexpected character {bad:?}") });
    }
    Ok(())
}
