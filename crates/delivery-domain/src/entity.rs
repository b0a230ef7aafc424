use crate::error::DomainError;
use crate::stage::Stage;

/// Contrato mínimo que los repositorios necesitan de una entidad de etapa.
///
/// - `entity_id`: clave única propia de la entidad (nunca compartida entre
///   etapas).
/// - `replacement_key`: clave secundaria cuya unicidad también debe
///   respetarse al guardar. Un `save` con la misma clave reemplaza el
///   registro previo (por ejemplo, un único `QcResult` vigente por draft).
pub trait StageEntity: Clone + Send + Sync + 'static {
    /// Etapa dueña de la entidad.
    const STAGE: Stage;
    /// Nombre corto de la entidad para mensajes y logs.
    const KIND: &'static str;

    fn entity_id(&self) -> &str;

    /// Invariantes locales de la entidad (ids lógicos, campos requeridos).
    fn validate(&self) -> Result<(), DomainError>;

    fn replacement_key(&self) -> Option<&str> {
        None
    }
}
