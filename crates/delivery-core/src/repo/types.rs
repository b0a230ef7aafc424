use delivery_domain::StageEntity;

use crate::errors::RepositoryError;

/// Contrato de almacenamiento local de una etapa.
///
/// Ambos backends (transitorio y relacional) deben ser intercambiables:
/// - `save`: reemplazo completo. Si ya existe la misma clave (o la misma
///   `replacement_key`), el conjunto de filas previo se elimina antes de
///   insertar. Nunca se mezclan listas.
/// - `get`: `RepositoryError::NotFound` si no existe.
/// - `delete`: idempotente; borrar un id inexistente no es error. Siempre
///   acotado a un único id.
pub trait StageRepository<E: StageEntity>: Send + Sync {
    fn save(&self, entity: &E) -> Result<String, RepositoryError>;

    fn get(&self, id: &str) -> Result<E, RepositoryError>;

    fn delete(&self, id: &str) -> Result<(), RepositoryError>;

    /// `get` que traduce `NotFound` a `None`.
    fn find(&self, id: &str) -> Result<Option<E>, RepositoryError> {
        match self.get(id) {
            Ok(e) => Ok(Some(e)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
