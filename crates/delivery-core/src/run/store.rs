use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::WorkflowRun;
use crate::errors::RepositoryError;

/// Persistencia del estado de los runs (propiedad exclusiva del
/// coordinador).
pub trait RunStore: Send + Sync {
    /// Inserta `run` si no existe un run con el mismo `run_id`.
    ///
    /// Devuelve `Some(existente)` cuando ya había uno; en ese caso no escribe
    /// nada. Debe ser atómico: dos llamadas concurrentes con el mismo id no
    /// pueden ambas devolver `None`.
    fn create_if_absent(&self, run: &WorkflowRun) -> Result<Option<WorkflowRun>, RepositoryError>;

    /// Reemplazo completo del run (incluido su contexto).
    fn save(&self, run: &WorkflowRun) -> Result<(), RepositoryError>;

    fn find(&self, run_id: &str) -> Result<Option<WorkflowRun>, RepositoryError>;
}

#[derive(Default)]
pub struct InMemoryRunStore {
    runs: DashMap<String, WorkflowRun>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl RunStore for InMemoryRunStore {
    fn create_if_absent(&self, run: &WorkflowRun) -> Result<Option<WorkflowRun>, RepositoryError> {
        match self.runs.entry(run.run_id.clone()) {
            Entry::Occupied(existing) => Ok(Some(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(run.clone());
                Ok(None)
            }
        }
    }

    fn save(&self, run: &WorkflowRun) -> Result<(), RepositoryError> {
        self.runs.insert(run.run_id.clone(), run.clone());
        Ok(())
    }

    fn find(&self, run_id: &str) -> Result<Option<WorkflowRun>, RepositoryError> {
        Ok(self.runs.get(run_id).map(|r| r.value().clone()))
    }
}
