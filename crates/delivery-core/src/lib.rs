//! delivery-core: coordinador de la saga, contrato de repositorios y
//! puertos de etapa.
pub mod errors;
pub mod hashing;
pub mod port;
pub mod repo;
pub mod run;
pub mod saga;

pub use errors::{classify_error, CompensationFailure, ErrorClass, RepositoryError, SagaError, StageError};
pub use hashing::{canonical_dump, derive_id, hash_str, hash_value, to_canonical_json};
pub use port::{DeliveryPort, IntakePort, ProductionPort, QualityPort, StrategyPort};
pub use repo::{InMemoryRepository, StageRepository};
pub use run::{FailureDetail, InMemoryRunStore, RunStatus, RunStore, StageRecord, WorkflowRun};
pub use saga::{SagaContext, SagaCoordinator, SagaPorts, SagaStep};
