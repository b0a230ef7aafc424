mod store;
mod types;

pub use store::{InMemoryRunStore, RunStore};
pub use types::{FailureDetail, RunStatus, StageRecord, WorkflowRun};
