mod coordinator;
mod step;
mod steps;

pub use coordinator::{SagaCoordinator, SagaPorts};
pub use step::{SagaContext, SagaStep};
pub use steps::{DeliveryStep, IntakeStep, ProductionStep, QualityStep, StrategyStep};
