//! Assignment Orchestration
//!
//! The onboarding saga: assigning a tenant its identity manager, and
//! wiring each newly assigned application into the tenant's security
//! fabric. Assignment requests are accepted immediately and executed on a
//! background worker; progress is observable through the saga log and by
//! re-querying assignment state.

pub mod orchestrator;
pub mod progress;
pub mod worker;

pub use orchestrator::AssignmentOrchestrator;
pub use progress::{SagaExecution, SagaProgressLog, SagaStatus, StepRecord, StepStatus};
pub use worker::{AssignmentJob, ProvisioningServices, ACK_TIMEOUT};
