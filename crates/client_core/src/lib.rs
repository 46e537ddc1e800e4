//! Client-side submission workflow: grading policy, the submission state
//! machine, and the orchestration that runs each operation against a remote
//! repository.

pub mod config;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod policy;
pub mod repository;
pub mod transport;
pub mod types;

pub use config::{ClientSettings, ConfigError};
pub use engine::{RemoteStep, Transition};
pub use error::WorkflowError;
pub use orchestration::{OperationHandle, WorkflowOrchestrator};
pub use policy::{ReturnDialog, TrailingStatus};
pub use repository::{Clock, FixedClock, SubmissionRepository, SystemClock};
pub use transport::{HttpSubmissionRepository, TransportError};
pub use types::{OperationKey, OperationUpdate, WorkflowOperation};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
