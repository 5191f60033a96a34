pub mod bounded_poller;
pub mod provision_and_validate;
pub mod validate_deployment;
pub mod wait_for_ready;

pub use bounded_poller::{BoundedPoller, RaceOutcome};
pub use provision_and_validate::Orchestrator;
pub use validate_deployment::validate_deployment;
pub use wait_for_ready::wait_for_ready;
