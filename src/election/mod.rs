mod coordinator;

pub(crate) use coordinator::Candidate;
pub(crate) use coordinator::ElectionCoordinator;
pub use coordinator::ElectionError;
