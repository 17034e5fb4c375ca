pub mod error;
pub mod event;
pub mod store;

pub use error::StoreError;
pub use event::{EventKind, EventRecord};
pub use store::{DeploymentSummary, StateStore};
