pub mod discovery;
pub mod error;
pub mod policy;
pub mod router;
pub mod selection;

pub use discovery::{CallbackSource, DomainSource, EnvVarSource, JsonConfigSource};
pub use error::RouterError;
pub use policy::RoutingPolicy;
pub use router::DomainRouter;
pub use selection::Selection;
