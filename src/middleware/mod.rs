pub mod actor;
pub mod language;
pub mod tracing;

pub use actor::Actor;
pub use language::language_middleware;
pub use tracing::observability_middleware;
