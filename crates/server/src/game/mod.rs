//! Game sessions and the registry that owns them.

pub mod registry;
pub mod session;

pub use registry::SessionRegistry;
pub use session::{GameSession, MoveOutcome};
