//! Analysis engine integration: a UCI subprocess wrapper and the shared
//! session that serializes access to it.

pub mod session;
pub mod uci;

pub use session::EngineSession;
pub use uci::{EngineError, EngineLine, GoLimit};
