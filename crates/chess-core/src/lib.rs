//! Pure chess domain logic shared by the server: rules adapter over shakmaty,
//! termination classification, PGN rendering and the opening lookup table.
//! No I/O lives here.

pub mod opening;
pub mod pgn;
pub mod rules;

pub use rules::{RulesError, Termination};
