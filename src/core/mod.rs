// This module collects goop's shared infrastructure: the error taxonomy every stage reports
// through, and the generation session that carries the name arena, run statistics and the
// non-fatal diagnostics from analysis to emission.

//! Core goop infrastructure.
//!
//! - [`session`]: arena-backed per-run context
//! - [`error`]: model, parse and top-level errors

pub mod error;
pub mod session;

pub use error::{GoopError, GoopResult, ModelError, ModelResult, ParseError};
pub use session::{GenerationSession, SessionStats};
