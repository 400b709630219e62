//! goop - single inheritance and virtual dispatch for Go structs.
//!
//! goop reads a Go package, rebuilds the class hierarchy declared through
//! `goop:"super"` and `goop:"vtable"` struct tags, attributes every `Impl`
//! method to a dispatch table and generates the table types, `super`
//! accessors and idempotent `initClass` initializers that wire them.
//!
//! # Primary Usage
//!
//! ```no_run
//! use bumpalo::Bump;
//! use goop::{GenerationSession, Generator, GeneratorConfig};
//!
//! let arena = Bump::new();
//! let session = GenerationSession::new(&arena);
//! let config = GeneratorConfig::new("APackage", "./APackage", "AFile.go");
//! let written = Generator::new(&session, config).run()?;
//! println!("wrote {}", written.display());
//! # Ok::<(), goop::GoopError>(())
//! ```
//!
//! # Architecture
//!
//! - [`analyzer`] - Go source to declaration records
//! - [`model`] - classes, dispatch tables, overrides and their registry
//! - [`resolve`] - virtual function to dispatch table resolution
//! - [`synth`] - abstract declarations for resolved classes
//! - [`emit`] - Go text rendering and output
//! - [`generator`] - the pipeline tying them together
//! - [`core`] - session and errors

pub mod analyzer;
pub mod config;
pub mod core;
pub mod emit;
pub mod generator;
pub mod model;
pub mod resolve;
pub mod synth;

pub use crate::config::GeneratorConfig;
pub use crate::core::{GenerationSession, GoopError, GoopResult, ModelError, ModelResult, ParseError, SessionStats};
pub use crate::generator::{GenerationOutput, Generator};
pub use crate::model::{ClassId, ClassRegistry, TableId};
