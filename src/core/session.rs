// This module provides the per-run generation session. GenerationSession is the explicit
// context object threaded through analysis, registry population, resolution and synthesis;
// nothing in goop keeps process-wide state, so several sessions can live in one process.
// The session owns a reference to a bumpalo arena in which every class, table, field and
// method name is interned once, giving the entity model cheap `&'arena str` keys that share
// the session lifetime. It also counts what the run did (files parsed and skipped, classes,
// dispatch tables, overrides, virtual functions, declarations emitted) and collects the
// non-fatal diagnostics (unknown annotations) that are reported but do not stop the run.

//! Arena-based generation session.
//!
//! All names handed to the class model are interned in the session arena
//! and live as long as the session.

use crate::core::error::ModelError;
use bumpalo::Bump;
use hashbrown::HashSet;
use std::cell::RefCell;
use std::fmt;

/// Context object for one generation run.
pub struct GenerationSession<'arena> {
    /// Arena holding interned names.
    arena: &'arena Bump,

    /// Interned strings, keyed by content.
    interned_strings: RefCell<HashSet<&'arena str>>,

    /// Run statistics.
    stats: RefCell<SessionStats>,

    /// Non-fatal diagnostics, in the order they were reported.
    diagnostics: RefCell<Vec<ModelError>>,
}

impl<'arena> GenerationSession<'arena> {
    /// Create a new session allocating from the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            interned_strings: RefCell::new(HashSet::new()),
            stats: RefCell::new(SessionStats::default()),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Intern a string in the arena.
    pub fn intern_str(&self, s: &str) -> &'arena str {
        let mut strings = self.interned_strings.borrow_mut();
        if let Some(&interned) = strings.get(s) {
            return interned;
        }

        let interned: &'arena str = self.arena.alloc_str(s);
        strings.insert(interned);
        interned
    }

    /// Report a non-fatal diagnostic. It is logged and kept for the caller.
    pub fn report(&self, diagnostic: ModelError) {
        if diagnostic.is_fatal() {
            log::error!("{}", diagnostic);
        } else {
            log::warn!("{}", diagnostic);
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Diagnostics reported so far.
    pub fn diagnostics(&self) -> Vec<ModelError> {
        self.diagnostics.borrow().clone()
    }

    pub fn record_file_parsed(&self) {
        self.stats.borrow_mut().files_parsed += 1;
    }

    pub fn record_file_skipped(&self) {
        self.stats.borrow_mut().files_skipped += 1;
    }

    pub fn record_class(&self) {
        self.stats.borrow_mut().classes += 1;
    }

    pub fn record_table(&self) {
        self.stats.borrow_mut().tables += 1;
    }

    /// Record one resolved virtual function; `overriding` is false for declarations.
    pub fn record_virtual(&self, overriding: bool) {
        let mut stats = self.stats.borrow_mut();
        stats.virtual_functions += 1;
        if overriding {
            stats.overriding_functions += 1;
        }
    }

    pub fn record_override(&self) {
        self.stats.borrow_mut().overrides += 1;
    }

    /// Record declarations handed to the emitter.
    pub fn record_declarations(&self, count: usize) {
        self.stats.borrow_mut().declarations_emitted += count;
    }

    /// Get run statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Generation session statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Go files parsed.
    pub files_parsed: usize,

    /// Go files skipped because they were generated.
    pub files_skipped: usize,

    /// Classes created in the registry.
    pub classes: usize,

    /// Dispatch tables created.
    pub tables: usize,

    /// Override records created.
    pub overrides: usize,

    /// Virtual functions attributed to a table.
    pub virtual_functions: usize,

    /// Of those, functions registered as overrides.
    pub overriding_functions: usize,

    /// Declarations synthesized for the emitter.
    pub declarations_emitted: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generation Session Statistics:")?;
        writeln!(f, "  Files parsed: {}", self.files_parsed)?;
        if self.files_skipped > 0 {
            writeln!(f, "  Generated files skipped: {}", self.files_skipped)?;
        }
        writeln!(f, "  Classes: {}", self.classes)?;
        writeln!(f, "  Dispatch tables: {}", self.tables)?;
        writeln!(f, "  Overrides: {}", self.overrides)?;
        writeln!(
            f,
            "  Virtual functions: {} ({} overriding)",
            self.virtual_functions, self.overriding_functions
        )?;
        writeln!(f, "  Declarations emitted: {}", self.declarations_emitted)?;
        Ok(())
    }
}
