// This module defines the error types for goop using the thiserror crate. ModelError covers
// everything the class model can get wrong: virtual methods with no reachable dispatch
// table, unknown or malformed struct-tag annotations, declarations the analyzer cannot
// represent, supers that name no declared struct, duplicate super/vtable fields, dispatch
// tables claimed by two classes, inheritance cycles, overrides whose signature differs
// from the slot they replace, and package qualifiers no import of the file accounts for. ParseError carries a position inside a Go source file.
// GoopError is the top-level error surfaced by the generator and the binary; it wraps the
// other two and the I/O failures of reading the package and writing the generated file.
// UnknownAnnotation is the only non-fatal variant: the session records it as a diagnostic.

//! Error types for goop.
//!
//! Using thiserror for idiomatic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Errors detected while building or resolving the class model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("virtual function {function} of class {class} has no dispatch table in its ancestor chain")]
    UnresolvableVirtual {
        class: String,
        function: String,
    },

    #[error("unknown goop annotation \"{value}\" on field {field} of {class}")]
    UnknownAnnotation {
        class: String,
        field: String,
        value: String,
    },

    #[error("ambiguous declaration {name}: {reason}")]
    AmbiguousDeclaration {
        name: String,
        reason: String,
    },

    #[error("malformed annotation on field {field} of {class}: {reason}")]
    MalformedAnnotation {
        class: String,
        field: String,
        reason: String,
    },

    #[error("class {class} extends {super_name}, which is not a struct of this package")]
    UnknownSuper {
        class: String,
        super_name: String,
    },

    #[error("class {class} declares a second super {second} (already extends {first})")]
    DuplicateSuper {
        class: String,
        first: String,
        second: String,
    },

    #[error("class {class} declares a second vtable {second} (already owns {first})")]
    DuplicateTable {
        class: String,
        first: String,
        second: String,
    },

    #[error("vtable {table} of class {class} is already owned by class {owner}")]
    TableAlreadyOwned {
        table: String,
        owner: String,
        class: String,
    },

    #[error("inheritance cycle: {}", path.join(" -> "))]
    InheritanceCycle {
        path: Vec<String>,
    },

    #[error("{class}.{function}Impl has signature `{found}` but overrides slot `{expected}`")]
    SignatureMismatch {
        class: String,
        function: String,
        expected: String,
        found: String,
    },

    #[error("{class}.{function}Impl uses package {package}, which no import of {file} provides")]
    UnresolvedImport {
        class: String,
        function: String,
        package: String,
        file: String,
    },
}

impl ModelError {
    /// Whether the error aborts the run. Only unknown annotations are tolerated.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ModelError::UnknownAnnotation { .. })
    }
}

/// Syntax error inside a Go source file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{file}:{line}:{column}: {message}")]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Top-level error of a generation run.
#[derive(Error, Debug)]
pub enum GoopError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("package {dir} mixes package clauses {expected} and {found}")]
    MixedPackages {
        dir: String,
        expected: String,
        found: String,
    },

    #[error("file {file} not found in package {package}")]
    FileNotFound {
        file: String,
        package: String,
    },
}

impl GoopError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GoopError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type alias for whole generation runs.
pub type GoopResult<T> = Result<T, GoopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_virtual_message_names_class_and_function() {
        let err = ModelError::UnresolvableVirtual {
            class: "D".into(),
            function: "x".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("x"));
        assert!(msg.contains("class D"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unknown_annotation_is_not_fatal() {
        let err = ModelError::UnknownAnnotation {
            class: "A".into(),
            field: "b".into(),
            value: "base".into(),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_cycle_message_lists_path() {
        let err = ModelError::InheritanceCycle {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "inheritance cycle: A -> B -> A");
    }

    #[test]
    fn test_goop_error_wraps_model_error() {
        let err: GoopError = ModelError::UnknownSuper {
            class: "B".into(),
            super_name: "Missing".into(),
        }
        .into();
        assert!(matches!(err, GoopError::Model(_)));
        assert!(err.to_string().contains("Missing"));
    }
}
