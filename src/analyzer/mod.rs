// This module is goop's source analyzer. It turns Go source text into the declaration
// records the class model consumes: the package clause, imports, struct declarations with
// their (optionally tagged) fields, and function declarations with receiver, parameter and
// result descriptors and their doc comment. Function bodies are never interpreted; they are
// skipped by brace matching over the token stream. The analyzer is deliberately strict
// about shapes it cannot carry into generated code: a `type ( ... )` group holding more than
// one spec, channel types, or non-empty inline struct/interface types are rejected as
// ambiguous declarations instead of being silently misread. The package submodule scans a
// whole package directory, skipping files that were themselves generated.

//! Go declaration analyzer.
//!
//! ```text
//! source text --lexer--> tokens --parser--> SourceFile
//! package dir --package--> GoPackage (one SourceFile per .go file)
//! ```

pub mod lexer;
pub mod package;
pub mod parser;
pub mod tag;
pub mod types;

pub use package::{is_generated_source, GoPackage};
pub use parser::parse_source;
pub use tag::StructTag;
pub use types::{Param, Signature, TypeExpr};

use std::fmt;

/// One parsed Go source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub file_name: String,
    pub package_name: String,
    pub imports: Vec<ImportSpec>,
    pub types: Vec<TypeDecl>,
    pub functions: Vec<FunctionDecl>,
}

impl SourceFile {
    /// Struct declarations, in source order.
    pub fn structs(&self) -> impl Iterator<Item = (&TypeDecl, &[FieldDecl])> {
        self.types.iter().filter_map(|decl| match &decl.kind {
            TypeDeclKind::Struct(fields) => Some((decl, fields.as_slice())),
            _ => None,
        })
    }

    /// Functions declared with a receiver, in source order.
    pub fn methods(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.functions.iter().filter(|f| f.receiver.is_some())
    }

    /// Import providing the given package qualifier, if any.
    pub fn import_for(&self, qualifier: &str) -> Option<&ImportSpec> {
        self.imports.iter().find(|imp| imp.qualifier() == Some(qualifier))
    }
}

/// `import alias "path"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportSpec {
    pub alias: Option<String>,
    pub path: String,
}

impl ImportSpec {
    /// Name the import is referred to by. `None` for dot and blank imports.
    ///
    /// Without an alias this is the last path element, skipping a trailing
    /// major-version element such as `/v2`.
    pub fn qualifier(&self) -> Option<&str> {
        match self.alias.as_deref() {
            Some(".") | Some("_") => None,
            Some(alias) => Some(alias),
            None => {
                let mut segments = self.path.rsplit('/');
                let last = segments.next()?;
                if is_major_version(last) {
                    segments.next().or(Some(last))
                } else {
                    Some(last)
                }
            }
        }
    }
}

/// `v2`, `v3`, ... as used by module paths of major versions above one.
fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) && !n.starts_with('0'))
}

impl fmt::Display for ImportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} \"{}\"", alias, self.path),
            None => write!(f, "\"{}\"", self.path),
        }
    }
}

/// A named type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub doc: Option<String>,
    /// Declared with type parameters.
    pub generic: bool,
    pub kind: TypeDeclKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDeclKind {
    Struct(Vec<FieldDecl>),
    Interface,
    /// Any other named type or alias; goop has no use for it.
    Other,
}

/// A struct field. Embedded fields have no name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: Option<String>,
    pub ty: TypeExpr,
    pub tag: Option<StructTag>,
}

impl FieldDecl {
    /// The name the field is selected by: its own name, or the type name when embedded.
    pub fn selector(&self) -> Option<&str> {
        if let Some(name) = &self.name {
            return Some(name.as_str());
        }
        let mut ty = &self.ty;
        if let TypeExpr::Pointer(inner) = ty {
            ty = &**inner;
        }
        match ty {
            TypeExpr::Named { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Function receiver `(name *Type)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub name: Option<String>,
    pub type_name: String,
    pub is_pointer: bool,
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub doc: Option<String>,
    pub receiver: Option<Receiver>,
    pub signature: Signature,
    pub line: usize,
}

impl FunctionDecl {
    /// Receiver type name, for methods.
    pub fn receiver_type(&self) -> Option<&str> {
        self.receiver.as_ref().map(|r| r.type_name.as_str())
    }
}

impl fmt::Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func ")?;
        if let Some(recv) = &self.receiver {
            write!(f, "(")?;
            if let Some(name) = &recv.name {
                write!(f, "{} ", name)?;
            }
            if recv.is_pointer {
                write!(f, "*")?;
            }
            write!(f, "{}) ", recv.type_name)?;
        }
        write!(f, "{}{}", self.name, self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_qualifier() {
        let plain = ImportSpec { alias: None, path: "encoding/json".into() };
        let aliased = ImportSpec { alias: Some("js".into()), path: "encoding/json".into() };
        let dot = ImportSpec { alias: Some(".".into()), path: "strings".into() };
        assert_eq!(plain.qualifier(), Some("json"));
        assert_eq!(aliased.qualifier(), Some("js"));
        assert_eq!(dot.qualifier(), None);
        assert_eq!(aliased.to_string(), "js \"encoding/json\"");
    }

    #[test]
    fn test_major_version_import_qualifier() {
        let versioned = ImportSpec { alias: None, path: "github.com/foo/bar/v2".into() };
        let named = ImportSpec { alias: None, path: "example.com/tools/v0".into() };
        assert_eq!(versioned.qualifier(), Some("bar"));
        assert_eq!(named.qualifier(), Some("v0"));
        assert!(!is_major_version("v"));
        assert!(!is_major_version("vector"));
    }

    #[test]
    fn test_embedded_field_selector() {
        let embedded = FieldDecl {
            name: None,
            ty: TypeExpr::Pointer(Box::new(TypeExpr::named("A"))),
            tag: None,
        };
        let named = FieldDecl {
            name: Some("base".into()),
            ty: TypeExpr::named("A"),
            tag: None,
        };
        assert_eq!(embedded.selector(), Some("A"));
        assert_eq!(named.selector(), Some("base"));
    }
}
