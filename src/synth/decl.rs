// This module defines the small abstract syntax the synthesizer produces and the emitter
// renders: field paths rooted at the method receiver, the few expression and statement forms
// an initializer or accessor needs, and struct and method declarations. Keeping generated code
// as data lets the integration tests execute initializers directly.

//! Abstract Go declarations produced by the synthesizer.
//!
//! The model covers exactly what generated code needs: struct types, methods
//! on the class pointer, field paths rooted at the receiver, assignments of
//! method values and booleans, no-argument calls, an early-return guard and
//! a return. The emitter turns it into Go text; tests can also execute it.

use crate::analyzer::{ImportSpec, TypeExpr};
use std::fmt;

/// Receiver name used by every generated method.
pub const RECEIVER: &str = "this";

/// A field path from the receiver, e.g. `this.B.A.aVtable.getName`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Place {
    pub path: Vec<String>,
}

impl Place {
    /// The receiver itself.
    pub fn receiver() -> Self {
        Self::default()
    }

    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(name.into());
        Self { path }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", RECEIVER)?;
        for segment in &self.path {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `&place`.
    AddrOf(Place),
    Bool(bool),
    /// `place.method()`.
    Call { target: Place, method: String },
    /// `place.method`, a bound method value.
    MethodValue { target: Place, method: String },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::AddrOf(place) => write!(f, "&{}", place),
            Expr::Bool(value) => write!(f, "{}", value),
            Expr::Call { target, method } => write!(f, "{}.{}()", target, method),
            Expr::MethodValue { target, method } => write!(f, "{}.{}", target, method),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `if a && b { return }`.
    Guard(Vec<Place>),
    Expr(Expr),
    Assign(Place, Expr),
    Return(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub name: String,
    pub doc: Option<String>,
    pub fields: Vec<FieldSpec>,
}

/// A method on `*receiver_type` with no parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub receiver_type: String,
    pub name: String,
    pub doc: Option<String>,
    pub result: Option<TypeExpr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Struct(StructDecl),
    Func(FuncDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Struct(s) => &s.name,
            Decl::Func(f) => &f.name,
        }
    }
}

/// Everything generated for one triggering file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

impl GeneratedFile {
    /// The method `name` on `receiver_type`, if generated.
    pub fn method(&self, receiver_type: &str, name: &str) -> Option<&FuncDecl> {
        self.decls.iter().find_map(|decl| match decl {
            Decl::Func(f) if f.receiver_type == receiver_type && f.name == name => Some(f),
            _ => None,
        })
    }

    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.decls.iter().find_map(|decl| match decl {
            Decl::Struct(s) if s.name == name => Some(s),
            _ => None,
        })
    }
}
