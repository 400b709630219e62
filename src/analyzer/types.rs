//! Go type expressions and call signatures.
//!
//! Only the shapes goop can carry into generated code are representable:
//! named types (optionally package-qualified), pointers, slices, arrays,
//! maps, variadic parameters, function types and the empty interface and
//! struct literals. Channels and non-empty inline struct or interface types
//! are rejected by the parser.

use std::fmt;

/// A Go type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// `T` or `pkg.T`.
    Named {
        package: Option<String>,
        name: String,
    },
    /// `*T`.
    Pointer(Box<TypeExpr>),
    /// `[]T`.
    Slice(Box<TypeExpr>),
    /// `[N]T`, with the length kept as written.
    Array(String, Box<TypeExpr>),
    /// `map[K]V`.
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// `...T`, only valid as the last parameter.
    Variadic(Box<TypeExpr>),
    /// `func(params) results`.
    Func(Box<Signature>),
    /// `interface{}`.
    EmptyInterface,
    /// `struct{}`.
    EmptyStruct,
}

impl TypeExpr {
    /// Unqualified named type.
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named {
            package: None,
            name: name.into(),
        }
    }

    /// The identifier if this is an unqualified named type.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            TypeExpr::Named {
                package: None,
                name,
            } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Collect every package qualifier used by this type, in order of appearance.
    pub fn collect_packages<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Named {
                package: Some(package),
                ..
            } => {
                if !out.contains(&package.as_str()) {
                    out.push(package.as_str());
                }
            }
            TypeExpr::Named { package: None, .. }
            | TypeExpr::EmptyInterface
            | TypeExpr::EmptyStruct => {}
            TypeExpr::Pointer(inner)
            | TypeExpr::Slice(inner)
            | TypeExpr::Array(_, inner)
            | TypeExpr::Variadic(inner) => inner.collect_packages(out),
            TypeExpr::Map(key, value) => {
                key.collect_packages(out);
                value.collect_packages(out);
            }
            TypeExpr::Func(signature) => signature.collect_packages(out),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named {
                package: Some(package),
                name,
            } => write!(f, "{}.{}", package, name),
            TypeExpr::Named {
                package: None,
                name,
            } => write!(f, "{}", name),
            TypeExpr::Pointer(inner) => write!(f, "*{}", inner),
            TypeExpr::Slice(inner) => write!(f, "[]{}", inner),
            TypeExpr::Array(len, inner) => write!(f, "[{}]{}", len, inner),
            TypeExpr::Map(key, value) => write!(f, "map[{}]{}", key, value),
            TypeExpr::Variadic(inner) => write!(f, "...{}", inner),
            TypeExpr::Func(signature) => write!(f, "func{}", signature),
            TypeExpr::EmptyInterface => write!(f, "interface{{}}"),
            TypeExpr::EmptyStruct => write!(f, "struct{{}}"),
        }
    }
}

/// One parameter or result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

impl Param {
    pub fn new(name: Option<&str>, ty: TypeExpr) -> Self {
        Self {
            name: name.map(str::to_string),
            ty,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}", name, self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// A call signature: parameters and results, without receiver.
///
/// Displays as the part after `func`, e.g. `(a int, b string) (bool, error)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

impl Signature {
    pub fn new(params: Vec<Param>, results: Vec<Param>) -> Self {
        Self { params, results }
    }

    /// Whether two signatures agree on types, ignoring parameter names.
    pub fn same_shape(&self, other: &Signature) -> bool {
        fn types(params: &[Param]) -> Vec<&TypeExpr> {
            params.iter().map(|p| &p.ty).collect()
        }
        types(&self.params) == types(&other.params) && types(&self.results) == types(&other.results)
    }

    /// The callable type of this signature, for a dispatch slot.
    pub fn to_func_type(&self) -> TypeExpr {
        TypeExpr::Func(Box::new(self.clone()))
    }

    pub fn collect_packages<'a>(&'a self, out: &mut Vec<&'a str>) {
        for param in self.params.iter().chain(&self.results) {
            param.ty.collect_packages(out);
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")?;

        match self.results.as_slice() {
            [] => Ok(()),
            [single] if single.name.is_none() => write!(f, " {}", single),
            results => {
                write!(f, " (")?;
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", result)?;
                }
                write!(f, ")")
            }
        }
    }
}
