// This module holds goop's class model: the entities the resolution engine and the synthesizer
// work on. A Class is one Go struct taking part in the simulated hierarchy; it has at most one
// super (the embedded base struct), at most one dispatch table of its own, and an ordered list
// of Overrides, each naming an ancestor's dispatch table together with the entries this class
// re-implements for it. Entities live in index-addressed vectors inside the ClassRegistry and
// refer to one another by ClassId and TableId, so a table shared by an owner and any number of
// overriding descendants is a single object. Names are interned in the session arena.

//! Class hierarchy entities and their registry.

pub mod declarations;
pub mod registry;

pub use declarations::{populate_registry, VIRTUAL_SUFFIX};
pub use registry::ClassRegistry;

use crate::analyzer::{ImportSpec, Signature};
use std::fmt;

/// Index of a class in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) usize);

/// Index of a dispatch table in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub(crate) usize);

/// A virtual function entry: the `Impl`-stripped name and its call signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFunction<'arena> {
    pub name: &'arena str,
    pub signature: Signature,
    /// Imports backing the package qualifiers used in `signature`.
    pub imports: Vec<ImportSpec>,
}

impl<'arena> VirtualFunction<'arena> {
    pub fn new(name: &'arena str, signature: Signature) -> Self {
        Self {
            name,
            signature,
            imports: Vec::new(),
        }
    }

    /// Name of the method implementing this entry.
    pub fn impl_name(&self) -> String {
        format!("{}{}", self.name, declarations::VIRTUAL_SUFFIX)
    }
}

impl fmt::Display for VirtualFunction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.signature)
    }
}

/// A dispatch table, owned by the class that first declares its entries.
#[derive(Debug, Clone)]
pub struct DispatchTable<'arena> {
    pub id: TableId,
    pub name: &'arena str,
    pub owner: ClassId,
    pub entries: Vec<VirtualFunction<'arena>>,
}

impl<'arena> DispatchTable<'arena> {
    pub fn entry(&self, name: &str) -> Option<&VirtualFunction<'arena>> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Name of the boolean field recording that the table was initialized.
    pub fn init_flag_name(&self) -> String {
        format!("is{}Init", capitalize(self.name))
    }
}

/// A class's re-implementation of entries of an ancestor's table.
#[derive(Debug, Clone)]
pub struct Override<'arena> {
    pub table: TableId,
    pub entries: Vec<VirtualFunction<'arena>>,
}

/// One struct of the analyzed package.
#[derive(Debug, Clone)]
pub struct Class<'arena> {
    pub id: ClassId,
    pub name: &'arena str,
    /// Whether a struct declaration was seen, as opposed to a bare reference.
    pub declared: bool,
    /// File declaring the struct.
    pub file: Option<&'arena str>,
    pub super_class: Option<ClassId>,
    /// Embedded field holding the super value.
    pub super_field: Option<&'arena str>,
    pub own_table: Option<TableId>,
    /// Field holding the own dispatch table.
    pub table_field: Option<&'arena str>,
    pub overrides: Vec<Override<'arena>>,
    /// `Impl` methods attached to the struct, in declaration order.
    pub virtuals: Vec<VirtualFunction<'arena>>,
}

impl<'arena> Class<'arena> {
    pub(crate) fn new(id: ClassId, name: &'arena str) -> Self {
        Self {
            id,
            name,
            declared: false,
            file: None,
            super_class: None,
            super_field: None,
            own_table: None,
            table_field: None,
            overrides: Vec::new(),
            virtuals: Vec::new(),
        }
    }

    pub fn override_for(&self, table: TableId) -> Option<&Override<'arena>> {
        self.overrides.iter().find(|o| o.table == table)
    }
}

/// `aVtable` -> `AVtable`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Param, TypeExpr};

    #[test]
    fn test_init_flag_name() {
        let table = DispatchTable {
            id: TableId(0),
            name: "aVtable",
            owner: ClassId(0),
            entries: Vec::new(),
        };
        assert_eq!(table.init_flag_name(), "isAVtableInit");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_virtual_function_names() {
        let sig = Signature::new(Vec::new(), vec![Param::new(None, TypeExpr::named("string"))]);
        let f = VirtualFunction::new("getName", sig);
        assert_eq!(f.impl_name(), "getNameImpl");
        assert_eq!(f.to_string(), "getName() string");
    }
}
