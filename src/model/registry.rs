// This module implements the ClassRegistry, the single owner of every Class and DispatchTable
// of a unit. Classes are created on first reference, so a subclass may name its super before
// the super's struct has been seen. Links are recorded with their uniqueness checks (one super
// and one own table per class, one owner per table), and validate runs once the unit is fully
// loaded to reject supers that are not declared structs and inheritance cycles. The emission
// order puts every root first, sorted by name, and then each remaining class as soon as its
// super has been placed, smallest name first, so the order depends on names alone.

//! The class registry.
//!
//! One [`Class`] per name, created on first reference. The registry also
//! owns every [`DispatchTable`], validates the super links once the unit is
//! loaded and produces the emission order.

use super::{Class, ClassId, DispatchTable, Override, TableId, VirtualFunction};
use crate::core::error::{ModelError, ModelResult};
use hashbrown::{HashMap, HashSet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

#[derive(Debug, Default)]
pub struct ClassRegistry<'arena> {
    classes: Vec<Class<'arena>>,
    tables: Vec<DispatchTable<'arena>>,
    class_index: HashMap<&'arena str, ClassId>,
    table_index: HashMap<&'arena str, TableId>,
}

impl<'arena> ClassRegistry<'arena> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The class called `name`, created if this is its first reference.
    pub fn get_or_create(&mut self, name: &'arena str) -> ClassId {
        if let Some(&id) = self.class_index.get(name) {
            return id;
        }
        let id = ClassId(self.classes.len());
        log::trace!("registering class {}", name);
        self.classes.push(Class::new(id, name));
        self.class_index.insert(name, id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.class_index.get(name).copied()
    }

    pub fn class(&self, id: ClassId) -> &Class<'arena> {
        &self.classes[id.0]
    }

    pub(crate) fn class_mut(&mut self, id: ClassId) -> &mut Class<'arena> {
        &mut self.classes[id.0]
    }

    pub fn table(&self, id: TableId) -> &DispatchTable<'arena> {
        &self.tables[id.0]
    }

    pub(crate) fn table_mut(&mut self, id: TableId) -> &mut DispatchTable<'arena> {
        &mut self.tables[id.0]
    }

    /// Classes in creation order.
    pub fn classes(&self) -> impl Iterator<Item = &Class<'arena>> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Link `class` to its super through the embedded field `field`.
    pub fn set_super(&mut self, class: ClassId, super_name: &'arena str, field: &'arena str) -> ModelResult<()> {
        if let Some(existing) = self.classes[class.0].super_class {
            return Err(ModelError::DuplicateSuper {
                class: self.classes[class.0].name.to_string(),
                first: self.classes[existing.0].name.to_string(),
                second: super_name.to_string(),
            });
        }

        let super_id = self.get_or_create(super_name);
        let entry = &mut self.classes[class.0];
        entry.super_class = Some(super_id);
        entry.super_field = Some(field);
        log::debug!("class {} extends {}", entry.name, super_name);
        Ok(())
    }

    /// Give `class` its own dispatch table, held in field `field`.
    pub fn set_table(&mut self, class: ClassId, table_name: &'arena str, field: &'arena str) -> ModelResult<TableId> {
        let class_name = self.classes[class.0].name;
        if let Some(existing) = self.classes[class.0].own_table {
            return Err(ModelError::DuplicateTable {
                class: class_name.to_string(),
                first: self.tables[existing.0].name.to_string(),
                second: table_name.to_string(),
            });
        }
        if let Some(&existing) = self.table_index.get(table_name) {
            let owner = self.tables[existing.0].owner;
            return Err(ModelError::TableAlreadyOwned {
                table: table_name.to_string(),
                owner: self.classes[owner.0].name.to_string(),
                class: class_name.to_string(),
            });
        }

        let id = TableId(self.tables.len());
        self.tables.push(DispatchTable {
            id,
            name: table_name,
            owner: class,
            entries: Vec::new(),
        });
        self.table_index.insert(table_name, id);

        let entry = &mut self.classes[class.0];
        entry.own_table = Some(id);
        entry.table_field = Some(field);
        log::debug!("class {} owns dispatch table {}", class_name, table_name);
        Ok(id)
    }

    /// Append `function` to the override of `table` held by `class`, creating it on first use.
    pub(crate) fn push_override(&mut self, class: ClassId, table: TableId, function: VirtualFunction<'arena>) {
        let overrides = &mut self.classes[class.0].overrides;
        match overrides.iter_mut().find(|o| o.table == table) {
            Some(existing) => existing.entries.push(function),
            None => overrides.push(Override {
                table,
                entries: vec![function],
            }),
        }
    }

    /// Whether `class` is the super of any other class.
    pub fn has_subclasses(&self, class: ClassId) -> bool {
        self.classes.iter().any(|c| c.super_class == Some(class))
    }

    /// Whether the class takes part in the hierarchy and gets generated code.
    pub fn is_emitted(&self, class: ClassId) -> bool {
        let c = &self.classes[class.0];
        c.super_class.is_some() || c.own_table.is_some() || !c.overrides.is_empty() || self.has_subclasses(class)
    }

    /// Check that every super is a declared struct and that no super chain loops.
    pub fn validate(&self) -> ModelResult<()> {
        let mut by_name: Vec<&Class<'arena>> = self.classes.iter().collect();
        by_name.sort_by_key(|c| c.name);

        for class in &by_name {
            if let Some(super_id) = class.super_class {
                let super_class = &self.classes[super_id.0];
                if !super_class.declared {
                    return Err(ModelError::UnknownSuper {
                        class: class.name.to_string(),
                        super_name: super_class.name.to_string(),
                    });
                }
            }
        }

        for class in &by_name {
            if let Some(path) = self.find_cycle(class.id) {
                return Err(ModelError::InheritanceCycle { path });
            }
        }
        Ok(())
    }

    /// Names along the super chain from `start` back to the first repeated class, if any.
    fn find_cycle(&self, start: ClassId) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        let mut current = Some(start);

        while let Some(id) = current {
            if !visited.insert(id) {
                let cycle_start = path.iter().position(|&x| x == id).unwrap_or(0);
                let mut names: Vec<String> = path[cycle_start..]
                    .iter()
                    .map(|&c: &ClassId| self.classes[c.0].name.to_string())
                    .collect();
                names.push(self.classes[id.0].name.to_string());
                return Some(names);
            }
            path.push(id);
            current = self.classes[id.0].super_class;
        }
        None
    }

    /// All classes in emission order.
    ///
    /// Roots come first, sorted by name. Every other class follows once its
    /// super has been placed; among the classes ready at a time the smallest
    /// name goes first. Supers therefore always precede their descendants and
    /// the order depends only on the names, not on the order of discovery.
    pub fn classes_ordered(&self) -> ModelResult<Vec<ClassId>> {
        let mut children: HashMap<ClassId, Vec<ClassId>> = HashMap::new();
        let mut roots = Vec::new();
        for class in &self.classes {
            match class.super_class {
                Some(super_id) => children.entry(super_id).or_default().push(class.id),
                None => roots.push(class.id),
            }
        }
        roots.sort_by_key(|&id| self.classes[id.0].name);

        let mut order = Vec::with_capacity(self.classes.len());
        let mut ready = BinaryHeap::new();
        for &root in &roots {
            order.push(root);
            for &child in children.get(&root).into_iter().flatten() {
                ready.push(Reverse((self.classes[child.0].name, child)));
            }
        }
        while let Some(Reverse((_, id))) = ready.pop() {
            order.push(id);
            for &child in children.get(&id).into_iter().flatten() {
                ready.push(Reverse((self.classes[child.0].name, child)));
            }
        }

        if order.len() != self.classes.len() {
            let placed: HashSet<ClassId> = order.iter().copied().collect();
            let path = self
                .classes
                .iter()
                .filter(|c| !placed.contains(&c.id))
                .find_map(|c| self.find_cycle(c.id))
                .unwrap_or_default();
            return Err(ModelError::InheritanceCycle { path });
        }
        Ok(order)
    }
}

impl fmt::Display for ClassRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.classes_ordered() {
            Ok(order) => order,
            Err(_) => self.classes.iter().map(|c| c.id).collect(),
        };

        for id in order {
            let class = &self.classes[id.0];
            write!(f, "Class {}", class.name)?;
            if let Some(super_id) = class.super_class {
                write!(f, " : {}", self.classes[super_id.0].name)?;
            }
            writeln!(f, " {{")?;
            if let Some(table_id) = class.own_table {
                let table = &self.tables[table_id.0];
                writeln!(f, "    table {} {{", table.name)?;
                for entry in &table.entries {
                    writeln!(f, "        {}", entry)?;
                }
                writeln!(f, "    }}")?;
            }
            for ov in &class.overrides {
                let table = &self.tables[ov.table.0];
                writeln!(
                    f,
                    "    overrides {} of {} {{",
                    table.name, self.classes[table.owner.0].name
                )?;
                for entry in &ov.entries {
                    writeln!(f, "        {}", entry)?;
                }
                writeln!(f, "    }}")?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
