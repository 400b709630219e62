// This module is goop's resolution engine. For every virtual function found on every class it
// decides which dispatch table the function's slot lives in: an ancestor's table that already
// holds an entry of that name (the function then becomes an override of that slot), or else the
// class's own table (the function is declared there). Classes are processed in registry order,
// so a super's table and overrides are complete by the time a subclass looks at them, and
// within a class functions are processed in declaration order. An override must have the same
// signature as the slot it fills.

//! Virtual function to dispatch table resolution.

use crate::core::error::{ModelError, ModelResult};
use crate::core::session::GenerationSession;
use crate::model::{ClassId, ClassRegistry, TableId, VirtualFunction};

/// The table the virtual `function` of `class` must be wired into.
///
/// An override on the class itself that already targets a table holding
/// `function` wins. Otherwise the nearest ancestor table holding `function`
/// is used, and failing that the class's own table. `None` means the
/// function has nowhere to go.
pub fn choose_table(registry: &ClassRegistry<'_>, class: ClassId, function: &str) -> Option<TableId> {
    let entry = registry.class(class);
    if let Some(table) = claimed_by_override(registry, class, function) {
        return Some(table);
    }
    if let Some(table) = entry.super_class.and_then(|s| inherited_table(registry, s, function)) {
        return Some(table);
    }
    entry.own_table
}

fn claimed_by_override(registry: &ClassRegistry<'_>, class: ClassId, function: &str) -> Option<TableId> {
    registry
        .class(class)
        .overrides
        .iter()
        .find(|ov| registry.table(ov.table).contains(function))
        .map(|ov| ov.table)
}

/// Table holding `function` as seen from `ancestor` upwards.
fn inherited_table(registry: &ClassRegistry<'_>, ancestor: ClassId, function: &str) -> Option<TableId> {
    if let Some(table) = claimed_by_override(registry, ancestor, function) {
        return Some(table);
    }
    let entry = registry.class(ancestor);
    if let Some(table) = entry.super_class.and_then(|s| inherited_table(registry, s, function)) {
        return Some(table);
    }
    entry.own_table.filter(|&t| registry.table(t).contains(function))
}

/// Record that `class` implements `function` in `table`.
///
/// Into the class's own table the function is declared; into any other
/// table it becomes part of the class's override of that table.
pub fn register_virtual<'arena>(
    session: &GenerationSession<'arena>,
    registry: &mut ClassRegistry<'arena>,
    class: ClassId,
    function: VirtualFunction<'arena>,
    table: TableId,
) -> ModelResult<()> {
    let class_name = registry.class(class).name;

    if registry.class(class).own_table == Some(table) {
        log::debug!("{} declares {} in {}", class_name, function, registry.table(table).name);
        registry.table_mut(table).entries.push(function);
        session.record_virtual(false);
        return Ok(());
    }

    if let Some(slot) = registry.table(table).entry(function.name) {
        if !slot.signature.same_shape(&function.signature) {
            return Err(ModelError::SignatureMismatch {
                class: class_name.to_string(),
                function: function.name.to_string(),
                expected: slot.signature.to_string(),
                found: function.signature.to_string(),
            });
        }
    }

    log::debug!("{} overrides {} of {}", class_name, function.name, registry.table(table).name);
    if registry.class(class).override_for(table).is_none() {
        session.record_override();
    }
    registry.push_override(class, table, function);
    session.record_virtual(true);
    Ok(())
}

/// Validate the registry and attribute every virtual function of every class.
pub fn resolve_all<'arena>(session: &GenerationSession<'arena>, registry: &mut ClassRegistry<'arena>) -> ModelResult<()> {
    registry.validate()?;

    for class in registry.classes_ordered()? {
        let virtuals = registry.class(class).virtuals.clone();
        for function in virtuals {
            let table = choose_table(registry, class, function.name).ok_or_else(|| ModelError::UnresolvableVirtual {
                class: registry.class(class).name.to_string(),
                function: function.name.to_string(),
            })?;
            register_virtual(session, registry, class, function, table)?;
        }
    }

    log::debug!("resolved hierarchy:\n{}", registry);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Param, Signature, TypeExpr};
    use bumpalo::Bump;

    fn string_getter() -> Signature {
        Signature::new(Vec::new(), vec![Param::new(None, TypeExpr::named("string"))])
    }

    /// Root owns `rootTable`; Mid extends Root; Leaf extends Mid. All declare `f`.
    fn chain<'a>() -> (ClassRegistry<'a>, [ClassId; 3]) {
        let mut registry = ClassRegistry::new();
        let mut ids = Vec::new();
        for name in ["Root", "Mid", "Leaf"] {
            let id = registry.get_or_create(name);
            let class = registry.class_mut(id);
            class.declared = true;
            class.virtuals.push(VirtualFunction::new("f", string_getter()));
            ids.push(id);
        }
        registry.set_table(ids[0], "rootTable", "rootTable").unwrap();
        registry.set_super(ids[1], "Root", "Root").unwrap();
        registry.set_super(ids[2], "Mid", "Mid").unwrap();
        (registry, [ids[0], ids[1], ids[2]])
    }

    #[test]
    fn test_no_table_anywhere_is_absent() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);
        let mut registry = ClassRegistry::new();
        let d = registry.get_or_create("D");
        registry.class_mut(d).declared = true;
        assert_eq!(choose_table(&registry, d, "x"), None);

        registry.class_mut(d).virtuals.push(VirtualFunction::new("x", Signature::default()));
        assert_eq!(
            resolve_all(&session, &mut registry).unwrap_err(),
            ModelError::UnresolvableVirtual {
                class: "D".into(),
                function: "x".into()
            }
        );
    }

    #[test]
    fn test_overrides_converge_on_root_table() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);
        let (mut registry, [root, mid, leaf]) = chain();

        resolve_all(&session, &mut registry).unwrap();

        let table = registry.class(root).own_table.unwrap();
        assert_eq!(registry.table(table).entries.len(), 1);
        assert_eq!(registry.class(mid).overrides.len(), 1);
        assert_eq!(registry.class(mid).overrides[0].table, table);
        assert_eq!(registry.class(leaf).overrides[0].table, table);

        let stats = session.stats();
        assert_eq!(stats.virtual_functions, 3);
        assert_eq!(stats.overriding_functions, 2);
        assert_eq!(stats.overrides, 2);
    }

    #[test]
    fn test_new_virtual_needs_own_table() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);
        let (mut registry, [_, mid, _]) = chain();
        registry.class_mut(mid).virtuals.push(VirtualFunction::new("g", Signature::default()));

        // The root table has no `g` slot, so Mid cannot borrow it.
        let err = resolve_all(&session, &mut registry).unwrap_err();
        assert!(matches!(err, ModelError::UnresolvableVirtual { ref class, ref function } if class == "Mid" && function == "g"));
    }

    #[test]
    fn test_subclass_table_declares_new_virtuals() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);
        let (mut registry, [root, mid, leaf]) = chain();
        let mid_table = registry.set_table(mid, "midTable", "midTable").unwrap();
        registry.class_mut(mid).virtuals.push(VirtualFunction::new("g", Signature::default()));
        registry.class_mut(leaf).virtuals.push(VirtualFunction::new("g", Signature::default()));

        resolve_all(&session, &mut registry).unwrap();

        assert!(registry.table(mid_table).contains("g"));
        assert!(!registry.table(mid_table).contains("f"));
        let root_table = registry.class(root).own_table.unwrap();
        let leaf_tables: Vec<TableId> = registry.class(leaf).overrides.iter().map(|o| o.table).collect();
        assert_eq!(leaf_tables, vec![root_table, mid_table]);
    }

    #[test]
    fn test_signature_mismatch() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);
        let (mut registry, [_, mid, _]) = chain();
        registry.class_mut(mid).virtuals[0].signature = Signature::default();

        let err = resolve_all(&session, &mut registry).unwrap_err();
        assert_eq!(
            err,
            ModelError::SignatureMismatch {
                class: "Mid".into(),
                function: "f".into(),
                expected: "() string".into(),
                found: "()".into()
            }
        );
    }
}
