// This module is goop's code synthesizer. From a resolved class it builds the abstract Go
// declarations that reproduce virtual dispatch at runtime: the dispatch table struct of a
// table-owning class (an init flag plus one func-typed slot per entry), the `super` accessor
// of a derived class, and the idempotent `initClass` routine. The initializer returns early
// once every table it touches is flagged as initialized, runs the super's initializer first,
// then wires its own table and finally writes its overriding implementations into the shared
// ancestor tables, so the most derived implementation is the one left in each slot. Tables
// owned by an ancestor are addressed through the chain of embedded super fields.

//! Declaration synthesis for resolved classes.

pub mod decl;

pub use decl::{Decl, Expr, FieldSpec, FuncDecl, GeneratedFile, Place, Stmt, StructDecl, RECEIVER};

use crate::analyzer::{ImportSpec, TypeExpr};
use crate::core::error::ModelResult;
use crate::core::session::GenerationSession;
use crate::model::{ClassId, ClassRegistry, TableId};

/// Name of the generated initializer.
pub const INIT_METHOD: &str = "initClass";

/// Name of the generated super accessor.
pub const SUPER_METHOD: &str = "super";

/// Path from `class` to the field holding `table`.
///
/// `table` must be owned by `class` or one of its ancestors.
pub fn table_place(registry: &ClassRegistry<'_>, class: ClassId, table: TableId) -> Place {
    let owner = registry.table(table).owner;
    let mut place = Place::receiver();
    let mut current = class;
    while current != owner {
        let entry = registry.class(current);
        match (entry.super_class, entry.super_field) {
            (Some(super_id), Some(field)) => {
                place = place.field(field);
                current = super_id;
            }
            _ => break,
        }
    }
    let field = registry
        .class(owner)
        .table_field
        .unwrap_or(registry.table(table).name);
    place.field(field)
}

/// The dispatch table struct owned by `class`, if any.
pub fn dispatch_table_decl(registry: &ClassRegistry<'_>, class: ClassId) -> Option<StructDecl> {
    let table = registry.table(registry.class(class).own_table?);

    let mut fields = vec![FieldSpec {
        name: table.init_flag_name(),
        ty: TypeExpr::named("bool"),
    }];
    fields.extend(table.entries.iter().map(|entry| FieldSpec {
        name: entry.name.to_string(),
        ty: entry.signature.to_func_type(),
    }));

    Some(StructDecl {
        name: table.name.to_string(),
        doc: Some(format!("{} holds the virtual functions declared by {}.", table.name, registry.class(class).name)),
        fields,
    })
}

/// `func (this *C) super() *B`, if `class` has a super.
pub fn super_accessor(registry: &ClassRegistry<'_>, class: ClassId) -> Option<FuncDecl> {
    let entry = registry.class(class);
    let super_name = registry.class(entry.super_class?).name;
    let field = entry.super_field.unwrap_or(super_name);

    Some(FuncDecl {
        receiver_type: entry.name.to_string(),
        name: SUPER_METHOD.to_string(),
        doc: Some(format!("{} returns the embedded {} after initializing {}.", SUPER_METHOD, super_name, entry.name)),
        result: Some(TypeExpr::Pointer(Box::new(TypeExpr::named(super_name)))),
        body: vec![
            Stmt::Expr(Expr::Call {
                target: Place::receiver(),
                method: INIT_METHOD.to_string(),
            }),
            Stmt::Return(Expr::AddrOf(Place::receiver().field(field))),
        ],
    })
}

/// The idempotent initializer of `class`.
pub fn init_class(registry: &ClassRegistry<'_>, class: ClassId) -> FuncDecl {
    let entry = registry.class(class);
    let mut body = Vec::new();

    // Step 1: every table this class writes to.
    let mut guards = Vec::new();
    if let Some(own) = entry.own_table {
        guards.push(table_place(registry, class, own).field(registry.table(own).init_flag_name()));
    }
    for ov in &entry.overrides {
        guards.push(table_place(registry, class, ov.table).field(registry.table(ov.table).init_flag_name()));
    }
    if !guards.is_empty() {
        body.push(Stmt::Guard(guards));
    }

    // Step 2: ancestors first.
    if entry.super_class.is_some() {
        if let Some(field) = entry.super_field {
            body.push(Stmt::Expr(Expr::Call {
                target: Place::receiver().field(field),
                method: INIT_METHOD.to_string(),
            }));
        }
    }

    let method_value = |impl_name: String| Expr::MethodValue {
        target: Place::receiver(),
        method: impl_name,
    };

    // Step 3: own slots.
    if let Some(own) = entry.own_table {
        let table = registry.table(own);
        let place = table_place(registry, class, own);
        body.push(Stmt::Assign(place.field(table.init_flag_name()), Expr::Bool(true)));
        for function in &table.entries {
            log::trace!("{}: {} = {}", entry.name, place.field(function.name), function.impl_name());
            body.push(Stmt::Assign(place.field(function.name), method_value(function.impl_name())));
        }
    }

    // Step 4: overridden slots in the shared ancestor tables.
    for ov in &entry.overrides {
        let place = table_place(registry, class, ov.table);
        for function in &ov.entries {
            log::trace!("{}: {} = {}", entry.name, place.field(function.name), function.impl_name());
            body.push(Stmt::Assign(place.field(function.name), method_value(function.impl_name())));
        }
    }

    FuncDecl {
        receiver_type: entry.name.to_string(),
        name: INIT_METHOD.to_string(),
        doc: Some(format!("{} wires the dispatch slots of {}. It is safe to call repeatedly.", INIT_METHOD, entry.name)),
        result: None,
        body,
    }
}

/// All declarations of one class: table struct, super accessor, initializer.
pub fn synthesize_class(registry: &ClassRegistry<'_>, class: ClassId) -> Vec<Decl> {
    let mut decls = Vec::new();
    if let Some(table) = dispatch_table_decl(registry, class) {
        decls.push(Decl::Struct(table));
    }
    if let Some(accessor) = super_accessor(registry, class) {
        decls.push(Decl::Func(accessor));
    }
    decls.push(Decl::Func(init_class(registry, class)));
    decls
}

/// Imports needed by the table structs of `classes`.
fn collect_imports(registry: &ClassRegistry<'_>, classes: &[ClassId]) -> Vec<ImportSpec> {
    let mut imports: Vec<ImportSpec> = Vec::new();
    for &class in classes {
        let Some(own) = registry.class(class).own_table else {
            continue;
        };
        for entry in &registry.table(own).entries {
            for import in &entry.imports {
                if !imports.contains(import) {
                    imports.push(import.clone());
                }
            }
        }
    }
    imports.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.alias.cmp(&b.alias)));
    imports
}

/// Declarations for every class declared in `file_name`, in registry order.
///
/// The registry must be resolved.
pub fn synthesize_file(
    session: &GenerationSession<'_>,
    registry: &ClassRegistry<'_>,
    package: &str,
    file_name: &str,
) -> ModelResult<GeneratedFile> {
    let classes: Vec<ClassId> = registry
        .classes_ordered()?
        .into_iter()
        .filter(|&id| registry.class(id).file == Some(file_name) && registry.is_emitted(id))
        .collect();

    let mut decls = Vec::new();
    for &class in &classes {
        log::debug!("synthesizing class {}", registry.class(class).name);
        session.record_class();
        decls.extend(synthesize_class(registry, class));
    }
    session.record_declarations(decls.len());

    Ok(GeneratedFile {
        package: package.to_string(),
        imports: collect_imports(registry, &classes),
        decls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Param, Signature};
    use crate::model::VirtualFunction;
    use crate::resolve::resolve_all;
    use bumpalo::Bump;

    fn getter() -> Signature {
        Signature::new(Vec::new(), vec![Param::new(None, TypeExpr::named("string"))])
    }

    /// A owns aVtable with getName; B extends A; C extends B; all implement getName.
    fn names_registry<'a>(session: &GenerationSession<'a>) -> (ClassRegistry<'a>, [ClassId; 3]) {
        let mut registry = ClassRegistry::new();
        let mut ids = Vec::new();
        for (name, file) in [("A", "AFile.go"), ("B", "BFile.go"), ("C", "CFile.go")] {
            let id = registry.get_or_create(name);
            let class = registry.class_mut(id);
            class.declared = true;
            class.file = Some(file);
            class.virtuals.push(VirtualFunction::new("getName", getter()));
            ids.push(id);
        }
        registry.set_table(ids[0], "aVtable", "aVtable").unwrap();
        registry.set_super(ids[1], "A", "A").unwrap();
        registry.set_super(ids[2], "B", "B").unwrap();
        resolve_all(session, &mut registry).unwrap();
        (registry, [ids[0], ids[1], ids[2]])
    }

    #[test]
    fn test_table_place_walks_super_fields() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);
        let (registry, [a, _, c]) = names_registry(&session);
        let table = registry.class(a).own_table.unwrap();
        assert_eq!(table_place(&registry, c, table).to_string(), "this.B.A.aVtable");
        assert_eq!(table_place(&registry, a, table).to_string(), "this.aVtable");
    }

    #[test]
    fn test_root_declarations() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);
        let (registry, [a, _, _]) = names_registry(&session);

        let decls = synthesize_class(&registry, a);
        let names: Vec<&str> = decls.iter().map(Decl::name).collect();
        assert_eq!(names, vec!["aVtable", "initClass"]);

        let Decl::Struct(table) = &decls[0] else { panic!("expected table struct") };
        let fields: Vec<String> = table.fields.iter().map(|f| format!("{} {}", f.name, f.ty)).collect();
        assert_eq!(fields, vec!["isAVtableInit bool", "getName func() string"]);

        let init = init_class(&registry, a);
        let flag = Place::receiver().field("aVtable").field("isAVtableInit");
        assert_eq!(
            init.body,
            vec![
                Stmt::Guard(vec![flag.clone()]),
                Stmt::Assign(flag, Expr::Bool(true)),
                Stmt::Assign(
                    Place::receiver().field("aVtable").field("getName"),
                    Expr::MethodValue { target: Place::receiver(), method: "getNameImpl".into() }
                ),
            ]
        );
    }

    #[test]
    fn test_derived_declarations() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);
        let (registry, [_, _, c]) = names_registry(&session);

        let accessor = super_accessor(&registry, c).unwrap();
        assert_eq!(accessor.result.as_ref().unwrap().to_string(), "*B");
        assert_eq!(accessor.body[1], Stmt::Return(Expr::AddrOf(Place::receiver().field("B"))));

        let init = init_class(&registry, c);
        let table = Place::receiver().field("B").field("A").field("aVtable");
        assert_eq!(
            init.body,
            vec![
                Stmt::Guard(vec![table.field("isAVtableInit")]),
                Stmt::Expr(Expr::Call { target: Place::receiver().field("B"), method: "initClass".into() }),
                Stmt::Assign(
                    table.field("getName"),
                    Expr::MethodValue { target: Place::receiver(), method: "getNameImpl".into() }
                ),
            ]
        );
    }

    #[test]
    fn test_file_holds_only_its_classes() {
        let arena = Bump::new();
        let session = GenerationSession::new(&arena);
        let (registry, _) = names_registry(&session);

        let file = synthesize_file(&session, &registry, "APackage", "BFile.go").unwrap();
        assert_eq!(file.package, "APackage");
        assert!(file.struct_decl("aVtable").is_none());
        assert!(file.method("B", "super").is_some());
        assert!(file.method("B", "initClass").is_some());
        assert!(file.method("C", "initClass").is_none());
        assert_eq!(session.stats().classes, 1);
        assert_eq!(session.stats().declarations_emitted, 2);
    }
}
