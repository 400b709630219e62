//! Runtime behaviour of the synthesized initializers.
//!
//! The generated bodies are executed by the interpreter in `common`, so
//! these tests observe what a Go program would see: which implementation
//! sits in each slot, in which order slots are written, and that repeated
//! initialization changes nothing.

mod common;

use bumpalo::Bump;
use common::{names_sources, resolved_registry, Machine};
use goop::synth::{synthesize_file, Decl};
use goop::GenerationSession;

fn with_names<R>(f: impl FnOnce(&goop::ClassRegistry<'_>, &GenerationSession<'_>) -> R) -> R {
    let sources = names_sources();
    let borrowed: Vec<(&str, &str)> = sources.iter().map(|(n, t)| (n.as_str(), t.as_str())).collect();
    let arena = Bump::new();
    let session = GenerationSession::new(&arena);
    let registry = resolved_registry(&session, &borrowed).unwrap();
    f(&registry, &session)
}

#[test]
fn test_most_derived_implementation_wins() {
    with_names(|registry, _| {
        let mut machine = Machine::new(registry);
        machine.call("C", "initClass");

        assert_eq!(machine.value("B.A.aVtable.getName"), Some("C.getNameImpl"));
        assert_eq!(machine.value("B.A.aVtable.isAVtableInit"), Some("true"));

        let slot_writes: Vec<&str> = machine
            .writes
            .iter()
            .filter(|(path, _)| path == "B.A.aVtable.getName")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(slot_writes, vec!["A.getNameImpl", "B.getNameImpl", "C.getNameImpl"]);
        assert_eq!(machine.calls, vec!["C.initClass", "B.initClass", "A.initClass"]);
    });
}

#[test]
fn test_initialization_is_idempotent() {
    with_names(|registry, _| {
        let mut machine = Machine::new(registry);
        machine.call("C", "initClass");
        let memory = machine.memory.clone();
        let writes = machine.writes.len();

        machine.call("C", "initClass");
        assert_eq!(machine.memory, memory);
        assert_eq!(machine.writes.len(), writes);
    });
}

#[test]
fn test_super_accessor_initializes_first() {
    with_names(|registry, _| {
        // B.New calls b.super().New(...), which ends in A's own initClass.
        let mut machine = Machine::new(registry);
        machine.call("B", "super");
        let slot = machine.value("A.aVtable.getName").map(str::to_string);
        assert_eq!(slot.as_deref(), Some("B.getNameImpl"));

        let mut nested = Machine::new(registry);
        nested.call("C", "super");
        // The inner A.initClass sees the flag already set and leaves C's slot alone.
        assert_eq!(nested.value("B.A.aVtable.getName"), Some("C.getNameImpl"));
    });
}

#[test]
fn test_plain_root_object() {
    with_names(|registry, _| {
        let mut machine = Machine::new(registry);
        machine.call("A", "initClass");
        machine.call("A", "initClass");
        assert_eq!(machine.value("aVtable.getName"), Some("A.getNameImpl"));
        assert_eq!(machine.writes.len(), 2);
    });
}

#[test]
fn test_per_file_declarations() {
    with_names(|registry, session| {
        let a = synthesize_file(session, registry, "names", "AFile.go").unwrap();
        let names: Vec<&str> = a.decls.iter().map(Decl::name).collect();
        assert_eq!(names, vec!["aVtable", "initClass"]);

        let c = synthesize_file(session, registry, "names", "CFile.go").unwrap();
        let names: Vec<&str> = c.decls.iter().map(Decl::name).collect();
        assert_eq!(names, vec!["super", "initClass"]);
        assert!(c.imports.is_empty());
    });
}

#[test]
fn test_two_tables_both_guarded() {
    let arena = Bump::new();
    let session = GenerationSession::new(&arena);
    let registry = resolved_registry(
        &session,
        &[
            (
                "shape.go",
                "package shapes\ntype Shape struct {\n\tshapeVtable `goop:\"vtable\"`\n}\nfunc (s *Shape) areaImpl() float64 { return 0 }\n",
            ),
            (
                "square.go",
                "package shapes\ntype Square struct {\n\tShape `goop:\"super\"`\n\tsquareVtable `goop:\"vtable\"`\n}\n\
                 func (s *Square) areaImpl() float64 { return 1 }\n\
                 func (s *Square) diagonalImpl() float64 { return 2 }\n",
            ),
        ],
    )
    .unwrap();

    let mut machine = Machine::new(&registry);
    machine.call("Square", "initClass");
    assert_eq!(machine.value("Shape.shapeVtable.area"), Some("Square.areaImpl"));
    assert_eq!(machine.value("squareVtable.diagonal"), Some("Square.diagonalImpl"));
    assert_eq!(machine.value("squareVtable.isSquareVtableInit"), Some("true"));

    let writes = machine.writes.len();
    machine.call("Square", "initClass");
    assert_eq!(machine.writes.len(), writes);
}
