//! Shared helpers for the integration tests.
//!
//! [`Machine`] executes synthesized `initClass`/`super` bodies against a flat
//! memory of field paths, which is enough to observe slot writes, guards
//! and call order without a Go toolchain.

#![allow(dead_code)]

use goop::analyzer::{parse_source, SourceFile};
use goop::model::populate_registry;
use goop::resolve::resolve_all;
use goop::synth::{synthesize_class, Decl, Expr, FuncDecl, Place, Stmt};
use goop::{ClassRegistry, GenerationSession, ModelResult};
use hashbrown::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub fn names_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/names")
}

/// Copy the Names sample package into a scratch directory.
pub fn copy_names_package() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in fs::read_dir(names_dir()).unwrap() {
        let path = entry.unwrap().path();
        fs::copy(&path, dir.path().join(path.file_name().unwrap())).unwrap();
    }
    dir
}

pub fn parse_all(sources: &[(&str, &str)]) -> Vec<SourceFile> {
    sources
        .iter()
        .map(|(name, text)| parse_source(name, text).unwrap())
        .collect()
}

/// Populate and resolve a registry from in-memory Go sources.
pub fn resolved_registry<'a>(
    session: &GenerationSession<'a>,
    sources: &[(&str, &str)],
) -> ModelResult<ClassRegistry<'a>> {
    let files = parse_all(sources);
    let mut registry = ClassRegistry::new();
    populate_registry(session, &mut registry, &files, "goop")?;
    resolve_all(session, &mut registry)?;
    Ok(registry)
}

/// The Names sample package read from `tests/data`.
pub fn names_sources() -> Vec<(String, String)> {
    let mut sources: Vec<(String, String)> = fs::read_dir(names_dir())
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_str().unwrap().to_string();
            (name, fs::read_to_string(&path).unwrap())
        })
        .collect();
    sources.sort();
    sources
}

pub fn class_names(registry: &ClassRegistry<'_>) -> Vec<String> {
    registry
        .classes_ordered()
        .unwrap()
        .into_iter()
        .map(|id| registry.class(id).name.to_string())
        .collect()
}

/// Interpreter for generated method bodies.
pub struct Machine<'r, 'a> {
    registry: &'r ClassRegistry<'a>,
    methods: HashMap<(String, String), FuncDecl>,
    /// Field path (without receiver) to stored value.
    pub memory: HashMap<String, String>,
    /// Every slot or flag write, in order.
    pub writes: Vec<(String, String)>,
    pub calls: Vec<String>,
}

impl<'r, 'a> Machine<'r, 'a> {
    pub fn new(registry: &'r ClassRegistry<'a>) -> Self {
        let mut methods = HashMap::new();
        for class in registry.classes() {
            if !registry.is_emitted(class.id) {
                continue;
            }
            for decl in synthesize_class(registry, class.id) {
                if let Decl::Func(f) = decl {
                    methods.insert((f.receiver_type.clone(), f.name.clone()), f);
                }
            }
        }
        Self {
            registry,
            methods,
            memory: HashMap::new(),
            writes: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Call `method` on a fresh-object root of type `class`.
    pub fn call(&mut self, class: &str, method: &str) {
        self.exec(class, &[], method);
    }

    pub fn value(&self, path: &str) -> Option<&str> {
        self.memory.get(path).map(String::as_str)
    }

    fn exec(&mut self, ty: &str, receiver: &[String], method: &str) {
        let decl = self
            .methods
            .get(&(ty.to_string(), method.to_string()))
            .unwrap_or_else(|| panic!("no generated method {ty}.{method}"))
            .clone();
        self.calls.push(format!("{ty}.{method}"));

        for stmt in &decl.body {
            match stmt {
                Stmt::Guard(conditions) => {
                    let all_set = conditions
                        .iter()
                        .all(|place| self.memory.get(&self.key(receiver, place)).map(String::as_str) == Some("true"));
                    if all_set {
                        return;
                    }
                }
                Stmt::Expr(Expr::Call { target, method }) => {
                    let (target_ty, target_path) = self.resolve(ty, receiver, target);
                    self.exec(&target_ty, &target_path, method);
                }
                Stmt::Assign(place, value) => {
                    let stored = match value {
                        Expr::Bool(b) => b.to_string(),
                        Expr::MethodValue { target, method } => {
                            let (target_ty, _) = self.resolve(ty, receiver, target);
                            format!("{target_ty}.{method}")
                        }
                        other => panic!("unexpected assigned value {other}"),
                    };
                    let key = self.key(receiver, place);
                    self.writes.push((key.clone(), stored.clone()));
                    self.memory.insert(key, stored);
                }
                Stmt::Return(_) => return,
                Stmt::Expr(other) => panic!("unexpected expression statement {other}"),
            }
        }
    }

    fn key(&self, receiver: &[String], place: &Place) -> String {
        receiver
            .iter()
            .chain(&place.path)
            .cloned()
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Static type and absolute path of an embedded super place.
    fn resolve(&self, ty: &str, receiver: &[String], place: &Place) -> (String, Vec<String>) {
        let mut current = ty.to_string();
        for segment in &place.path {
            let id = self.registry.lookup(&current).unwrap();
            let class = self.registry.class(id);
            assert_eq!(class.super_field, Some(segment.as_str()), "{segment} is not the super of {current}");
            current = self.registry.class(class.super_class.unwrap()).name.to_string();
        }
        let mut path = receiver.to_vec();
        path.extend(place.path.iter().cloned());
        (current, path)
    }
}
