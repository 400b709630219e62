// This module fills a ClassRegistry from parsed source files. Every struct of the unit is
// registered in a first pass; fields carrying a goop annotation link the struct to its super or
// to its own dispatch table, and annotations with an unknown value are recorded as non-fatal
// diagnostics. The second pass attaches each method whose name ends in `Impl` to its receiver
// as a virtual function, together with the imports its signature needs. A package qualifier no
// import of the declaring file provides is fatal, since the table struct could not compile.

//! Registry population from analyzed source files.
//!
//! Structs are registered first, so that methods can be attached regardless
//! of the file order. Field annotations are read from the configured struct
//! tag key (`goop` by default).

use super::{ClassId, ClassRegistry, VirtualFunction};
use crate::analyzer::{FieldDecl, FunctionDecl, SourceFile, TypeDecl};
use crate::core::error::{ModelError, ModelResult};
use crate::core::session::GenerationSession;

/// Suffix marking a method as the implementation of a virtual function.
pub const VIRTUAL_SUFFIX: &str = "Impl";

const SUPER_ANNOTATION: &str = "super";
const VTABLE_ANNOTATION: &str = "vtable";

/// The virtual name implemented by a method, if it is an `Impl` method.
pub fn virtual_name(method: &str) -> Option<&str> {
    method.strip_suffix(VIRTUAL_SUFFIX).filter(|name| !name.is_empty())
}

/// Register every struct of `files` and attach their `Impl` methods.
pub fn populate_registry<'arena>(
    session: &GenerationSession<'arena>,
    registry: &mut ClassRegistry<'arena>,
    files: &[SourceFile],
    tag_key: &str,
) -> ModelResult<()> {
    for file in files {
        let file_name = session.intern_str(&file.file_name);
        for (decl, fields) in file.structs() {
            register_struct(session, registry, file_name, decl, fields, tag_key)?;
        }
    }

    for file in files {
        for method in file.methods() {
            attach_virtual(session, registry, file, method)?;
        }
    }

    log::debug!("registry holds {} classes", registry.len());
    Ok(())
}

fn register_struct<'arena>(
    session: &GenerationSession<'arena>,
    registry: &mut ClassRegistry<'arena>,
    file_name: &'arena str,
    decl: &TypeDecl,
    fields: &[FieldDecl],
    tag_key: &str,
) -> ModelResult<()> {
    let annotated: Vec<(&FieldDecl, String)> = fields
        .iter()
        .filter_map(|field| Some((field, field.tag.as_ref()?.lookup(tag_key)?)))
        .collect();

    if decl.generic {
        if !annotated.is_empty() {
            return Err(ModelError::AmbiguousDeclaration {
                name: decl.name.clone(),
                reason: "generic classes are not supported".to_string(),
            });
        }
        log::debug!("{}:{}: ignoring generic struct {}", file_name, decl.line, decl.name);
        return Ok(());
    }

    let name = session.intern_str(&decl.name);
    let id = registry.get_or_create(name);
    {
        let class = registry.class_mut(id);
        if class.declared {
            return Err(ModelError::AmbiguousDeclaration {
                name: decl.name.clone(),
                reason: format!("declared again at {}:{}", file_name, decl.line),
            });
        }
        class.declared = true;
        class.file = Some(file_name);
    }

    for (field, annotation) in annotated {
        let field_name = field.selector().unwrap_or("_");
        match annotation.as_str() {
            SUPER_ANNOTATION => {
                let target = annotation_target(&decl.name, field, SUPER_ANNOTATION)?;
                registry.set_super(id, session.intern_str(target), session.intern_str(field_name))?;
            }
            VTABLE_ANNOTATION => {
                let target = annotation_target(&decl.name, field, VTABLE_ANNOTATION)?;
                registry.set_table(id, session.intern_str(target), session.intern_str(field_name))?;
                session.record_table();
            }
            _ => session.report(ModelError::UnknownAnnotation {
                class: decl.name.clone(),
                field: field_name.to_string(),
                value: annotation,
            }),
        }
    }
    Ok(())
}

/// The plain type name an annotated field refers to.
fn annotation_target<'f>(class: &str, field: &'f FieldDecl, annotation: &str) -> ModelResult<&'f str> {
    field.ty.as_ident().ok_or_else(|| ModelError::MalformedAnnotation {
        class: class.to_string(),
        field: field.selector().unwrap_or("_").to_string(),
        reason: format!("{} field has type {}, expected a plain type name", annotation, field.ty),
    })
}

fn attach_virtual<'arena>(
    session: &GenerationSession<'arena>,
    registry: &mut ClassRegistry<'arena>,
    file: &SourceFile,
    method: &FunctionDecl,
) -> ModelResult<()> {
    let Some(name) = virtual_name(&method.name) else {
        return Ok(());
    };
    let Some(receiver) = method.receiver_type() else {
        return Ok(());
    };
    let Some(class_id) = registry.lookup(receiver).filter(|&id| registry.class(id).declared) else {
        log::debug!(
            "{}:{}: {}.{} has no registered receiver, skipping",
            file.file_name,
            method.line,
            receiver,
            method.name
        );
        return Ok(());
    };

    let mut function = VirtualFunction::new(session.intern_str(name), method.signature.clone());
    let mut packages = Vec::new();
    method.signature.collect_packages(&mut packages);
    for package in packages {
        match file.import_for(package) {
            Some(import) => function.imports.push(import.clone()),
            None => {
                return Err(ModelError::UnresolvedImport {
                    class: receiver.to_string(),
                    function: name.to_string(),
                    package: package.to_string(),
                    file: file.file_name.clone(),
                })
            }
        }
    }

    push_virtual(registry, class_id, function);
    Ok(())
}

fn push_virtual<'arena>(registry: &mut ClassRegistry<'arena>, class: ClassId, function: VirtualFunction<'arena>) {
    let class = registry.class_mut(class);
    if class.virtuals.iter().any(|v| v.name == function.name) {
        return;
    }
    log::trace!("{} declares virtual {}", class.name, function);
    class.virtuals.push(function);
}
