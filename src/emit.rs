// This module turns a GeneratedFile into Go source text and writes it next to the triggering
// file. Rendering is deterministic: imports are sorted by path, struct fields are aligned the
// way gofmt aligns them, and every file starts with the standard generated-code header so
// later runs recognise and skip it.

//! Go source rendering.
//!
//! Output follows `gofmt` layout: tab indentation, struct field types
//! aligned with spaces, one blank line between declarations.

use crate::core::error::{GoopError, GoopResult};
use crate::synth::{Decl, FuncDecl, GeneratedFile, Stmt, StructDecl, RECEIVER};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "// Code generated by goop; DO NOT EDIT.";

/// Suffix appended to the stem of the triggering file.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_goop";

/// `AFile.go` -> `AFile_goop.go`.
pub fn output_file_name(source_file: &str, suffix: &str) -> String {
    let stem = source_file.strip_suffix(".go").unwrap_or(source_file);
    format!("{}{}.go", stem, suffix)
}

/// Render a generated file as Go source text.
pub fn render(file: &GeneratedFile) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push_str("\n\n");
    let _ = writeln!(out, "package {}", file.package);

    match file.imports.as_slice() {
        [] => {}
        [single] => {
            let _ = write!(out, "\nimport {}\n", single);
        }
        imports => {
            out.push_str("\nimport (\n");
            for import in imports {
                let _ = writeln!(out, "\t{}", import);
            }
            out.push_str(")\n");
        }
    }

    for decl in &file.decls {
        out.push('\n');
        match decl {
            Decl::Struct(s) => render_struct(&mut out, s),
            Decl::Func(f) => render_func(&mut out, f),
        }
    }
    out
}

fn render_doc(out: &mut String, doc: Option<&str>) {
    for line in doc.into_iter().flat_map(str::lines) {
        let _ = writeln!(out, "// {}", line);
    }
}

fn render_struct(out: &mut String, decl: &StructDecl) {
    render_doc(out, decl.doc.as_deref());
    let _ = writeln!(out, "type {} struct {{", decl.name);
    let width = decl.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for field in &decl.fields {
        let _ = writeln!(out, "\t{:<width$} {}", field.name, field.ty, width = width);
    }
    out.push_str("}\n");
}

fn render_func(out: &mut String, decl: &FuncDecl) {
    render_doc(out, decl.doc.as_deref());
    let _ = write!(out, "func ({} *{}) {}()", RECEIVER, decl.receiver_type, decl.name);
    if let Some(result) = &decl.result {
        let _ = write!(out, " {}", result);
    }
    out.push_str(" {\n");
    for stmt in &decl.body {
        render_stmt(out, stmt);
    }
    out.push_str("}\n");
}

fn render_stmt(out: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Guard(conditions) => {
            let condition: Vec<String> = conditions.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "\tif {} {{", condition.join(" && "));
            out.push_str("\t\treturn\n\t}\n");
        }
        Stmt::Expr(expr) => {
            let _ = writeln!(out, "\t{}", expr);
        }
        Stmt::Assign(place, expr) => {
            let _ = writeln!(out, "\t{} = {}", place, expr);
        }
        Stmt::Return(expr) => {
            let _ = writeln!(out, "\treturn {}", expr);
        }
    }
}

/// Write rendered source to `dir/<output name>`, returning the path written.
pub fn write_file(dir: &Path, file_name: &str, source: &str) -> GoopResult<PathBuf> {
    let path = dir.join(file_name);
    fs::write(&path, source).map_err(|e| GoopError::io(&path, e))?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{ImportSpec, TypeExpr};
    use crate::synth::{Expr, FieldSpec, Place};

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("AFile.go", DEFAULT_OUTPUT_SUFFIX), "AFile_goop.go");
        assert_eq!(output_file_name("shapes", "_gen"), "shapes_gen.go");
    }

    #[test]
    fn test_render_empty_file() {
        let file = GeneratedFile {
            package: "names".into(),
            imports: Vec::new(),
            decls: Vec::new(),
        };
        assert_eq!(render(&file), "// Code generated by goop; DO NOT EDIT.\n\npackage names\n");
    }

    #[test]
    fn test_render_struct_and_method() {
        let flag = Place::receiver().field("aVtable").field("isAVtableInit");
        let file = GeneratedFile {
            package: "p".into(),
            imports: vec![
                ImportSpec { alias: None, path: "io".into() },
                ImportSpec { alias: Some("str".into()), path: "strings".into() },
            ],
            decls: vec![
                Decl::Struct(StructDecl {
                    name: "aVtable".into(),
                    doc: None,
                    fields: vec![
                        FieldSpec { name: "isAVtableInit".into(), ty: TypeExpr::named("bool") },
                        FieldSpec { name: "getName".into(), ty: TypeExpr::named("func() string") },
                    ],
                }),
                Decl::Func(FuncDecl {
                    receiver_type: "A".into(),
                    name: "initClass".into(),
                    doc: Some("initClass wires A.".into()),
                    result: None,
                    body: vec![
                        Stmt::Guard(vec![flag.clone(), flag.clone()]),
                        Stmt::Assign(flag, Expr::Bool(true)),
                    ],
                }),
            ],
        };

        let expected = "\
// Code generated by goop; DO NOT EDIT.

package p

import (
\t\"io\"
\tstr \"strings\"
)

type aVtable struct {
\tisAVtableInit bool
\tgetName       func() string
}

// initClass wires A.
func (this *A) initClass() {
\tif this.aVtable.isAVtableInit && this.aVtable.isAVtableInit {
\t\treturn
\t}
\tthis.aVtable.isAVtableInit = true
}
";
        assert_eq!(render(&file), expected);
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a_goop.go", "package a\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "package a\n");
    }
}
