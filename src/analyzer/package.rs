//! Package directory scanning.
//!
//! A unit is every `.go` file of one directory. Test files and files that
//! carry the `// Code generated` marker are left out, the latter because
//! goop's own output lives next to its input.

use super::{parse_source, SourceFile};
use crate::core::error::{GoopError, GoopResult};
use crate::core::session::GenerationSession;
use std::fs;
use std::path::{Path, PathBuf};

const GENERATED_MARKER: &str = "// Code generated";

/// Whether a source file was produced by a generator.
pub fn is_generated_source(text: &str) -> bool {
    text.trim_start_matches('\u{feff}').starts_with(GENERATED_MARKER)
}

/// All analyzed files of one package directory, sorted by file name.
#[derive(Debug, Clone)]
pub struct GoPackage {
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
}

impl GoPackage {
    /// Build a package from already parsed files.
    ///
    /// With `expected` set every file must declare that package; otherwise the
    /// first file decides.
    pub fn from_files(dir: impl Into<PathBuf>, expected: Option<&str>, mut files: Vec<SourceFile>) -> GoopResult<Self> {
        let dir = dir.into();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        let name = match expected {
            Some(name) => name.to_string(),
            None => files.first().map(|f| f.package_name.clone()).unwrap_or_default(),
        };
        if let Some(stray) = files.iter().find(|f| f.package_name != name) {
            return Err(GoopError::MixedPackages {
                dir: dir.display().to_string(),
                expected: name,
                found: format!("{} ({})", stray.package_name, stray.file_name),
            });
        }

        Ok(Self { name, dir, files })
    }

    /// Read and parse every Go file in `dir`.
    pub fn load(
        session: &GenerationSession<'_>,
        dir: &Path,
        expected: Option<&str>,
        skip_generated: bool,
    ) -> GoopResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| GoopError::io(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GoopError::io(dir, e))?;
            let path = entry.path();
            let is_file = entry.file_type().map_err(|e| GoopError::io(&path, e))?.is_file();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if is_file && name.ends_with(".go") && !name.ends_with("_test.go") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = Vec::new();
        for path in paths {
            let text = fs::read_to_string(&path).map_err(|e| GoopError::io(&path, e))?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            if skip_generated && is_generated_source(&text) {
                log::debug!("skipping generated file {}", file_name);
                session.record_file_skipped();
                continue;
            }

            log::info!("parsing {}", path.display());
            files.push(parse_source(&file_name, &text)?);
            session.record_file_parsed();
        }

        Self::from_files(dir, expected, files)
    }

    pub fn file(&self, file_name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.file_name == file_name)
    }

    /// Like [`GoPackage::file`], failing with [`GoopError::FileNotFound`].
    pub fn require_file(&self, file_name: &str) -> GoopResult<&SourceFile> {
        self.file(file_name).ok_or_else(|| GoopError::FileNotFound {
            file: file_name.to_string(),
            package: self.name.clone(),
        })
    }
}
