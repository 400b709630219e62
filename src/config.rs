// This module holds the configuration of one generation run: the package name and directory,
// the triggering file, the suffix of the generated file name, whether previously generated
// files are skipped while scanning, and the struct tag key that carries annotations. Library
// callers build it with the builder methods; the binary fills it from flags and environment.

//! Generator configuration.
//!
//! The CLI fills a [`GeneratorConfig`] from flags and the `GOFILE` /
//! `GOPACKAGE` variables set by `go generate`; library callers build one
//! directly.

use crate::emit::{output_file_name, DEFAULT_OUTPUT_SUFFIX};
use std::path::{Path, PathBuf};

/// Struct tag key carrying goop annotations.
pub const DEFAULT_TAG_KEY: &str = "goop";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Package name every analyzed file must declare.
    pub package: String,
    /// Directory holding the package sources.
    pub dir: PathBuf,
    /// File whose classes are generated, relative to `dir`.
    pub file: String,
    /// Appended to the stem of `file` to name the output.
    pub output_suffix: String,
    /// Skip files starting with `// Code generated`.
    pub skip_generated: bool,
    pub tag_key: String,
}

impl GeneratorConfig {
    pub fn new(package: impl Into<String>, dir: impl Into<PathBuf>, file: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            dir: dir.into(),
            file: file.into(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            skip_generated: true,
            tag_key: DEFAULT_TAG_KEY.to_string(),
        }
    }

    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    pub fn with_skip_generated(mut self, skip: bool) -> Self {
        self.skip_generated = skip;
        self
    }

    pub fn with_tag_key(mut self, key: impl Into<String>) -> Self {
        self.tag_key = key.into();
        self
    }

    /// Name of the triggering file inside the package directory.
    ///
    /// `GOFILE` is a bare file name, but a path is accepted too.
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.file)
    }

    pub fn output_name(&self) -> String {
        output_file_name(self.file_name(), &self.output_suffix)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(self.output_name())
    }
}
