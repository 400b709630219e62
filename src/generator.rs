// This module drives one goop run over a package directory. It loads and parses every Go file
// of the unit, registers all structs and their `Impl` methods in a fresh ClassRegistry,
// validates and resolves the hierarchy, synthesizes the declarations of the classes declared in
// the triggering file and renders them. Writing the result is a separate step so callers can
// print instead. Any error aborts the run before anything is written.

//! End-to-end generation pipeline.

use crate::analyzer::GoPackage;
use crate::config::GeneratorConfig;
use crate::core::error::GoopResult;
use crate::core::session::GenerationSession;
use crate::emit::{render, write_file};
use crate::model::{populate_registry, ClassRegistry};
use crate::resolve::resolve_all;
use crate::synth::{synthesize_file, GeneratedFile};
use std::path::PathBuf;

/// Generated code for one triggering file.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Where the source belongs.
    pub path: PathBuf,
    pub file: GeneratedFile,
    /// Rendered Go source.
    pub source: String,
}

pub struct Generator<'s, 'arena> {
    session: &'s GenerationSession<'arena>,
    config: GeneratorConfig,
}

impl<'s, 'arena> Generator<'s, 'arena> {
    pub fn new(session: &'s GenerationSession<'arena>, config: GeneratorConfig) -> Self {
        Self { session, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Parse the configured package directory.
    pub fn load_package(&self) -> GoopResult<GoPackage> {
        GoPackage::load(
            self.session,
            &self.config.dir,
            Some(self.config.package.as_str()),
            self.config.skip_generated,
        )
    }

    /// Register every class of `package` and resolve all virtual functions.
    pub fn build_registry(&self, package: &GoPackage) -> GoopResult<ClassRegistry<'arena>> {
        let mut registry = ClassRegistry::new();
        populate_registry(self.session, &mut registry, &package.files, &self.config.tag_key)?;
        resolve_all(self.session, &mut registry)?;
        Ok(registry)
    }

    /// Generate the triggering file's code from an already loaded package.
    pub fn generate_for(&self, package: &GoPackage, registry: &ClassRegistry<'arena>) -> GoopResult<GenerationOutput> {
        let file_name = self.config.file_name();
        package.require_file(file_name)?;

        let file = synthesize_file(self.session, registry, &package.name, file_name)?;
        log::info!("{}: {} declarations", file_name, file.decls.len());
        let source = render(&file);
        Ok(GenerationOutput {
            path: self.config.output_path(),
            file,
            source,
        })
    }

    /// Load, resolve and render, without writing.
    pub fn generate(&self) -> GoopResult<GenerationOutput> {
        let package = self.load_package()?;
        let registry = self.build_registry(&package)?;
        self.generate_for(&package, &registry)
    }

    /// Generate and write the output file, returning its path.
    pub fn run(&self) -> GoopResult<PathBuf> {
        let output = self.generate()?;
        write_file(&self.config.dir, &self.config.output_name(), &output.source)
    }
}
