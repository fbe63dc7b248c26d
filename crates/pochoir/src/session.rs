//! Build session: rewrite every input in parallel, then reconcile.
//!
//! ```text
//! phase 1 (rayon)                     phase 2 (single thread)
//! style    ─rewrite_style────┐
//! style    ─rewrite_style────┼──> UsageLedger ──reconcile──> diagnostics
//! template ─rewrite_template─┘
//! ```

use std::path::Path;

use pochoir_atelier_style::{rewrite_style, StyleOptions, TraversalMode};
use pochoir_atelier_template::{rewrite_template, TemplateMode, TemplateOptions};
use pochoir_carton::{path::join, NamingScheme};
use pochoir_croquis::{LedgerDiagnostic, UsageLedger};
use pochoir_relief::TransformError;
use rayon::prelude::*;

use crate::config::PochoirConfig;
use crate::error::BuildResult;
use crate::tree::{self, InputFile, InputKind, OutputFile};

/// Options of one build
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Qualifier of every module path
    pub namespace: String,
    pub naming: NamingScheme,
    pub traversal: TraversalMode,
    pub template_mode: TemplateMode,
    pub skip_alias_validation: bool,
}

impl BuildOptions {
    /// Options from a project config, for a project at `root`.
    pub fn from_config(config: &PochoirConfig, root: &Path) -> Self {
        Self {
            namespace: config.namespace(root),
            naming: config.naming_scheme,
            traversal: config.traversal,
            template_mode: config.template_mode,
            skip_alias_validation: config.skip_alias_validation,
        }
    }

    fn style_options(&self) -> StyleOptions {
        StyleOptions {
            traversal: self.traversal,
            naming: self.naming,
        }
    }

    fn template_options(&self) -> TemplateOptions {
        TemplateOptions {
            naming: self.naming,
            mode: self.template_mode,
            skip_alias_validation: self.skip_alias_validation,
        }
    }
}

/// A file that failed to rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// Path relative to the styles root
    pub relative_path: String,
    pub error: TransformError,
}

/// Everything a build produced
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Rewritten style modules, at their target paths
    pub styles: Vec<OutputFile>,
    /// Rewritten templates, at their source paths
    pub templates: Vec<OutputFile>,
    pub failures: Vec<FileFailure>,
    /// Advisory findings of the reconciliation pass
    pub diagnostics: Vec<LedgerDiagnostic>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.styles.len() + self.templates.len()
    }

    /// All rewritten style modules, concatenated in path order.
    pub fn aggregate(&self) -> String {
        tree::aggregate_styles(&self.styles)
    }

    /// Write every output and the namespace aggregate under `out_dir`.
    pub fn write(&self, out_dir: &Path, namespace: &str) -> BuildResult<usize> {
        let mut written = tree::write_outputs(out_dir, namespace, &self.styles)?.len();
        written += tree::write_outputs(out_dir, namespace, &self.templates)?.len();
        tree::write_aggregate(out_dir, namespace, &self.styles)?;
        Ok(written + 1)
    }
}

/// One build over a set of inputs.
///
/// The session owns the ledger; [`BuildSession::run`] consumes the session so
/// reconciliation can only happen once every file has been rewritten.
#[derive(Debug)]
pub struct BuildSession {
    options: BuildOptions,
    ledger: UsageLedger,
}

impl BuildSession {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            ledger: UsageLedger::new(),
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Rewrite `inputs` in parallel and reconcile the ledger.
    pub fn run(self, inputs: &[InputFile]) -> BuildReport {
        let style_options = self.options.style_options();
        let template_options = self.options.template_options();

        let results: Vec<_> = inputs
            .par_iter()
            .map(|input| self.rewrite(input, &style_options, &template_options))
            .collect();

        let mut report = BuildReport::default();
        for (input, result) in inputs.iter().zip(results) {
            match result {
                Ok(output) => match input.kind {
                    InputKind::Style => report.styles.push(output),
                    InputKind::Template => report.templates.push(output),
                },
                Err(error) => {
                    tracing::debug!("session: {} failed: {}", input.relative_path, error);
                    report.failures.push(FileFailure {
                        relative_path: input.relative_path.clone(),
                        error,
                    });
                }
            }
        }

        report.diagnostics = self.ledger.reconcile();
        tracing::debug!(
            "session: {} rewritten, {} failed, {} diagnostics",
            report.file_count(),
            report.failures.len(),
            report.diagnostics.len()
        );
        report
    }

    fn rewrite(
        &self,
        input: &InputFile,
        style_options: &StyleOptions,
        template_options: &TemplateOptions,
    ) -> Result<OutputFile, TransformError> {
        match input.kind {
            InputKind::Style => {
                let output = rewrite_style(
                    &input.contents,
                    &self.options.namespace,
                    &input.relative_path,
                    style_options,
                    &self.ledger,
                )?;
                Ok(OutputFile {
                    relative_path: output.target_path,
                    contents: output.code,
                })
            }
            InputKind::Template => {
                let module_name = join(&self.options.namespace, &input.relative_path);
                let output = rewrite_template(
                    &input.contents,
                    &module_name,
                    template_options,
                    &self.ledger,
                )?;
                Ok(OutputFile {
                    relative_path: input.relative_path.clone(),
                    contents: output.code,
                })
            }
        }
    }
}
