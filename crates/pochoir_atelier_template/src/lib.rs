//! # pochoir_atelier_template
//!
//! Atelier Template - The template workshop for Pochoir.
//!
//! ## Name Origin
//!
//! **Atelier** (/a.tə.lje/) is the French word for an artist's workshop. This
//! one works on templates: it reads the `{{import}}` directives of a template,
//! then swaps every `alias.member` class usage for the scoped name the style
//! workshop gave that class.
//!
//! ## Modes
//!
//! - [`TemplateMode::Ast`] parses the template with `pochoir_armature`,
//!   replaces nodes and prints it back.
//! - [`TemplateMode::Scanner`] works on the raw text with regular expressions.
//!
//! Both modes produce the same output for well-formed templates.
//!
//! ## Example
//!
//! ```
//! use pochoir_atelier_template::{rewrite_template, TemplateOptions};
//! use pochoir_croquis::UsageLedger;
//!
//! let ledger = UsageLedger::new();
//! let source = "{{import s from './styles.scoped.scss'}}\n<h1 class={{s.title}}>Hi</h1>";
//! let output = rewrite_template(
//!     source,
//!     "my-app/components/card/template.hbs",
//!     &TemplateOptions::default(),
//!     &ledger,
//! )
//! .unwrap();
//! assert!(output.code.starts_with("{{!-- imported styles --}}\n<h1 class=\"title_"));
//! assert_eq!(output.usages[0].import_path, "my-app/components/card/styles.scoped.scss");
//! ```

pub mod imports;
mod scanner;
pub mod usage;

use pochoir_armature::{parse_template, print_template};
use pochoir_carton::{normalize_path, NamingScheme};
use pochoir_croquis::UsageLedger;
use pochoir_relief::TransformResult;
use serde::{Deserialize, Serialize};

pub use imports::{
    collect_imports, is_valid_alias, resolve_import_path, ImportDirective, ImportTable,
    IMPORTED_STYLES_COMMENT,
};
pub use usage::{rewrite_usages, ClassUsage};

/// How templates are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    /// Parse, replace nodes, print
    #[default]
    Ast,
    /// Regular expressions over the raw text
    Scanner,
}

impl TemplateMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ast => "ast",
            Self::Scanner => "scanner",
        }
    }
}

/// Template rewrite options
#[derive(Debug, Clone, Default)]
pub struct TemplateOptions {
    pub naming: NamingScheme,
    pub mode: TemplateMode,
    /// Accept import aliases outside `[A-Za-z0-9.-]+`
    pub skip_alias_validation: bool,
}

/// Rewritten template
#[derive(Debug, Clone)]
pub struct TemplateOutput {
    pub code: String,
    /// Every import directive, in source order
    pub imports: Vec<ImportDirective>,
    /// Every rewritten usage, in source order
    pub usages: Vec<ClassUsage>,
}

/// Rewrite the imports and class usages of one template.
///
/// `module_name` is the namespace-qualified template path
/// (`my-app/components/card/template.hbs`). Relative import paths resolve
/// against its directory, and errors name it.
pub fn rewrite_template(
    source: &str,
    module_name: &str,
    options: &TemplateOptions,
    ledger: &UsageLedger,
) -> TransformResult<TemplateOutput> {
    let module_name = normalize_path(module_name);

    let output = match options.mode {
        TemplateMode::Ast => {
            let mut template = parse_template(source, &module_name)?;
            let table = collect_imports(&mut template, &module_name, options)?;
            let usages = rewrite_usages(&mut template, &table, options.naming, ledger);
            TemplateOutput {
                code: print_template(&template),
                imports: table.into_directives(),
                usages,
            }
        }
        TemplateMode::Scanner => scanner::rewrite(source, &module_name, options, ledger)?,
    };

    tracing::debug!(
        "template: {} ({}) {} imports, {} class usages",
        module_name,
        options.mode.as_str(),
        output.imports.len(),
        output.usages.len()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pochoir_atelier_style::{rewrite_style, StyleOptions};
    use pochoir_carton::scoped_name;
    use pochoir_relief::TransformError;
    use std::path::PathBuf;

    /// A template fixture
    #[derive(Debug, Deserialize)]
    struct TestCase {
        name: String,
        module: String,
        input: String,
        #[serde(default)]
        usages: usize,
    }

    #[derive(Debug, Deserialize)]
    struct Fixture {
        cases: Vec<TestCase>,
    }

    /// Get the path to the tests/fixtures directory
    fn fixtures_path() -> PathBuf {
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
        PathBuf::from(manifest_dir)
            .parent()
            .unwrap()
            .parent()
            .unwrap()
            .join("tests")
            .join("fixtures")
    }

    fn load_fixture(name: &str) -> Fixture {
        let content = std::fs::read_to_string(fixtures_path().join(name)).unwrap();
        toml::from_str(&content).unwrap()
    }

    fn rewrite(
        source: &str,
        mode: TemplateMode,
        ledger: &UsageLedger,
    ) -> TransformResult<TemplateOutput> {
        let options = TemplateOptions {
            mode,
            ..Default::default()
        };
        rewrite_template(source, "my-app/components/button/template.hbs", &options, ledger)
    }

    #[test]
    fn test_cross_file_agreement() {
        let ledger = UsageLedger::new();
        let style = rewrite_style(
            ".primary { color: blue; }",
            "my-app",
            "components/button/styles.scoped.scss",
            &StyleOptions::default(),
            &ledger,
        )
        .unwrap();
        let scoped = scoped_name(
            "primary",
            "my-app/components/button/styles.scoped.scss",
            NamingScheme::Flat,
        );
        assert_eq!(style.code, format!(".{} {{ color: blue; }}", scoped));

        let source = "{{import s from './styles.scoped.scss'}}\n<button class={{s.primary}}></button>";
        for mode in [TemplateMode::Ast, TemplateMode::Scanner] {
            let output = rewrite(source, mode, &ledger).unwrap();
            assert_eq!(
                output.code,
                format!(
                    "{{{{!-- imported styles --}}}}\n<button class=\"{}\"></button>",
                    scoped
                )
            );
        }
        assert!(ledger.reconcile().is_empty());
    }

    #[test]
    fn test_module_name_is_normalized() {
        let ledger = UsageLedger::new();
        let source = "{{import s from '../shared/styles.scoped.scss'}}";
        let options = TemplateOptions::default();
        let module = "my-app//components/./card/template.hbs";
        let output = rewrite_template(source, module, &options, &ledger).unwrap();
        assert_eq!(
            output.imports[0].import_path,
            "my-app/components/shared/styles.scoped.scss"
        );
    }

    #[test]
    fn test_invalid_alias_registers_nothing() {
        let ledger = UsageLedger::new();
        let source = "{{import s from './styles.scoped.scss'}}{{import My Name from './x.scoped.scss'}}<p class={{s.a}}></p>";
        for mode in [TemplateMode::Ast, TemplateMode::Scanner] {
            let err = rewrite(source, mode, &ledger).unwrap_err();
            assert!(matches!(err, TransformError::InvalidIdentifier { .. }));
            assert_eq!(err.path(), "my-app/components/button/template.hbs");
        }
        assert_eq!(ledger.module_count(), 0);
    }

    #[test]
    fn test_parse_error_in_ast_mode() {
        let source = "<div>\n  <p>\n</div>";
        let err = rewrite(source, TemplateMode::Ast, &UsageLedger::new()).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"my-app/components/button/template.hbs:3:1: Unexpected closing tag </div>"
        );
    }

    #[test]
    fn test_modes_agree_on_fixtures() {
        let fixture = load_fixture("templates.toml");
        assert!(!fixture.cases.is_empty());
        for case in &fixture.cases {
            let options = |mode: TemplateMode| TemplateOptions {
                mode,
                ..Default::default()
            };
            let ast = rewrite_template(
                &case.input,
                &case.module,
                &options(TemplateMode::Ast),
                &UsageLedger::new(),
            )
            .unwrap_or_else(|e| panic!("{}: {}", case.name, e));
            let scanned = rewrite_template(
                &case.input,
                &case.module,
                &options(TemplateMode::Scanner),
                &UsageLedger::new(),
            )
            .unwrap_or_else(|e| panic!("{}: {}", case.name, e));

            assert_eq!(ast.code, scanned.code, "{}", case.name);
            assert_eq!(ast.imports, scanned.imports, "{}", case.name);
            assert_eq!(ast.usages, scanned.usages, "{}", case.name);
            assert_eq!(ast.usages.len(), case.usages, "{}", case.name);
        }
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let source = "{{import s from './styles.scoped.scss'}}<p class=\"a {{s.b}}\">{{s.c}}</p>";
        for mode in [TemplateMode::Ast, TemplateMode::Scanner] {
            let first = rewrite(source, mode, &UsageLedger::new()).unwrap();
            let second = rewrite(source, mode, &UsageLedger::new()).unwrap();
            assert_eq!(first.code, second.code);
        }
    }
}
