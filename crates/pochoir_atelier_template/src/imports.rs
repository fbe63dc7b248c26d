//! Import directives: `{{import s from './styles.scoped.scss'}}`.
//!
//! Every directive of a template is collected before any class usage is
//! rewritten, and replaced by an inert comment so it renders nothing.

use once_cell::sync::Lazy;
use pochoir_carton::{
    path::{dirname, is_rooted, join, normalize_path},
    CompactString, FxHashMap,
};
use pochoir_relief::{
    builders, replace_node, CommentNode, Expression, MustacheKind, MustacheNode, SourceLocation,
    Template, TemplateNode, TransformError, TransformResult,
};
use regex::Regex;

use crate::scanner::{Edit, Scan};
use crate::TemplateOptions;

/// Text of the comment that replaces a directive
pub const IMPORTED_STYLES_COMMENT: &str = "imported styles";

static ALIAS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9.-]+$").unwrap());

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\{\{~?\s*import\s+(.+?)\s+from\s+(?:'([^']*)'|"([^"]*)")\s*~?\}\}"#).unwrap()
});

/// One `{{import}}` directive, resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    /// Alias the template binds
    pub local_name: CompactString,
    /// Normalized, namespace-qualified path of the imported module
    pub import_path: String,
    pub loc: SourceLocation,
}

/// Aliases of one template. A later directive for the same alias wins.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    directives: Vec<ImportDirective>,
    by_alias: FxHashMap<CompactString, usize>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `directive.local_name`, returning the path it was bound to before.
    pub fn insert(&mut self, directive: ImportDirective) -> Option<String> {
        let index = self.directives.len();
        let previous = self
            .by_alias
            .insert(directive.local_name.clone(), index)
            .map(|i| self.directives[i].import_path.clone());
        self.directives.push(directive);
        previous
    }

    /// Module path bound to `alias`.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.by_alias
            .get(alias)
            .map(|&i| self.directives[i].import_path.as_str())
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Every directive in source order, including overridden ones.
    pub fn directives(&self) -> &[ImportDirective] {
        &self.directives
    }

    pub fn into_directives(self) -> Vec<ImportDirective> {
        self.directives
    }
}

/// Whether `alias` is a valid import alias (`[A-Za-z0-9.-]+`).
pub fn is_valid_alias(alias: &str) -> bool {
    ALIAS_RE.is_match(alias)
}

/// Resolve an import path written in the template named `module_name`.
///
/// ```
/// use pochoir_atelier_template::resolve_import_path;
///
/// let module = "my-app/components/card/template.hbs";
/// assert_eq!(
///     resolve_import_path(module, "./styles.scoped.scss"),
///     "my-app/components/card/styles.scoped.scss"
/// );
/// assert_eq!(
///     resolve_import_path(module, "../button/styles.scoped.scss"),
///     "my-app/components/button/styles.scoped.scss"
/// );
/// assert_eq!(
///     resolve_import_path(module, "/shared/app/base.scoped.scss"),
///     "shared/app/base.scoped.scss"
/// );
/// ```
pub fn resolve_import_path(module_name: &str, raw_path: &str) -> String {
    if is_rooted(raw_path) {
        normalize_path(&raw_path[1..])
    } else {
        join(dirname(module_name), raw_path)
    }
}

fn bind(
    table: &mut ImportTable,
    module_name: &str,
    alias: &str,
    raw_path: &str,
    loc: SourceLocation,
    options: &TemplateOptions,
) -> TransformResult<()> {
    if !options.skip_alias_validation && !is_valid_alias(alias) {
        return Err(TransformError::invalid_identifier(module_name, alias));
    }
    let directive = ImportDirective {
        local_name: CompactString::from(alias),
        import_path: resolve_import_path(module_name, raw_path),
        loc,
    };
    if let Some(previous) = table.insert(directive) {
        tracing::debug!(
            "template: {} rebinds import alias {:?} (was {})",
            module_name,
            alias,
            previous
        );
    }
    Ok(())
}

/// Comment replacing the directive written as `directive`. The directive's
/// `~` markers carry over.
fn imported_styles_comment(directive: &str, loc: SourceLocation) -> CommentNode {
    let mut comment = builders::mustache_comment(IMPORTED_STYLES_COMMENT, loc);
    comment.strip_open = directive.starts_with("{{~");
    comment.strip_close = directive.ends_with("~}}");
    comment
}

/// Collect and neutralize the import directives of a parsed template.
pub fn collect_imports(
    template: &mut Template,
    module_name: &str,
    options: &TemplateOptions,
) -> TransformResult<ImportTable> {
    let mut table = ImportTable::new();
    let Template { source, body, .. } = template;
    collect_nodes(body, source, &mut table, module_name, options)?;
    Ok(table)
}

fn collect_nodes(
    nodes: &mut [TemplateNode],
    source: &str,
    table: &mut ImportTable,
    module_name: &str,
    options: &TemplateOptions,
) -> TransformResult<()> {
    for node in nodes.iter_mut() {
        let import = match node {
            TemplateNode::Element(element) => {
                // `<div {{import ...}}>` sits among the modifiers
                let mut modifiers = Vec::with_capacity(element.modifiers.len());
                for modifier in std::mem::take(&mut element.modifiers) {
                    match import_parts(&modifier, source) {
                        Some((alias, raw_path)) => {
                            bind(table, module_name, alias, raw_path, modifier.loc, options)?;
                            let directive = &source[modifier.loc.range()];
                            element
                                .comments
                                .push(imported_styles_comment(directive, modifier.loc));
                        }
                        None => modifiers.push(modifier),
                    }
                }
                element.modifiers = modifiers;

                collect_nodes(&mut element.children, source, table, module_name, options)?;
                None
            }
            TemplateNode::Mustache(mustache) => import_parts(mustache, source)
                .map(|(alias, raw_path)| (alias.to_string(), raw_path.to_string(), mustache.loc)),
            TemplateNode::Text(_) | TemplateNode::Comment(_) => None,
        };

        if let Some((alias, raw_path, loc)) = import {
            bind(table, module_name, &alias, &raw_path, loc, options)?;
            let comment = imported_styles_comment(&source[loc.range()], loc);
            replace_node(node, TemplateNode::Comment(comment));
        }
    }
    Ok(())
}

/// Alias source text and path literal of an `{{import <alias> from '<path>'}}`
/// mustache.
fn import_parts<'m>(mustache: &'m MustacheNode, source: &'m str) -> Option<(&'m str, &'m str)> {
    if mustache.kind != MustacheKind::Plain
        || mustache.trusting
        || !mustache.hash.is_empty()
        || !mustache.block_params.is_empty()
        || mustache.params.len() < 3
    {
        return None;
    }
    let Expression::Path(head) = &mustache.path else {
        return None;
    };
    let n = mustache.params.len();
    let (Expression::Path(from), Expression::StringLiteral(path)) =
        (&mustache.params[n - 2], &mustache.params[n - 1])
    else {
        return None;
    };
    if !head.original.eq_ignore_ascii_case("import")
        || !from.original.eq_ignore_ascii_case("from")
    {
        return None;
    }

    let alias = source[head.loc.end.offset as usize..from.loc.start.offset as usize].trim();
    Some((alias, path.value.as_str()))
}

/// Collect the import directives of a raw template and queue their
/// neutralizing edits.
pub(crate) fn scan_imports(
    scan: &mut Scan<'_>,
    module_name: &str,
    options: &TemplateOptions,
) -> TransformResult<ImportTable> {
    let mut table = ImportTable::new();
    let source = scan.source;
    for segment in scan.segments.clone() {
        for caps in IMPORT_RE.captures_iter(&source[segment.clone()]) {
            let (Some(whole), Some(alias)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let range = segment.start + whole.start()..segment.start + whole.end();
            if scan.is_escaped(range.start) {
                continue;
            }
            let raw_path = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            let loc = scan.lines.location(range.start, range.end);
            bind(&mut table, module_name, alias.as_str().trim(), raw_path, loc, options)?;

            let directive = whole.as_str();
            let open = if directive.starts_with("{{~") { "{{~" } else { "{{" };
            let close = if directive.ends_with("~}}") { "~}}" } else { "}}" };
            let comment = format!("{}!-- {} --{}", open, IMPORTED_STYLES_COMMENT, close);
            scan.edits.push(Edit::new(range, comment));
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pochoir_armature::{parse_template, print_template};

    const MODULE: &str = "my-app/components/card/template.hbs";

    fn ast_imports(
        source: &str,
        options: &TemplateOptions,
    ) -> TransformResult<(ImportTable, String)> {
        let mut template = parse_template(source, MODULE).unwrap();
        let table = collect_imports(&mut template, MODULE, options)?;
        Ok((table, print_template(&template)))
    }

    fn scanner_imports(
        source: &str,
        options: &TemplateOptions,
    ) -> TransformResult<(ImportTable, String)> {
        let mut scan = Scan::new(source);
        let table = scan_imports(&mut scan, MODULE, options)?;
        Ok((table, scan.finish()))
    }

    #[test]
    fn test_alias_pattern() {
        assert!(is_valid_alias("s"));
        assert!(is_valid_alias("ui.styles"));
        assert!(is_valid_alias("card-2"));
        assert!(!is_valid_alias("My Name"));
        assert!(!is_valid_alias("s_x"));
        assert!(!is_valid_alias(""));
    }

    #[test]
    fn test_collect_and_neutralize() {
        let source = concat!(
            "{{import s from './styles.scoped.scss'}}\n",
            "{{IMPORT btn from \"../button/styles.scoped.scss\"}}\n",
            "<p></p>"
        );
        for collect in [ast_imports, scanner_imports] {
            let (table, code) = collect(source, &TemplateOptions::default()).unwrap();
            assert_eq!(table.len(), 2);
            assert_eq!(
                table.resolve("s"),
                Some("my-app/components/card/styles.scoped.scss")
            );
            assert_eq!(
                table.resolve("btn"),
                Some("my-app/components/button/styles.scoped.scss")
            );
            assert_eq!(
                code,
                "{{!-- imported styles --}}\n{{!-- imported styles --}}\n<p></p>"
            );
        }
    }

    #[test]
    fn test_duplicate_alias_last_wins() {
        let source = "{{import s from './a.scoped.scss'}}{{import s from './b.scoped.scss'}}";
        for collect in [ast_imports, scanner_imports] {
            let (table, _) = collect(source, &TemplateOptions::default()).unwrap();
            assert_eq!(table.directives().len(), 2);
            assert_eq!(table.resolve("s"), Some("my-app/components/card/b.scoped.scss"));
        }
    }

    #[test]
    fn test_invalid_alias_names_the_file() {
        let source = "<div>\n  {{import My Name from './styles.scoped.scss'}}\n</div>";
        for collect in [ast_imports, scanner_imports] {
            let err = collect(source, &TemplateOptions::default()).unwrap_err();
            assert_eq!(err, TransformError::invalid_identifier(MODULE, "My Name"));
        }
    }

    #[test]
    fn test_skip_alias_validation() {
        let options = TemplateOptions {
            skip_alias_validation: true,
            ..Default::default()
        };
        let source = "{{import my_styles from './styles.scoped.scss'}}";
        for collect in [ast_imports, scanner_imports] {
            let (table, _) = collect(source, &options).unwrap();
            assert!(table.resolve("my_styles").is_some());
        }
    }

    #[test]
    fn test_whitespace_control_carries_over() {
        let source = "<p>\n  {{~import s from './styles.scoped.scss'~}}\n  {{~ import t from './t.scoped.scss' }}\n</p>";
        for collect in [ast_imports, scanner_imports] {
            let (table, code) = collect(source, &TemplateOptions::default()).unwrap();
            assert_eq!(table.len(), 2);
            assert_eq!(
                code,
                "<p>\n  {{~!-- imported styles --~}}\n  {{~!-- imported styles --}}\n</p>"
            );
        }
    }

    #[test]
    fn test_directive_in_tag_position() {
        let source = "<div {{import t from './y.scoped.scss'}} class=\"a\"></div>";
        for collect in [ast_imports, scanner_imports] {
            let (table, code) = collect(source, &TemplateOptions::default()).unwrap();
            assert_eq!(table.resolve("t"), Some("my-app/components/card/y.scoped.scss"));
            assert_eq!(code, "<div {{!-- imported styles --}} class=\"a\"></div>");
        }
    }

    #[test]
    fn test_commented_directives_are_ignored() {
        let source = concat!(
            "{{!-- {{import s from './styles.scoped.scss'}} --}}",
            "<!-- {{import t from './x.scoped.scss'}} -->"
        );
        for collect in [ast_imports, scanner_imports] {
            let (table, code) = collect(source, &TemplateOptions::default()).unwrap();
            assert!(table.is_empty());
            assert_eq!(code, source);
        }
    }
}
