//! Class selector rewriting.

use pochoir_carton::{
    naming::scoped_name,
    path::{join, swap_extension},
    CompactString, NamingScheme,
};
use pochoir_croquis::UsageLedger;
use pochoir_relief::{LineIndex, SourceLocation, TransformResult};
use serde::{Deserialize, Serialize};

use crate::parser::parse_stylesheet;
use crate::stylesheet::StyleNode;

/// Extension of style modules that get scoped
pub const SOURCE_EXTENSION: &str = "scoped.scss";

/// Extension of rewritten style modules
pub const TARGET_EXTENSION: &str = "pod.scss";

/// Which rules get their selectors rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    /// Top-level rules only
    #[default]
    Shallow,
    /// Rules at every nesting level, including inside at-rules
    Deep,
}

impl TraversalMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shallow => "shallow",
            Self::Deep => "deep",
        }
    }
}

/// Style rewrite options
#[derive(Debug, Clone, Default)]
pub struct StyleOptions {
    pub traversal: TraversalMode,
    pub naming: NamingScheme,
}

/// A class defined by a style module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    pub class_name: CompactString,
    /// Location of the `.class` selector
    pub loc: SourceLocation,
}

/// Rewritten style module
#[derive(Debug, Clone)]
pub struct StyleOutput {
    pub code: String,
    /// Relative path with [`SOURCE_EXTENSION`] swapped for [`TARGET_EXTENSION`]
    pub target_path: String,
    /// Namespace-qualified module path fed to the naming function
    pub module_path: String,
    /// Definitions in source order; a class defined twice appears twice
    pub definitions: Vec<ClassDefinition>,
}

/// Rewrite the class selectors of one style module.
///
/// Definitions are registered in `ledger` only once the whole module has
/// rewritten successfully.
pub fn rewrite_style(
    source: &str,
    namespace: &str,
    relative_path: &str,
    options: &StyleOptions,
    ledger: &UsageLedger,
) -> TransformResult<StyleOutput> {
    let module_path = join(namespace, relative_path);
    let sheet = parse_stylesheet(source, &module_path)?;

    let mut edits = Vec::new();
    let rules = Rules {
        source,
        traversal: options.traversal,
    };
    rules.collect(&sheet.nodes, true, &mut edits);

    let lines = LineIndex::new(source);
    let mut code = String::with_capacity(source.len() + edits.len() * 8);
    let mut definitions = Vec::with_capacity(edits.len());
    let mut cursor = 0;
    for (start, end) in edits {
        let class_name = &source[start + 1..end];
        code.push_str(&source[cursor..start]);
        code.push('.');
        code.push_str(&scoped_name(class_name, &module_path, options.naming));
        cursor = end;
        definitions.push(ClassDefinition {
            class_name: CompactString::from(class_name),
            loc: lines.location(start, end),
        });
    }
    code.push_str(&source[cursor..]);

    ledger.register_defined_classes(
        &module_path,
        definitions.iter().map(|d| d.class_name.as_str()),
    );
    tracing::debug!(
        "style: {} rewrote {} class selectors",
        module_path,
        definitions.len()
    );

    let target_path = swap_extension(relative_path, SOURCE_EXTENSION, TARGET_EXTENSION)
        .unwrap_or_else(|| relative_path.to_string());
    Ok(StyleOutput {
        code,
        target_path,
        module_path,
        definitions,
    })
}

struct Rules<'a> {
    source: &'a str,
    traversal: TraversalMode,
}

impl Rules<'_> {
    /// Push the byte range of every rewritable `.class` selector, in order.
    fn collect(&self, nodes: &[StyleNode], top_level: bool, edits: &mut Vec<(usize, usize)>) {
        for node in nodes {
            if let StyleNode::Rule(rule) = node {
                if top_level || self.traversal == TraversalMode::Deep {
                    let prelude = rule.prelude.range();
                    for (start, end) in split_selectors(&self.source[prelude.clone()]) {
                        let selector = &self.source[prelude.start + start..prelude.start + end];
                        if class_selector_name(selector).is_some() {
                            edits.push((prelude.start + start, prelude.start + end));
                        }
                    }
                }
            }
            if self.traversal == TraversalMode::Deep {
                self.collect(node.children(), false, edits);
            }
        }
    }
}

/// Trimmed byte ranges of the comma-separated selectors in `prelude`.
fn split_selectors(prelude: &str) -> Vec<(usize, usize)> {
    let bytes = prelude.as_bytes();
    let mut ranges = Vec::new();
    let mut depth = 0u32;
    let mut quote = None;
    let mut start = 0;

    for (i, &c) in bytes.iter().enumerate() {
        match (quote, c) {
            (Some(q), _) if c == q && (i == 0 || bytes[i - 1] != b'\\') => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(c),
            (None, b'(' | b'[') => depth += 1,
            (None, b')' | b']') => depth = depth.saturating_sub(1),
            (None, b',') if depth == 0 => {
                ranges.push(trimmed(prelude, start, i));
                start = i + 1;
            }
            _ => {}
        }
    }
    ranges.push(trimmed(prelude, start, bytes.len()));
    ranges
}

fn trimmed(s: &str, start: usize, end: usize) -> (usize, usize) {
    let part = &s[start..end];
    let lead = part.len() - part.trim_start().len();
    let trail = part.len() - part.trim_end().len();
    if lead == part.len() {
        return (start, start);
    }
    (start + lead, end - trail)
}

/// Class name of a selector that is exactly one class selector.
///
/// ```
/// use pochoir_atelier_style::class_selector_name;
///
/// assert_eq!(class_selector_name(".card-title"), Some("card-title"));
/// assert_eq!(class_selector_name(".card .title"), None);
/// assert_eq!(class_selector_name(".card:hover"), None);
/// ```
pub fn class_selector_name(selector: &str) -> Option<&str> {
    let name = selector.strip_prefix('.')?;
    is_css_identifier(name).then_some(name)
}

fn is_css_identifier(name: &str) -> bool {
    let is_start = |c: char| c.is_ascii_alphabetic() || c == '_' || !c.is_ascii();
    let is_rest = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii();

    let mut chars = name.chars();
    let valid_start = match chars.next() {
        Some('-') => matches!(chars.next(), Some(c) if is_start(c) || c == '-'),
        Some(c) => is_start(c),
        None => false,
    };
    valid_start && chars.all(is_rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMESPACE: &str = "my-app";
    const PATH: &str = "components/card/styles.scoped.scss";

    fn rewrite(source: &str, traversal: TraversalMode) -> StyleOutput {
        let options = StyleOptions {
            traversal,
            naming: NamingScheme::Flat,
        };
        rewrite_style(source, NAMESPACE, PATH, &options, &UsageLedger::new()).unwrap()
    }

    fn scoped(class_name: &str) -> String {
        scoped_name(class_name, "my-app/components/card/styles.scoped.scss", NamingScheme::Flat)
    }

    #[test]
    fn test_golden_prefixed() {
        let ledger = UsageLedger::new();
        let options = StyleOptions {
            naming: NamingScheme::Prefixed,
            ..Default::default()
        };
        let output = rewrite_style(
            ".card-title { font-weight: bold; }",
            "my-app",
            "app/components/card/pod-styles.scoped.scss",
            &options,
            &ledger,
        )
        .unwrap();
        insta::assert_snapshot!(output.code, @".card_card-title_4e461 { font-weight: bold; }");
        assert_eq!(output.module_path, "my-app/app/components/card/pod-styles.scoped.scss");
        assert_eq!(
            ledger.defined_classes("my-app/app/components/card/pod-styles.scoped.scss"),
            ["card-title"]
        );
    }

    #[test]
    fn test_only_single_class_selectors() {
        let source = ".a, .b > .c, div.d, .e:hover, .f .g, #h, .i {}";
        let output = rewrite(source, TraversalMode::Deep);
        let expected = format!(
            ".{}, .b > .c, div.d, .e:hover, .f .g, #h, .{} {{}}",
            scoped("a"),
            scoped("i")
        );
        assert_eq!(output.code, expected);
        let names: Vec<_> = output.definitions.iter().map(|d| d.class_name.as_str()).collect();
        assert_eq!(names, ["a", "i"]);
    }

    #[test]
    fn test_shallow_and_deep() {
        let source = ".outer {\n  .inner { color: red; }\n}\n@media print {\n  .printed { display: none; }\n}\n";

        let shallow = rewrite(source, TraversalMode::Shallow);
        let names: Vec<_> = shallow.definitions.iter().map(|d| d.class_name.as_str()).collect();
        assert_eq!(names, ["outer"]);
        assert!(shallow.code.contains("  .inner { color: red; }"));

        let deep = rewrite(source, TraversalMode::Deep);
        let names: Vec<_> = deep.definitions.iter().map(|d| d.class_name.as_str()).collect();
        assert_eq!(names, ["outer", "inner", "printed"]);
        assert!(deep.code.contains(&format!("@media print {{\n  .{} {{", scoped("printed"))));
    }

    #[test]
    fn test_default_options_touch_top_level_rules_only() {
        let ledger = UsageLedger::new();
        let source = ".outer {\n  .inner {}\n}\n@media print {\n  .printed {}\n}\n";
        let options = StyleOptions::default();
        let output = rewrite_style(source, NAMESPACE, PATH, &options, &ledger).unwrap();
        assert_eq!(output.code, source.replacen(".outer", &format!(".{}", scoped("outer")), 1));
        assert_eq!(
            ledger.defined_classes("my-app/components/card/styles.scoped.scss"),
            ["outer"]
        );
    }

    #[test]
    fn test_nested_only_module_registers_nothing() {
        let ledger = UsageLedger::new();
        let options = StyleOptions::default();
        rewrite_style("@media print { .a {} }", NAMESPACE, PATH, &options, &ledger).unwrap();
        let plain = "div { color: red; }";
        rewrite_style(plain, NAMESPACE, "b.scoped.scss", &options, &ledger).unwrap();
        assert_eq!(ledger.module_count(), 0);
    }

    #[test]
    fn test_everything_else_is_verbatim() {
        let source = "// .commented { }\n/* .blocked { } */\n$gap: 4px; // trailing\n.a {\n  content: \".b { }\";\n  margin: #{$gap}\n}\n";
        let output = rewrite(source, TraversalMode::Deep);
        assert_eq!(output.code, source.replacen(".a {", &format!(".{} {{", scoped("a")), 1));
        assert_eq!(output.definitions.len(), 1);
        assert_eq!(output.definitions[0].loc.start.line, 4);
    }

    #[test]
    fn test_target_path() {
        let output = rewrite(".a {}", TraversalMode::Deep);
        assert_eq!(output.target_path, "components/card/styles.pod.scss");
    }

    #[test]
    fn test_failed_module_registers_nothing() {
        let ledger = UsageLedger::new();
        let result = rewrite_style(
            ".a { color: red; }\n.b {",
            NAMESPACE,
            PATH,
            &StyleOptions::default(),
            &ledger,
        );
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "my-app/components/card/styles.scoped.scss:2:4: Unclosed block"
        );
        assert_eq!(ledger.module_count(), 0);
    }

    #[test]
    fn test_css_identifiers() {
        assert!(is_css_identifier("card-title"));
        assert!(is_css_identifier("_private"));
        assert!(is_css_identifier("-webkit-thing"));
        assert!(is_css_identifier("--custom"));
        assert!(is_css_identifier("café"));
        assert!(!is_css_identifier("1col"));
        assert!(!is_css_identifier("-1col"));
        assert!(!is_css_identifier(""));
        assert!(!is_css_identifier("a.b"));
    }
}
