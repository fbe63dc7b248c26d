//! Class usage rewriting.
//!
//! A usage is a path `alias.member` whose alias was bound by an import
//! directive of the same template. It is rewritten in three positions:
//!
//! - (a) the whole value of a `class` attribute:
//!   `class={{s.primary}}` becomes `class="primary_xxxxx"`
//! - (b) one interpolated part of a quoted `class` value:
//!   `class="btn {{s.primary}}"` becomes `class="btn primary_xxxxx"`
//! - (c) any other path inside a mustache or sub-expression:
//!   `{{if active s.on}}` becomes `{{if active "on_xxxxx"}}`
//!
//! Paths with an unknown alias are left alone.

use std::ops::Range;

use once_cell::sync::Lazy;
use pochoir_carton::{naming::scoped_name, CompactString, NamingScheme};
use pochoir_croquis::UsageLedger;
use pochoir_relief::{
    builders, replace_node, AttrValue, AttributeNode, ConcatPart, Expression, MustacheKind,
    MustacheNode, PathExpression, SourceLocation, Template, TemplateNode,
};
use regex::Regex;

use crate::imports::ImportTable;
use crate::scanner::{Edit, Scan, MUSTACHE_RE};

/// `class=` right before an attribute value.
static CLASS_ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)class\s*=\s*").unwrap());

/// `{{path}}` with nothing but a single path inside.
static BARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\{~?\s*(?:&\s*)?([^\s{}()"'=|~#/^>!&][^\s{}()"'=|~]*)\s*~?\}\}"#).unwrap()
});

/// Tokens of a mustache body: strings, parens and paths.
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""[^"]*"|'[^']*'|\(|\)|[^\s(){}=|~"']+"#).unwrap());

/// A resolved class usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassUsage {
    /// Import alias the usage went through
    pub local_name: CompactString,
    /// Class name inside the imported module
    pub member: CompactString,
    /// Module path the alias is bound to
    pub import_path: String,
    pub scoped_name: String,
    /// Location of the `alias.member` path
    pub loc: SourceLocation,
}

/// Maps `alias.member` paths through the import table and records every hit.
struct Resolver<'r> {
    table: &'r ImportTable,
    naming: NamingScheme,
    ledger: &'r UsageLedger,
    usages: Vec<ClassUsage>,
}

impl<'r> Resolver<'r> {
    fn new(table: &'r ImportTable, naming: NamingScheme, ledger: &'r UsageLedger) -> Self {
        Self {
            table,
            naming,
            ledger,
            usages: Vec::new(),
        }
    }

    /// Scoped name for `path`, if its alias is imported.
    fn resolve(&mut self, path: &PathExpression) -> Option<String> {
        let (local_name, member) = path.split_member()?;
        let import_path = self.table.resolve(local_name)?;
        let scoped = scoped_name(member, import_path, self.naming);

        self.ledger.register_used_class(import_path, member);
        self.usages.push(ClassUsage {
            local_name: CompactString::from(local_name),
            member: CompactString::from(member),
            import_path: import_path.to_string(),
            scoped_name: scoped.clone(),
            loc: path.loc,
        });
        Some(scoped)
    }

    fn finish(mut self) -> Vec<ClassUsage> {
        self.usages.sort_by_key(|usage| usage.loc.start.offset);
        self.usages
    }
}

/// Rewrite the class usages of a parsed template in place.
pub fn rewrite_usages(
    template: &mut Template,
    table: &ImportTable,
    naming: NamingScheme,
    ledger: &UsageLedger,
) -> Vec<ClassUsage> {
    let mut rewriter = UsageRewriter {
        resolver: Resolver::new(table, naming, ledger),
    };
    rewriter.visit_nodes(&mut template.body);
    rewriter.resolver.finish()
}

struct UsageRewriter<'r> {
    resolver: Resolver<'r>,
}

impl UsageRewriter<'_> {
    fn visit_nodes(&mut self, nodes: &mut [TemplateNode]) {
        for node in nodes {
            match node {
                TemplateNode::Element(element) => {
                    for attr in &mut element.attributes {
                        self.visit_attribute(attr);
                    }
                    for modifier in &mut element.modifiers {
                        self.visit_mustache(modifier);
                    }
                    self.visit_nodes(&mut element.children);
                }
                TemplateNode::Mustache(mustache) => self.visit_mustache(mustache),
                TemplateNode::Text(_) | TemplateNode::Comment(_) => {}
            }
        }
    }

    fn visit_attribute(&mut self, attr: &mut AttributeNode) {
        let is_class = attr.name == "class";
        let Some(value) = attr.value.as_mut() else {
            return;
        };

        let replacement = match value {
            AttrValue::Mustache(mustache) if is_class => self
                .class_value(mustache)
                .map(|scoped| builders::attr_text(scoped, mustache.loc)),
            _ => None,
        };
        if let Some(replacement) = replacement {
            replace_node(value, replacement);
            return;
        }

        match value {
            AttrValue::Mustache(mustache) => self.visit_mustache(mustache),
            AttrValue::Concat(concat) => {
                for part in &mut concat.parts {
                    let replacement = match part {
                        ConcatPart::Mustache(mustache) if is_class => self
                            .class_value(mustache)
                            .map(|scoped| ConcatPart::Text(builders::text(scoped, mustache.loc))),
                        _ => None,
                    };
                    match (replacement, part) {
                        (Some(replacement), part) => {
                            replace_node(part, replacement);
                        }
                        (None, ConcatPart::Mustache(mustache)) => self.visit_mustache(mustache),
                        (None, ConcatPart::Text(_)) => {}
                    }
                }
            }
            AttrValue::Text { .. } => {}
        }
    }

    /// Scoped name for a `class` value that is a lone `{{alias.member}}`.
    fn class_value(&mut self, mustache: &MustacheNode) -> Option<String> {
        if mustache.trusting || !mustache.block_params.is_empty() {
            return None;
        }
        let path = mustache.bare_path()?;
        self.resolver.resolve(path)
    }

    fn visit_mustache(&mut self, mustache: &mut MustacheNode) {
        // The head is a helper name unless the mustache is a lone value
        let lone_value = mustache.kind == MustacheKind::Plain
            && mustache.params.is_empty()
            && mustache.hash.is_empty()
            && mustache.block_params.is_empty();
        if lone_value || !matches!(mustache.path, Expression::Path(_)) {
            self.visit_expression(&mut mustache.path);
        }
        for param in &mut mustache.params {
            self.visit_expression(param);
        }
        for pair in &mut mustache.hash {
            self.visit_expression(&mut pair.value);
        }
    }

    fn visit_expression(&mut self, expr: &mut Expression) {
        let replacement = match expr {
            Expression::Path(path) => self
                .resolver
                .resolve(path)
                .map(|scoped| builders::string_literal(scoped, path.loc)),
            Expression::SubExpression(sub) => {
                for param in &mut sub.params {
                    self.visit_expression(param);
                }
                for pair in &mut sub.hash {
                    self.visit_expression(&mut pair.value);
                }
                None
            }
            Expression::StringLiteral(_) | Expression::NumberLiteral(_) => None,
        };
        if let Some(literal) = replacement {
            replace_node(expr, Expression::StringLiteral(literal));
        }
    }
}

/// Rewrite the class usages of a raw template by queueing edits on `scan`.
pub(crate) fn scan_usages(
    scan: &mut Scan<'_>,
    table: &ImportTable,
    naming: NamingScheme,
    ledger: &UsageLedger,
) -> Vec<ClassUsage> {
    let mut resolver = Resolver::new(table, naming, ledger);
    scan_class_attributes(scan, &mut resolver);
    scan_mustaches(scan, &mut resolver);
    resolver.finish()
}

/// Positions (a) and (b).
fn scan_class_attributes(scan: &mut Scan<'_>, resolver: &mut Resolver<'_>) {
    let source = scan.source;
    let mut edits = Vec::new();
    for segment in scan.segments.clone() {
        for m in CLASS_ATTR_RE.find_iter(&source[segment.clone()]) {
            let at = segment.start + m.end();
            match source.as_bytes().get(at) {
                Some(b'{') => {
                    if let Some((whole, path)) = bare_mustache(source, at) {
                        let path = scan.path_at(path);
                        if let Some(scoped) = resolver.resolve(&path) {
                            edits.push(Edit::new(whole, format!("\"{}\"", scoped)));
                        }
                    }
                }
                Some(&quote @ (b'"' | b'\'')) => {
                    let parts = quoted_class_parts(source, at, quote).unwrap_or_default();
                    for (whole, path) in parts {
                        let path = scan.path_at(path);
                        if let Some(scoped) = resolver.resolve(&path) {
                            edits.push(Edit::new(whole, scoped));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    for edit in edits {
        if !scan.is_edited(&edit.range) {
            scan.edits.push(edit);
        }
    }
}

/// Range of the `{{path}}` starting exactly at `at` and the range of its path.
fn bare_mustache(source: &str, at: usize) -> Option<(Range<usize>, Range<usize>)> {
    let caps = BARE_RE.captures_at(source, at)?;
    let whole = caps.get(0)?;
    let path = caps.get(1)?;
    (whole.start() == at && !is_number(path.as_str())).then(|| (whole.range(), path.range()))
}

/// Bare mustaches of the quoted value opening at `open`, or `None` when the
/// value never closes.
fn quoted_class_parts(
    source: &str,
    open: usize,
    quote: u8,
) -> Option<Vec<(Range<usize>, Range<usize>)>> {
    let bytes = source.as_bytes();
    let mut parts = Vec::new();
    let mut i = open + 1;
    loop {
        match bytes.get(i) {
            None => return None,
            Some(&c) if c == quote => return Some(parts),
            Some(b'{')
                if bytes[i..].starts_with(b"{{")
                    && bytes[i - 1] != b'\\'
                    && !bytes[i..].starts_with(b"{{!")
                    && !bytes[i..].starts_with(b"{{~!") =>
            {
                let mustache = MUSTACHE_RE.find_at(source, i).filter(|m| m.start() == i)?;
                let part =
                    bare_mustache(source, i).filter(|(whole, _)| whole.end == mustache.end());
                parts.extend(part);
                i = mustache.end();
            }
            Some(_) => i += 1,
        }
    }
}

/// Position (c): paths anywhere else inside a mustache.
fn scan_mustaches(scan: &mut Scan<'_>, resolver: &mut Resolver<'_>) {
    let source = scan.source;
    let mut edits = Vec::new();
    for segment in scan.segments.clone() {
        for m in MUSTACHE_RE.find_iter(&source[segment.clone()]) {
            let range = segment.start + m.start()..segment.start + m.end();
            if scan.is_escaped(range.start) || scan.is_edited(&range) {
                continue;
            }
            for path in replaceable_paths(source, range) {
                if let Some(scoped) = resolver.resolve(&scan.path_at(path.clone())) {
                    edits.push(Edit::new(path, format!("\"{}\"", scoped)));
                }
            }
        }
    }
    scan.edits.extend(edits);
}

/// Ranges of the paths inside the mustache at `range` that may be rewritten:
/// params, hash values and sub-expression arguments, plus the head when it is
/// the only thing in a plain mustache.
fn replaceable_paths(source: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let bytes = source.as_bytes();
    let end = range.end - 2;
    let mut i = range.start + 2;
    if bytes.get(i) == Some(&b'{') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'~') {
        i += 1;
    }
    while i < end && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let mut lone_value_allowed = true;
    if i < end && matches!(bytes[i], b'#' | b'/' | b'^' | b'>' | b'&') {
        lone_value_allowed = bytes[i] == b'&';
        i += 1;
    }
    if i >= end {
        return Vec::new();
    }

    let mut paths = Vec::new();
    let mut head = None;
    let mut depth = 0u32;
    let mut top_level = 0usize;
    let mut expect_head = true;
    for token in TOKEN_RE.find_iter(&source[i..end]) {
        let token_range = i + token.start()..i + token.end();
        match token.as_str() {
            "(" => {
                if depth == 0 {
                    top_level += 1;
                }
                depth += 1;
                expect_head = true;
            }
            ")" => {
                depth = depth.saturating_sub(1);
                expect_head = false;
            }
            text => {
                let is_head = std::mem::replace(&mut expect_head, false);
                if depth == 0 {
                    top_level += 1;
                }
                let is_hash_key = bytes.get(token_range.end) == Some(&b'=');
                if text.starts_with(['"', '\'']) || is_hash_key || is_number(text) {
                    continue;
                }
                match (is_head, depth) {
                    (false, _) => paths.push(token_range),
                    (true, 0) => head = Some(token_range),
                    // sub-expression helper names are never rewritten
                    (true, _) => {}
                }
            }
        }
    }

    if let Some(head) = head.filter(|_| lone_value_allowed && top_level == 1) {
        paths.push(head);
    }
    paths.sort_by_key(|path| path.start);
    paths
}

/// Whether a token reads as a number literal rather than a path.
fn is_number(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rewrite_template, TemplateMode, TemplateOptions};

    const MODULE: &str = "my-app/components/card/template.hbs";
    const STYLES: &str = "my-app/components/card/styles.scoped.scss";

    fn scoped(class_name: &str) -> String {
        scoped_name(class_name, STYLES, NamingScheme::Flat)
    }

    fn rewrite(source: &str, mode: TemplateMode) -> (String, Vec<ClassUsage>) {
        let options = TemplateOptions {
            mode,
            ..Default::default()
        };
        let output = rewrite_template(source, MODULE, &options, &UsageLedger::new()).unwrap();
        (output.code, output.usages)
    }

    fn both(source: &str) -> String {
        let (ast, ast_usages) = rewrite(source, TemplateMode::Ast);
        let (scanned, scanned_usages) = rewrite(source, TemplateMode::Scanner);
        assert_eq!(ast, scanned, "modes disagree on {:?}", source);
        assert_eq!(ast_usages, scanned_usages, "modes disagree on {:?}", source);
        ast
    }

    #[test]
    fn test_whole_class_value() {
        let code = both("{{import s from './styles.scoped.scss'}}\n<div class={{s.primary}}></div>");
        assert_eq!(
            code,
            format!("{{{{!-- imported styles --}}}}\n<div class=\"{}\"></div>", scoped("primary"))
        );
    }

    #[test]
    fn test_import_in_tag_position() {
        let code = both("<div {{import s from './styles.scoped.scss'}}><p class={{s.a}}></p></div>");
        assert_eq!(
            code,
            format!("<div {{{{!-- imported styles --}}}}><p class=\"{}\"></p></div>", scoped("a"))
        );
    }

    #[test]
    fn test_class_value_part() {
        let code = both("{{import s from './styles.scoped.scss'}}<a class=\"btn {{s.primary}} {{if on s.on}}\"></a>");
        assert_eq!(
            code,
            format!(
                "{{{{!-- imported styles --}}}}<a class=\"btn {} {{{{if on \"{}\"}}}}\"></a>",
                scoped("primary"),
                scoped("on")
            )
        );
    }

    #[test]
    fn test_paths_in_helpers() {
        let code = both(
            "{{import s from './styles.scoped.scss'}}{{#if (eq kind s.big)}}<Card @class={{s.card}} @title={{t title}} {{on \"click\" (fn go s.x)}} />{{/if}}",
        );
        assert_eq!(
            code,
            format!(
                "{{{{!-- imported styles --}}}}{{{{#if (eq kind \"{}\")}}}}<Card @class={{{{\"{}\"}}}} @title={{{{t title}}}} {{{{on \"click\" (fn go \"{}\")}}}} />{{{{/if}}}}",
                scoped("big"),
                scoped("card"),
                scoped("x")
            )
        );
    }

    #[test]
    fn test_unknown_alias_passes_through() {
        let source = "{{import s from './styles.scoped.scss'}}<p class={{foo.bar}}>{{t.title}}</p>";
        let code = both(source);
        assert_eq!(
            code,
            "{{!-- imported styles --}}<p class={{foo.bar}}>{{t.title}}</p>"
        );
        let (_, usages) = rewrite(source, TemplateMode::Ast);
        assert!(usages.is_empty());
    }

    #[test]
    fn test_helper_heads_are_not_rewritten() {
        let source = "{{import s from './styles.scoped.scss'}}{{s.helper s.arg}}{{#s.block}}{{/s.block}}";
        let code = both(source);
        assert_eq!(
            code,
            format!(
                "{{{{!-- imported styles --}}}}{{{{s.helper \"{}\"}}}}{{{{#s.block}}}}{{{{/s.block}}}}",
                scoped("arg")
            )
        );
    }

    #[test]
    fn test_usages_are_recorded() {
        let ledger = UsageLedger::new();
        let source = "{{import ui.s from './styles.scoped.scss'}}<p class=\"{{ui.s.a}}\">{{ui.s.b}}</p>";
        let options = TemplateOptions::default();
        let output = rewrite_template(source, MODULE, &options, &ledger).unwrap();
        let members: Vec<_> = output.usages.iter().map(|u| u.member.as_str()).collect();
        assert_eq!(members, ["a", "b"]);
        assert_eq!(output.usages[0].local_name, "ui.s");
        assert_eq!(output.usages[0].import_path, STYLES);
        assert_eq!(ledger.used_classes(STYLES), ["a", "b"]);
    }

    #[test]
    fn test_replaceable_paths() {
        let cases = [
            ("{{s.a}}", vec!["s.a"]),
            ("{{{s.a}}}", vec!["s.a"]),
            ("{{~ s.a ~}}", vec!["s.a"]),
            ("{{s.a s.b}}", vec!["s.b"]),
            ("{{#if s.a}}", vec!["s.a"]),
            ("{{#s.a}}", vec![]),
            ("{{f key=s.a s.k=1}}", vec!["s.a"]),
            ("{{f (g s.a) \"s.b\" 1.5}}", vec!["s.a"]),
        ];
        for (source, expected) in cases {
            let paths: Vec<_> = replaceable_paths(source, 0..source.len())
                .into_iter()
                .map(|r| &source[r])
                .collect();
            assert_eq!(paths, expected, "{:?}", source);
        }
    }
}
