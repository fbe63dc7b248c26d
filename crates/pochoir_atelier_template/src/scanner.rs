//! Text-level template rewriting without a parse.
//!
//! The scanner sees a template as text. HTML comments, mustache comments and
//! the bodies of `<script>` and `<style>` are cut out first; everything else
//! is searched with regular expressions and rewritten through byte-range
//! edits that are applied in one pass at the end.

use std::ops::Range;

use once_cell::sync::Lazy;
use pochoir_croquis::UsageLedger;
use pochoir_relief::{LineIndex, PathExpression, TransformResult};
use regex::Regex;

use crate::{imports, usage, TemplateOptions, TemplateOutput};

/// Regions the scanner never looks into.
static EXCLUDED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<!--.*?-->|\{\{~?!--.*?--~?\}\}|\{\{~?!.*?\}\}|(?i:<script\b.*?</script\s*>)|(?i:<style\b.*?</style\s*>)",
    )
    .unwrap()
});

/// `{{ ... }}` up to the first `}}` outside a string literal.
pub(crate) static MUSTACHE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\{(?:[^}"']|"[^"]*"|'[^']*')*\}\}"#).unwrap());

/// A byte-range replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    #[inline]
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.range.start < range.end && range.start < self.range.end
    }
}

/// Shared state of one scanner run.
pub(crate) struct Scan<'a> {
    pub source: &'a str,
    pub lines: LineIndex,
    /// Searchable ranges, in order
    pub segments: Vec<Range<usize>>,
    pub edits: Vec<Edit>,
}

impl<'a> Scan<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            segments: segments(source),
            edits: Vec::new(),
        }
    }

    /// Whether the `{{` at `at` is escaped with a backslash.
    #[inline]
    pub fn is_escaped(&self, at: usize) -> bool {
        at > 0 && self.source.as_bytes()[at - 1] == b'\\'
    }

    /// Path expression over `range` of the source.
    pub fn path_at(&self, range: Range<usize>) -> PathExpression {
        let loc = self.lines.location(range.start, range.end);
        PathExpression::new(&self.source[range], loc)
    }

    pub fn is_edited(&self, range: &Range<usize>) -> bool {
        self.edits.iter().any(|edit| edit.overlaps(range))
    }

    /// Apply all edits to the source.
    pub fn finish(mut self) -> String {
        self.edits.sort_by_key(|edit| edit.range.start);
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for edit in &self.edits {
            out.push_str(&self.source[cursor..edit.range.start]);
            out.push_str(&edit.replacement);
            cursor = edit.range.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

/// Complement of the excluded regions of `source`.
fn segments(source: &str) -> Vec<Range<usize>> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for excluded in EXCLUDED_RE.find_iter(source) {
        if excluded.start() > cursor {
            segments.push(cursor..excluded.start());
        }
        cursor = excluded.end();
    }
    if cursor < source.len() {
        segments.push(cursor..source.len());
    }
    segments
}

/// Rewrite a template in scanner mode.
pub(crate) fn rewrite(
    source: &str,
    module_name: &str,
    options: &TemplateOptions,
    ledger: &UsageLedger,
) -> TransformResult<TemplateOutput> {
    let mut scan = Scan::new(source);
    let table = imports::scan_imports(&mut scan, module_name, options)?;
    let usages = usage::scan_usages(&mut scan, &table, options.naming, ledger);
    Ok(TemplateOutput {
        code: scan.finish(),
        imports: table.into_directives(),
        usages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_skip_comments_and_raw_text() {
        let source = "a<!-- {{x}} -->b{{!-- {{y}} --}}c{{! z }}d<STYLE>.e{}</style>f";
        let parts: Vec<_> = segments(source).into_iter().map(|r| &source[r]).collect();
        assert_eq!(parts, ["a", "b", "c", "d", "f"]);
    }

    #[test]
    fn test_mustache_re_skips_braces_in_strings() {
        let source = r#"{{concat "}}" s.x}} rest"#;
        let m = MUSTACHE_RE.find(source).unwrap();
        assert_eq!(m.as_str(), r#"{{concat "}}" s.x}}"#);
    }

    #[test]
    fn test_finish_applies_edits_in_order() {
        let mut scan = Scan::new("0123456789");
        scan.edits.push(Edit::new(6..8, "b"));
        scan.edits.push(Edit::new(1..3, "a"));
        assert!(scan.is_edited(&(2..4)));
        assert!(!scan.is_edited(&(3..6)));
        assert_eq!(scan.finish(), "0a345b89");
    }
}
