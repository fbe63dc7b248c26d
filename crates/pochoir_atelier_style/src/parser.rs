//! Statement-level SCSS parser.
//!
//! Only statement boundaries are recognized: `{`, `;` and `}` outside of
//! strings, comments, parentheses and `#{}` interpolation. Selectors and
//! values are left to whoever reads the spans.

use memchr::{memchr, memmem};
use pochoir_carton::CompactString;
use pochoir_relief::{LineIndex, TransformError, TransformResult};

use crate::stylesheet::{AtRuleNode, CommentNode, DeclarationNode, RuleNode, StyleNode, Stylesheet};

/// Parse an SCSS style module into a [`Stylesheet`].
///
/// `path` only appears in error messages.
pub fn parse_stylesheet(source: &str, path: &str) -> TransformResult<Stylesheet> {
    let mut parser = StyleParser {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        lines: LineIndex::new(source),
        path,
    };
    let nodes = parser.parse_nodes(None)?;
    Ok(Stylesheet {
        nodes,
        loc: parser.lines.location(0, source.len()),
    })
}

struct StyleParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    lines: LineIndex,
    path: &'a str,
}

impl StyleParser<'_> {
    fn error(&self, at: usize, message: &str) -> TransformError {
        TransformError::parse(self.path, self.lines.position(at), message)
    }

    #[inline]
    fn byte(&self, at: usize) -> Option<u8> {
        self.bytes.get(at).copied()
    }

    /// Statements until the end of input, or until the `}` closing the block
    /// opened at `open`.
    fn parse_nodes(&mut self, open: Option<usize>) -> TransformResult<Vec<StyleNode>> {
        let mut nodes = Vec::new();
        loop {
            while self.byte(self.pos).is_some_and(|c| c.is_ascii_whitespace()) {
                self.pos += 1;
            }
            let Some(c) = self.byte(self.pos) else {
                return match open {
                    Some(at) => Err(self.error(at, "Unclosed block")),
                    None => Ok(nodes),
                };
            };

            match (c, self.byte(self.pos + 1)) {
                (b'}', _) => {
                    if open.is_none() {
                        return Err(self.error(self.pos, "Unexpected '}'"));
                    }
                    self.pos += 1;
                    return Ok(nodes);
                }
                (b'/', Some(b'*')) => {
                    let start = self.pos;
                    self.pos = self.skip_block_comment(start)?;
                    nodes.push(StyleNode::Comment(CommentNode {
                        is_line: false,
                        loc: self.lines.location(start, self.pos),
                    }));
                }
                (b'/', Some(b'/')) => {
                    let start = self.pos;
                    self.pos = self.line_end(start);
                    nodes.push(StyleNode::Comment(CommentNode {
                        is_line: true,
                        loc: self.lines.location(start, self.pos),
                    }));
                }
                (b';', _) => self.pos += 1,
                _ => nodes.push(self.parse_statement()?),
            }
        }
    }

    fn parse_statement(&mut self) -> TransformResult<StyleNode> {
        let start = self.pos;
        let (end, terminator) = self.scan_statement(start)?;
        let at_rule = self.bytes[start] == b'@';

        let (children, stop) = match terminator {
            Some(b'{') => {
                self.pos = end + 1;
                let children = self.parse_nodes(Some(end))?;
                (Some(children), self.pos)
            }
            Some(b';') => {
                self.pos = end + 1;
                (None, self.pos)
            }
            // `}` or end of input: the statement is a final declaration
            // without a semicolon, and the `}` belongs to the parent
            _ => {
                self.pos = end;
                (None, end)
            }
        };
        let loc = self.lines.location(start, stop);

        if at_rule {
            let name_end = start
                + 1
                + self.bytes[start + 1..end]
                    .iter()
                    .take_while(|c| c.is_ascii_alphanumeric() || **c == b'-' || **c == b'_')
                    .count();
            return Ok(StyleNode::AtRule(AtRuleNode {
                name: CompactString::from(&self.source[start + 1..name_end]),
                prelude: self.lines.location(name_end, end),
                children,
                loc,
            }));
        }

        Ok(match children {
            Some(children) => StyleNode::Rule(RuleNode {
                prelude: self.lines.location(start, end),
                children,
                loc,
            }),
            None => StyleNode::Declaration(DeclarationNode { loc }),
        })
    }

    /// Index and byte of the first `{`, `;` or `}` that ends the statement
    /// starting at `start`; `(len, None)` at end of input.
    fn scan_statement(&self, start: usize) -> TransformResult<(usize, Option<u8>)> {
        let mut i = start;
        let mut parens = 0u32;
        while let Some(c) = self.byte(i) {
            match (c, self.byte(i + 1)) {
                (b'"' | b'\'', _) => i = self.skip_string(i)?,
                (b'/', Some(b'*')) => i = self.skip_block_comment(i)?,
                (b'/', Some(b'/')) if parens == 0 => i = self.line_end(i),
                (b'#', Some(b'{')) => i = self.skip_interpolation(i)?,
                (b'(', _) => {
                    parens += 1;
                    i += 1;
                }
                (b')', _) => {
                    parens = parens.saturating_sub(1);
                    i += 1;
                }
                (b'{' | b';' | b'}', _) if parens == 0 => return Ok((i, Some(c))),
                _ => i += 1,
            }
        }
        Ok((self.bytes.len(), None))
    }

    /// Offset just past the string opening at `start`.
    fn skip_string(&self, start: usize) -> TransformResult<usize> {
        let quote = self.bytes[start];
        let mut i = start + 1;
        loop {
            match self.byte(i) {
                Some(b'\\') => i += 2,
                Some(c) if c == quote => return Ok(i + 1),
                Some(b'\n') | None => return Err(self.error(start, "Unterminated string")),
                Some(_) => i += 1,
            }
        }
    }

    /// Offset just past the `/* */` comment opening at `start`.
    fn skip_block_comment(&self, start: usize) -> TransformResult<usize> {
        memmem::find(&self.bytes[start + 2..], b"*/")
            .map(|end| start + 2 + end + 2)
            .ok_or_else(|| self.error(start, "Unterminated comment"))
    }

    /// Offset just past the `#{...}` interpolation opening at `start`.
    fn skip_interpolation(&self, start: usize) -> TransformResult<usize> {
        let mut depth = 1u32;
        let mut i = start + 2;
        loop {
            match self.byte(i) {
                None => return Err(self.error(start, "Unterminated interpolation")),
                Some(b'"' | b'\'') => i = self.skip_string(i)?,
                Some(b'{') => {
                    depth += 1;
                    i += 1;
                }
                Some(b'}') => {
                    depth -= 1;
                    i += 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                Some(_) => i += 1,
            }
        }
    }

    /// Offset of the newline ending the line at `start`, or end of input.
    fn line_end(&self, start: usize) -> usize {
        memchr(b'\n', &self.bytes[start..]).map_or(self.bytes.len(), |i| start + i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Stylesheet {
        parse_stylesheet(source, "my-app/card/styles.scoped.scss").unwrap()
    }

    fn kinds(nodes: &[StyleNode]) -> Vec<&'static str> {
        nodes
            .iter()
            .map(|n| match n {
                StyleNode::Rule(_) => "rule",
                StyleNode::AtRule(_) => "at-rule",
                StyleNode::Declaration(_) => "declaration",
                StyleNode::Comment(_) => "comment",
            })
            .collect()
    }

    #[test]
    fn test_parse_statements() {
        let source = "@use \"sass:math\";\n$gap: 4px;\n// note\n.a { color: red; .b { margin: 0 } }\n/* end */";
        let sheet = parse(source);
        assert_eq!(
            kinds(&sheet.nodes),
            ["at-rule", "declaration", "comment", "rule", "comment"]
        );
        let StyleNode::Rule(rule) = &sheet.nodes[3] else {
            panic!("expected rule");
        };
        assert_eq!(&source[rule.prelude.range()], ".a ");
        assert_eq!(kinds(&rule.children), ["declaration", "rule"]);
        assert_eq!(kinds(rule.children[1].children()), ["declaration"]);
    }

    #[test]
    fn test_at_rule_blocks() {
        let source = "@media (min-width: 600px) { .wide { display: block; } }";
        let sheet = parse(source);
        let StyleNode::AtRule(media) = &sheet.nodes[0] else {
            panic!("expected at-rule");
        };
        assert_eq!(media.name, "media");
        assert_eq!(&source[media.prelude.range()], " (min-width: 600px) ");
        assert_eq!(kinds(media.children.as_deref().unwrap()), ["rule"]);
    }

    #[test]
    fn test_braces_inside_strings_comments_and_interpolation() {
        let source = ".a::after { content: \"}\"; /* { */ }\n.b-#{$name} { width: calc(100% - #{$gap}); }\n.c { background: url(data:x;y) }";
        let sheet = parse(source);
        assert_eq!(kinds(&sheet.nodes), ["rule", "rule", "rule"]);
        let StyleNode::Rule(a) = &sheet.nodes[0] else {
            panic!("expected rule");
        };
        assert_eq!(kinds(&a.children), ["declaration", "comment"]);
    }

    #[test]
    fn test_locations() {
        let sheet = parse(".a {\n  color: red;\n}\n");
        let StyleNode::Rule(rule) = &sheet.nodes[0] else {
            panic!("expected rule");
        };
        assert_eq!(rule.loc.start.line, 1);
        assert_eq!(rule.loc.end.line, 3);
        assert_eq!(rule.children[0].loc().start.column, 3);
    }

    #[test]
    fn test_errors() {
        let cases = [
            (".a { color: red;", "1:4: Unclosed block"),
            (".a { }\n}", "2:1: Unexpected '}'"),
            ("/* open", "1:1: Unterminated comment"),
            (".a { content: \"open; }", "1:15: Unterminated string"),
            (".a-#{$x { }", "1:4: Unterminated interpolation"),
        ];
        for (source, expected) in cases {
            let err = parse_stylesheet(source, "s.scss").unwrap_err();
            assert_eq!(err.to_string(), format!("s.scss:{}", expected), "{:?}", source);
        }
    }
}
