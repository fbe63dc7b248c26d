//! Recursive-descent parser for Handlebars-flavoured HTML.
//!
//! The parser records a location for every node it builds and never
//! normalizes anything it reads, so [`crate::print_template`] can splice the
//! source gaps back in. It understands just enough HTML to know where tags,
//! attributes and raw-text elements begin and end.

use memchr::{memchr2, memmem};
use pochoir_carton::CompactString;
use pochoir_relief::{
    AttrValue, AttributeNode, CommentKind, CommentNode, ConcatNode, ConcatPart, ElementNode,
    Expression, HashPair, LineIndex, MustacheKind, MustacheNode, NumberLiteral, PathExpression,
    Quote, StringLiteral, SubExpression, Template, TemplateNode, TextNode, TransformError,
    TransformResult,
};

/// Character codes for fast comparison
mod char_codes {
    pub const TAB: u8 = 0x09;
    pub const NEWLINE: u8 = 0x0A;
    pub const FORM_FEED: u8 = 0x0C;
    pub const CARRIAGE_RETURN: u8 = 0x0D;
    pub const SPACE: u8 = 0x20;
    pub const EXCLAMATION_MARK: u8 = 0x21;
    pub const DOUBLE_QUOTE: u8 = 0x22;
    pub const NUMBER: u8 = 0x23;
    pub const AMP: u8 = 0x26;
    pub const SINGLE_QUOTE: u8 = 0x27;
    pub const LEFT_PAREN: u8 = 0x28;
    pub const RIGHT_PAREN: u8 = 0x29;
    pub const DASH: u8 = 0x2D;
    pub const SLASH: u8 = 0x2F;
    pub const COLON: u8 = 0x3A;
    pub const LT: u8 = 0x3C;
    pub const EQ: u8 = 0x3D;
    pub const GT: u8 = 0x3E;
    pub const BACKSLASH: u8 = 0x5C;
    pub const CARET: u8 = 0x5E;
    pub const LEFT_BRACE: u8 = 0x7B;
    pub const PIPE: u8 = 0x7C;
    pub const RIGHT_BRACE: u8 = 0x7D;
    pub const TILDE: u8 = 0x7E;
}

use char_codes::*;

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is not parsed
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Check if `tag` is an HTML void element
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

#[inline]
fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Check if character is whitespace
#[inline]
fn is_whitespace(c: u8) -> bool {
    c == SPACE || c == NEWLINE || c == TAB || c == FORM_FEED || c == CARRIAGE_RETURN
}

/// Check if character can appear in a path or hash key
#[inline]
fn is_path_char(c: u8) -> bool {
    !is_whitespace(c)
        && !matches!(
            c,
            LEFT_PAREN
                | RIGHT_PAREN
                | LEFT_BRACE
                | RIGHT_BRACE
                | PIPE
                | EQ
                | TILDE
                | DOUBLE_QUOTE
                | SINGLE_QUOTE
        )
}

/// What ends an argument list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    /// `}}` or `}}}`
    Mustache { trusting: bool },
    /// `)`
    Paren,
}

/// Parse `source` into a [`Template`].
///
/// `path` only appears in error messages.
pub fn parse_template(source: &str, path: &str) -> TransformResult<Template> {
    let mut parser = Parser::new(source, path);
    let body = parser.parse_children(None)?;
    let loc = parser.lines.location(0, source.len());
    Ok(Template::new(source, body, loc))
}

struct Parser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    lines: LineIndex,
    path: &'a str,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, path: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            lines: LineIndex::new(source),
            path,
        }
    }

    fn error(&self, at: usize, message: impl Into<String>) -> TransformError {
        TransformError::parse(self.path, self.lines.position(at), message)
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    #[inline]
    fn starts_with(&self, s: &str) -> bool {
        self.bytes[self.pos..].starts_with(s.as_bytes())
    }

    #[inline]
    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    fn find_from(&self, needle: &str, from: usize) -> Option<usize> {
        memmem::find(&self.bytes[from..], needle.as_bytes()).map(|i| from + i)
    }

    /// Whether a tag, comment or mustache begins at `at`.
    fn begins_construct(&self, at: usize) -> bool {
        let rest = &self.bytes[at..];
        match rest.first() {
            Some(&LT) => {
                rest.starts_with(b"</")
                    || rest.starts_with(b"<!--")
                    || rest.get(1).is_some_and(|&c| c.is_ascii_alphabetic() || c == COLON)
            }
            Some(&LEFT_BRACE) => {
                rest.starts_with(b"{{") && (at == 0 || self.bytes[at - 1] != BACKSLASH)
            }
            _ => false,
        }
    }

    #[inline]
    fn at_mustache_comment(&self) -> bool {
        self.starts_with("{{!") || self.starts_with("{{~!")
    }

    fn parse_children(
        &mut self,
        parent: Option<(&str, usize)>,
    ) -> TransformResult<Vec<TemplateNode>> {
        let mut nodes = Vec::new();
        loop {
            if self.pos >= self.bytes.len() {
                return match parent {
                    Some((tag, start)) => {
                        Err(self.error(start, format!("Unclosed element <{}>", tag)))
                    }
                    None => Ok(nodes),
                };
            }

            if self.starts_with("</") {
                let start = self.pos;
                let name = self.parse_close_tag()?;
                return match parent {
                    Some((tag, _)) if tag.eq_ignore_ascii_case(&name) => Ok(nodes),
                    _ => Err(self.error(start, format!("Unexpected closing tag </{}>", name))),
                };
            }

            let node = if self.starts_with("<!--") {
                TemplateNode::Comment(self.parse_html_comment()?)
            } else if self.at_mustache_comment() {
                TemplateNode::Comment(self.parse_mustache_comment()?)
            } else if self.begins_construct(self.pos) && self.peek() == Some(LEFT_BRACE) {
                TemplateNode::Mustache(self.parse_mustache()?)
            } else if self.begins_construct(self.pos) {
                TemplateNode::Element(self.parse_element()?)
            } else {
                TemplateNode::Text(self.parse_text())
            };
            nodes.push(node);
        }
    }

    fn parse_text(&mut self) -> TextNode {
        let start = self.pos;
        let mut i = start;
        loop {
            match memchr2(LT, LEFT_BRACE, &self.bytes[i..]) {
                None => {
                    i = self.bytes.len();
                    break;
                }
                Some(off) => {
                    let at = i + off;
                    if at > start && self.begins_construct(at) {
                        i = at;
                        break;
                    }
                    i = at + 1;
                }
            }
        }
        self.pos = i;
        TextNode::new(&self.source[start..i], self.lines.location(start, i))
    }

    fn parse_html_comment(&mut self) -> TransformResult<CommentNode> {
        let start = self.pos;
        let end = self
            .find_from("-->", start + 4)
            .ok_or_else(|| self.error(start, "Unterminated comment"))?;
        self.pos = end + 3;
        Ok(CommentNode {
            value: self.source[start + 4..end].to_string(),
            kind: CommentKind::Html,
            strip_open: false,
            strip_close: false,
            loc: self.lines.location(start, self.pos),
        })
    }

    fn parse_mustache_comment(&mut self) -> TransformResult<CommentNode> {
        let start = self.pos;
        self.pos += 2;
        let strip_open = self.eat(TILDE);
        self.pos += 1; // '!'

        let (kind, value_start, value_end, strip_close, end) = if self.starts_with("--") {
            let value_start = self.pos + 2;
            let mut from = value_start;
            loop {
                let dashes = self
                    .find_from("--", from)
                    .ok_or_else(|| self.error(start, "Unterminated comment"))?;
                let after = &self.bytes[dashes + 2..];
                if after.starts_with(b"}}") {
                    break (CommentKind::MustacheBlock, value_start, dashes, false, dashes + 4);
                }
                if after.starts_with(b"~}}") {
                    break (CommentKind::MustacheBlock, value_start, dashes, true, dashes + 5);
                }
                from = dashes + 1;
            }
        } else {
            let value_start = self.pos;
            let close = self
                .find_from("}}", value_start)
                .ok_or_else(|| self.error(start, "Unterminated comment"))?;
            let strip_close = close > value_start && self.bytes[close - 1] == TILDE;
            let value_end = if strip_close { close - 1 } else { close };
            (CommentKind::Mustache, value_start, value_end, strip_close, close + 2)
        };

        self.pos = end;
        Ok(CommentNode {
            value: self.source[value_start..value_end].to_string(),
            kind,
            strip_open,
            strip_close,
            loc: self.lines.location(start, end),
        })
    }

    fn parse_close_tag(&mut self) -> TransformResult<CompactString> {
        let start = self.pos;
        self.pos += 2;
        let name = CompactString::from(self.read_while(|c| !is_whitespace(c) && c != GT));
        self.skip_whitespace();
        if !self.eat(GT) {
            return Err(self.error(start, format!("Expected '>' to close </{}", name)));
        }
        Ok(name)
    }

    fn parse_element(&mut self) -> TransformResult<ElementNode> {
        let start = self.pos;
        self.pos += 1;
        let tag =
            CompactString::from(self.read_while(|c| !is_whitespace(c) && c != GT && c != SLASH));

        let mut attributes = Vec::new();
        let mut modifiers = Vec::new();
        let mut comments = Vec::new();
        let is_self_closing = loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.error(start, format!("Unclosed tag <{}>", tag))),
                Some(GT) => {
                    self.pos += 1;
                    break false;
                }
                Some(SLASH) if self.peek_at(1) == Some(GT) => {
                    self.pos += 2;
                    break true;
                }
                Some(LEFT_BRACE) if self.at_mustache_comment() => {
                    comments.push(self.parse_mustache_comment()?)
                }
                Some(LEFT_BRACE) if self.starts_with("{{") => {
                    modifiers.push(self.parse_mustache()?)
                }
                Some(_) => attributes.push(self.parse_attribute()?),
            }
        };

        let children = if is_self_closing || is_void_element(&tag) {
            Vec::new()
        } else if is_raw_text_element(&tag) {
            self.parse_raw_text(&tag, start)?
        } else {
            self.parse_children(Some((tag.as_str(), start)))?
        };

        Ok(ElementNode {
            tag,
            attributes,
            modifiers,
            comments,
            children,
            is_self_closing,
            loc: self.lines.location(start, self.pos),
        })
    }

    /// Content of `<script>` and `<style>`, up to the matching close tag.
    fn parse_raw_text(&mut self, tag: &str, open: usize) -> TransformResult<Vec<TemplateNode>> {
        let content_start = self.pos;
        let mut from = content_start;
        let close = loop {
            let at = self
                .find_from("</", from)
                .ok_or_else(|| self.error(open, format!("Unclosed element <{}>", tag)))?;
            let name_end = at + 2 + tag.len();
            if self
                .bytes
                .get(at + 2..name_end)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag.as_bytes()))
            {
                break at;
            }
            from = at + 2;
        };

        let mut children = Vec::new();
        if close > content_start {
            children.push(TemplateNode::Text(TextNode::new(
                &self.source[content_start..close],
                self.lines.location(content_start, close),
            )));
        }
        self.pos = close;
        self.parse_close_tag()?;
        Ok(children)
    }

    fn parse_attribute(&mut self) -> TransformResult<AttributeNode> {
        let start = self.pos;
        let name = self.read_while(|c| {
            !is_whitespace(c) && !matches!(c, EQ | GT | SLASH | DOUBLE_QUOTE | SINGLE_QUOTE)
        });
        if name.is_empty() {
            return Err(self.error(start, "Unexpected character in tag"));
        }
        let name = CompactString::from(name);
        let name_end = self.pos;

        self.skip_whitespace();
        if !self.eat(EQ) {
            self.pos = name_end;
            return Ok(AttributeNode {
                name,
                value: None,
                loc: self.lines.location(start, name_end),
            });
        }
        self.skip_whitespace();

        let value = match self.peek() {
            Some(q @ (DOUBLE_QUOTE | SINGLE_QUOTE)) => self.parse_quoted_value(q)?,
            Some(LEFT_BRACE) if self.starts_with("{{") => {
                AttrValue::Mustache(self.parse_mustache()?)
            }
            Some(c) if c != GT => {
                let value_start = self.pos;
                let raw = self.read_while(|c| !is_whitespace(c) && c != GT);
                AttrValue::Text {
                    text: TextNode::new(raw, self.lines.location(value_start, self.pos)),
                    quote: Quote::None,
                }
            }
            _ => {
                return Err(self.error(
                    self.pos,
                    format!("Missing value for attribute \"{}\"", name),
                ))
            }
        };

        Ok(AttributeNode {
            name,
            value: Some(value),
            loc: self.lines.location(start, self.pos),
        })
    }

    fn parse_quoted_value(&mut self, q: u8) -> TransformResult<AttrValue> {
        let start = self.pos;
        let quote = Quote::from_byte(q);
        self.pos += 1;

        let mut parts = Vec::new();
        let mut text_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error(start, "Unterminated attribute value")),
                Some(c) if c == q => break,
                // `{{! ... }}` inside a quoted value stays part of the text
                Some(LEFT_BRACE)
                    if self.begins_construct(self.pos) && !self.at_mustache_comment() =>
                {
                    if self.pos > text_start {
                        parts.push(ConcatPart::Text(TextNode::new(
                            &self.source[text_start..self.pos],
                            self.lines.location(text_start, self.pos),
                        )));
                    }
                    parts.push(ConcatPart::Mustache(self.parse_mustache()?));
                    text_start = self.pos;
                }
                Some(_) => self.pos += 1,
            }
        }
        let inner_end = self.pos;
        self.pos += 1;
        let loc = self.lines.location(start, self.pos);

        if parts.is_empty() {
            return Ok(AttrValue::Text {
                text: TextNode::new(&self.source[start + 1..inner_end], loc),
                quote,
            });
        }
        if inner_end > text_start {
            parts.push(ConcatPart::Text(TextNode::new(
                &self.source[text_start..inner_end],
                self.lines.location(text_start, inner_end),
            )));
        }
        Ok(AttrValue::Concat(ConcatNode { parts, quote, loc }))
    }

    fn parse_mustache(&mut self) -> TransformResult<MustacheNode> {
        let start = self.pos;
        let trusting = self.starts_with("{{{");
        self.pos += if trusting { 3 } else { 2 };
        self.eat(TILDE);
        self.skip_whitespace();

        let kind = if trusting {
            MustacheKind::Plain
        } else {
            let kind = match self.peek() {
                Some(NUMBER) => Some(MustacheKind::BlockOpen),
                Some(SLASH) => Some(MustacheKind::BlockClose),
                Some(CARET) => Some(MustacheKind::InverseOpen),
                Some(GT) => Some(MustacheKind::Partial),
                Some(AMP) => Some(MustacheKind::Plain),
                _ => None,
            };
            if kind.is_some() {
                self.pos += 1;
                self.skip_whitespace();
            }
            kind.unwrap_or_default()
        };

        let closer = Closer::Mustache { trusting };
        if self.pos >= self.bytes.len() {
            return Err(self.error(start, "Unclosed mustache"));
        }
        if self.at_closer(closer) {
            return Err(self.error(start, "Empty mustache"));
        }

        let path = self.parse_expression(start)?;
        let (params, hash, block_params) = self.parse_arguments(closer, start)?;

        self.eat(TILDE);
        self.pos += if trusting { 3 } else { 2 };

        Ok(MustacheNode {
            kind,
            path,
            params,
            hash,
            block_params,
            trusting,
            loc: self.lines.location(start, self.pos),
        })
    }

    fn at_closer(&self, closer: Closer) -> bool {
        match closer {
            Closer::Mustache { trusting } => {
                let close = if trusting { "}}}" } else { "}}" };
                self.starts_with(close)
                    || (self.peek() == Some(TILDE)
                        && self.bytes[self.pos + 1..].starts_with(close.as_bytes()))
            }
            Closer::Paren => self.peek() == Some(RIGHT_PAREN),
        }
    }

    /// Params, hash pairs and block params up to (not including) `closer`.
    #[allow(clippy::type_complexity)]
    fn parse_arguments(
        &mut self,
        closer: Closer,
        open: usize,
    ) -> TransformResult<(Vec<Expression>, Vec<HashPair>, Vec<CompactString>)> {
        let mut params = Vec::new();
        let mut hash = Vec::new();
        let mut block_params = Vec::new();

        loop {
            self.skip_whitespace();
            if self.pos >= self.bytes.len() {
                let message = match closer {
                    Closer::Mustache { .. } => "Unclosed mustache",
                    Closer::Paren => "Unclosed sub-expression",
                };
                return Err(self.error(open, message));
            }
            if self.at_closer(closer) {
                break;
            }

            if matches!(closer, Closer::Mustache { .. }) && self.at_block_params() {
                block_params = self.parse_block_params()?;
            } else if let Some(eq) = self.hash_key_end() {
                let pair_start = self.pos;
                let key = CompactString::from(&self.source[pair_start..eq]);
                self.pos = eq + 1;
                self.skip_whitespace();
                let value = self.parse_expression(open)?;
                hash.push(HashPair {
                    key,
                    value,
                    loc: self.lines.location(pair_start, self.pos),
                });
            } else {
                params.push(self.parse_expression(open)?);
            }
        }

        Ok((params, hash, block_params))
    }

    /// End of `key` when the cursor sits on `key=`.
    fn hash_key_end(&self) -> Option<usize> {
        let mut i = self.pos;
        while self.bytes.get(i).copied().is_some_and(is_path_char) {
            i += 1;
        }
        (i > self.pos && self.bytes.get(i) == Some(&EQ)).then_some(i)
    }

    fn at_block_params(&self) -> bool {
        if !self.starts_with("as") || !self.peek_at(2).is_some_and(is_whitespace) {
            return false;
        }
        let mut i = self.pos + 2;
        while self.bytes.get(i).copied().is_some_and(is_whitespace) {
            i += 1;
        }
        self.bytes.get(i) == Some(&PIPE)
    }

    fn parse_block_params(&mut self) -> TransformResult<Vec<CompactString>> {
        let start = self.pos;
        self.pos += 2;
        self.skip_whitespace();
        self.pos += 1; // '|'

        let mut names = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat(PIPE) {
                return Ok(names);
            }
            let name = self.read_while(is_path_char);
            if name.is_empty() {
                return Err(self.error(start, "Invalid block params"));
            }
            names.push(CompactString::from(name));
        }
    }

    fn parse_expression(&mut self, open: usize) -> TransformResult<Expression> {
        let start = self.pos;
        match self.peek() {
            Some(LEFT_PAREN) => {
                self.pos += 1;
                self.skip_whitespace();
                if self.peek() == Some(RIGHT_PAREN) {
                    return Err(self.error(start, "Empty sub-expression"));
                }
                if self.pos >= self.bytes.len() {
                    return Err(self.error(start, "Unclosed sub-expression"));
                }
                let path = self.parse_expression(start)?;
                let (params, hash, _) = self.parse_arguments(Closer::Paren, start)?;
                self.pos += 1; // ')'
                Ok(Expression::SubExpression(SubExpression {
                    path: Box::new(path),
                    params,
                    hash,
                    loc: self.lines.location(start, self.pos),
                }))
            }
            Some(q @ (DOUBLE_QUOTE | SINGLE_QUOTE)) => {
                let mut i = start + 1;
                let end = loop {
                    match self.bytes.get(i) {
                        None => return Err(self.error(start, "Unterminated string")),
                        Some(&BACKSLASH) => i += 2,
                        Some(&c) if c == q => break i,
                        Some(_) => i += 1,
                    }
                };
                self.pos = end + 1;
                Ok(Expression::StringLiteral(StringLiteral {
                    value: self.source[start + 1..end].to_string(),
                    quote: Quote::from_byte(q),
                    loc: self.lines.location(start, self.pos),
                }))
            }
            Some(c)
                if c.is_ascii_digit()
                    || (c == DASH && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) =>
            {
                self.pos += 1;
                let raw = self.read_while(|c| c.is_ascii_digit() || c == b'.');
                let raw = &self.source[start..start + 1 + raw.len()];
                Ok(Expression::NumberLiteral(NumberLiteral {
                    raw: CompactString::from(raw),
                    loc: self.lines.location(start, self.pos),
                }))
            }
            Some(c) if is_path_char(c) && c != EXCLAMATION_MARK => {
                let original = self.read_while(is_path_char);
                Ok(Expression::Path(PathExpression::new(
                    original,
                    self.lines.location(start, self.pos),
                )))
            }
            Some(_) => Err(self.error(start, "Expected expression")),
            None => Err(self.error(open, "Unclosed mustache")),
        }
    }
}
