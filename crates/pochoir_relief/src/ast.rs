//! Template AST node types.
//!
//! The tree is deliberately small: it models what a class-scoping pass has to
//! look at (elements, attributes, mustaches and their expressions) and keeps
//! everything else as text. Every node records its source location, and the
//! [`Template`] owns the source, so a printer can reproduce untouched regions
//! byte for byte.

use pochoir_carton::{CompactString, SmallVec};
use serde::{Deserialize, Serialize};

use crate::location::SourceLocation;

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Template = 0,
    Element = 1,
    Attribute = 2,
    Text = 3,
    Mustache = 4,
    Concat = 5,
    Comment = 6,
    Path = 7,
    StringLiteral = 8,
    NumberLiteral = 9,
    SubExpression = 10,
    HashPair = 11,
}

/// Quote style of an attribute value or string literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum Quote {
    None = 0,
    Single = 1,
    #[default]
    Double = 2,
}

impl Quote {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Single => "'",
            Self::Double => "\"",
        }
    }

    #[inline]
    pub const fn from_byte(b: u8) -> Self {
        match b {
            b'\'' => Self::Single,
            b'"' => Self::Double,
            _ => Self::None,
        }
    }
}

/// Root of a parsed template
#[derive(Debug, Clone)]
pub struct Template {
    /// Original source the locations point into
    pub source: String,
    pub body: Vec<TemplateNode>,
    pub loc: SourceLocation,
}

impl Template {
    pub fn new(source: impl Into<String>, body: Vec<TemplateNode>, loc: SourceLocation) -> Self {
        Self {
            source: source.into(),
            body,
            loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Template
    }

    /// Source text covered by `loc`.
    #[inline]
    pub fn slice(&self, loc: &SourceLocation) -> &str {
        &self.source[loc.range()]
    }
}

/// Content node of a template or element
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Element(ElementNode),
    Text(TextNode),
    Mustache(MustacheNode),
    Comment(CommentNode),
}

impl TemplateNode {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Element(n) => &n.loc,
            Self::Text(n) => &n.loc,
            Self::Mustache(n) => &n.loc,
            Self::Comment(n) => &n.loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Element(_) => NodeType::Element,
            Self::Text(_) => NodeType::Text,
            Self::Mustache(_) => NodeType::Mustache,
            Self::Comment(_) => NodeType::Comment,
        }
    }
}

/// HTML element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: CompactString,
    pub attributes: Vec<AttributeNode>,
    /// `<div {{on "click" this.toggle}}>`
    pub modifiers: Vec<MustacheNode>,
    /// `<div {{! note }}>`
    pub comments: Vec<CommentNode>,
    pub children: Vec<TemplateNode>,
    pub is_self_closing: bool,
    pub loc: SourceLocation,
}

/// Attribute node
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeNode {
    pub name: CompactString,
    pub value: Option<AttrValue>,
    pub loc: SourceLocation,
}

/// Value of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Static value; `text.loc` includes the quotes
    Text { text: TextNode, quote: Quote },
    /// `name={{expr}}`
    Mustache(MustacheNode),
    /// `name="static {{expr}} static"`
    Concat(ConcatNode),
}

impl AttrValue {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Text { text, .. } => &text.loc,
            Self::Mustache(n) => &n.loc,
            Self::Concat(n) => &n.loc,
        }
    }
}

/// Quoted attribute value mixing text and mustaches
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatNode {
    pub parts: Vec<ConcatPart>,
    pub quote: Quote,
    /// Includes the quotes
    pub loc: SourceLocation,
}

/// Segment of a [`ConcatNode`]
#[derive(Debug, Clone, PartialEq)]
pub enum ConcatPart {
    Text(TextNode),
    Mustache(MustacheNode),
}

impl ConcatPart {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Text(n) => &n.loc,
            Self::Mustache(n) => &n.loc,
        }
    }
}

/// Text node
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub chars: String,
    pub loc: SourceLocation,
}

impl TextNode {
    pub fn new(chars: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            chars: chars.into(),
            loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Text
    }
}

/// Comment flavour, which decides how a comment is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommentKind {
    /// `<!--value-->`
    Html = 0,
    /// `{{!value}}`
    Mustache = 1,
    /// `{{!--value--}}`
    MustacheBlock = 2,
}

/// Comment node
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub value: String,
    pub kind: CommentKind,
    /// `{{~!` and `~}}` whitespace control
    pub strip_open: bool,
    pub strip_close: bool,
    pub loc: SourceLocation,
}

impl CommentNode {
    pub fn node_type(&self) -> NodeType {
        NodeType::Comment
    }
}

/// What the opening delimiter of a mustache announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum MustacheKind {
    /// `{{path ...}}`
    #[default]
    Plain = 0,
    /// `{{#path ...}}`
    BlockOpen = 1,
    /// `{{/path}}`
    BlockClose = 2,
    /// `{{^path ...}}`
    InverseOpen = 3,
    /// `{{> partial}}`
    Partial = 4,
}

/// `{{path param key=value}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MustacheNode {
    pub kind: MustacheKind,
    pub path: Expression,
    pub params: Vec<Expression>,
    pub hash: Vec<HashPair>,
    /// Names bound by `as |a b|`
    pub block_params: Vec<CompactString>,
    /// `{{{triple}}}`
    pub trusting: bool,
    pub loc: SourceLocation,
}

impl MustacheNode {
    pub fn node_type(&self) -> NodeType {
        NodeType::Mustache
    }

    /// Whether this is `{{a.b}}` with no params or hash.
    pub fn is_bare_path(&self) -> bool {
        matches!(self.kind, MustacheKind::Plain)
            && self.params.is_empty()
            && self.hash.is_empty()
            && matches!(self.path, Expression::Path(_))
    }

    /// Path of a bare `{{a.b}}` mustache.
    pub fn bare_path(&self) -> Option<&PathExpression> {
        match &self.path {
            Expression::Path(path) if self.is_bare_path() => Some(path),
            _ => None,
        }
    }
}

/// Expression inside a mustache or sub-expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Path(PathExpression),
    StringLiteral(StringLiteral),
    NumberLiteral(NumberLiteral),
    SubExpression(SubExpression),
}

impl Expression {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Path(n) => &n.loc,
            Self::StringLiteral(n) => &n.loc,
            Self::NumberLiteral(n) => &n.loc,
            Self::SubExpression(n) => &n.loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Path(_) => NodeType::Path,
            Self::StringLiteral(_) => NodeType::StringLiteral,
            Self::NumberLiteral(_) => NodeType::NumberLiteral,
            Self::SubExpression(_) => NodeType::SubExpression,
        }
    }
}

/// `a`, `a.b`, `this.a`, `@index`
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    pub original: CompactString,
    pub parts: SmallVec<[CompactString; 4]>,
    pub loc: SourceLocation,
}

impl PathExpression {
    pub fn new(original: impl Into<CompactString>, loc: SourceLocation) -> Self {
        let original = original.into();
        let parts = original.split('.').map(CompactString::from).collect();
        Self {
            original,
            parts,
            loc,
        }
    }

    /// Split `alias.member` at its last dot.
    ///
    /// ```
    /// use pochoir_relief::{PathExpression, SourceLocation};
    ///
    /// let path = PathExpression::new("ui.styles.primary", SourceLocation::STUB);
    /// assert_eq!(path.split_member(), Some(("ui.styles", "primary")));
    /// ```
    pub fn split_member(&self) -> Option<(&str, &str)> {
        let (alias, member) = self.original.rsplit_once('.')?;
        (!alias.is_empty() && !member.is_empty()).then_some((alias, member))
    }
}

/// `"value"` or `'value'`; `loc` includes the quotes
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
    pub quote: Quote,
    pub loc: SourceLocation,
}

/// Numeric literal, kept as written
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub raw: CompactString,
    pub loc: SourceLocation,
}

/// `(path param key=value)`
#[derive(Debug, Clone, PartialEq)]
pub struct SubExpression {
    pub path: Box<Expression>,
    pub params: Vec<Expression>,
    pub hash: Vec<HashPair>,
    pub loc: SourceLocation,
}

/// `key=value`
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: CompactString,
    pub value: Expression,
    pub loc: SourceLocation,
}

/// Replace the node in `slot` with `node`, returning the old one.
///
/// Replacement nodes are built with [`builders`], which only ask for a kind,
/// a value and a location. Nothing of the old node survives the swap.
#[inline]
pub fn replace_node<T>(slot: &mut T, node: T) -> T {
    std::mem::replace(slot, node)
}

/// Constructors for replacement nodes.
pub mod builders {
    use super::*;

    pub fn text(chars: impl Into<String>, loc: SourceLocation) -> TextNode {
        TextNode::new(chars, loc)
    }

    /// `{{!-- value --}}`
    pub fn mustache_comment(value: &str, loc: SourceLocation) -> CommentNode {
        let mut padded = String::with_capacity(value.len() + 2);
        padded.push(' ');
        padded.push_str(value);
        padded.push(' ');
        CommentNode {
            value: padded,
            kind: CommentKind::MustacheBlock,
            strip_open: false,
            strip_close: false,
            loc,
        }
    }

    pub fn string_literal(value: impl Into<String>, loc: SourceLocation) -> StringLiteral {
        StringLiteral {
            value: value.into(),
            quote: Quote::Double,
            loc,
        }
    }

    /// Static attribute value; always quoted so it survives any surrounding.
    pub fn attr_text(chars: impl Into<String>, loc: SourceLocation) -> AttrValue {
        AttrValue::Text {
            text: text(chars, loc),
            quote: Quote::Double,
        }
    }
}
