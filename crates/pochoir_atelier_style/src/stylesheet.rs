//! Lossless rule tree of an SCSS style module.
//!
//! Nodes only record where things are. The text itself stays in the source,
//! which is what the rewriter copies from.

use pochoir_carton::CompactString;
use pochoir_relief::SourceLocation;

/// Parsed style module
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    pub nodes: Vec<StyleNode>,
    pub loc: SourceLocation,
}

/// Statement of a style module
#[derive(Debug, Clone, PartialEq)]
pub enum StyleNode {
    /// `selectors { ... }`
    Rule(RuleNode),
    /// `@media ... { ... }`, `@use "x";`, `@include x;`
    AtRule(AtRuleNode),
    /// `color: red;`, `$gap: 4px;`
    Declaration(DeclarationNode),
    /// `/* ... */` or `// ...`
    Comment(CommentNode),
}

impl StyleNode {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Rule(n) => &n.loc,
            Self::AtRule(n) => &n.loc,
            Self::Declaration(n) => &n.loc,
            Self::Comment(n) => &n.loc,
        }
    }

    /// Child statements of a block, if the node has one.
    pub fn children(&self) -> &[StyleNode] {
        match self {
            Self::Rule(n) => &n.children,
            Self::AtRule(n) => n.children.as_deref().unwrap_or_default(),
            Self::Declaration(_) | Self::Comment(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleNode {
    /// Selector list up to (not including) `{`
    pub prelude: SourceLocation,
    pub children: Vec<StyleNode>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtRuleNode {
    /// Name without `@`
    pub name: CompactString,
    /// Everything between the name and `{` or `;`
    pub prelude: SourceLocation,
    /// `None` for statement at-rules such as `@use "x";`
    pub children: Option<Vec<StyleNode>>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationNode {
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    /// `// ...` rather than `/* ... */`
    pub is_line: bool,
    pub loc: SourceLocation,
}
