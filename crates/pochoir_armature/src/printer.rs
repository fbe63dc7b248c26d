//! Lossless template printer.
//!
//! Every composite node prints as the source between its children plus the
//! printed children themselves. Leaves print from their own fields, so a
//! replaced leaf shows its new content while the text around it is copied
//! from the source untouched.

use pochoir_relief::{
    AttrValue, AttributeNode, CommentKind, CommentNode, ConcatPart, Expression, HashPair,
    MustacheNode, SourceLocation, Template, TemplateNode,
};

/// Print `template` back to text.
pub fn print_template(template: &Template) -> String {
    let mut printer = Printer {
        source: &template.source,
        out: String::with_capacity(template.source.len()),
    };
    let children = template.body.iter().map(Child::Node).collect();
    printer.splice(&template.loc, children);
    printer.out
}

/// Anything with a location that can sit inside another node
#[derive(Clone, Copy)]
enum Child<'t> {
    Node(&'t TemplateNode),
    Attribute(&'t AttributeNode),
    AttrValue(&'t AttrValue),
    Part(&'t ConcatPart),
    Mustache(&'t MustacheNode),
    Comment(&'t CommentNode),
    Expression(&'t Expression),
    Hash(&'t HashPair),
}

impl Child<'_> {
    fn loc(&self) -> &SourceLocation {
        match self {
            Self::Node(n) => n.loc(),
            Self::Attribute(n) => &n.loc,
            Self::AttrValue(n) => n.loc(),
            Self::Part(n) => n.loc(),
            Self::Mustache(n) => &n.loc,
            Self::Comment(n) => &n.loc,
            Self::Expression(n) => n.loc(),
            Self::Hash(n) => &n.loc,
        }
    }
}

struct Printer<'s> {
    source: &'s str,
    out: String,
}

impl Printer<'_> {
    /// Copy the gaps of `loc` from the source and print `children` in between.
    fn splice(&mut self, loc: &SourceLocation, mut children: Vec<Child<'_>>) {
        children.sort_by_key(|c| c.loc().start.offset);

        let mut cursor = loc.start.offset as usize;
        for child in children {
            let range = child.loc().range();
            if range.start > cursor {
                self.out.push_str(&self.source[cursor..range.start]);
            }
            self.print(child);
            cursor = cursor.max(range.end);
        }

        let end = loc.end.offset as usize;
        if end > cursor {
            self.out.push_str(&self.source[cursor..end]);
        }
    }

    fn print(&mut self, child: Child<'_>) {
        match child {
            Child::Node(TemplateNode::Text(text)) | Child::Part(ConcatPart::Text(text)) => {
                self.out.push_str(&text.chars)
            }
            Child::Node(TemplateNode::Comment(comment)) | Child::Comment(comment) => {
                self.print_comment(comment)
            }
            Child::Node(TemplateNode::Mustache(m))
            | Child::Part(ConcatPart::Mustache(m))
            | Child::AttrValue(AttrValue::Mustache(m))
            | Child::Mustache(m) => self.print_mustache(m),
            Child::Node(TemplateNode::Element(element)) => {
                let mut children: Vec<Child<'_>> =
                    element.attributes.iter().map(Child::Attribute).collect();
                children.extend(element.modifiers.iter().map(Child::Mustache));
                children.extend(element.comments.iter().map(Child::Comment));
                children.extend(element.children.iter().map(Child::Node));
                self.splice(&element.loc, children);
            }
            Child::Attribute(attr) => {
                let children = attr.value.iter().map(Child::AttrValue).collect();
                self.splice(&attr.loc, children);
            }
            Child::AttrValue(AttrValue::Text { text, quote }) => {
                self.out.push_str(quote.as_str());
                self.out.push_str(&text.chars);
                self.out.push_str(quote.as_str());
            }
            Child::AttrValue(AttrValue::Concat(concat)) => {
                let children = concat.parts.iter().map(Child::Part).collect();
                self.splice(&concat.loc, children);
            }
            Child::Expression(expr) => self.print_expression(expr),
            Child::Hash(pair) => self.splice(&pair.loc, vec![Child::Expression(&pair.value)]),
        }
    }

    fn print_mustache(&mut self, mustache: &MustacheNode) {
        let mut children = vec![Child::Expression(&mustache.path)];
        children.extend(mustache.params.iter().map(Child::Expression));
        children.extend(mustache.hash.iter().map(Child::Hash));
        self.splice(&mustache.loc, children);
    }

    fn print_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Path(path) => self.out.push_str(&path.original),
            Expression::StringLiteral(lit) => {
                self.out.push_str(lit.quote.as_str());
                self.out.push_str(&lit.value);
                self.out.push_str(lit.quote.as_str());
            }
            Expression::NumberLiteral(num) => self.out.push_str(&num.raw),
            Expression::SubExpression(sub) => {
                let mut children = vec![Child::Expression(&sub.path)];
                children.extend(sub.params.iter().map(Child::Expression));
                children.extend(sub.hash.iter().map(Child::Hash));
                self.splice(&sub.loc, children);
            }
        }
    }

    fn print_comment(&mut self, comment: &CommentNode) {
        let (open, close) = match comment.kind {
            CommentKind::Html => {
                self.out.push_str("<!--");
                self.out.push_str(&comment.value);
                self.out.push_str("-->");
                return;
            }
            CommentKind::Mustache => ("!", ""),
            CommentKind::MustacheBlock => ("!--", "--"),
        };
        self.out.push_str("{{");
        if comment.strip_open {
            self.out.push('~');
        }
        self.out.push_str(open);
        self.out.push_str(&comment.value);
        self.out.push_str(close);
        if comment.strip_close {
            self.out.push('~');
        }
        self.out.push_str("}}");
    }
}
