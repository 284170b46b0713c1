use pretty::{Arena, DocAllocator, DocBuilder};

use super::{Node, NodeKind, Quote};

/// Renders a syntax tree as an indented S-expression, such as
/// `(Binary + (NumberLiteral 1) (NumberLiteral 2))`.
pub struct Prettier<'a> {
    allocator: Arena<'a>,
    width: usize,
    locations: bool,
}

impl<'a> Prettier<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_width(self, width: usize) -> Self {
        Self { width, ..self }
    }

    /// Also print the location of every node that has one.
    pub fn with_locations(self, locations: bool) -> Self {
        Self { locations, ..self }
    }

    #[must_use]
    pub fn pretty(&'a self, node: &Node) -> String {
        self.doc_node(node).pretty(self.width).to_string()
    }

    fn doc_node(&'a self, node: &Node) -> DocBuilder<'a, Arena<'a>> {
        let mut head = self.allocator.text(node.kind_name());

        for label in labels(node) {
            head = head.append(self.allocator.space()).append(self.allocator.text(label));
        }

        if self.locations {
            if let Some(location) = node.location {
                head = head
                    .append(self.allocator.space())
                    .append(self.allocator.text(format!("@{location}")));
            }
        }

        let children = node.children();
        if children.is_empty() {
            return head.parens();
        }

        let children = self.allocator.intersperse(
            children.into_iter().map(|child| self.doc_node(child)),
            self.allocator.line(),
        );

        head.append(self.allocator.line().append(children).nest(2))
            .group()
            .parens()
    }
}

impl Default for Prettier<'_> {
    fn default() -> Self {
        Self {
            allocator: Arena::new(),
            width: 80,
            locations: false,
        }
    }
}

/// The non-structural data of a node worth showing next to its kind.
fn labels(node: &Node) -> Vec<String> {
    match &node.kind {
        NodeKind::Binary { operator, .. } => vec![operator.symbol().into()],
        NodeKind::Unary { operator, .. } => vec![operator.symbol().into()],
        NodeKind::Update {
            operator, prefix, ..
        } => vec![
            operator.symbol().into(),
            if *prefix { "prefix" } else { "postfix" }.into(),
        ],
        NodeKind::Assignment {
            operator, by_ref, ..
        } => {
            let mut labels = vec![operator.symbol().to_string()];
            if *by_ref {
                labels.push("&".into());
            }
            labels
        }
        NodeKind::Cast { cast, .. } => vec![cast.name().into()],
        NodeKind::Include { kind, .. } => vec![kind.keyword().into()],
        NodeKind::NumberLiteral { value } => vec![value.to_string()],
        NodeKind::StringLiteral { value, quote } => vec![match quote {
            Quote::Single => format!("'{}'", value.escape_debug()),
            Quote::Double => format!("\"{}\"", value.escape_debug()),
        }],
        NodeKind::BooleanLiteral { value } => vec![value.to_string()],
        NodeKind::InlineHtml { value } => vec![format!("{:?}", value)],
        NodeKind::Variable { name } => vec![format!("${name}")],
        NodeKind::Identifier { name }
        | NodeKind::Name { name, .. }
        | NodeKind::Label { name }
        | NodeKind::Const { name, .. }
        | NodeKind::TraitDeclaration { name, .. }
        | NodeKind::InterfaceDeclaration { name, .. }
        | NodeKind::EnumCase { name, .. }
        | NodeKind::ClassConstant { name, .. } => vec![name.clone()],
        NodeKind::Goto { label } => vec![label.clone()],
        NodeKind::FunctionDeclaration {
            name, return_type, ..
        }
        | NodeKind::Method {
            name, return_type, ..
        } => {
            let mut labels = vec![name.clone()];
            labels.extend(return_type.iter().map(|ty| format!(": {ty}")));
            labels
        }
        NodeKind::Parameter {
            name,
            type_hint,
            variadic,
            by_ref,
            ..
        } => {
            let mut labels: Vec<String> = type_hint.iter().map(ToString::to_string).collect();
            let prefix = match (*by_ref, *variadic) {
                (true, true) => "&...",
                (true, false) => "&",
                (false, true) => "...",
                (false, false) => "",
            };
            labels.push(format!("{prefix}${name}"));
            labels
        }
        NodeKind::Property { name, .. } => vec![format!("${name}")],
        NodeKind::ClassDeclaration { name, .. } => {
            vec![name.clone().unwrap_or_else(|| "class@anonymous".into())]
        }
        NodeKind::EnumDeclaration {
            name, backing_type, ..
        } => {
            let mut labels = vec![name.clone()];
            labels.extend(backing_type.iter().map(|ty| format!(": {ty}")));
            labels
        }
        NodeKind::Namespace { name, .. } => name.iter().cloned().collect(),
        NodeKind::Use { items, .. } => items
            .iter()
            .map(|item| match &item.alias {
                Some(alias) => format!("{} as {alias}", item.name),
                None => item.name.clone(),
            })
            .collect(),
        NodeKind::Argument { name, spread, .. } => {
            let mut labels: Vec<String> = name.iter().map(|name| format!("{name}:")).collect();
            if *spread {
                labels.push("...".into());
            }
            labels
        }
        NodeKind::ClosureUse { name, by_ref } => {
            vec![format!("{}${name}", if *by_ref { "&" } else { "" })]
        }
        NodeKind::Member { nullsafe: true, .. } => vec!["?->".into()],
        NodeKind::Heredoc { label, nowdoc, .. } => {
            vec![if *nowdoc {
                format!("'{label}'")
            } else {
                label.clone()
            }]
        }
        NodeKind::Foreach { by_ref: true, .. }
        | NodeKind::ArrayElement { by_ref: true, .. } => vec!["&".into()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BinaryOp, Number};

    #[test]
    fn prints_nested_s_expressions() {
        let node = Node::synthetic(NodeKind::Binary {
            operator: BinaryOp::Add,
            left: Box::new(Node::synthetic(NodeKind::NumberLiteral {
                value: Number::Int(1),
            })),
            right: Box::new(Node::synthetic(NodeKind::Variable { name: "x".into() })),
        });

        let prettier = Prettier::new();
        assert_eq!(
            "(Binary + (NumberLiteral 1) (Variable $x))",
            prettier.pretty(&node)
        );
    }

    #[test]
    fn breaks_lines_when_too_wide() {
        let node = Node::synthetic(NodeKind::Binary {
            operator: BinaryOp::Add,
            left: Box::new(Node::synthetic(NodeKind::NumberLiteral {
                value: Number::Int(1),
            })),
            right: Box::new(Node::synthetic(NodeKind::Variable { name: "x".into() })),
        });

        let prettier = Prettier::new().with_width(10);
        assert_eq!(
            "(Binary +\n  (NumberLiteral 1)\n  (Variable $x))",
            prettier.pretty(&node)
        );
    }
}
