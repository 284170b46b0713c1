//! Depth-first, pre-order traversal of a syntax tree.
//!
//! A visitor is called once per node, parents before children and children
//! in source order. It decides how the walk continues by returning a
//! [`Visit`]:
//!
//! ```text
//! Continue   visit the children of this node, then carry on
//! Skip       carry on, but not into the children of this node
//! Stop       end the whole walk
//! Found(x)   end the whole walk and return x
//! ```
//!
//! The visitor also gets a [`Context`] with the ancestors of the current node
//! and some user data, so passes that care about where a node is do not need
//! parent pointers in the tree.

use std::ops::ControlFlow;

use phpast_common::Node;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Visit<T> {
    Continue,
    Skip,
    Stop,
    Found(T),
}

pub struct Context<'a, 'd, D> {
    /// The ancestors of the current node, outermost first.
    pub ancestors: Vec<&'a Node>,

    /// The number of ancestors.
    pub depth: usize,

    pub data: &'d mut D,
}

impl<'a, 'd, D> Context<'a, 'd, D> {
    fn new(data: &'d mut D) -> Self {
        Self {
            ancestors: Vec::new(),
            depth: 0,
            data,
        }
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.ancestors.last().copied()
    }

    /// The ancestors of the current node, innermost first.
    pub fn ancestors_inward(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.ancestors.iter().rev().copied()
    }
}

/// Walk a tree, returning the value of the first [`Visit::Found`], if any.
pub fn walk<'a, T, F>(root: &'a Node, visitor: F) -> Option<T>
where
    F: FnMut(&'a Node, &mut Context<'a, '_, ()>) -> Visit<T>,
{
    walk_with(root, &mut (), visitor)
}

/// Walk a tree with some data available to the visitor through
/// [`Context::data`].
pub fn walk_with<'a, D, T, F>(root: &'a Node, data: &mut D, mut visitor: F) -> Option<T>
where
    F: FnMut(&'a Node, &mut Context<'a, '_, D>) -> Visit<T>,
{
    let mut cx = Context::new(data);
    match visit(root, &mut cx, &mut visitor) {
        ControlFlow::Continue(()) => None,
        ControlFlow::Break(found) => found,
    }
}

/// Walk each of a sequence of trees in turn. A `Stop` or `Found` ends the
/// walk over all of them.
pub fn walk_all<'a, D, T, F>(roots: &'a [Node], data: &mut D, mut visitor: F) -> Option<T>
where
    F: FnMut(&'a Node, &mut Context<'a, '_, D>) -> Visit<T>,
{
    let mut cx = Context::new(data);
    for root in roots {
        if let ControlFlow::Break(found) = visit(root, &mut cx, &mut visitor) {
            return found;
        }
    }

    None
}

fn visit<'a, D, T, F>(
    node: &'a Node,
    cx: &mut Context<'a, '_, D>,
    visitor: &mut F,
) -> ControlFlow<Option<T>>
where
    F: FnMut(&'a Node, &mut Context<'a, '_, D>) -> Visit<T>,
{
    match visitor(node, cx) {
        Visit::Continue => {}
        Visit::Skip => return ControlFlow::Continue(()),
        Visit::Stop => return ControlFlow::Break(None),
        Visit::Found(value) => return ControlFlow::Break(Some(value)),
    }

    cx.ancestors.push(node);
    cx.depth += 1;

    let mut flow = ControlFlow::Continue(());
    for child in node.children() {
        flow = visit(child, cx, visitor);
        if flow.is_break() {
            break;
        }
    }

    cx.ancestors.pop();
    cx.depth -= 1;

    flow
}

/// Every node in the tree matching the predicate, in pre-order.
pub fn find_nodes<'a>(
    root: &'a Node,
    mut predicate: impl FnMut(&Node) -> bool,
) -> Vec<&'a Node> {
    let mut found = Vec::new();
    walk_with(root, &mut found, |node, cx| {
        if predicate(node) {
            cx.data.push(node);
        }

        Visit::<()>::Continue
    });

    found
}

/// The first node in pre-order matching the predicate.
pub fn find_first<'a>(
    root: &'a Node,
    mut predicate: impl FnMut(&Node) -> bool,
) -> Option<&'a Node> {
    walk(root, |node, _| {
        if predicate(node) {
            Visit::Found(node)
        } else {
            Visit::Continue
        }
    })
}

#[cfg(test)]
mod tests {
    use phpast_common::tree::Number;
    use phpast_common::NodeKind;

    use super::*;

    fn number(value: i64) -> Node {
        Node::synthetic(NodeKind::NumberLiteral {
            value: Number::Int(value),
        })
    }

    fn statement(expression: Node) -> Node {
        Node::synthetic(NodeKind::ExpressionStatement {
            expression: Box::new(expression),
        })
    }

    fn program() -> Node {
        Node::synthetic(NodeKind::Program {
            statements: vec![
                statement(number(1)),
                Node::synthetic(NodeKind::Block {
                    statements: vec![statement(number(2))],
                }),
                statement(number(3)),
            ],
        })
    }

    fn literal(node: &Node) -> Option<i64> {
        match node.kind {
            NodeKind::NumberLiteral {
                value: Number::Int(value),
            } => Some(value),
            _ => None,
        }
    }

    #[test]
    fn visits_in_pre_order() {
        let program = program();
        let mut seen = Vec::new();

        walk_with(&program, &mut seen, |node, cx| {
            cx.data.push((node.kind_name(), cx.depth));
            Visit::<()>::Continue
        });

        assert_eq!(
            vec![
                ("Program", 0),
                ("ExpressionStatement", 1),
                ("NumberLiteral", 2),
                ("Block", 1),
                ("ExpressionStatement", 2),
                ("NumberLiteral", 3),
                ("ExpressionStatement", 1),
                ("NumberLiteral", 2),
            ],
            seen
        );
    }

    #[test]
    fn skip_ignores_children() {
        let program = program();
        let numbers = find_nodes(&program, |node| literal(node).is_some()).len();
        assert_eq!(3, numbers);

        let mut seen = 0;
        walk_with(&program, &mut seen, |node, cx| {
            if literal(node).is_some() {
                *cx.data += 1;
            }

            if matches!(node.kind, NodeKind::Block { .. }) {
                Visit::<()>::Skip
            } else {
                Visit::Continue
            }
        });

        assert_eq!(2, seen);
    }

    #[test]
    fn stop_and_found_end_the_walk() {
        let program = program();

        let mut seen = 0;
        let res: Option<()> = walk_with(&program, &mut seen, |node, cx| {
            if literal(node).is_some() {
                *cx.data += 1;
                return Visit::Stop;
            }

            Visit::Continue
        });

        assert_eq!(None, res);
        assert_eq!(1, seen);

        let found = walk(&program, |node, _| match literal(node) {
            Some(value) if value > 1 => Visit::Found(value),
            _ => Visit::Continue,
        });

        assert_eq!(Some(2), found);
        let first = find_first(&program, |node| literal(node).is_some());
        assert_eq!(Some(1), first.and_then(literal));
    }

    #[test]
    fn ancestors_are_tracked() {
        let program = program();
        let parents = walk(&program, |node, cx| {
            if literal(node) == Some(2) {
                let kinds: Vec<_> = cx.ancestors.iter().map(|node| node.kind_name()).collect();
                Visit::Found(kinds)
            } else {
                Visit::Continue
            }
        });

        assert_eq!(
            Some(vec!["Program", "Block", "ExpressionStatement"]),
            parents
        );
    }

    #[test]
    fn sequences_can_be_walked() {
        let statements = vec![statement(number(1)), statement(number(2))];
        let mut count = 0;
        walk_all(&statements, &mut count, |_, cx| {
            *cx.data += 1;
            Visit::<()>::Continue
        });

        assert_eq!(4, count);
    }
}
