//! Pure tree rewriting.
//!
//! A transformer is called on every node and answers with an [`Action`]. The
//! input tree is never touched; the result is rebuilt from the answers with
//! [`Node::map_children`], so unchanged subtrees are cloned and replaced ones
//! are spliced in.
//!
//! [`transform`] works top-down: a node is offered to the transformer first,
//! and then the children of whatever it was replaced with are transformed.
//! [`transform_post`] works bottom-up, which is what folding passes want,
//! since a node is only seen after its children have been rewritten.

use phpast_common::Node;

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Keep,
    Replace(Node),
    /// Drop the node. Within a sequence its slot disappears, an optional
    /// child becomes absent and a mandatory child becomes an empty statement.
    Remove,
}

/// Where the transformer currently is in the tree. In a top-down transform
/// the ancestors are the nodes after replacement; in a bottom-up transform
/// they are the nodes of the input tree.
pub struct TransformContext<'a, 'd, D> {
    parent: Option<&'a Ancestor<'a>>,
    pub depth: usize,
    pub data: &'d mut D,
}

/// One link of the chain of ancestors, living on the stack of the rewrite.
struct Ancestor<'a> {
    node: &'a Node,
    parent: Option<&'a Ancestor<'a>>,
}

impl<'a, 'd, D> TransformContext<'a, 'd, D> {
    fn new(data: &'d mut D) -> Self {
        Self {
            parent: None,
            depth: 0,
            data,
        }
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.parent.map(|ancestor| ancestor.node)
    }

    /// The ancestors of the current node, outermost first.
    pub fn ancestors(&self) -> Vec<&'a Node> {
        let mut ancestors = Vec::with_capacity(self.depth);
        let mut current = self.parent;
        while let Some(ancestor) = current {
            ancestors.push(ancestor.node);
            current = ancestor.parent;
        }

        ancestors.reverse();
        ancestors
    }
}

pub fn transform<F>(node: &Node, transformer: F) -> Node
where
    F: FnMut(&Node, &mut TransformContext<'_, '_, ()>) -> Action,
{
    transform_with(node, &mut (), transformer)
}

/// Transform a tree top-down with some data available to the transformer.
/// Removing the root leaves an empty statement in its place.
pub fn transform_with<D, F>(node: &Node, data: &mut D, mut transformer: F) -> Node
where
    F: FnMut(&Node, &mut TransformContext<'_, '_, D>) -> Action,
{
    let mut cx = TransformContext::new(data);
    rewrite(node, &mut cx, &mut transformer).unwrap_or_else(|| Node::nop(node.location))
}

/// Transform each tree of a sequence top-down. Removed trees are left out.
pub fn transform_all<F>(nodes: &[Node], mut transformer: F) -> Vec<Node>
where
    F: FnMut(&Node, &mut TransformContext<'_, '_, ()>) -> Action,
{
    let mut data = ();
    let mut cx = TransformContext::new(&mut data);
    nodes
        .iter()
        .filter_map(|node| rewrite(node, &mut cx, &mut transformer))
        .collect()
}

/// Transform a tree bottom-up: the transformer sees each node after its
/// children have been rebuilt.
pub fn transform_post<F>(node: &Node, mut transformer: F) -> Node
where
    F: FnMut(&Node, &mut TransformContext<'_, '_, ()>) -> Action,
{
    let mut data = ();
    let mut cx = TransformContext::new(&mut data);
    rewrite_post(node, &mut cx, &mut transformer).unwrap_or_else(|| Node::nop(node.location))
}

fn rewrite<D, F>(
    node: &Node,
    cx: &mut TransformContext<'_, '_, D>,
    transformer: &mut F,
) -> Option<Node>
where
    F: FnMut(&Node, &mut TransformContext<'_, '_, D>) -> Action,
{
    let replacement;
    let node = match transformer(node, cx) {
        Action::Keep => node,
        Action::Replace(new) => {
            replacement = new;
            &replacement
        }
        Action::Remove => return None,
    };

    let ancestor = Ancestor {
        node,
        parent: cx.parent,
    };

    let mut inner = TransformContext {
        parent: Some(&ancestor),
        depth: cx.depth + 1,
        data: &mut *cx.data,
    };

    Some(node.map_children(|child| rewrite(child, &mut inner, transformer)))
}

fn rewrite_post<D, F>(
    node: &Node,
    cx: &mut TransformContext<'_, '_, D>,
    transformer: &mut F,
) -> Option<Node>
where
    F: FnMut(&Node, &mut TransformContext<'_, '_, D>) -> Action,
{
    let ancestor = Ancestor {
        node,
        parent: cx.parent,
    };

    let mut inner = TransformContext {
        parent: Some(&ancestor),
        depth: cx.depth + 1,
        data: &mut *cx.data,
    };

    let rebuilt = node.map_children(|child| rewrite_post(child, &mut inner, transformer));

    match transformer(&rebuilt, cx) {
        Action::Keep => Some(rebuilt),
        Action::Replace(new) => Some(new),
        Action::Remove => None,
    }
}

#[cfg(test)]
mod tests {
    use phpast_common::tree::{BinaryOp, Number};
    use phpast_common::{Location, NodeKind, Position};

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

    fn add(left: Node, right: Node) -> Node {
        Node::synthetic(NodeKind::Binary {
            operator: BinaryOp::Add,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn program(statements: Vec<Node>) -> Node {
        Node::synthetic(NodeKind::Program { statements })
    }

    fn is_number(node: &Node, expected: i64) -> bool {
        matches!(
            node.kind,
            NodeKind::NumberLiteral { value: Number::Int(value) } if value == expected
        )
    }

    #[test]
    fn replaces_nodes_without_touching_the_input() {
        let input = program(vec![statement(number(1)), statement(number(2))]);
        let before = input.clone();

        let output = transform(&input, |node, _| {
            if is_number(node, 1) {
                Action::Replace(number(10))
            } else {
                Action::Keep
            }
        });

        assert_eq!(before, input);
        assert_eq!(
            program(vec![statement(number(10)), statement(number(2))]),
            output
        );
    }

    #[test]
    fn removal_depends_on_the_slot() {
        let input = program(vec![
            statement(number(1)),
            statement(add(number(1), number(2))),
            Node::synthetic(NodeKind::Return {
                value: Some(Box::new(number(1))),
            }),
        ]);

        let output = transform(&input, |node, _| {
            if is_number(node, 1) {
                Action::Remove
            } else {
                Action::Keep
            }
        });

        let expected = program(vec![
            statement(Node::nop(None)),
            statement(Node::synthetic(NodeKind::Binary {
                operator: BinaryOp::Add,
                left: Box::new(Node::nop(None)),
                right: Box::new(number(2)),
            })),
            Node::synthetic(NodeKind::Return { value: None }),
        ]);

        assert_eq!(expected, output);

        let dropped = transform(&input, |node, _| match node.kind {
            NodeKind::ExpressionStatement { .. } => Action::Remove,
            _ => Action::Keep,
        });

        assert_eq!(
            program(vec![Node::synthetic(NodeKind::Return {
                value: Some(Box::new(number(1))),
            })]),
            dropped
        );
    }

    #[test]
    fn replacements_are_transformed_further() {
        let input = statement(number(1));
        let output = transform(&input, |node, _| {
            if is_number(node, 1) {
                Action::Replace(add(number(2), number(3)))
            } else if is_number(node, 3) {
                Action::Replace(number(4))
            } else {
                Action::Keep
            }
        });

        assert_eq!(statement(add(number(2), number(4))), output);
    }

    #[test]
    fn removing_the_root_leaves_an_empty_statement() {
        let location = Location::new(Position::new(1, 1, 0), Position::new(1, 4, 3));
        let input = Node::new(NodeKind::Nop, location);
        let output = transform(&statement(number(1)), |_, _| Action::Remove);
        assert_eq!(Node::nop(None), output);

        let output = transform(&input, |_, _| Action::Remove);
        assert_eq!(Some(location), output.location);
    }

    #[test]
    fn sequences_drop_removed_roots() {
        let nodes = vec![statement(number(1)), statement(number(2)), number(3)];
        let output = transform_all(&nodes, |node, cx| {
            if cx.parent().is_none() && matches!(node.kind, NodeKind::NumberLiteral { .. }) {
                Action::Remove
            } else {
                Action::Keep
            }
        });

        assert_eq!(vec![statement(number(1)), statement(number(2))], output);
    }

    #[test]
    fn data_is_shared_across_the_transform() {
        let input = program(vec![statement(number(1)), statement(number(2))]);
        let mut seen = Vec::new();
        transform_with(&input, &mut seen, |node, cx| {
            cx.data.push(node.kind_name());
            Action::Keep
        });

        assert_eq!(
            vec![
                "Program",
                "ExpressionStatement",
                "NumberLiteral",
                "ExpressionStatement",
                "NumberLiteral"
            ],
            seen
        );
    }

    #[test]
    fn post_order_sees_rebuilt_children() {
        let input = statement(add(add(number(1), number(2)), number(3)));

        let output = transform_post(&input, |node, _| match &node.kind {
            NodeKind::Binary { left, right, .. } => match (&left.kind, &right.kind) {
                (
                    NodeKind::NumberLiteral {
                        value: Number::Int(left),
                    },
                    NodeKind::NumberLiteral {
                        value: Number::Int(right),
                    },
                ) => Action::Replace(number(left + right)),
                _ => Action::Keep,
            },
            _ => Action::Keep,
        });

        assert_eq!(statement(number(6)), output);
    }

    #[test]
    fn ancestors_are_the_replaced_nodes() {
        let input = program(vec![statement(number(1))]);
        let returned = Node::synthetic(NodeKind::Return {
            value: Some(Box::new(number(1))),
        });

        let mut seen = Vec::new();
        transform_with(&input, &mut seen, |node, cx| {
            if let NodeKind::ExpressionStatement { expression } = &node.kind {
                return Action::Replace(Node::synthetic(NodeKind::Return {
                    value: Some(expression.clone()),
                }));
            }

            if is_number(node, 1) {
                let parent = cx.parent().cloned();
                let kinds: Vec<_> = cx.ancestors().iter().map(|node| node.kind_name()).collect();
                cx.data.push((parent, kinds, cx.depth));
            }

            Action::Keep
        });

        assert_eq!(vec![(Some(returned), vec!["Program", "Return"], 2)], seen);
    }

    #[test]
    fn post_order_ancestors_are_the_input_nodes() {
        let input = statement(add(number(1), number(2)));
        let mut seen = Vec::new();

        transform_post(&input, |node, cx| {
            if is_number(node, 2) {
                seen.push((cx.parent().cloned(), cx.ancestors().len()));
            }

            match node.kind {
                NodeKind::Binary { .. } => Action::Replace(number(3)),
                _ => Action::Keep,
            }
        });

        assert_eq!(vec![(Some(add(number(1), number(2))), 2)], seen);
    }
}
