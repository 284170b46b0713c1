use log::{debug, trace};

use phpast_common::{Node, NodeKind};

use crate::transform::{transform_post, Action};

/// Remove statements that can never run: anything following a `return` or a
/// `throw` in the same statement list, and the branches of an `if` whose
/// condition is the literal `true` or `false`.
///
/// This is a single bottom-up pass. An `elseif` promoted in place of an
/// `if (false)` is not simplified again, even if its own condition is a
/// literal.
pub fn remove_dead_code(tree: &Node) -> Node {
    let mut removed = 0;
    let result = transform_post(tree, |node, _| simplify(node, &mut removed));

    debug!("removed {removed} unreachable statements or branches");
    result
}

fn simplify(node: &Node, removed: &mut usize) -> Action {
    let kind = match &node.kind {
        NodeKind::Program { statements } => match reachable(statements, removed) {
            Some(statements) => NodeKind::Program { statements },
            None => return Action::Keep,
        },
        NodeKind::Block { statements } => match reachable(statements, removed) {
            Some(statements) => NodeKind::Block { statements },
            None => return Action::Keep,
        },
        NodeKind::Case { test, body } => match reachable(body, removed) {
            Some(body) => NodeKind::Case {
                test: test.clone(),
                body,
            },
            None => return Action::Keep,
        },
        NodeKind::Namespace {
            name,
            statements,
            braced,
        } => match reachable(statements, removed) {
            Some(statements) => NodeKind::Namespace {
                name: name.clone(),
                statements,
                braced: *braced,
            },
            None => return Action::Keep,
        },

        NodeKind::If {
            condition,
            then_branch,
            else_ifs,
            else_branch,
        } => {
            return match condition.kind {
                NodeKind::BooleanLiteral { value: true } => {
                    trace!("`if (true)` replaced by its body");
                    *removed += 1;
                    Action::Replace(then_branch.as_ref().clone())
                }

                NodeKind::BooleanLiteral { value: false } => {
                    *removed += 1;
                    match else_ifs.split_first() {
                        Some((first, rest)) => promote(node, first, rest, else_branch),
                        None => match else_branch {
                            Some(branch) => Action::Replace(branch.as_ref().clone()),
                            None => Action::Remove,
                        },
                    }
                }

                _ => Action::Keep,
            }
        }

        _ => return Action::Keep,
    };

    Action::Replace(Node {
        kind,
        location: node.location,
    })
}

/// The statements up to and including the first one that leaves the
/// current block, or `None` if there is nothing to drop.
fn reachable(statements: &[Node], removed: &mut usize) -> Option<Vec<Node>> {
    let end = statements.iter().position(terminates)?;
    if end + 1 == statements.len() {
        return None;
    }

    trace!("dropping {} statements", statements.len() - end - 1);
    *removed += statements.len() - end - 1;
    Some(statements[..=end].to_vec())
}

fn terminates(statement: &Node) -> bool {
    match &statement.kind {
        NodeKind::Return { .. } | NodeKind::Throw { .. } => true,
        NodeKind::ExpressionStatement { expression } => {
            matches!(expression.kind, NodeKind::Throw { .. })
        }
        _ => false,
    }
}

/// Turn the first `elseif` of a dead `if` into an `if` of its own.
fn promote(
    dead: &Node,
    first: &Node,
    rest: &[Node],
    else_branch: &Option<Box<Node>>,
) -> Action {
    let NodeKind::ElseIf { condition, body } = &first.kind else {
        return Action::Keep;
    };

    trace!("promoting an `elseif` of a dead `if`");
    Action::Replace(Node {
        kind: NodeKind::If {
            condition: condition.clone(),
            then_branch: body.clone(),
            else_ifs: rest.to_vec(),
            else_branch: else_branch.clone(),
        },
        location: dead.location,
    })
}

#[cfg(test)]
mod tests {
    use phpast_frontend::parse;

    use super::*;
    use crate::utils::normalize;

    fn check(source: &str, expected: &str) {
        let tree = parse(source).expect("source parses");
        let expected = parse(expected).expect("expected source parses");
        assert_eq!(normalize(&expected), normalize(&remove_dead_code(&tree)));
    }

    #[test]
    fn collapses_constant_conditions() {
        check(
            "<?php if (false) { echo 1; } else { echo 2; }",
            "<?php { echo 2; }",
        );
        check("<?php if (true) { echo 1; } else { echo 2; }", "<?php { echo 1; }");
        check("<?php if (false) { echo 1; } echo 2;", "<?php echo 2;");
        check("<?php if ($a) { echo 1; }", "<?php if ($a) { echo 1; }");
    }

    #[test]
    fn promotes_elseif_chains() {
        check(
            "<?php if (false) { echo 1; } elseif ($a) { echo 2; } elseif ($b) { echo 3; } else { echo 4; }",
            "<?php if ($a) { echo 2; } elseif ($b) { echo 3; } else { echo 4; }",
        );
    }

    #[test]
    fn nested_dead_branches_collapse() {
        check(
            "<?php while ($a) { if (true) { if (false) { echo 1; } } }",
            "<?php while ($a) { { } }",
        );
    }

    #[test]
    fn drops_code_after_return_and_throw() {
        check(
            "<?php function f() { return 1; echo 2; echo 3; }",
            "<?php function f() { return 1; }",
        );
        check(
            "<?php function f() { echo 1; throw $e; echo 2; }",
            "<?php function f() { echo 1; throw $e; }",
        );
        check("<?php return; echo 1;", "<?php return;");
        check(
            "<?php switch ($a) { case 1: return 1; echo 2; case 2: echo 3; }",
            "<?php switch ($a) { case 1: return 1; case 2: echo 3; }",
        );
    }

    #[test]
    fn only_the_enclosing_list_is_cut() {
        check(
            "<?php if ($a) { return 1; } echo 2;",
            "<?php if ($a) { return 1; } echo 2;",
        );
        check(
            "<?php function f() { return 1; } echo 2;",
            "<?php function f() { return 1; } echo 2;",
        );
    }

    #[test]
    fn empty_bodies_become_empty_statements() {
        check("<?php while ($a) if (false) echo 1;", "<?php while ($a) ;");
    }
}
