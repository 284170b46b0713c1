use std::ptr;

use im::HashSet;
use log::{debug, trace};

use phpast_common::tree::AssignOp;
use phpast_common::{Node, NodeKind};

use crate::transform::{transform, Action};
use crate::walk::{find_first, walk_with, Visit};

/// Functions that read or write local variables by name.
const DYNAMIC_SCOPE: &[&str] = &["compact", "extract", "get_defined_vars", "parse_str"];

/// Remove statements of the form `$x = value;` where `$x` is never read
/// anywhere in the tree.
///
/// Scopes, ordering and control flow are ignored, so a name read in one
/// function keeps its assignments in every other function alive.
pub fn remove_unused_variables(tree: &Node) -> Node {
    remove_unused_variables_with(tree, false)
}

/// Like [`remove_unused_variables`], but if `conservative` is set, also keep
/// assignments whose value has side effects and assignments which may be
/// observed through a reference. Trees that access variables dynamically,
/// through `$$name` or functions like `compact`, are then returned
/// unchanged.
pub fn remove_unused_variables_with(tree: &Node, conservative: bool) -> Node {
    if conservative {
        if let Some(dynamic) = find_first(tree, is_dynamic) {
            debug!(
                "not removing unused variables: found a dynamic variable access ({})",
                dynamic.kind_name()
            );
            return tree.clone();
        }
    }

    let read = reads(tree, conservative);
    debug!("found {} variables that are read", read.len());

    let mut removed = 0;
    let result = transform(tree, |node, _| {
        match unused_assignment(node, &read, conservative) {
            Some(name) => {
                trace!("removing unused assignment to `${name}`");
                removed += 1;
                Action::Remove
            }
            None => Action::Keep,
        }
    });

    debug!("removed {removed} unused assignments");
    result
}

/// Every variable name which is read somewhere. The target of a plain `=`
/// is the only variable which is not a read, since compound assignments
/// read their target first. With `references`, by-reference parameters and
/// closure uses count as reads too.
fn reads(tree: &Node, references: bool) -> HashSet<String> {
    let mut read = HashSet::new();
    walk_with(tree, &mut read, |node, cx| {
        match &node.kind {
            NodeKind::Variable { name } => {
                let assigned = matches!(
                    cx.parent().map(|parent| &parent.kind),
                    Some(NodeKind::Assignment {
                        operator: AssignOp::Assign,
                        target,
                        ..
                    }) if ptr::eq(&**target, node)
                );

                if !assigned {
                    cx.data.insert(name.clone());
                }
            }

            NodeKind::Parameter {
                name, by_ref: true, ..
            }
            | NodeKind::ClosureUse { name, by_ref: true }
                if references =>
            {
                cx.data.insert(name.clone());
            }

            _ => {}
        }

        Visit::<()>::Continue
    });

    read
}

/// The name of the variable assigned by this statement, if the statement
/// can be removed.
fn unused_assignment<'a>(
    statement: &'a Node,
    read: &HashSet<String>,
    conservative: bool,
) -> Option<&'a str> {
    let NodeKind::ExpressionStatement { expression } = &statement.kind else {
        return None;
    };

    let NodeKind::Assignment {
        operator: AssignOp::Assign,
        target,
        value,
        by_ref: false,
    } = &expression.kind
    else {
        return None;
    };

    let NodeKind::Variable { name } = &target.kind else {
        return None;
    };

    if read.contains(name) || (conservative && has_side_effects(value)) {
        return None;
    }

    Some(name.as_str())
}

fn has_side_effects(value: &Node) -> bool {
    find_first(value, |node| {
        matches!(
            node.kind,
            NodeKind::Call { .. }
                | NodeKind::New { .. }
                | NodeKind::Clone { .. }
                | NodeKind::Include { .. }
                | NodeKind::Eval { .. }
                | NodeKind::Exit { .. }
                | NodeKind::Yield { .. }
                | NodeKind::YieldFrom { .. }
                | NodeKind::Print { .. }
                | NodeKind::Assignment { .. }
                | NodeKind::Update { .. }
                | NodeKind::ShellExec { .. }
                | NodeKind::Throw { .. }
        )
    })
    .is_some()
}

fn is_dynamic(node: &Node) -> bool {
    match &node.kind {
        NodeKind::VariableVariable { .. } => true,
        NodeKind::Call { callee, .. } => match &callee.kind {
            NodeKind::Name { name, .. } => {
                let name = name.trim_start_matches('\\');
                DYNAMIC_SCOPE
                    .iter()
                    .any(|function| name.eq_ignore_ascii_case(function))
            }
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use phpast_frontend::parse;

    use super::*;
    use crate::utils::normalize;

    fn check(source: &str, expected: &str) {
        let tree = parse(source).expect("source parses");
        let expected = parse(expected).expect("expected source parses");
        assert_eq!(
            normalize(&expected),
            normalize(&remove_unused_variables(&tree))
        );
    }

    #[test]
    fn removes_assignments_that_are_never_read() {
        check("<?php $x = 1; echo 2;", "<?php echo 2;");
        check("<?php $x = 1; $x = 2;", "<?php");
        check("<?php $x = 1; echo $x;", "<?php $x = 1; echo $x;");
    }

    #[test]
    fn ordering_is_ignored() {
        check("<?php echo $x; $x = 1;", "<?php echo $x; $x = 1;");
    }

    #[test]
    fn compound_assignments_read_their_target() {
        check("<?php $x = 1; $x += 2;", "<?php $x = 1; $x += 2;");
        check("<?php $x = 1; $x ??= 2;", "<?php $x = 1; $x ??= 2;");
    }

    fn check_conservative(source: &str, expected: &str) {
        let tree = parse(source).expect("source parses");
        let expected = parse(expected).expect("expected source parses");
        assert_eq!(
            normalize(&expected),
            normalize(&remove_unused_variables_with(&tree, true))
        );
    }

    #[test]
    fn values_are_dropped_with_their_assignment() {
        check("<?php $x = f(); echo 2;", "<?php echo 2;");
        check("<?php $x = new Foo;", "<?php");
        check("<?php $x = [1, g()];", "<?php");
    }

    #[test]
    fn conservative_removal_keeps_side_effects() {
        check_conservative("<?php $x = f();", "<?php $x = f();");
        check_conservative("<?php $x = new Foo;", "<?php $x = new Foo;");
        check_conservative("<?php $x = $y = 1;", "<?php $x = $y = 1;");
        check_conservative("<?php $x = $i++;", "<?php $x = $i++;");
        check_conservative("<?php $x = [1, g()];", "<?php $x = [1, g()];");
        check_conservative(
            "<?php $x = include 'a.php';",
            "<?php $x = include 'a.php';",
        );
        check_conservative("<?php $x = 1; $y = 2 + 3;", "<?php");
    }

    #[test]
    fn only_plain_variable_assignments_are_removed() {
        check("<?php $a[0] = 1;", "<?php $a[0] = 1;");
        check("<?php $o->p = 1;", "<?php $o->p = 1;");
        check("<?php $x = &$y;", "<?php $x = &$y;");
        check("<?php [$a, $b] = [1, 2];", "<?php [$a, $b] = [1, 2];");
    }

    #[test]
    fn nested_statements_are_cleaned_too() {
        check(
            "<?php function f($a) { $unused = $a + 1; return $a; }",
            "<?php function f($a) { return $a; }",
        );
        check("<?php if ($c) { $x = 1; }", "<?php if ($c) { }");
    }

    #[test]
    fn globals_count_as_reads() {
        check(
            "<?php function f() { global $g; $g = 1; }",
            "<?php function f() { global $g; $g = 1; }",
        );
    }

    #[test]
    fn references_only_count_when_conservative() {
        check(
            "<?php function f(&$out) { $out = 1; }",
            "<?php function f(&$out) { }",
        );
        check_conservative(
            "<?php function f(&$out) { $out = 1; }",
            "<?php function f(&$out) { $out = 1; }",
        );
    }

    #[test]
    fn dynamic_access_disables_conservative_removal() {
        check("<?php $x = 1; echo $$name;", "<?php echo $$name;");
        check_conservative("<?php $x = 1; echo $$name;", "<?php $x = 1; echo $$name;");
        check_conservative(
            "<?php $x = 1; return compact('x');",
            "<?php $x = 1; return compact('x');",
        );
    }
}
