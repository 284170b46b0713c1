//! Naive inlining of small functions.
//!
//! A function is a candidate when it takes at most two plain parameters and
//! its body is a single `return` of an expression. A call to a candidate by
//! its unqualified name, with positional arguments only, is replaced by the
//! returned expression with every parameter variable replaced by the
//! corresponding argument. Missing arguments use the parameter default; a
//! call missing an argument without default is left alone.
//!
//! No attempt is made to preserve evaluation order or to avoid duplicating
//! arguments with side effects, and a variable in the body that shadows a
//! parameter is substituted all the same.

use im::HashMap;
use log::{debug, trace};

use phpast_common::tree::NameKind;
use phpast_common::{Node, NodeKind};

use crate::transform::{transform_post, Action};
use crate::walk::{walk_with, Visit};

const MAX_PARAMETERS: usize = 2;

#[derive(Clone, Debug)]
struct Candidate {
    params: Vec<(String, Option<Node>)>,
    body: Node,
}

pub fn inline_functions(tree: &Node) -> Node {
    let candidates = candidates(tree);
    debug!("found {} inlining candidates", candidates.len());
    if candidates.is_empty() {
        return tree.clone();
    }

    let mut inlined = 0;
    let result = transform_post(tree, |node, _| {
        let NodeKind::Call { callee, arguments } = &node.kind else {
            return Action::Keep;
        };

        let NodeKind::Name {
            name,
            kind: NameKind::Unqualified,
        } = &callee.kind
        else {
            return Action::Keep;
        };

        let Some(candidate) = candidates.get(&name.to_ascii_lowercase()) else {
            return Action::Keep;
        };

        match instantiate(candidate, arguments) {
            Some(mut body) => {
                trace!("inlined a call to `{name}`");
                inlined += 1;
                body.location = node.location;
                Action::Replace(body)
            }
            None => Action::Keep,
        }
    });

    debug!("inlined {inlined} calls");
    result
}

/// Functions declared anywhere in the tree that are simple enough to inline,
/// by lowercased name. When a name is declared more than once, the first
/// declaration wins.
fn candidates(tree: &Node) -> HashMap<String, Candidate> {
    let mut found = HashMap::new();
    walk_with(tree, &mut found, |node, cx| {
        let NodeKind::FunctionDeclaration {
            name, params, body, ..
        } = &node.kind
        else {
            return Visit::<()>::Continue;
        };

        let key = name.to_ascii_lowercase();
        if cx.data.contains_key(&key) {
            return Visit::Continue;
        }

        if let Some(candidate) = candidate(params, body) {
            trace!("`{name}` can be inlined");
            cx.data.insert(key, candidate);
        }

        Visit::Continue
    });

    found
}

fn candidate(params: &[Node], body: &Node) -> Option<Candidate> {
    if params.len() > MAX_PARAMETERS {
        return None;
    }

    let params = params
        .iter()
        .map(|param| match &param.kind {
            NodeKind::Parameter {
                name,
                default,
                by_ref: false,
                variadic: false,
                ..
            } => Some((name.clone(), default.as_deref().cloned())),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    let NodeKind::Block { statements } = &body.kind else {
        return None;
    };

    match statements.as_slice() {
        [Node {
            kind: NodeKind::Return { value: Some(value) },
            ..
        }] => Some(Candidate {
            params,
            body: value.as_ref().clone(),
        }),
        _ => None,
    }
}

/// The body of the candidate with its parameters bound to the arguments.
fn instantiate(candidate: &Candidate, arguments: &[Node]) -> Option<Node> {
    if arguments.len() > candidate.params.len() {
        return None;
    }

    let mut bindings = HashMap::new();
    for (i, (name, default)) in candidate.params.iter().enumerate() {
        let value = match arguments.get(i) {
            Some(argument) => match &argument.kind {
                NodeKind::Argument {
                    name: None,
                    value,
                    spread: false,
                } => value.as_ref().clone(),
                _ => return None,
            },
            None => default.clone()?,
        };

        bindings.insert(name.clone(), value);
    }

    Some(transform_post(&candidate.body, |node, _| match &node.kind {
        NodeKind::Variable { name } => match bindings.get(name) {
            Some(value) => Action::Replace(value.clone()),
            None => Action::Keep,
        },
        _ => Action::Keep,
    }))
}

#[cfg(test)]
mod tests {
    use phpast_frontend::parse;

    use super::*;
    use crate::utils::normalize;

    fn check(source: &str, expected: &str) {
        let tree = parse(source).expect("source parses");
        let expected = parse(expected).expect("expected source parses");
        assert_eq!(normalize(&expected), normalize(&inline_functions(&tree)));
    }

    #[test]
    fn substitutes_arguments() {
        check(
            "<?php function add($a, $b) { return $a + $b; } add(1, 2);",
            "<?php function add($a, $b) { return $a + $b; } 1 + 2;",
        );
        check(
            "<?php function twice($x) { return $x * 2; } echo twice($y + 1);",
            "<?php function twice($x) { return $x * 2; } echo ($y + 1) * 2;",
        );
    }

    #[test]
    fn names_match_case_insensitively() {
        check(
            "<?php function Id($v) { return $v; } echo ID(3);",
            "<?php function Id($v) { return $v; } echo 3;",
        );
    }

    #[test]
    fn defaults_fill_missing_arguments() {
        check(
            "<?php function inc($a, $by = 1) { return $a + $by; } echo inc($n);",
            "<?php function inc($a, $by = 1) { return $a + $by; } echo $n + 1;",
        );
        check(
            "<?php function add($a, $b) { return $a + $b; } echo add(1);",
            "<?php function add($a, $b) { return $a + $b; } echo add(1);",
        );
    }

    #[test]
    fn arguments_are_substituted_once() {
        check(
            "<?php function swap($a, $b) { return [$b, $a]; } echo swap($b, $a);",
            "<?php function swap($a, $b) { return [$b, $a]; } echo [$a, $b];",
        );
    }

    #[test]
    fn nested_calls_are_inlined_inside_out() {
        check(
            "<?php function neg($a) { return -$a; } echo neg(neg(1));",
            "<?php function neg($a) { return -$a; } echo -(-1);",
        );
    }

    #[test]
    fn unsuitable_functions_are_left_alone() {
        let sources = [
            "<?php function f($a, $b, $c) { return $a; } echo f(1, 2, 3);",
            "<?php function f($a) { echo $a; return $a; } echo f(1);",
            "<?php function f($a) { return; } f(1);",
            "<?php function f(&$a) { return $a; } echo f($x);",
            "<?php function f(...$a) { return $a; } echo f(1);",
        ];

        for source in sources {
            check(source, source);
        }
    }

    #[test]
    fn unsuitable_calls_are_left_alone() {
        let sources = [
            "<?php function f($a) { return $a; } echo f(...$xs);",
            "<?php function f($a) { return $a; } echo f(a: 1);",
            "<?php function f($a) { return $a; } echo f(1, 2);",
            "<?php function f($a) { return $a; } echo \\f(1);",
            "<?php function f($a) { return $a; } echo $o->f(1);",
            "<?php function f($a) { return $a; } echo f(...);",
        ];

        for source in sources {
            check(source, source);
        }
    }

    #[test]
    fn recursion_terminates() {
        let source = "<?php function f($a) { return f($a); } echo f(1);";
        check(
            source,
            "<?php function f($a) { return f($a); } echo f(1);",
        );
    }
}
