//! Property tests over randomly generated PHP programs.

use phpast_common::{Node, NodeKind};
use phpast_frontend::parse;
use phpast_midend::{
    find_nodes, fold_constants, is_equal, normalize, optimize, remove_dead_code, statistics,
    OptimizeOptions,
};
use proptest::prelude::*;

fn variable() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["$a", "$b", "$c"]).prop_map(String::from)
}

/// Arithmetic and concatenation over small literals and a few variables,
/// fully parenthesized and with a single space between tokens.
fn expression() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0i64..100).prop_map(|n| n.to_string()),
        variable(),
        prop::sample::select(vec!["'x'", "'y'"]).prop_map(String::from),
    ];

    leaf.prop_recursive(4, 32, 2, |inner| {
        let operator = prop::sample::select(vec!["+", "-", "*", "/", "%", "**", "."]);
        (inner.clone(), operator, inner).prop_map(|(left, op, right)| format!("( {left} {op} {right} )"))
    })
}

fn condition() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["true", "false", "$a"]).prop_map(String::from)
}

fn statement() -> impl Strategy<Value = String> {
    let simple = prop_oneof![
        expression().prop_map(|e| format!("{e} ;")),
        expression().prop_map(|e| format!("echo {e} ;")),
        (variable(), expression()).prop_map(|(v, e)| format!("{v} = {e} ;")),
        expression().prop_map(|e| format!("return {e} ;")),
        Just("throw $e ;".to_string()),
    ];

    simple.prop_recursive(3, 24, 4, |inner| {
        let block = prop::collection::vec(inner, 0..4).prop_map(|statements| statements.join(" "));
        prop_oneof![
            (condition(), block.clone(), block.clone())
                .prop_map(|(c, then, other)| format!("if ( {c} ) {{ {then} }} else {{ {other} }}")),
            (condition(), block.clone()).prop_map(|(c, then)| format!("if ( {c} ) {{ {then} }}")),
            block.prop_map(|body| format!("while ( $a ) {{ {body} }}")),
        ]
    })
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(statement(), 0..6)
        .prop_map(|statements| format!("<?php {}", statements.join(" ")))
}

/// Ways of separating tokens which do not change the meaning of a program.
fn separator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "  ",
        "\n",
        "\t",
        " /* comment */ ",
        " // comment\n",
        " # comment\n",
    ])
}

fn parsed(source: &str) -> Result<Node, TestCaseError> {
    parse(source).map_err(|error| TestCaseError::fail(format!("{error} in {source}")))
}

fn top_level(tree: &Node) -> &[Node] {
    match &tree.kind {
        NodeKind::Program { statements } => statements,
        _ => &[],
    }
}

fn terminates(statement: &Node) -> bool {
    matches!(statement.kind, NodeKind::Return { .. } | NodeKind::Throw { .. })
}

fn is_simple(statement: &Node) -> bool {
    matches!(
        statement.kind,
        NodeKind::ExpressionStatement { .. } | NodeKind::Echo { .. }
    )
}

proptest! {
    /// Normalizing twice is the same as normalizing once
    #[test]
    fn normalize_is_idempotent(source in program()) {
        let tree = parsed(&source)?;
        let once = normalize(&tree);
        prop_assert_eq!(&once, &normalize(&once));
    }

    /// Whitespace and comments between tokens do not change the tree
    #[test]
    fn formatting_is_ignored(source in program(), separator in separator()) {
        let tree = parsed(&source)?;
        let reformatted = parsed(&source.replace(' ', separator))?;
        prop_assert_eq!(normalize(&tree), normalize(&reformatted));
        prop_assert!(is_equal(&tree, &reformatted));
    }

    /// Folding a folded tree changes nothing
    #[test]
    fn folding_is_idempotent(source in program()) {
        let once = fold_constants(&parsed(&source)?);
        prop_assert_eq!(&once, &fold_constants(&once));
    }

    /// Folding never makes a tree larger
    #[test]
    fn folding_never_grows_the_tree(source in program()) {
        let tree = parsed(&source)?;
        let folded = fold_constants(&tree);
        prop_assert!(statistics(&folded).node_count <= statistics(&tree).node_count);
    }

    /// Dead code removal never adds statements
    #[test]
    fn dead_code_removal_never_adds_statements(source in program()) {
        let tree = parsed(&source)?;
        let pruned = remove_dead_code(&tree);

        let before = find_nodes(&tree, Node::is_statement).len();
        let after = find_nodes(&pruned, Node::is_statement).len();
        prop_assert!(after <= before, "{} statements became {}", before, after);
    }

    /// Statements before the first `return` or `throw` are never removed
    #[test]
    fn dead_code_removal_keeps_reachable_statements(source in program()) {
        let tree = parsed(&source)?;
        let pruned = remove_dead_code(&tree);

        let reachable: Vec<_> = top_level(&tree)
            .iter()
            .take_while(|statement| !terminates(statement))
            .filter(|statement| is_simple(statement))
            .map(normalize)
            .collect();

        let kept: Vec<_> = top_level(&pruned)
            .iter()
            .filter(|statement| is_simple(statement))
            .map(normalize)
            .collect();

        prop_assert_eq!(reachable, kept);
    }

    /// Every optimization level accepts every tree, and level 0 changes nothing
    #[test]
    fn optimizing_is_total(source in program(), level in 0u8..=3) {
        let tree = parsed(&source)?;
        let optimized = optimize(&tree, &OptimizeOptions::with_level(level));

        if level == 0 {
            prop_assert_eq!(&tree, &optimized);
        }
    }
}
