use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use phpast_common::{Node, NodeKind};

use crate::walk::{walk_with, Visit};

/// A copy of the tree with every location removed, so that trees parsed
/// from differently formatted sources compare equal.
pub fn normalize(tree: &Node) -> Node {
    let mut node = tree.map_children(|child| Some(normalize(child)));
    node.location = None;
    node
}

/// Structural equality, ignoring locations.
pub fn is_equal(a: &Node, b: &Node) -> bool {
    normalize(a) == normalize(b)
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    pub node_count: usize,

    /// The number of nodes of each kind.
    pub kinds: BTreeMap<&'static str, usize>,

    /// The number of nodes on the longest path from the root to a leaf.
    pub max_depth: usize,

    /// Function declarations, methods, closures and arrow functions.
    pub function_count: usize,

    /// Classes, including anonymous ones, interfaces, traits and enums.
    pub class_count: usize,

    /// The distinct names of the variables used anywhere, without `$`.
    pub variables: BTreeSet<String>,
}

pub fn statistics(tree: &Node) -> Statistics {
    let mut stats = Statistics::default();
    walk_with(tree, &mut stats, |node, cx| {
        let stats = &mut *cx.data;
        stats.node_count += 1;
        *stats.kinds.entry(node.kind_name()).or_default() += 1;
        stats.max_depth = stats.max_depth.max(cx.depth + 1);

        if node.is_function_like() {
            stats.function_count += 1;
        }

        if node.is_class_like() {
            stats.class_count += 1;
        }

        if let NodeKind::Variable { name } = &node.kind {
            stats.variables.insert(name.clone());
        }

        Visit::<()>::Continue
    });

    stats
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:     {}", self.node_count)?;
        writeln!(f, "depth:     {}", self.max_depth)?;
        writeln!(f, "functions: {}", self.function_count)?;
        writeln!(f, "classes:   {}", self.class_count)?;

        write!(f, "variables:")?;
        for name in &self.variables {
            write!(f, " ${name}")?;
        }
        writeln!(f)?;

        writeln!(f, "kinds:")?;
        for (kind, count) in &self.kinds {
            writeln!(f, "  {kind:<24}{count}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use phpast_frontend::parse;

    use super::*;

    #[test]
    fn normalize_strips_every_location() {
        let tree = parse("<?php echo $a + 1; function f() { return [1]; }").expect("source parses");
        assert!(tree.location.is_some());

        let normalized = normalize(&tree);
        let mut located = 0;
        walk_with(&normalized, &mut located, |node, cx| {
            if node.location.is_some() {
                *cx.data += 1;
            }
            Visit::<()>::Continue
        });

        assert_eq!(0, located);
        assert_eq!(normalized, normalize(&normalized));
    }

    #[test]
    fn equality_ignores_formatting() {
        let a = parse("<?php echo $a+1;").expect("source parses");
        let b = parse("<?php\n\n  echo   $a\n + 1 ; // done").expect("source parses");
        let c = parse("<?php echo $a + 2;").expect("source parses");

        assert_ne!(a, b);
        assert!(is_equal(&a, &b));
        assert!(!is_equal(&a, &c));
    }

    #[test]
    fn counts_nodes_and_kinds() {
        let tree = parse("<?php $a = 1; echo $a, $b;").expect("source parses");
        let stats = statistics(&tree);

        // Program, ExpressionStatement, Assignment, Variable, NumberLiteral,
        // Echo, Variable, Variable
        assert_eq!(8, stats.node_count);
        assert_eq!(Some(&3), stats.kinds.get("Variable"));
        assert_eq!(Some(&1), stats.kinds.get("Echo"));
        assert_eq!(4, stats.max_depth);
        assert_eq!(
            vec!["a", "b"],
            stats.variables.iter().map(String::as_str).collect::<Vec<_>>()
        );
    }

    #[test]
    fn counts_functions_and_classes() {
        let tree = parse(
            "<?php
            function f() { return fn($x) => $x; }
            class A { public function m() { } }
            interface I { }
            $o = new class { };
            $c = function () { };",
        )
        .expect("source parses");

        let stats = statistics(&tree);
        assert_eq!(4, stats.function_count);
        assert_eq!(3, stats.class_count);
    }

    #[test]
    fn empty_programs() {
        let stats = statistics(&parse("<?php").expect("source parses"));
        assert_eq!(1, stats.node_count);
        assert_eq!(1, stats.max_depth);
        assert!(stats.variables.is_empty());
    }
}
