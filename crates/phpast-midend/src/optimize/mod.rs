//! Tree to tree optimizations. Every pass is a pure function from a tree to
//! a new tree, and [`optimize`] chains them according to an optimization
//! level:
//!
//! ```text
//! level 0   nothing
//! level 1   constant folding, dead code removal
//! level 2   ... then unused variable removal
//! level 3   ... then inlining, and folding once more
//! ```
//!
//! Each pass can also be switched off on its own.

mod dead;
mod fold;
mod inline;
mod unused;

pub use self::dead::remove_dead_code;
pub use self::fold::fold_constants;
pub use self::inline::inline_functions;
pub use self::unused::{remove_unused_variables, remove_unused_variables_with};

use log::{info, trace};

use phpast_common::Node;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OptimizeOptions {
    pub level: u8,
    pub constant_folding: bool,
    pub dead_code: bool,
    pub unused_variables: bool,
    pub inlining: bool,

    /// Keep unused assignments whose value has side effects, or which may be
    /// observed through a reference or a dynamic variable access.
    pub conservative: bool,
}

impl OptimizeOptions {
    pub fn with_level(level: u8) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            level: 1,
            constant_folding: true,
            dead_code: true,
            unused_variables: true,
            inlining: true,
            conservative: false,
        }
    }
}

pub fn optimize(tree: &Node, options: &OptimizeOptions) -> Node {
    info!("optimizing at level {}", options.level);

    let mut tree = tree.clone();
    if options.level == 0 {
        return tree;
    }

    if options.constant_folding {
        tree = fold_constants(&tree);
    }

    if options.dead_code {
        tree = remove_dead_code(&tree);
    }

    if options.level >= 2 && options.unused_variables {
        tree = remove_unused_variables_with(&tree, options.conservative);
    }

    if options.level >= 3 && options.inlining {
        tree = inline_functions(&tree);
        if options.constant_folding {
            tree = fold_constants(&tree);
        }
    }

    trace!("done optimizing");
    tree
}

#[cfg(test)]
mod tests {
    use phpast_frontend::parse;

    use super::*;
    use crate::utils::normalize;

    fn check(level: u8, source: &str, expected: &str) {
        check_with(&OptimizeOptions::with_level(level), source, expected);
    }

    fn check_with(options: &OptimizeOptions, source: &str, expected: &str) {
        let tree = parse(source).expect("source parses");
        let expected = parse(expected).expect("expected source parses");
        assert_eq!(normalize(&expected), normalize(&optimize(&tree, options)));
    }

    #[test]
    fn level_zero_does_nothing() {
        let source = "<?php $x = 1 + 2; if (false) { echo 1; }";
        check(0, source, source);
    }

    #[test]
    fn folding_and_dead_code() {
        check(1, "<?php 1 + 2;", "<?php 3;");
        check(
            1,
            "<?php if (false) { echo 1; } else { echo 2; }",
            "<?php { echo 2; }",
        );
        check(
            1,
            "<?php function f() { return 2 * 3; echo 1; }",
            "<?php function f() { return 6; }",
        );
    }

    #[test]
    fn unused_variables_need_level_two() {
        check(1, "<?php $x = 1; echo 2;", "<?php $x = 1; echo 2;");
        check(2, "<?php $x = 1; echo 2;", "<?php echo 2;");
    }

    #[test]
    fn unused_values_are_dropped_unless_conservative() {
        check(2, "<?php $x = f(); echo 2;", "<?php echo 2;");

        let options = OptimizeOptions {
            conservative: true,
            ..OptimizeOptions::with_level(2)
        };
        check_with(
            &options,
            "<?php $x = f(); $y = 1; echo 2;",
            "<?php $x = f(); echo 2;",
        );
    }

    #[test]
    fn inlining_needs_level_three() {
        let source = "<?php function add($a, $b) { return $a + $b; } add(1, 2);";
        check(2, source, source);
        check(
            3,
            source,
            "<?php function add($a, $b) { return $a + $b; } 3;",
        );
    }

    #[test]
    fn passes_can_be_switched_off() {
        let options = OptimizeOptions {
            constant_folding: false,
            ..OptimizeOptions::with_level(3)
        };

        check_with(
            &options,
            "<?php function add($a, $b) { return $a + $b; } add(1, 2);",
            "<?php function add($a, $b) { return $a + $b; } 1 + 2;",
        );

        let options = OptimizeOptions {
            dead_code: false,
            ..OptimizeOptions::default()
        };

        check_with(
            &options,
            "<?php if (true) { echo 1 + 1; }",
            "<?php if (true) { echo 2; }",
        );
    }

    #[test]
    fn the_input_is_left_untouched() {
        let tree = parse("<?php $x = 1 + 2; return; echo $x;").expect("source parses");
        let before = tree.clone();
        let _ = optimize(&tree, &OptimizeOptions::with_level(3));
        assert_eq!(before, tree);
    }
}
