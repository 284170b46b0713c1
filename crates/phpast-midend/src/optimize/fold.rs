//! Constant folding of arithmetic on number literals and concatenation of
//! string literals.
//!
//! Integer arithmetic behaves like PHP's: a result that does not fit in an
//! `i64` becomes a float, and division only produces an integer when it is
//! exact. Anything that would raise an error at runtime, such as a division
//! by zero, is left for the runtime to complain about.

use log::{debug, trace};

use phpast_common::tree::{BinaryOp, Number};
use phpast_common::{Node, NodeKind};

use crate::transform::{transform_post, Action};

pub fn fold_constants(tree: &Node) -> Node {
    let mut folded = 0;
    let result = transform_post(tree, |node, _| {
        let NodeKind::Binary {
            operator,
            left,
            right,
        } = &node.kind
        else {
            return Action::Keep;
        };

        let kind = match (&left.kind, &right.kind) {
            (
                NodeKind::NumberLiteral { value: left },
                NodeKind::NumberLiteral { value: right },
            ) => match arithmetic(*operator, *left, *right) {
                Some(value) => NodeKind::NumberLiteral { value },
                None => return Action::Keep,
            },

            (
                NodeKind::StringLiteral { value: left, quote },
                NodeKind::StringLiteral { value: right, .. },
            ) if *operator == BinaryOp::Concat => NodeKind::StringLiteral {
                value: format!("{left}{right}"),
                quote: *quote,
            },

            _ => return Action::Keep,
        };

        trace!("folded a `{}`", operator.symbol());
        folded += 1;

        Action::Replace(Node {
            kind,
            location: node.location,
        })
    });

    debug!("folded {folded} constant expressions");
    result
}

fn arithmetic(operator: BinaryOp, left: Number, right: Number) -> Option<Number> {
    let result = match (left, right) {
        (Number::Int(a), Number::Int(b)) => integer(operator, a, b)?,
        _ => match operator {
            BinaryOp::Mod => modulo(to_int(left)?, to_int(right)?)?,
            BinaryOp::Div if right.as_f64() == 0.0 => return None,
            _ => Number::Float(float(operator, left.as_f64(), right.as_f64())?),
        },
    };

    match result {
        Number::Float(value) if !value.is_finite() => None,
        result => Some(result),
    }
}

fn integer(operator: BinaryOp, a: i64, b: i64) -> Option<Number> {
    let promote = || float(operator, a as f64, b as f64).map(Number::Float);

    match operator {
        BinaryOp::Add => a.checked_add(b).map(Number::Int).or_else(promote),
        BinaryOp::Sub => a.checked_sub(b).map(Number::Int).or_else(promote),
        BinaryOp::Mul => a.checked_mul(b).map(Number::Int).or_else(promote),

        BinaryOp::Div if b == 0 => None,
        BinaryOp::Div => match (a.checked_rem(b), a.checked_div(b)) {
            (Some(0), Some(quotient)) => Some(Number::Int(quotient)),
            _ => promote(),
        },

        BinaryOp::Mod => modulo(a, b),

        BinaryOp::Pow if b >= 0 => u32::try_from(b)
            .ok()
            .and_then(|exponent| a.checked_pow(exponent))
            .map(Number::Int)
            .or_else(promote),
        BinaryOp::Pow => promote(),

        _ => None,
    }
}

fn float(operator: BinaryOp, a: f64, b: f64) -> Option<f64> {
    Some(match operator {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Pow => a.powf(b),
        _ => return None,
    })
}

/// `%` works on integers, and the sign of the result follows the dividend.
fn modulo(a: i64, b: i64) -> Option<Number> {
    if b == 0 {
        return None;
    }

    a.checked_rem(b).map(Number::Int)
}

fn to_int(number: Number) -> Option<i64> {
    match number {
        Number::Int(value) => Some(value),
        Number::Float(value) if value.is_finite() && value.abs() < i64::MAX as f64 => {
            Some(value.trunc() as i64)
        }
        Number::Float(_) => None,
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
        assert_eq!(normalize(&expected), normalize(&fold_constants(&tree)));
    }

    fn folded(source: &str) -> NodeKind {
        let tree = fold_constants(&parse(source).expect("source parses"));
        let NodeKind::Program { mut statements } = tree.kind else {
            panic!("not a program");
        };

        match statements.pop().map(|statement| statement.kind) {
            Some(NodeKind::ExpressionStatement { expression }) => expression.kind,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn folds_integer_arithmetic() {
        check("<?php 1 + 2;", "<?php 3;");
        check("<?php 2 * 3 + 4;", "<?php 10;");
        check("<?php 2 * (3 + 4);", "<?php 14;");
        check("<?php 10 - 4 - 3;", "<?php 3;");
        check("<?php 2 ** 10;", "<?php 1024;");
        check("<?php 7 % 3;", "<?php 1;");
        check("<?php -7 % 3;", "<?php -7 % 3;");
        check("<?php 8 / 2;", "<?php 4;");
    }

    #[test]
    fn follows_php_number_semantics() {
        assert_eq!(
            NodeKind::NumberLiteral {
                value: Number::Float(0.5)
            },
            folded("<?php 1 / 2;")
        );

        assert_eq!(
            NodeKind::NumberLiteral {
                value: Number::Float(2.5)
            },
            folded("<?php 1.5 + 1;")
        );

        assert_eq!(
            NodeKind::NumberLiteral {
                value: Number::Float(8.0)
            },
            folded("<?php 2 ** 3.0;")
        );

        assert_eq!(
            NodeKind::NumberLiteral {
                value: Number::Int(1)
            },
            folded("<?php 7.9 % 3;")
        );

        assert_eq!(
            NodeKind::NumberLiteral {
                value: Number::Float(i64::MAX as f64 + 1.0)
            },
            folded("<?php 9223372036854775807 + 1;")
        );
    }

    #[test]
    fn leaves_runtime_errors_alone() {
        check("<?php 1 / 0;", "<?php 1 / 0;");
        check("<?php 1 % 0;", "<?php 1 % 0;");
        check("<?php 1.5 / 0.0;", "<?php 1.5 / 0.0;");
    }

    #[test]
    fn concatenates_strings() {
        check("<?php 'a' . 'b';", "<?php 'ab';");
        check("<?php 'a' . 'b' . 'c';", "<?php 'abc';");
        check(r#"<?php "a\n" . 'b';"#, r#"<?php "a\nb";"#);
    }

    #[test]
    fn ignores_everything_else() {
        check("<?php $a + 1;", "<?php $a + 1;");
        check("<?php 1 . 2;", "<?php 1 . 2;");
        check("<?php 'a' + 'b';", "<?php 'a' + 'b';");
        check("<?php 1 < 2;", "<?php 1 < 2;");
        check("<?php 1 + 2 + $a;", "<?php 3 + $a;");
        check("<?php $a + 1 + 2;", "<?php $a + 1 + 2;");
    }

    #[test]
    fn folds_inside_nested_code() {
        check(
            "<?php function f() { return [1 + 1, 'x' . 'y']; }",
            "<?php function f() { return [2, 'xy']; }",
        );
    }

    #[test]
    fn folding_is_idempotent() {
        let tree = parse("<?php $a = 1 + 2 * 3; echo 'a' . 'b', 4 / 3;").expect("source parses");
        let once = fold_constants(&tree);
        assert_eq!(once, fold_constants(&once));
    }
}
