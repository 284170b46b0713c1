//! Semantic checks on a parsed tree.
//!
//! The validator reports three kinds of problem:
//!
//! - `break` or `continue` with no enclosing loop or switch in the same
//!   function (an error),
//! - loops whose condition is always true, `while (true)` and `for (;;)`
//!   (a warning),
//! - variables read without any visible definition (a warning).
//!
//! The undefined variable check is a heuristic. A variable counts as defined
//! when some enclosing construct binds it (a parameter, a closure `use`, a
//! `foreach` or a `catch`) or when it is assigned, declared `global` or
//! `static`, or bound by a `foreach` anywhere *before* the read among the
//! siblings of the read or of one of its ancestors. Branches and loops are
//! not followed, so code like `if ($c) { $x = 1; } echo $x;` is accepted.

use std::ptr;

use log::{debug, info, trace};

use phpast_common::message::{Code, Diagnostic, MessageContainer, MessageMaker, Severity};
use phpast_common::tree::{AssignOp, BinaryOp, Number};
use phpast_common::{Node, NodeKind};

use crate::walk::{walk, walk_with, Context, Visit};

/// Variables which are available everywhere.
const SUPERGLOBALS: &[&str] = &[
    "GLOBALS", "_SERVER", "_GET", "_POST", "_FILES", "_COOKIE", "_SESSION", "_REQUEST", "_ENV",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Validation<'a> {
    /// Whether no errors were found. Warnings do not make a tree invalid.
    pub valid: bool,
    pub errors: Vec<Diagnostic<'a>>,
    pub warnings: Vec<Diagnostic<'a>>,
}

pub fn validate(tree: &Node) -> Validation<'_> {
    info!("validating");

    let mut messages = Vec::new();
    walk_with(tree, &mut messages, |node, cx| {
        check(node, cx);
        Visit::<()>::Continue
    });

    let (errors, warnings): (Vec<_>, Vec<_>) = messages
        .into_iter()
        .partition(|diagnostic| diagnostic.severity == Severity::Error);

    debug!(
        "validation found {} errors and {} warnings",
        errors.len(),
        warnings.len()
    );

    Validation {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

trait ValidationMessages {
    fn outside_loop(&mut self, keyword: &str);
    fn too_many_levels(&mut self, keyword: &str, levels: i64);
    fn infinite_loop(&mut self);
    fn undefined_variable(&mut self, name: &str);
}

impl<'a, C: MessageContainer<'a>> ValidationMessages for MessageMaker<'a, C> {
    fn outside_loop(&mut self, keyword: &str) {
        let message = self
            .error(Code::InvalidBreakContinue)
            .with_message(format!("`{keyword}` outside of a loop or switch"));
        self.add(message)
    }

    fn too_many_levels(&mut self, keyword: &str, levels: i64) {
        let message = self
            .error(Code::InvalidBreakContinue)
            .with_message(format!("cannot `{keyword}` {levels} levels"));
        self.add(message)
    }

    fn infinite_loop(&mut self) {
        let message = self
            .warning(Code::InfiniteLoop)
            .with_message("the condition of this loop is always true");
        self.add(message)
    }

    fn undefined_variable(&mut self, name: &str) {
        let message = self
            .warning(Code::UndefinedVariable)
            .with_message(format!("undefined variable `${name}`"));
        self.add(message)
    }
}

type Messages<'a> = Vec<Diagnostic<'a>>;

fn at<'a, 'b>(
    cx: &'b mut Context<'a, '_, Messages<'a>>,
    node: &'a Node,
) -> MessageMaker<'a, &'b mut Messages<'a>> {
    MessageMaker::new(&mut *cx.data, node)
}

fn check<'a>(node: &'a Node, cx: &mut Context<'a, '_, Messages<'a>>) {
    match &node.kind {
        NodeKind::Break { levels } | NodeKind::Continue { levels } => {
            let keyword = match node.kind {
                NodeKind::Break { .. } => "break",
                _ => "continue",
            };

            let available = enclosing_loops(&cx.ancestors);
            let wanted = match levels.as_deref().map(|levels| &levels.kind) {
                Some(NodeKind::NumberLiteral {
                    value: Number::Int(levels),
                }) => *levels,
                _ => 1,
            };

            if available == 0 {
                at(cx, node).outside_loop(keyword);
            } else if wanted < 1 || wanted as usize > available {
                at(cx, node).too_many_levels(keyword, wanted);
            }
        }

        NodeKind::While { condition, .. } if is_true(condition) => at(cx, node).infinite_loop(),
        NodeKind::For { condition, .. } if condition.is_empty() => at(cx, node).infinite_loop(),

        NodeKind::Variable { name } => {
            if is_read(node, &cx.ancestors) && !is_defined(name, node, &cx.ancestors) {
                trace!("`${name}` has no visible definition");
                at(cx, node).undefined_variable(name);
            }
        }

        _ => {}
    }
}

/// The number of loops and switches a `break` can leave without crossing
/// into another function or class.
fn enclosing_loops(ancestors: &[&Node]) -> usize {
    ancestors
        .iter()
        .rev()
        .take_while(|ancestor| !ancestor.is_function_like() && !ancestor.is_class_like())
        .filter(|ancestor| ancestor.is_breakable())
        .count()
}

fn is_true(condition: &Node) -> bool {
    matches!(condition.kind, NodeKind::BooleanLiteral { value: true })
}

/// Whether this variable occurrence reads the variable, as opposed to
/// binding it or merely testing for its existence.
fn is_read(node: &Node, ancestors: &[&Node]) -> bool {
    // Assignment targets, including destructuring and `$a[] = ...`.
    let mut child = node;
    for &ancestor in ancestors.iter().rev() {
        match &ancestor.kind {
            NodeKind::ArrayElement { value, .. } if ptr::eq(&**value, child) => {}
            NodeKind::Array { .. } | NodeKind::List { .. } => {}
            NodeKind::Index { object, .. } if ptr::eq(&**object, child) => {}

            NodeKind::Assignment {
                operator,
                target,
                value,
                by_ref,
            } => {
                let assigned = ptr::eq(&**target, child)
                    && matches!(operator, AssignOp::Assign | AssignOp::Coalesce);
                let referenced = *by_ref && ptr::eq(&**value, child);
                if assigned || referenced {
                    return false;
                }
                break;
            }

            NodeKind::Foreach { key, value, .. } => {
                let bound = ptr::eq(&**value, child)
                    || key.as_deref().map_or(false, |key| ptr::eq(key, child));
                if bound {
                    return false;
                }
                break;
            }

            _ => break,
        }

        child = ancestor;
    }

    if let Some(parent) = ancestors.last() {
        match &parent.kind {
            NodeKind::Global { .. } => return false,
            NodeKind::StaticVariable { variable, .. } if ptr::eq(&**variable, node) => {
                return false
            }
            NodeKind::Catch {
                variable: Some(variable),
                ..
            } if ptr::eq(&**variable, node) => return false,
            NodeKind::StaticMember { member, .. } if ptr::eq(&**member, node) => return false,
            _ => {}
        }
    }

    // Existence tests.
    let mut child = node;
    for &ancestor in ancestors.iter().rev() {
        match &ancestor.kind {
            NodeKind::Isset { .. } | NodeKind::Empty { .. } | NodeKind::Unset { .. } => {
                return false
            }
            NodeKind::Binary {
                operator: BinaryOp::Coalesce,
                left,
                ..
            } if ptr::eq(&**left, child) => return false,
            _ if ancestor.is_statement() || ancestor.is_function_like() => break,
            _ => {}
        }

        child = ancestor;
    }

    true
}

fn is_defined(name: &str, node: &Node, ancestors: &[&Node]) -> bool {
    if SUPERGLOBALS.contains(&name) {
        return true;
    }

    if name == "this" && ancestors.iter().any(|ancestor| has_this(ancestor)) {
        return true;
    }

    let mut child = node;
    for &ancestor in ancestors.iter().rev() {
        match &ancestor.kind {
            NodeKind::FunctionDeclaration { params, .. } | NodeKind::Method { params, .. } => {
                return has_parameter(params, name);
            }

            NodeKind::Closure { params, uses, .. } => {
                let captured = uses.iter().any(|used| {
                    matches!(&used.kind, NodeKind::ClosureUse { name: used, .. } if used == name)
                });
                return captured || has_parameter(params, name);
            }

            // Arrow functions capture the enclosing scope by value.
            NodeKind::ArrowFunction { params, .. } if has_parameter(params, name) => return true,

            NodeKind::Foreach { key, value, .. } => {
                if binds(value, name) || key.as_deref().map_or(false, |key| binds(key, name)) {
                    return true;
                }
            }

            NodeKind::Catch {
                variable: Some(variable),
                ..
            } if binds(variable, name) => return true,

            _ if ancestor.is_class_like() => return false,
            _ => {}
        }

        let preceding = ancestor
            .children()
            .into_iter()
            .take_while(|sibling| !ptr::eq(*sibling, child));

        for sibling in preceding {
            if defines(sibling, name) {
                return true;
            }
        }

        child = ancestor;
    }

    false
}

fn has_this(node: &Node) -> bool {
    node.is_class_like()
        || matches!(
            node.kind,
            NodeKind::Method { .. } | NodeKind::Closure { .. } | NodeKind::ArrowFunction { .. }
        )
}

fn has_parameter(params: &[Node], name: &str) -> bool {
    params
        .iter()
        .any(|param| matches!(&param.kind, NodeKind::Parameter { name: param, .. } if param == name))
}

/// Whether anything within this node, outside of nested functions and
/// classes, defines the variable.
fn defines(node: &Node, name: &str) -> bool {
    walk(node, |node, _| {
        if node.is_function_like() || node.is_class_like() {
            return Visit::Skip;
        }

        let found = match &node.kind {
            NodeKind::Assignment { target, .. } => binds(target, name),
            NodeKind::Global { variables } => variables.iter().any(|variable| binds(variable, name)),
            NodeKind::StaticVariable { variable, .. } => binds(variable, name),
            NodeKind::Foreach { key, value, .. } => {
                binds(value, name) || key.as_deref().map_or(false, |key| binds(key, name))
            }
            NodeKind::Catch {
                variable: Some(variable),
                ..
            } => binds(variable, name),
            _ => false,
        };

        if found {
            Visit::Found(())
        } else {
            Visit::Continue
        }
    })
    .is_some()
}

/// Whether assigning to this target binds the variable.
fn binds(target: &Node, name: &str) -> bool {
    match &target.kind {
        NodeKind::Variable { name: bound } => bound == name,
        NodeKind::Array { elements, .. } | NodeKind::List { elements } => {
            elements.iter().any(|element| match &element.kind {
                NodeKind::ArrayElement { value, .. } => binds(value, name),
                _ => false,
            })
        }
        NodeKind::Index { object, .. } => binds(object, name),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use phpast_frontend::parse;

    use super::*;

    fn codes(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
        diagnostics
            .iter()
            .map(|diagnostic| diagnostic.code.tag())
            .collect()
    }

    fn check(source: &str, errors: &[&str], warnings: &[&str]) {
        let tree = parse(source).expect("source parses");
        let validation = validate(&tree);

        assert_eq!(errors, codes(&validation.errors), "errors of {source}");
        assert_eq!(warnings, codes(&validation.warnings), "warnings of {source}");
        assert_eq!(errors.is_empty(), validation.valid);
    }

    fn undefined(source: &str) -> Vec<String> {
        let tree = parse(source).expect("source parses");
        validate(&tree)
            .warnings
            .iter()
            .filter(|warning| warning.code == Code::UndefinedVariable)
            .map(|warning| match &warning.node.kind {
                NodeKind::Variable { name } => name.clone(),
                other => panic!("warning about a {other:?}"),
            })
            .collect()
    }

    #[test]
    fn break_outside_of_a_loop() {
        check("<?php break;", &["invalid-break-continue"], &[]);
        check("<?php continue;", &["invalid-break-continue"], &[]);
    }

    #[test]
    fn break_inside_loops_and_switches() {
        check(
            "<?php $a = 1; $xs = [];
            while ($a) { break; }
            do { continue; } while ($a);
            foreach ($xs as $x) { if ($x) { continue; } }
            for ($i = 0; $i < 3; $i++) { break 1; }
            switch ($a) { case 1: break; }",
            &[],
            &[],
        );
    }

    #[test]
    fn functions_hide_enclosing_loops() {
        check(
            "<?php $a = 1; while ($a) { $f = function () { break; }; }",
            &["invalid-break-continue"],
            &[],
        );
        check(
            "<?php $a = 1; while ($a) { function f() { continue; } }",
            &["invalid-break-continue"],
            &[],
        );
    }

    #[test]
    fn break_levels_are_counted() {
        check(
            "<?php $a = 1; while ($a) { while ($a) { break 2; } }",
            &[],
            &[],
        );
        check(
            "<?php $a = 1; while ($a) { break 2; }",
            &["invalid-break-continue"],
            &[],
        );
        check(
            "<?php $a = 1; while ($a) { break 0; }",
            &["invalid-break-continue"],
            &[],
        );
    }

    #[test]
    fn infinite_loops_are_warned_about() {
        check("<?php while (true) { }", &[], &["infinite-loop"]);
        check("<?php for (;;) { }", &[], &["infinite-loop"]);
        check("<?php while (true) { break; }", &[], &["infinite-loop"]);
        check("<?php $a = 1; while ($a) { }", &[], &[]);
        check("<?php while (false) { }", &[], &[]);
    }

    #[test]
    fn diagnostics_point_at_their_node() {
        let tree = parse("<?php\n\nbreak;").expect("source parses");
        let validation = validate(&tree);
        let error = validation.errors.first().expect("one error");

        assert!(matches!(error.node.kind, NodeKind::Break { .. }));
        assert_eq!(error.node.location, error.location);
        assert_eq!(Some(3), error.location.map(|location| location.start.line));
        assert!(error.message.contains("break"));
    }

    #[test]
    fn defined_variables() {
        let sources = [
            "<?php function f($a) { return $a; }",
            "<?php $y = 1; $f = function ($a) use ($y) { return $a + $y; };",
            "<?php $m = 2; $f = fn($a) => $a * $m;",
            "<?php foreach ([1, 2] as $k => $v) { echo $k, $v; }",
            "<?php foreach ([[1, 2]] as [$a, $b]) { echo $a + $b; }",
            "<?php try { } catch (Exception $e) { echo $e; }",
            "<?php function f() { global $g; static $s = 0; return $g + $s; }",
            "<?php [$a, $b] = [1, 2]; list(, $c) = [1, 2]; echo $a, $b, $c;",
            "<?php class A { public function f() { return $this; } }",
            "<?php $f = function () { return $this; };",
            "<?php echo $_GET['a'], $GLOBALS['b'];",
            "<?php if (isset($x) || empty($y)) { unset($z); } echo $w ?? 1;",
            "<?php $a[] = 1; echo $a[0];",
            "<?php $x ??= 1; echo $x;",
            "<?php $i = 0; for ($j = 0; $j < 3; $j++) { $i += $j; }",
            "<?php if ($c = f()) { echo $c; }",
            "<?php $a = 1; $b = &$undefined; echo $a;",
            "<?php if ($c = 1) { $x = 1; } echo $x;",
        ];

        for source in sources {
            assert_eq!(Vec::<String>::new(), undefined(source), "in {source}");
        }
    }

    #[test]
    fn undefined_variables() {
        let cases = [
            ("<?php echo $x;", vec!["x"]),
            ("<?php function f() { return $x; }", vec!["x"]),
            ("<?php $x = 1; function f() { return $x; }", vec!["x"]),
            ("<?php $x = $x + 1;", vec!["x"]),
            ("<?php function f() { return $this; }", vec!["this"]),
            ("<?php echo $a; $a = 1;", vec!["a"]),
            ("<?php $f = function () { return $y; };", vec!["y"]),
            ("<?php $o->p = $q;", vec!["o", "q"]),
            ("<?php $x += 1;", vec!["x"]),
        ];

        for (source, expected) in cases {
            assert_eq!(expected, undefined(source), "in {source}");
        }
    }

    #[test]
    fn errors_and_warnings_are_separated() {
        let tree = parse("<?php break; echo $x; while (true) { }").expect("source parses");
        let validation = validate(&tree);

        assert!(!validation.valid);
        assert_eq!(1, validation.errors.len());

        let warnings = validation
            .warnings
            .iter()
            .map(|warning| warning.code)
            .sorted_by_key(|code| code.tag())
            .collect_vec();
        assert_eq!(vec![Code::InfiniteLoop, Code::UndefinedVariable], warnings);
    }
}
