//! Explicit, per-variant access to the structural children of a node. Both
//! the read-only view ([`Node::children`]) and the rebuilding view
//! ([`Node::map_children`]) list children in the order they appear in the
//! source, e.g. condition, then-branch, else-ifs and else-branch for an `if`.

use super::{Node, NodeKind};

impl Node {
    /// The direct structural children of this node, in textual order.
    pub fn children(&self) -> Vec<&Node> {
        let c = Collector::default();

        let c = match &self.kind {
            NodeKind::Program { statements } => c.many(statements),

            NodeKind::ExpressionStatement { expression } => c.one(expression),
            NodeKind::Block { statements } => c.many(statements),
            NodeKind::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
            } => c
                .one(condition)
                .one(then_branch)
                .many(else_ifs)
                .opt(else_branch),
            NodeKind::ElseIf { condition, body } => c.one(condition).one(body),
            NodeKind::While { condition, body } => c.one(condition).one(body),
            NodeKind::DoWhile { body, condition } => c.one(body).one(condition),
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => c.many(init).many(condition).many(update).one(body),
            NodeKind::Foreach {
                subject,
                key,
                value,
                body,
                ..
            } => c.one(subject).opt(key).one(value).one(body),
            NodeKind::Switch { subject, cases } => c.one(subject).many(cases),
            NodeKind::Case { test, body } => c.opt(test).many(body),
            NodeKind::Break { levels } | NodeKind::Continue { levels } => c.opt(levels),
            NodeKind::Return { value } => c.opt(value),
            NodeKind::Throw { expression } => c.one(expression),
            NodeKind::Try {
                body,
                catches,
                finally,
            } => c.one(body).many(catches).opt(finally),
            NodeKind::Catch {
                types,
                variable,
                body,
            } => c.many(types).opt(variable).one(body),
            NodeKind::Echo { expressions } => c.many(expressions),
            NodeKind::Global { variables }
            | NodeKind::StaticVariables { variables }
            | NodeKind::Unset { variables } => c.many(variables),
            NodeKind::StaticVariable { variable, default } => c.one(variable).opt(default),
            NodeKind::InlineHtml { .. }
            | NodeKind::Nop
            | NodeKind::Label { .. }
            | NodeKind::Goto { .. }
            | NodeKind::Use { .. } => c,
            NodeKind::Namespace { statements, .. } => c.many(statements),
            NodeKind::ConstDeclaration { constants } => c.many(constants),
            NodeKind::Const { value, .. } => c.one(value),
            NodeKind::Declare { directives, body } => c.many(directives).opt(body),

            NodeKind::FunctionDeclaration { params, body, .. } => c.many(params).one(body),
            NodeKind::Parameter { default, .. } => c.opt(default),
            NodeKind::ClassDeclaration {
                extends,
                implements,
                members,
                ..
            } => c.opt(extends).many(implements).many(members),
            NodeKind::InterfaceDeclaration {
                extends, members, ..
            } => c.many(extends).many(members),
            NodeKind::TraitDeclaration { members, .. } => c.many(members),
            NodeKind::EnumDeclaration {
                implements,
                members,
                ..
            } => c.many(implements).many(members),
            NodeKind::Method { params, body, .. } => c.many(params).opt(body),
            NodeKind::Property { default, .. } => c.opt(default),
            NodeKind::ClassConstant { value, .. } => c.one(value),
            NodeKind::TraitUse { traits } => c.many(traits),
            NodeKind::EnumCase { value, .. } => c.opt(value),

            NodeKind::Assignment { target, value, .. } => c.one(target).one(value),
            NodeKind::Binary { left, right, .. } => c.one(left).one(right),
            NodeKind::Unary { operand, .. } | NodeKind::Update { operand, .. } => c.one(operand),
            NodeKind::Cast { expression, .. } => c.one(expression),
            NodeKind::Conditional {
                condition,
                consequent,
                alternate,
            } => c.one(condition).opt(consequent).one(alternate),
            NodeKind::Call { callee, arguments } => c.one(callee).many(arguments),
            NodeKind::Argument { value, .. } => c.one(value),
            NodeKind::VariadicPlaceholder => c,
            NodeKind::Member {
                object, property, ..
            } => c.one(object).one(property),
            NodeKind::StaticMember { class, member } => c.one(class).one(member),
            NodeKind::Index { object, index } => c.one(object).opt(index),
            NodeKind::Array { elements, .. } | NodeKind::List { elements } => c.many(elements),
            NodeKind::ArrayElement { key, value, .. } => c.opt(key).one(value),
            NodeKind::Closure {
                params, uses, body, ..
            } => c.many(params).many(uses).one(body),
            NodeKind::ClosureUse { .. } => c,
            NodeKind::ArrowFunction { params, body, .. } => c.many(params).one(body),
            NodeKind::New { class, arguments } => c.one(class).many(arguments),
            NodeKind::Clone { expression }
            | NodeKind::YieldFrom { expression }
            | NodeKind::Empty { expression }
            | NodeKind::Eval { expression }
            | NodeKind::Print { expression } => c.one(expression),
            NodeKind::Yield { key, value } => c.opt(key).opt(value),
            NodeKind::Match { subject, arms } => c.one(subject).many(arms),
            NodeKind::MatchArm { conditions, body } => c.many(conditions).one(body),
            NodeKind::Include { path, .. } => c.one(path),
            NodeKind::Isset { variables } => c.many(variables),
            NodeKind::Exit { value } => c.opt(value),
            NodeKind::ShellExec { parts }
            | NodeKind::InterpolatedString { parts }
            | NodeKind::Heredoc { parts, .. } => c.many(parts),

            NodeKind::NumberLiteral { .. }
            | NodeKind::StringLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::NullLiteral
            | NodeKind::Identifier { .. }
            | NodeKind::Variable { .. }
            | NodeKind::Name { .. } => c,
            NodeKind::VariableVariable { expression } => c.one(expression),
        };

        c.nodes
    }

    /// Rebuild this node with every structural child replaced by the result
    /// of `f`. Children for which `f` returns `None` are removed: dropped from
    /// sequences, set to `None` when optional, and replaced by an empty
    /// statement when mandatory. Non-structural fields are copied as is.
    pub fn map_children(&self, f: impl FnMut(&Node) -> Option<Node>) -> Node {
        let mut r = Rebuild { f };

        let kind = match &self.kind {
            NodeKind::Program { statements } => NodeKind::Program {
                statements: r.many(statements),
            },

            NodeKind::ExpressionStatement { expression } => NodeKind::ExpressionStatement {
                expression: r.one(expression),
            },
            NodeKind::Block { statements } => NodeKind::Block {
                statements: r.many(statements),
            },
            NodeKind::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
            } => NodeKind::If {
                condition: r.one(condition),
                then_branch: r.one(then_branch),
                else_ifs: r.many(else_ifs),
                else_branch: r.opt(else_branch),
            },
            NodeKind::ElseIf { condition, body } => NodeKind::ElseIf {
                condition: r.one(condition),
                body: r.one(body),
            },
            NodeKind::While { condition, body } => NodeKind::While {
                condition: r.one(condition),
                body: r.one(body),
            },
            NodeKind::DoWhile { body, condition } => NodeKind::DoWhile {
                body: r.one(body),
                condition: r.one(condition),
            },
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => NodeKind::For {
                init: r.many(init),
                condition: r.many(condition),
                update: r.many(update),
                body: r.one(body),
            },
            NodeKind::Foreach {
                subject,
                key,
                value,
                by_ref,
                body,
            } => NodeKind::Foreach {
                subject: r.one(subject),
                key: r.opt(key),
                value: r.one(value),
                by_ref: *by_ref,
                body: r.one(body),
            },
            NodeKind::Switch { subject, cases } => NodeKind::Switch {
                subject: r.one(subject),
                cases: r.many(cases),
            },
            NodeKind::Case { test, body } => NodeKind::Case {
                test: r.opt(test),
                body: r.many(body),
            },
            NodeKind::Break { levels } => NodeKind::Break {
                levels: r.opt(levels),
            },
            NodeKind::Continue { levels } => NodeKind::Continue {
                levels: r.opt(levels),
            },
            NodeKind::Return { value } => NodeKind::Return {
                value: r.opt(value),
            },
            NodeKind::Throw { expression } => NodeKind::Throw {
                expression: r.one(expression),
            },
            NodeKind::Try {
                body,
                catches,
                finally,
            } => NodeKind::Try {
                body: r.one(body),
                catches: r.many(catches),
                finally: r.opt(finally),
            },
            NodeKind::Catch {
                types,
                variable,
                body,
            } => NodeKind::Catch {
                types: r.many(types),
                variable: r.opt(variable),
                body: r.one(body),
            },
            NodeKind::Echo { expressions } => NodeKind::Echo {
                expressions: r.many(expressions),
            },
            NodeKind::Global { variables } => NodeKind::Global {
                variables: r.many(variables),
            },
            NodeKind::StaticVariables { variables } => NodeKind::StaticVariables {
                variables: r.many(variables),
            },
            NodeKind::StaticVariable { variable, default } => NodeKind::StaticVariable {
                variable: r.one(variable),
                default: r.opt(default),
            },
            NodeKind::Unset { variables } => NodeKind::Unset {
                variables: r.many(variables),
            },
            NodeKind::Namespace {
                name,
                statements,
                braced,
            } => NodeKind::Namespace {
                name: name.clone(),
                statements: r.many(statements),
                braced: *braced,
            },
            NodeKind::ConstDeclaration { constants } => NodeKind::ConstDeclaration {
                constants: r.many(constants),
            },
            NodeKind::Const { name, value } => NodeKind::Const {
                name: name.clone(),
                value: r.one(value),
            },
            NodeKind::Declare { directives, body } => NodeKind::Declare {
                directives: r.many(directives),
                body: r.opt(body),
            },

            NodeKind::FunctionDeclaration {
                name,
                params,
                return_type,
                body,
                by_ref,
            } => NodeKind::FunctionDeclaration {
                name: name.clone(),
                params: r.many(params),
                return_type: return_type.clone(),
                body: r.one(body),
                by_ref: *by_ref,
            },
            NodeKind::Parameter {
                name,
                type_hint,
                default,
                by_ref,
                variadic,
                modifiers,
            } => NodeKind::Parameter {
                name: name.clone(),
                type_hint: type_hint.clone(),
                default: r.opt(default),
                by_ref: *by_ref,
                variadic: *variadic,
                modifiers: modifiers.clone(),
            },
            NodeKind::ClassDeclaration {
                name,
                modifiers,
                extends,
                implements,
                members,
            } => NodeKind::ClassDeclaration {
                name: name.clone(),
                modifiers: modifiers.clone(),
                extends: r.opt(extends),
                implements: r.many(implements),
                members: r.many(members),
            },
            NodeKind::InterfaceDeclaration {
                name,
                extends,
                members,
            } => NodeKind::InterfaceDeclaration {
                name: name.clone(),
                extends: r.many(extends),
                members: r.many(members),
            },
            NodeKind::TraitDeclaration { name, members } => NodeKind::TraitDeclaration {
                name: name.clone(),
                members: r.many(members),
            },
            NodeKind::EnumDeclaration {
                name,
                backing_type,
                implements,
                members,
            } => NodeKind::EnumDeclaration {
                name: name.clone(),
                backing_type: backing_type.clone(),
                implements: r.many(implements),
                members: r.many(members),
            },
            NodeKind::Method {
                name,
                modifiers,
                params,
                return_type,
                body,
                by_ref,
            } => NodeKind::Method {
                name: name.clone(),
                modifiers: modifiers.clone(),
                params: r.many(params),
                return_type: return_type.clone(),
                body: r.opt(body),
                by_ref: *by_ref,
            },
            NodeKind::Property {
                name,
                modifiers,
                type_hint,
                default,
            } => NodeKind::Property {
                name: name.clone(),
                modifiers: modifiers.clone(),
                type_hint: type_hint.clone(),
                default: r.opt(default),
            },
            NodeKind::ClassConstant {
                name,
                modifiers,
                value,
            } => NodeKind::ClassConstant {
                name: name.clone(),
                modifiers: modifiers.clone(),
                value: r.one(value),
            },
            NodeKind::TraitUse { traits } => NodeKind::TraitUse {
                traits: r.many(traits),
            },
            NodeKind::EnumCase { name, value } => NodeKind::EnumCase {
                name: name.clone(),
                value: r.opt(value),
            },

            NodeKind::Assignment {
                operator,
                target,
                value,
                by_ref,
            } => NodeKind::Assignment {
                operator: *operator,
                target: r.one(target),
                value: r.one(value),
                by_ref: *by_ref,
            },
            NodeKind::Binary {
                operator,
                left,
                right,
            } => NodeKind::Binary {
                operator: *operator,
                left: r.one(left),
                right: r.one(right),
            },
            NodeKind::Unary { operator, operand } => NodeKind::Unary {
                operator: *operator,
                operand: r.one(operand),
            },
            NodeKind::Update {
                operator,
                prefix,
                operand,
            } => NodeKind::Update {
                operator: *operator,
                prefix: *prefix,
                operand: r.one(operand),
            },
            NodeKind::Cast { cast, expression } => NodeKind::Cast {
                cast: *cast,
                expression: r.one(expression),
            },
            NodeKind::Conditional {
                condition,
                consequent,
                alternate,
            } => NodeKind::Conditional {
                condition: r.one(condition),
                consequent: r.opt(consequent),
                alternate: r.one(alternate),
            },
            NodeKind::Call { callee, arguments } => NodeKind::Call {
                callee: r.one(callee),
                arguments: r.many(arguments),
            },
            NodeKind::Argument {
                name,
                value,
                spread,
            } => NodeKind::Argument {
                name: name.clone(),
                value: r.one(value),
                spread: *spread,
            },
            NodeKind::Member {
                object,
                property,
                nullsafe,
            } => NodeKind::Member {
                object: r.one(object),
                property: r.one(property),
                nullsafe: *nullsafe,
            },
            NodeKind::StaticMember { class, member } => NodeKind::StaticMember {
                class: r.one(class),
                member: r.one(member),
            },
            NodeKind::Index { object, index } => NodeKind::Index {
                object: r.one(object),
                index: r.opt(index),
            },
            NodeKind::Array { elements, legacy } => NodeKind::Array {
                elements: r.many(elements),
                legacy: *legacy,
            },
            NodeKind::ArrayElement {
                key,
                value,
                by_ref,
                spread,
            } => NodeKind::ArrayElement {
                key: r.opt(key),
                value: r.one(value),
                by_ref: *by_ref,
                spread: *spread,
            },
            NodeKind::List { elements } => NodeKind::List {
                elements: r.many(elements),
            },
            NodeKind::Closure {
                params,
                uses,
                return_type,
                body,
                by_ref,
                is_static,
            } => NodeKind::Closure {
                params: r.many(params),
                uses: r.many(uses),
                return_type: return_type.clone(),
                body: r.one(body),
                by_ref: *by_ref,
                is_static: *is_static,
            },
            NodeKind::ArrowFunction {
                params,
                return_type,
                body,
                by_ref,
                is_static,
            } => NodeKind::ArrowFunction {
                params: r.many(params),
                return_type: return_type.clone(),
                body: r.one(body),
                by_ref: *by_ref,
                is_static: *is_static,
            },
            NodeKind::New { class, arguments } => NodeKind::New {
                class: r.one(class),
                arguments: r.many(arguments),
            },
            NodeKind::Clone { expression } => NodeKind::Clone {
                expression: r.one(expression),
            },
            NodeKind::Yield { key, value } => NodeKind::Yield {
                key: r.opt(key),
                value: r.opt(value),
            },
            NodeKind::YieldFrom { expression } => NodeKind::YieldFrom {
                expression: r.one(expression),
            },
            NodeKind::Match { subject, arms } => NodeKind::Match {
                subject: r.one(subject),
                arms: r.many(arms),
            },
            NodeKind::MatchArm { conditions, body } => NodeKind::MatchArm {
                conditions: r.many(conditions),
                body: r.one(body),
            },
            NodeKind::Include { kind, path } => NodeKind::Include {
                kind: *kind,
                path: r.one(path),
            },
            NodeKind::Isset { variables } => NodeKind::Isset {
                variables: r.many(variables),
            },
            NodeKind::Empty { expression } => NodeKind::Empty {
                expression: r.one(expression),
            },
            NodeKind::Eval { expression } => NodeKind::Eval {
                expression: r.one(expression),
            },
            NodeKind::Exit { value } => NodeKind::Exit {
                value: r.opt(value),
            },
            NodeKind::Print { expression } => NodeKind::Print {
                expression: r.one(expression),
            },
            NodeKind::ShellExec { parts } => NodeKind::ShellExec {
                parts: r.many(parts),
            },
            NodeKind::InterpolatedString { parts } => NodeKind::InterpolatedString {
                parts: r.many(parts),
            },
            NodeKind::Heredoc {
                label,
                nowdoc,
                parts,
            } => NodeKind::Heredoc {
                label: label.clone(),
                nowdoc: *nowdoc,
                parts: r.many(parts),
            },
            NodeKind::VariableVariable { expression } => NodeKind::VariableVariable {
                expression: r.one(expression),
            },

            leaf @ (NodeKind::InlineHtml { .. }
            | NodeKind::Nop
            | NodeKind::Label { .. }
            | NodeKind::Goto { .. }
            | NodeKind::Use { .. }
            | NodeKind::ClosureUse { .. }
            | NodeKind::VariadicPlaceholder
            | NodeKind::NumberLiteral { .. }
            | NodeKind::StringLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::NullLiteral
            | NodeKind::Identifier { .. }
            | NodeKind::Variable { .. }
            | NodeKind::Name { .. }) => leaf.clone(),
        };

        Node {
            kind,
            location: self.location,
        }
    }

    /// A short, stable name for the kind of this node.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Program { .. } => "Program",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::Block { .. } => "Block",
            NodeKind::If { .. } => "If",
            NodeKind::ElseIf { .. } => "ElseIf",
            NodeKind::While { .. } => "While",
            NodeKind::DoWhile { .. } => "DoWhile",
            NodeKind::For { .. } => "For",
            NodeKind::Foreach { .. } => "Foreach",
            NodeKind::Switch { .. } => "Switch",
            NodeKind::Case { .. } => "Case",
            NodeKind::Break { .. } => "Break",
            NodeKind::Continue { .. } => "Continue",
            NodeKind::Return { .. } => "Return",
            NodeKind::Throw { .. } => "Throw",
            NodeKind::Try { .. } => "Try",
            NodeKind::Catch { .. } => "Catch",
            NodeKind::Echo { .. } => "Echo",
            NodeKind::Global { .. } => "Global",
            NodeKind::StaticVariables { .. } => "StaticVariables",
            NodeKind::StaticVariable { .. } => "StaticVariable",
            NodeKind::Unset { .. } => "Unset",
            NodeKind::InlineHtml { .. } => "InlineHtml",
            NodeKind::Nop => "Nop",
            NodeKind::Label { .. } => "Label",
            NodeKind::Goto { .. } => "Goto",
            NodeKind::Namespace { .. } => "Namespace",
            NodeKind::Use { .. } => "Use",
            NodeKind::ConstDeclaration { .. } => "ConstDeclaration",
            NodeKind::Const { .. } => "Const",
            NodeKind::Declare { .. } => "Declare",
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::ClassDeclaration { .. } => "ClassDeclaration",
            NodeKind::InterfaceDeclaration { .. } => "InterfaceDeclaration",
            NodeKind::TraitDeclaration { .. } => "TraitDeclaration",
            NodeKind::EnumDeclaration { .. } => "EnumDeclaration",
            NodeKind::Method { .. } => "Method",
            NodeKind::Property { .. } => "Property",
            NodeKind::ClassConstant { .. } => "ClassConstant",
            NodeKind::TraitUse { .. } => "TraitUse",
            NodeKind::EnumCase { .. } => "EnumCase",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Update { .. } => "Update",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::Conditional { .. } => "Conditional",
            NodeKind::Call { .. } => "Call",
            NodeKind::Argument { .. } => "Argument",
            NodeKind::VariadicPlaceholder => "VariadicPlaceholder",
            NodeKind::Member { .. } => "Member",
            NodeKind::StaticMember { .. } => "StaticMember",
            NodeKind::Index { .. } => "Index",
            NodeKind::Array { .. } => "Array",
            NodeKind::ArrayElement { .. } => "ArrayElement",
            NodeKind::List { .. } => "List",
            NodeKind::Closure { .. } => "Closure",
            NodeKind::ClosureUse { .. } => "ClosureUse",
            NodeKind::ArrowFunction { .. } => "ArrowFunction",
            NodeKind::New { .. } => "New",
            NodeKind::Clone { .. } => "Clone",
            NodeKind::Yield { .. } => "Yield",
            NodeKind::YieldFrom { .. } => "YieldFrom",
            NodeKind::Match { .. } => "Match",
            NodeKind::MatchArm { .. } => "MatchArm",
            NodeKind::Include { .. } => "Include",
            NodeKind::Isset { .. } => "Isset",
            NodeKind::Empty { .. } => "Empty",
            NodeKind::Eval { .. } => "Eval",
            NodeKind::Exit { .. } => "Exit",
            NodeKind::Print { .. } => "Print",
            NodeKind::ShellExec { .. } => "ShellExec",
            NodeKind::NumberLiteral { .. } => "NumberLiteral",
            NodeKind::StringLiteral { .. } => "StringLiteral",
            NodeKind::InterpolatedString { .. } => "InterpolatedString",
            NodeKind::Heredoc { .. } => "Heredoc",
            NodeKind::BooleanLiteral { .. } => "BooleanLiteral",
            NodeKind::NullLiteral => "NullLiteral",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::Variable { .. } => "Variable",
            NodeKind::VariableVariable { .. } => "VariableVariable",
            NodeKind::Name { .. } => "Name",
        }
    }
}

#[derive(Default)]
struct Collector<'a> {
    nodes: Vec<&'a Node>,
}

impl<'a> Collector<'a> {
    fn one(mut self, node: &'a Node) -> Self {
        self.nodes.push(node);
        self
    }

    fn opt(mut self, node: &'a Option<Box<Node>>) -> Self {
        self.nodes.extend(node.as_deref());
        self
    }

    fn many(mut self, nodes: &'a [Node]) -> Self {
        self.nodes.extend(nodes);
        self
    }
}

struct Rebuild<F> {
    f: F,
}

impl<F: FnMut(&Node) -> Option<Node>> Rebuild<F> {
    fn one(&mut self, node: &Node) -> Box<Node> {
        let location = node.location;
        Box::new((self.f)(node).unwrap_or_else(|| Node::nop(location)))
    }

    fn opt(&mut self, node: &Option<Box<Node>>) -> Option<Box<Node>> {
        node.as_deref().and_then(|node| (self.f)(node)).map(Box::new)
    }

    fn many(&mut self, nodes: &[Node]) -> Vec<Node> {
        nodes.iter().filter_map(|node| (self.f)(node)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{BinaryOp, Number};
    use super::*;

    fn number(value: i64) -> Node {
        Node::synthetic(NodeKind::NumberLiteral {
            value: Number::Int(value),
        })
    }

    fn add(left: Node, right: Node) -> Node {
        Node::synthetic(NodeKind::Binary {
            operator: BinaryOp::Add,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    #[test]
    fn if_children_follow_source_order() {
        let node = Node::synthetic(NodeKind::If {
            condition: Box::new(number(1)),
            then_branch: Box::new(number(2)),
            else_ifs: vec![number(3), number(4)],
            else_branch: Some(Box::new(number(5))),
        });

        let values: Vec<_> = node
            .children()
            .into_iter()
            .map(|child| match child.kind {
                NodeKind::NumberLiteral {
                    value: Number::Int(value),
                } => value,
                _ => unreachable!(),
            })
            .collect();

        assert_eq!(vec![1, 2, 3, 4, 5], values);
    }

    #[test]
    fn removed_mandatory_child_becomes_nop() {
        let node = add(number(1), number(2));
        let rebuilt = node.map_children(|child| match child.kind {
            NodeKind::NumberLiteral {
                value: Number::Int(1),
            } => None,
            _ => Some(child.clone()),
        });

        let NodeKind::Binary { left, right, .. } = rebuilt.kind else {
            panic!("expected a binary node");
        };
        assert_eq!(NodeKind::Nop, left.kind);
        assert_eq!(number(2), *right);
    }

    #[test]
    fn removed_sequence_entries_disappear() {
        let node = Node::synthetic(NodeKind::Block {
            statements: vec![number(1), number(2), number(3)],
        });
        let rebuilt = node.map_children(|child| (*child != number(2)).then(|| child.clone()));

        assert_eq!(
            NodeKind::Block {
                statements: vec![number(1), number(3)]
            },
            rebuilt.kind
        );
    }
}
