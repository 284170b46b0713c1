//! Statements. Every statement form accepts both the braced syntax and, where
//! PHP has one, the alternative syntax using `:` and an `end...` keyword:
//!
//! ```php
//! if ($a):
//!     echo 1;
//! elseif ($b):
//!     echo 2;
//! endif;
//! ```
//!
//! Alternative bodies are represented as [`NodeKind::Block`]s, so the tree does
//! not remember which syntax was used.

use log::trace;
use phpast_common::tree::{Modifier, UseItem, UseKind};
use phpast_common::{Node, NodeKind};

use super::{name_of, AnyName, Cursor, Matcher, Parser, Result, Version};
use crate::lex::TokenKind;

impl Parser {
    /// Parse statements until `done` says to stop. Errors are recovered from
    /// if the parser is configured to do so.
    pub(super) fn statements(&mut self, done: impl Fn(&Self) -> bool) -> Result<Vec<Node>> {
        let mut statements = Vec::new();

        loop {
            while self.eat(&[TokenKind::OpenTag, TokenKind::CloseTag]).is_some() {}

            if done(self) || self.is_at_end() {
                break;
            }

            match self.statement() {
                Ok(statement) => statements.push(statement),
                Err(error) if self.options.error_recovery => self.recover(error),
                Err(error) => return Err(error),
            }
        }

        Ok(statements)
    }

    /// `{ statements }`
    pub(super) fn block(&mut self) -> Result<Node> {
        let start = self
            .consume(TokenKind::LeftBrace, "expected '{'")?
            .location;

        let statements = self.statements(|this| this.check(TokenKind::RightBrace))?;
        self.consume(TokenKind::RightBrace, "expected '}' after block")?;

        Ok(self.finish(NodeKind::Block { statements }, start))
    }

    /// The end of a simple statement. A closing tag also ends a statement.
    pub(super) fn end_statement(&mut self) -> Result<()> {
        if self.eat(TokenKind::Semicolon).is_some() || self.check(TokenKind::CloseTag) {
            return Ok(());
        }

        if self.is_at_end() {
            return Ok(());
        }

        Err(self.error("expected ';' after statement"))
    }

    pub(super) fn statement(&mut self) -> Result<Node> {
        let token = self.peek().clone();
        let start = token.location;
        let next = self.peek_at(1).kind;

        trace!("parsing a statement at {}", token.kind);

        match token.kind {
            TokenKind::LeftBrace => self.block(),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Node::nop(Some(start)))
            }

            TokenKind::InlineHtml => {
                self.advance();
                Ok(Node::new(NodeKind::InlineHtml { value: token.text }, start))
            }

            TokenKind::AttributeStart => {
                self.skip_attributes()?;
                self.statement()
            }

            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Do => self.do_while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Foreach => self.foreach_statement(),
            TokenKind::Switch => self.switch_statement(),
            TokenKind::Try => self.try_statement(),
            TokenKind::Declare => self.declare_statement(),

            TokenKind::Break | TokenKind::Continue => {
                self.advance();
                let levels = if self.check(&[TokenKind::Semicolon, TokenKind::CloseTag]) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };

                self.end_statement()?;
                let kind = if token.kind == TokenKind::Break {
                    NodeKind::Break { levels }
                } else {
                    NodeKind::Continue { levels }
                };

                Ok(self.finish(kind, start))
            }

            TokenKind::Return => {
                self.advance();
                let value = if self.check(&[
                    TokenKind::Semicolon,
                    TokenKind::CloseTag,
                    TokenKind::Eof,
                ]) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };

                self.end_statement()?;
                Ok(self.finish(NodeKind::Return { value }, start))
            }

            // A throw expression in statement position is still a statement.
            TokenKind::Throw => {
                self.advance();
                let expression = self.parse_expression()?;
                self.end_statement()?;
                Ok(self.finish(
                    NodeKind::Throw {
                        expression: Box::new(expression),
                    },
                    start,
                ))
            }

            TokenKind::Echo | TokenKind::OpenTagWithEcho => {
                self.advance();
                let mut expressions = vec![self.parse_expression()?];
                while self.eat(TokenKind::Comma).is_some() {
                    expressions.push(self.parse_expression()?);
                }

                self.end_statement()?;
                Ok(self.finish(NodeKind::Echo { expressions }, start))
            }

            TokenKind::Global => {
                self.advance();
                let mut variables = Vec::new();
                loop {
                    variables.push(self.parse_expression()?);
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }

                self.end_statement()?;
                Ok(self.finish(NodeKind::Global { variables }, start))
            }

            TokenKind::Static if next == TokenKind::Variable => self.static_variables(),

            TokenKind::Unset => {
                self.advance();
                self.consume(TokenKind::LeftParen, "expected '(' after 'unset'")?;
                let variables = self.expression_list(TokenKind::RightParen)?;
                self.consume(TokenKind::RightParen, "expected ')' after unset variables")?;
                self.end_statement()?;
                Ok(self.finish(NodeKind::Unset { variables }, start))
            }

            TokenKind::Const => {
                self.advance();
                let constants = self.constants()?;
                self.end_statement()?;
                Ok(self.finish(NodeKind::ConstDeclaration { constants }, start))
            }

            TokenKind::Namespace if next != TokenKind::Backslash => self.namespace_statement(),
            TokenKind::Use => self.use_statement(),

            TokenKind::Goto => {
                self.advance();
                let label = self.consume(TokenKind::Identifier, "expected a label after 'goto'")?;
                self.end_statement()?;
                Ok(self.finish(NodeKind::Goto { label: label.text }, start))
            }

            TokenKind::Identifier if next == TokenKind::Colon => {
                self.advance();
                self.advance();
                Ok(self.finish(NodeKind::Label { name: name_of(&token) }, start))
            }

            TokenKind::Function
                if AnyName.matches(self.peek_at(1))
                    || (next == TokenKind::Amp && AnyName.matches(self.peek_at(2))) =>
            {
                self.function_declaration()
            }

            TokenKind::Abstract | TokenKind::Final | TokenKind::Class => {
                let modifiers = self.class_modifiers();
                self.class_declaration(modifiers, start)
            }

            TokenKind::Readonly
                if matches!(
                    next,
                    TokenKind::Class | TokenKind::Final | TokenKind::Abstract
                ) =>
            {
                let modifiers = self.class_modifiers();
                self.class_declaration(modifiers, start)
            }

            TokenKind::Interface => self.interface_declaration(),
            TokenKind::Trait => self.trait_declaration(),
            TokenKind::Enum
                if self.supports(Version::PHP_81) && next == TokenKind::Identifier =>
            {
                self.enum_declaration()
            }

            _ => {
                let expression = self.parse_expression()?;
                self.end_statement()?;
                Ok(self.finish(
                    NodeKind::ExpressionStatement {
                        expression: Box::new(expression),
                    },
                    start,
                ))
            }
        }
    }

    /// Skip any number of `#[...]` attribute groups.
    pub(super) fn skip_attributes(&mut self) -> Result<()> {
        while self.eat(TokenKind::AttributeStart).is_some() {
            let mut depth = 1usize;

            while depth > 0 {
                if self.is_at_end() {
                    return Err(self.error("unterminated attribute"));
                }

                match self.advance().kind {
                    TokenKind::LeftBracket | TokenKind::AttributeStart => depth += 1,
                    TokenKind::RightBracket => depth -= 1,
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Parse either a single statement, or with the alternative syntax, the
    /// statements up to one of the `ends` keywords.
    fn body(&mut self, ends: &[TokenKind]) -> Result<(Node, bool)> {
        let start = self.peek().location;

        if self.eat(TokenKind::Colon).is_none() {
            return Ok((self.statement()?, false));
        }

        let statements = self.statements(|this| this.check(ends))?;
        Ok((self.finish(NodeKind::Block { statements }, start), true))
    }

    /// Consume an `end...` keyword and its terminator.
    fn end_alternative(&mut self, end: TokenKind, message: &str) -> Result<()> {
        self.consume(end, message)?;
        self.end_statement()
    }

    fn parenthesized(&mut self, what: &str) -> Result<Node> {
        self.consume(TokenKind::LeftParen, &format!("expected '(' after '{what}'"))?;
        let expr = self.parse_expression()?;
        self.consume(TokenKind::RightParen, &format!("expected ')' after {what} condition"))?;
        Ok(expr)
    }

    fn if_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::If, "expected 'if'")?.location;
        let condition = self.parenthesized("if")?;

        const ENDS: &[TokenKind] = &[TokenKind::ElseIf, TokenKind::Else, TokenKind::EndIf];
        let (then_branch, alternative) = self.body(ENDS)?;

        let mut else_ifs = Vec::new();
        let mut else_branch = None;

        loop {
            let clause_start = self.peek().location;

            let is_else_if = self.check(TokenKind::ElseIf)
                || (!alternative
                    && self.check(TokenKind::Else)
                    && self.peek_at(1).kind == TokenKind::If);

            if is_else_if {
                self.eat(TokenKind::Else);
                self.advance();

                let condition = self.parenthesized("elseif")?;
                let (body, _) = self.body(ENDS)?;
                else_ifs.push(self.finish(
                    NodeKind::ElseIf {
                        condition: Box::new(condition),
                        body: Box::new(body),
                    },
                    clause_start,
                ));
                continue;
            }

            if self.eat(TokenKind::Else).is_some() {
                let (body, _) = self.body(&[TokenKind::EndIf])?;
                else_branch = Some(Box::new(body));
            }

            break;
        }

        if alternative {
            self.end_alternative(TokenKind::EndIf, "expected 'endif'")?;
        }

        Ok(self.finish(
            NodeKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_ifs,
                else_branch,
            },
            start,
        ))
    }

    fn while_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::While, "expected 'while'")?.location;
        let condition = self.parenthesized("while")?;

        let (body, alternative) = self.body(&[TokenKind::EndWhile])?;
        if alternative {
            self.end_alternative(TokenKind::EndWhile, "expected 'endwhile'")?;
        }

        Ok(self.finish(
            NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            start,
        ))
    }

    fn do_while_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Do, "expected 'do'")?.location;
        let body = self.statement()?;

        self.consume(TokenKind::While, "expected 'while' after do body")?;
        let condition = self.parenthesized("while")?;
        self.end_statement()?;

        Ok(self.finish(
            NodeKind::DoWhile {
                body: Box::new(body),
                condition: Box::new(condition),
            },
            start,
        ))
    }

    fn for_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::For, "expected 'for'")?.location;
        self.consume(TokenKind::LeftParen, "expected '(' after 'for'")?;

        let init = self.expression_list(TokenKind::Semicolon)?;
        self.consume(TokenKind::Semicolon, "expected ';' after for initializer")?;
        let condition = self.expression_list(TokenKind::Semicolon)?;
        self.consume(TokenKind::Semicolon, "expected ';' after for condition")?;
        let update = self.expression_list(TokenKind::RightParen)?;
        self.consume(TokenKind::RightParen, "expected ')' after for clauses")?;

        let (body, alternative) = self.body(&[TokenKind::EndFor])?;
        if alternative {
            self.end_alternative(TokenKind::EndFor, "expected 'endfor'")?;
        }

        Ok(self.finish(
            NodeKind::For {
                init,
                condition,
                update,
                body: Box::new(body),
            },
            start,
        ))
    }

    fn foreach_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Foreach, "expected 'foreach'")?.location;
        self.consume(TokenKind::LeftParen, "expected '(' after 'foreach'")?;

        let subject = self.parse_expression()?;
        self.consume(TokenKind::As, "expected 'as' in foreach")?;

        let mut by_ref = self.eat(TokenKind::Amp).is_some();
        let mut value = self.parse_expression()?;
        let mut key = None;

        if !by_ref && self.eat(TokenKind::DoubleArrow).is_some() {
            key = Some(Box::new(value));
            by_ref = self.eat(TokenKind::Amp).is_some();
            value = self.parse_expression()?;
        }

        self.consume(TokenKind::RightParen, "expected ')' after foreach clauses")?;

        let (body, alternative) = self.body(&[TokenKind::EndForeach])?;
        if alternative {
            self.end_alternative(TokenKind::EndForeach, "expected 'endforeach'")?;
        }

        Ok(self.finish(
            NodeKind::Foreach {
                subject: Box::new(subject),
                key,
                value: Box::new(value),
                by_ref,
                body: Box::new(body),
            },
            start,
        ))
    }

    fn switch_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Switch, "expected 'switch'")?.location;
        let subject = self.parenthesized("switch")?;

        let alternative = if self.eat(TokenKind::Colon).is_some() {
            true
        } else {
            self.consume(TokenKind::LeftBrace, "expected '{' after switch subject")?;
            false
        };

        let close = if alternative {
            TokenKind::EndSwitch
        } else {
            TokenKind::RightBrace
        };

        let mut cases = Vec::new();
        while !self.check(close) && !self.is_at_end() {
            let case_start = self.peek().location;

            let test = if self.eat(TokenKind::Default).is_some() {
                None
            } else {
                self.consume(TokenKind::Case, "expected 'case' or 'default'")?;
                Some(Box::new(self.parse_expression()?))
            };

            self.consume(
                &[TokenKind::Colon, TokenKind::Semicolon],
                "expected ':' after case label",
            )?;

            let body = self.statements(|this| {
                this.check(&[TokenKind::Case, TokenKind::Default]) || this.check(close)
            })?;

            cases.push(self.finish(NodeKind::Case { test, body }, case_start));
        }

        if alternative {
            self.end_alternative(TokenKind::EndSwitch, "expected 'endswitch'")?;
        } else {
            self.consume(TokenKind::RightBrace, "expected '}' after switch cases")?;
        }

        Ok(self.finish(
            NodeKind::Switch {
                subject: Box::new(subject),
                cases,
            },
            start,
        ))
    }

    fn try_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Try, "expected 'try'")?.location;
        let body = self.block()?;

        let mut catches = Vec::new();
        while self.check(TokenKind::Catch) {
            let catch_start = self.advance().location;
            self.consume(TokenKind::LeftParen, "expected '(' after 'catch'")?;

            let mut types = vec![self.name_node()?];
            while self.eat(TokenKind::Pipe).is_some() {
                types.push(self.name_node()?);
            }

            let variable = match self.eat(TokenKind::Variable) {
                Some(token) => Some(Box::new(Node::new(
                    NodeKind::Variable {
                        name: name_of(&token),
                    },
                    token.location,
                ))),
                None => None,
            };

            self.consume(TokenKind::RightParen, "expected ')' after catch clause")?;
            let body = self.block()?;

            catches.push(self.finish(
                NodeKind::Catch {
                    types,
                    variable,
                    body: Box::new(body),
                },
                catch_start,
            ));
        }

        let finally = if self.eat(TokenKind::Finally).is_some() {
            Some(Box::new(self.block()?))
        } else {
            None
        };

        if catches.is_empty() && finally.is_none() {
            return Err(self.error("expected 'catch' or 'finally' after try block"));
        }

        Ok(self.finish(
            NodeKind::Try {
                body: Box::new(body),
                catches,
                finally,
            },
            start,
        ))
    }

    fn declare_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Declare, "expected 'declare'")?.location;
        self.consume(TokenKind::LeftParen, "expected '(' after 'declare'")?;
        let directives = self.constants()?;
        self.consume(TokenKind::RightParen, "expected ')' after declare directives")?;

        let body = if self.eat(TokenKind::Semicolon).is_some() || self.check(TokenKind::CloseTag) {
            None
        } else {
            let (body, alternative) = self.body(&[TokenKind::EndDeclare])?;
            if alternative {
                self.end_alternative(TokenKind::EndDeclare, "expected 'enddeclare'")?;
            }

            Some(Box::new(body))
        };

        Ok(self.finish(NodeKind::Declare { directives, body }, start))
    }

    /// `static $a = 1, $b;`
    fn static_variables(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Static, "expected 'static'")?.location;

        let mut variables = Vec::new();
        loop {
            let token = self.consume(TokenKind::Variable, "expected a variable")?;
            let variable = Node::new(
                NodeKind::Variable {
                    name: name_of(&token),
                },
                token.location,
            );

            let default = if self.eat(TokenKind::Assign).is_some() {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };

            variables.push(self.finish(
                NodeKind::StaticVariable {
                    variable: Box::new(variable),
                    default,
                },
                token.location,
            ));

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.end_statement()?;
        Ok(self.finish(NodeKind::StaticVariables { variables }, start))
    }

    /// A comma separated list of `NAME = value` pairs.
    pub(super) fn constants(&mut self) -> Result<Vec<Node>> {
        let mut constants = Vec::new();

        loop {
            let name = self.consume(AnyName, "expected a constant name")?;
            self.consume(TokenKind::Assign, "expected '=' after constant name")?;
            let value = self.parse_expression()?;

            constants.push(self.finish(
                NodeKind::Const {
                    name: name.text,
                    value: Box::new(value),
                },
                name.location,
            ));

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        Ok(constants)
    }

    /// A namespace declaration. Without braces, the namespace extends to the
    /// next namespace declaration or the end of the file.
    fn namespace_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Namespace, "expected 'namespace'")?.location;

        let name = if self.check(&[TokenKind::Identifier, TokenKind::Backslash]) {
            Some(self.qualified_name()?.0)
        } else {
            None
        };

        if self.eat(TokenKind::LeftBrace).is_some() {
            let statements = self.statements(|this| this.check(TokenKind::RightBrace))?;
            self.consume(TokenKind::RightBrace, "expected '}' after namespace body")?;

            return Ok(self.finish(
                NodeKind::Namespace {
                    name,
                    statements,
                    braced: true,
                },
                start,
            ));
        }

        if name.is_none() {
            return Err(self.error("expected a namespace name or '{'"));
        }

        self.end_statement()?;
        let statements = self.statements(|this| {
            this.check(TokenKind::Namespace) && this.peek_at(1).kind != TokenKind::Backslash
        })?;

        Ok(self.finish(
            NodeKind::Namespace {
                name,
                statements,
                braced: false,
            },
            start,
        ))
    }

    /// `use A\B as C, D;`, `use function f;` or `use A\{B, C as D};`
    fn use_statement(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Use, "expected 'use'")?.location;
        let kind = self.use_kind();

        let mut items = Vec::new();
        loop {
            let (name, _) = self.qualified_name()?;

            if self.check(TokenKind::Backslash) && self.peek_at(1).kind == TokenKind::LeftBrace {
                self.advance();
                self.advance();
                let prefix = name;

                while !self.check(TokenKind::RightBrace) {
                    // Group items may carry their own kind.
                    self.use_kind();
                    let (member, _) = self.qualified_name()?;
                    let alias = self.use_alias()?;

                    items.push(UseItem {
                        name: format!("{prefix}\\{member}"),
                        alias,
                    });

                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }

                self.consume(TokenKind::RightBrace, "expected '}' after group use")?;
            } else {
                let alias = self.use_alias()?;
                items.push(UseItem { name, alias });
            }

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.end_statement()?;
        Ok(self.finish(NodeKind::Use { kind, items }, start))
    }

    fn use_kind(&mut self) -> UseKind {
        if self.eat(TokenKind::Function).is_some() {
            UseKind::Function
        } else if self.eat(TokenKind::Const).is_some() {
            UseKind::Const
        } else {
            UseKind::Normal
        }
    }

    fn use_alias(&mut self) -> Result<Option<String>> {
        if self.eat(TokenKind::As).is_none() {
            return Ok(None);
        }

        let alias = self.consume(AnyName, "expected an alias after 'as'")?;
        Ok(Some(alias.text))
    }

    /// Leading `abstract`, `final` and `readonly` of a class declaration.
    fn class_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();

        loop {
            let modifier = match self.peek().kind {
                TokenKind::Abstract => Modifier::Abstract,
                TokenKind::Final => Modifier::Final,
                TokenKind::Readonly => Modifier::Readonly,
                _ => return modifiers,
            };

            self.advance();
            modifiers.push(modifier);
        }
    }
}
