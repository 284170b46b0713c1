//! Names, types and declarations.
//!
//! PHP allows reserved words in many name positions, like method names and
//! class constants, so most names here are matched with [`AnyName`] rather
//! than just identifiers.

use phpast_common::tree::{Modifier, NameKind, TypeHint};
use phpast_common::{Location, Node, NodeKind};

use super::{name_of, AnyName, Cursor, Matcher, Parser, Result};
use crate::lex::TokenKind;

impl Parser {
    /// A possibly qualified name such as `Foo`, `Foo\Bar`, `\Foo` or
    /// `namespace\Foo`. The name is returned as written.
    pub(super) fn qualified_name(&mut self) -> Result<(String, NameKind)> {
        let mut name = String::new();
        let mut kind = NameKind::Unqualified;

        if self.check(TokenKind::Namespace) && self.peek_at(1).kind == TokenKind::Backslash {
            self.advance();
            self.advance();
            name.push_str("namespace\\");
            kind = NameKind::Relative;
        } else if self.eat(TokenKind::Backslash).is_some() {
            name.push('\\');
            kind = NameKind::FullyQualified;
        }

        name.push_str(&self.consume(AnyName, "expected a name")?.text);

        while self.check(TokenKind::Backslash) && AnyName.matches(self.peek_at(1)) {
            self.advance();
            name.push('\\');
            name.push_str(&self.advance().text);

            if kind == NameKind::Unqualified {
                kind = NameKind::Qualified;
            }
        }

        Ok((name, kind))
    }

    pub(super) fn name_node(&mut self) -> Result<Node> {
        let start = self.peek().location;
        let (name, kind) = self.qualified_name()?;
        Ok(self.finish(NodeKind::Name { name, kind }, start))
    }

    fn name_list(&mut self) -> Result<Vec<Node>> {
        let mut names = vec![self.name_node()?];
        while self.eat(TokenKind::Comma).is_some() {
            names.push(self.name_node()?);
        }

        Ok(names)
    }

    /// Whether a type annotation starts at the current token.
    fn at_type(&self) -> bool {
        self.check(&[TokenKind::Question, TokenKind::Backslash]) || self.check(AnyName)
    }

    /// A type annotation: a name, `?name`, or a union or intersection of
    /// names.
    fn type_hint(&mut self) -> Result<TypeHint> {
        if self.eat(TokenKind::Question).is_some() {
            let inner = self.single_type()?;
            return Ok(TypeHint::Nullable(Box::new(inner)));
        }

        let first = self.single_type()?;

        if self.check(TokenKind::Pipe) {
            let mut types = vec![first];
            while self.eat(TokenKind::Pipe).is_some() {
                types.push(self.single_type()?);
            }

            return Ok(TypeHint::Union(types));
        }

        // `A & $b` is a by-reference parameter, not an intersection.
        if self.at_intersection() {
            let mut types = vec![first];
            while self.at_intersection() {
                self.advance();
                types.push(self.single_type()?);
            }

            return Ok(TypeHint::Intersection(types));
        }

        Ok(first)
    }

    fn at_intersection(&self) -> bool {
        let next = self.peek_at(1);
        self.check(TokenKind::Amp)
            && (next.kind == TokenKind::Backslash || AnyName.matches(next))
    }

    fn single_type(&mut self) -> Result<TypeHint> {
        let (name, _) = self.qualified_name()?;
        Ok(TypeHint::Named(name))
    }

    /// An optional `: type` after a parameter list.
    pub(super) fn return_type(&mut self) -> Result<Option<TypeHint>> {
        if self.eat(TokenKind::Colon).is_none() {
            return Ok(None);
        }

        self.type_hint().map(Some)
    }

    /// A parenthesised parameter list.
    pub(super) fn parameters(&mut self) -> Result<Vec<Node>> {
        self.consume(TokenKind::LeftParen, "expected '(' before parameters")?;

        let mut params = Vec::new();
        while !self.check(TokenKind::RightParen) {
            self.skip_attributes()?;
            let start = self.peek().location;

            let mut modifiers = Vec::new();
            while let Some(modifier) = promotion_modifier(self.peek().kind) {
                self.advance();
                modifiers.push(modifier);
            }

            let type_hint = if self.at_type() {
                Some(self.type_hint()?)
            } else {
                None
            };

            let by_ref = self.eat(TokenKind::Amp).is_some();
            let variadic = self.eat(TokenKind::Ellipsis).is_some();
            let variable = self.consume(TokenKind::Variable, "expected a parameter name")?;

            let default = if self.eat(TokenKind::Assign).is_some() {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };

            params.push(self.finish(
                NodeKind::Parameter {
                    name: name_of(&variable),
                    type_hint,
                    default,
                    by_ref,
                    variadic,
                    modifiers,
                },
                start,
            ));

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.consume(TokenKind::RightParen, "expected ')' after parameters")?;
        Ok(params)
    }

    pub(super) fn function_declaration(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Function, "expected 'function'")?.location;
        let by_ref = self.eat(TokenKind::Amp).is_some();
        let name = self.consume(AnyName, "expected a function name")?;

        let params = self.parameters()?;
        let return_type = self.return_type()?;
        let body = self.block()?;

        Ok(self.finish(
            NodeKind::FunctionDeclaration {
                name: name.text,
                params,
                return_type,
                body: Box::new(body),
                by_ref,
            },
            start,
        ))
    }

    /// A class declaration, after its modifiers.
    pub(super) fn class_declaration(
        &mut self,
        modifiers: Vec<Modifier>,
        start: Location,
    ) -> Result<Node> {
        self.consume(TokenKind::Class, "expected 'class'")?;
        let name = self.consume(AnyName, "expected a class name")?;
        let (extends, implements) = self.class_header()?;
        let members = self.class_body()?;

        Ok(self.finish(
            NodeKind::ClassDeclaration {
                name: Some(name.text),
                modifiers,
                extends,
                implements,
                members,
            },
            start,
        ))
    }

    /// The class of `new class(...) { ... }`, together with the constructor
    /// arguments.
    pub(super) fn anonymous_class(&mut self) -> Result<(Node, Vec<Node>)> {
        let start = self.consume(TokenKind::Class, "expected 'class'")?.location;

        let arguments = if self.check(TokenKind::LeftParen) {
            self.arguments()?
        } else {
            Vec::new()
        };

        let (extends, implements) = self.class_header()?;
        let members = self.class_body()?;

        let class = self.finish(
            NodeKind::ClassDeclaration {
                name: None,
                modifiers: Vec::new(),
                extends,
                implements,
                members,
            },
            start,
        );

        Ok((class, arguments))
    }

    fn class_header(&mut self) -> Result<(Option<Box<Node>>, Vec<Node>)> {
        let extends = if self.eat(TokenKind::Extends).is_some() {
            Some(Box::new(self.name_node()?))
        } else {
            None
        };

        let implements = if self.eat(TokenKind::Implements).is_some() {
            self.name_list()?
        } else {
            Vec::new()
        };

        Ok((extends, implements))
    }

    pub(super) fn interface_declaration(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Interface, "expected 'interface'")?.location;
        let name = self.consume(AnyName, "expected an interface name")?;

        let extends = if self.eat(TokenKind::Extends).is_some() {
            self.name_list()?
        } else {
            Vec::new()
        };

        let members = self.class_body()?;

        Ok(self.finish(
            NodeKind::InterfaceDeclaration {
                name: name.text,
                extends,
                members,
            },
            start,
        ))
    }

    pub(super) fn trait_declaration(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Trait, "expected 'trait'")?.location;
        let name = self.consume(AnyName, "expected a trait name")?;
        let members = self.class_body()?;

        Ok(self.finish(
            NodeKind::TraitDeclaration {
                name: name.text,
                members,
            },
            start,
        ))
    }

    pub(super) fn enum_declaration(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Enum, "expected 'enum'")?.location;
        let name = self.consume(AnyName, "expected an enum name")?;

        let backing_type = if self.eat(TokenKind::Colon).is_some() {
            Some(self.type_hint()?)
        } else {
            None
        };

        let implements = if self.eat(TokenKind::Implements).is_some() {
            self.name_list()?
        } else {
            Vec::new()
        };

        let members = self.class_body()?;

        Ok(self.finish(
            NodeKind::EnumDeclaration {
                name: name.text,
                backing_type,
                implements,
                members,
            },
            start,
        ))
    }

    fn class_body(&mut self) -> Result<Vec<Node>> {
        self.consume(TokenKind::LeftBrace, "expected '{' before class body")?;

        let mut members = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            match self.member() {
                Ok(parsed) => members.extend(parsed),
                Err(error) if self.options.error_recovery => self.recover(error),
                Err(error) => return Err(error),
            }
        }

        self.consume(TokenKind::RightBrace, "expected '}' after class body")?;
        Ok(members)
    }

    /// A single member declaration. Property declarations may declare several
    /// properties at once, so this returns a list.
    fn member(&mut self) -> Result<Vec<Node>> {
        self.skip_attributes()?;
        let start = self.peek().location;

        if self.eat(TokenKind::Use).is_some() {
            let traits = self.name_list()?;

            if self.check(TokenKind::LeftBrace) {
                self.skip_adaptations()?;
            } else {
                self.end_statement()?;
            }

            return Ok(vec![self.finish(NodeKind::TraitUse { traits }, start)]);
        }

        if self.eat(TokenKind::Case).is_some() {
            let name = self.consume(AnyName, "expected an enum case name")?;
            let value = if self.eat(TokenKind::Assign).is_some() {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };

            self.end_statement()?;
            return Ok(vec![self.finish(
                NodeKind::EnumCase {
                    name: name.text,
                    value,
                },
                start,
            )]);
        }

        let mut modifiers = Vec::new();
        while let Some(modifier) = member_modifier(self.peek().kind) {
            self.advance();
            modifiers.push(modifier);
        }

        if self.eat(TokenKind::Const).is_some() {
            return self.class_constants(modifiers, start);
        }

        if self.eat(TokenKind::Function).is_some() {
            return self.method(modifiers, start).map(|method| vec![method]);
        }

        if modifiers.is_empty() {
            return Err(self.error("expected a class member"));
        }

        self.properties(modifiers)
    }

    /// Skip the `{ ... }` block of trait adaptations after a trait use.
    fn skip_adaptations(&mut self) -> Result<()> {
        self.consume(TokenKind::LeftBrace, "expected '{'")?;

        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(self.error("unterminated trait adaptation block"));
            }

            match self.advance().kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
        }

        Ok(())
    }

    fn class_constants(&mut self, modifiers: Vec<Modifier>, start: Location) -> Result<Vec<Node>> {
        // A typed constant, like `const int X = 1;`. The type is not kept.
        let typed = AnyName.matches(self.peek()) && AnyName.matches(self.peek_at(1));
        if typed || self.check(TokenKind::Question) {
            self.type_hint()?;
        }

        let mut constants = Vec::new();
        loop {
            let name = self.consume(AnyName, "expected a constant name")?;
            self.consume(TokenKind::Assign, "expected '=' after constant name")?;
            let value = self.parse_expression()?;

            constants.push(self.finish(
                NodeKind::ClassConstant {
                    name: name.text,
                    modifiers: modifiers.clone(),
                    value: Box::new(value),
                },
                start,
            ));

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.end_statement()?;
        Ok(constants)
    }

    fn method(&mut self, modifiers: Vec<Modifier>, start: Location) -> Result<Node> {
        let by_ref = self.eat(TokenKind::Amp).is_some();
        let name = self.consume(AnyName, "expected a method name")?;
        let params = self.parameters()?;
        let return_type = self.return_type()?;

        let body = if self.check(TokenKind::LeftBrace) {
            Some(Box::new(self.block()?))
        } else {
            self.end_statement()?;
            None
        };

        Ok(self.finish(
            NodeKind::Method {
                name: name.text,
                modifiers,
                params,
                return_type,
                body,
                by_ref,
            },
            start,
        ))
    }

    fn properties(&mut self, modifiers: Vec<Modifier>) -> Result<Vec<Node>> {
        let type_hint = if self.check(TokenKind::Variable) {
            None
        } else {
            Some(self.type_hint()?)
        };

        let mut properties = Vec::new();
        loop {
            let variable = self.consume(TokenKind::Variable, "expected a property name")?;
            let default = if self.eat(TokenKind::Assign).is_some() {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };

            properties.push(self.finish(
                NodeKind::Property {
                    name: name_of(&variable),
                    modifiers: modifiers.clone(),
                    type_hint: type_hint.clone(),
                    default,
                },
                variable.location,
            ));

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.end_statement()?;
        Ok(properties)
    }
}

fn promotion_modifier(kind: TokenKind) -> Option<Modifier> {
    match kind {
        TokenKind::Public => Some(Modifier::Public),
        TokenKind::Protected => Some(Modifier::Protected),
        TokenKind::Private => Some(Modifier::Private),
        TokenKind::Readonly => Some(Modifier::Readonly),
        _ => None,
    }
}

fn member_modifier(kind: TokenKind) -> Option<Modifier> {
    match kind {
        TokenKind::Static => Some(Modifier::Static),
        TokenKind::Abstract => Some(Modifier::Abstract),
        TokenKind::Final => Some(Modifier::Final),
        TokenKind::Var => Some(Modifier::Var),
        other => promotion_modifier(other),
    }
}
