use phpast_common::tree::{
    AssignOp, BinaryOp, CastKind, IncludeKind, NameKind, Number, Quote, UnaryOp, UpdateOp,
};
use phpast_common::{Location, Node, NodeKind};

use super::{name_of, span, AnyName, Cursor, Matcher, ParseError, Parser, Result, Version};
use crate::lex::{Token, TokenKind, TokenValue};

type Operand = fn(&mut Parser) -> Result<Node>;

impl Parser {
    /// Parse an expression.
    pub fn parse_expression(&mut self) -> Result<Node> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Node> {
        let target = self.ternary()?;
        self.assignment_tail(target)
    }

    /// If an assignment operator follows, parse the rest of an assignment to
    /// `target`.
    fn assignment_tail(&mut self, target: Node) -> Result<Node> {
        let Some(operator) = assign_op(self.peek().kind) else {
            return Ok(target);
        };

        self.advance();
        let by_ref = operator == AssignOp::Assign && self.eat(TokenKind::Amp).is_some();
        let value = self.assignment()?;
        let location = span(&target) + span(&value);

        Ok(Node::new(
            NodeKind::Assignment {
                operator,
                target: Box::new(target),
                value: Box::new(value),
                by_ref,
            },
            location,
        ))
    }

    fn ternary(&mut self) -> Result<Node> {
        let condition = self.coalesce()?;
        if self.eat(TokenKind::Question).is_none() {
            return Ok(condition);
        }

        let consequent = if self.eat(TokenKind::Colon).is_some() {
            None
        } else {
            let consequent = self.assignment()?;
            self.consume(TokenKind::Colon, "expected ':' in conditional expression")?;
            Some(Box::new(consequent))
        };

        let alternate = self.assignment()?;
        let location = span(&condition) + span(&alternate);

        Ok(Node::new(
            NodeKind::Conditional {
                condition: Box::new(condition),
                consequent,
                alternate: Box::new(alternate),
            },
            location,
        ))
    }

    fn coalesce(&mut self) -> Result<Node> {
        let left = self.boolean_or()?;
        if self.eat(TokenKind::Coalesce).is_none() {
            return Ok(left);
        }

        let right = self.coalesce()?;
        Ok(binary(BinaryOp::Coalesce, left, right))
    }

    /// Parse a left associative chain of binary operators.
    fn binary_chain(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
        operand: Operand,
    ) -> Result<Node> {
        let mut left = operand(self)?;

        while let Some(&(_, operator)) = operators.iter().find(|(kind, _)| self.check(*kind)) {
            self.advance();
            let right = operand(self)?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn boolean_or(&mut self) -> Result<Node> {
        self.binary_chain(
            &[
                (TokenKind::PipePipe, BinaryOp::BooleanOr),
                (TokenKind::Or, BinaryOp::LogicalOr),
            ],
            Self::boolean_and,
        )
    }

    fn boolean_and(&mut self) -> Result<Node> {
        self.binary_chain(
            &[
                (TokenKind::AmpAmp, BinaryOp::BooleanAnd),
                (TokenKind::And, BinaryOp::LogicalAnd),
            ],
            Self::bit_or,
        )
    }

    fn bit_or(&mut self) -> Result<Node> {
        self.binary_chain(&[(TokenKind::Pipe, BinaryOp::BitOr)], Self::bit_xor)
    }

    fn bit_xor(&mut self) -> Result<Node> {
        self.binary_chain(
            &[
                (TokenKind::Caret, BinaryOp::BitXor),
                (TokenKind::Xor, BinaryOp::LogicalXor),
            ],
            Self::bit_and,
        )
    }

    fn bit_and(&mut self) -> Result<Node> {
        self.binary_chain(&[(TokenKind::Amp, BinaryOp::BitAnd)], Self::equality)
    }

    fn equality(&mut self) -> Result<Node> {
        self.binary_chain(
            &[
                (TokenKind::Equal, BinaryOp::Equal),
                (TokenKind::NotEqual, BinaryOp::NotEqual),
                (TokenKind::Identical, BinaryOp::Identical),
                (TokenKind::NotIdentical, BinaryOp::NotIdentical),
            ],
            Self::relational,
        )
    }

    fn relational(&mut self) -> Result<Node> {
        self.binary_chain(
            &[
                (TokenKind::Less, BinaryOp::Less),
                (TokenKind::Greater, BinaryOp::Greater),
                (TokenKind::LessEqual, BinaryOp::LessEqual),
                (TokenKind::GreaterEqual, BinaryOp::GreaterEqual),
                (TokenKind::Instanceof, BinaryOp::Instanceof),
            ],
            Self::spaceship,
        )
    }

    fn spaceship(&mut self) -> Result<Node> {
        self.binary_chain(&[(TokenKind::Spaceship, BinaryOp::Spaceship)], Self::shift)
    }

    fn shift(&mut self) -> Result<Node> {
        self.binary_chain(
            &[
                (TokenKind::Shl, BinaryOp::Shl),
                (TokenKind::Shr, BinaryOp::Shr),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Node> {
        self.binary_chain(
            &[
                (TokenKind::Plus, BinaryOp::Add),
                (TokenKind::Minus, BinaryOp::Sub),
                (TokenKind::Dot, BinaryOp::Concat),
            ],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Node> {
        self.binary_chain(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Mod),
            ],
            Self::power,
        )
    }

    fn power(&mut self) -> Result<Node> {
        let base = self.unary()?;
        if self.eat(TokenKind::Pow).is_none() {
            return Ok(base);
        }

        let exponent = self.power()?;
        Ok(binary(BinaryOp::Pow, base, exponent))
    }

    fn unary(&mut self) -> Result<Node> {
        let start = self.peek().location;

        let operator = match self.peek().kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::At => Some(UnaryOp::Silence),
            _ => None,
        };

        if let Some(operator) = operator {
            self.advance();

            // `!$a = f()` assigns before negating.
            let operand = self.unary()?;
            let operand = self.assignment_tail(operand)?;
            return Ok(self.finish(
                NodeKind::Unary {
                    operator,
                    operand: Box::new(operand),
                },
                start,
            ));
        }

        if let Some(operator) = update_op(self.peek().kind) {
            self.advance();
            let operand = self.unary()?;
            return Ok(self.finish(
                NodeKind::Update {
                    operator,
                    prefix: true,
                    operand: Box::new(operand),
                },
                start,
            ));
        }

        if let Some(cast) = self.cast() {
            let expression = self.unary()?;
            let expression = self.assignment_tail(expression)?;
            return Ok(self.finish(
                NodeKind::Cast {
                    cast,
                    expression: Box::new(expression),
                },
                start,
            ));
        }

        self.postfix()
    }

    /// Consume a cast like `(int)` if one is next.
    fn cast(&mut self) -> Option<CastKind> {
        if !self.check(TokenKind::LeftParen) {
            return None;
        }

        let checkpoint = self.checkpoint();
        self.advance();

        let cast = self
            .eat(AnyName)
            .and_then(|token| CastKind::from_spelling(&token.text));

        if cast.is_some() && self.eat(TokenKind::RightParen).is_some() {
            return cast;
        }

        self.rewind(checkpoint);
        None
    }

    fn postfix(&mut self) -> Result<Node> {
        let mut expr = self.primary()?;

        loop {
            let start = span(&expr);
            let kind = self.peek().kind;

            expr = match kind {
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = if self.check(TokenKind::RightBracket) {
                        None
                    } else {
                        Some(Box::new(self.parse_expression()?))
                    };

                    self.consume(TokenKind::RightBracket, "expected ']' after index")?;
                    self.finish(
                        NodeKind::Index {
                            object: Box::new(expr),
                            index,
                        },
                        start,
                    )
                }

                TokenKind::Arrow | TokenKind::NullsafeArrow => {
                    let nullsafe = kind == TokenKind::NullsafeArrow;
                    if nullsafe && !self.supports(Version::PHP_80) {
                        return Err(self.error("the nullsafe operator requires PHP 8.0"));
                    }

                    self.advance();
                    let property = self.member_name()?;
                    self.finish(
                        NodeKind::Member {
                            object: Box::new(expr),
                            property: Box::new(property),
                            nullsafe,
                        },
                        start,
                    )
                }

                TokenKind::DoubleColon => {
                    self.advance();
                    let member = self.static_member_name()?;
                    self.finish(
                        NodeKind::StaticMember {
                            class: Box::new(expr),
                            member: Box::new(member),
                        },
                        start,
                    )
                }

                TokenKind::LeftParen => {
                    let arguments = self.arguments()?;
                    self.finish(
                        NodeKind::Call {
                            callee: Box::new(expr),
                            arguments,
                        },
                        start,
                    )
                }

                TokenKind::Increment | TokenKind::Decrement => {
                    let Some(operator) = update_op(kind) else {
                        return Ok(expr);
                    };

                    self.advance();
                    self.finish(
                        NodeKind::Update {
                            operator,
                            prefix: false,
                            operand: Box::new(expr),
                        },
                        start,
                    )
                }

                _ => return Ok(expr),
            };
        }
    }

    /// The property after `->` or `?->`.
    fn member_name(&mut self) -> Result<Node> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Variable => {
                self.advance();
                Ok(Node::new(
                    NodeKind::Variable {
                        name: name_of(&token),
                    },
                    token.location,
                ))
            }

            TokenKind::LeftBrace => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightBrace, "expected '}' after property expression")?;
                Ok(expr)
            }

            _ if AnyName.matches(&token) => {
                self.advance();
                Ok(Node::new(
                    NodeKind::Identifier { name: token.text },
                    token.location,
                ))
            }

            _ => Err(self.error("expected a property name")),
        }
    }

    /// The member after `::`.
    fn static_member_name(&mut self) -> Result<Node> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Variable => {
                self.advance();
                Ok(Node::new(
                    NodeKind::Variable {
                        name: name_of(&token),
                    },
                    token.location,
                ))
            }

            TokenKind::Dollar => self.variable_variable(),

            _ if AnyName.matches(&token) => {
                self.advance();
                Ok(Node::new(
                    NodeKind::Identifier { name: token.text },
                    token.location,
                ))
            }

            _ => Err(self.error("expected a member name after '::'")),
        }
    }

    /// Parse a parenthesised argument list.
    pub(super) fn arguments(&mut self) -> Result<Vec<Node>> {
        self.consume(TokenKind::LeftParen, "expected '(' before arguments")?;

        let mut arguments = Vec::new();

        if self.check(TokenKind::Ellipsis) && self.peek_at(1).kind == TokenKind::RightParen {
            let token = self.advance();
            arguments.push(Node::new(NodeKind::VariadicPlaceholder, token.location));
        }

        while !self.check(TokenKind::RightParen) {
            arguments.push(self.argument()?);

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.consume(TokenKind::RightParen, "expected ')' after arguments")?;
        Ok(arguments)
    }

    fn argument(&mut self) -> Result<Node> {
        let start = self.peek().location;

        let spread = self.eat(TokenKind::Ellipsis).is_some();
        let name = if spread { None } else { self.argument_name() };
        let value = self.parse_expression()?;

        Ok(self.finish(
            NodeKind::Argument {
                name,
                value: Box::new(value),
                spread,
            },
            start,
        ))
    }

    /// Consume `name:` of a named argument, if this is one.
    fn argument_name(&mut self) -> Option<String> {
        if !self.supports(Version::PHP_80) || !self.check(AnyName) {
            return None;
        }

        let checkpoint = self.checkpoint();
        let name = self.advance();

        if self.eat(TokenKind::Colon).is_some() {
            return Some(name.text);
        }

        self.rewind(checkpoint);
        None
    }

    fn primary(&mut self) -> Result<Node> {
        let token = self.peek().clone();
        let start = token.location;

        match token.kind {
            TokenKind::Variable => {
                self.advance();
                Ok(Node::new(
                    NodeKind::Variable {
                        name: name_of(&token),
                    },
                    start,
                ))
            }

            TokenKind::Dollar => self.variable_variable(),

            TokenKind::Number => {
                self.advance();
                let value = match token.value {
                    TokenValue::Number(value) => value,
                    _ => Number::Int(0),
                };

                Ok(Node::new(NodeKind::NumberLiteral { value }, start))
            }

            TokenKind::StringLiteral => {
                self.advance();
                Ok(Node::new(string_literal(&token), start))
            }

            TokenKind::StringStart => {
                self.advance();
                let parts = self.string_parts(TokenKind::StringEnd, Some('"'))?;
                self.consume(TokenKind::StringEnd, "unterminated string")?;
                Ok(self.finish(NodeKind::InterpolatedString { parts }, start))
            }

            TokenKind::StartHeredoc => self.heredoc(),

            TokenKind::Backtick => {
                self.advance();
                let parts = self.string_parts(TokenKind::Backtick, Some('`'))?;
                self.consume(TokenKind::Backtick, "unterminated shell command")?;
                Ok(self.finish(NodeKind::ShellExec { parts }, start))
            }

            TokenKind::LeftBracket => self.array_literal(),
            TokenKind::Array if self.peek_at(1).kind == TokenKind::LeftParen => {
                self.array_literal()
            }

            TokenKind::List => {
                self.advance();
                self.consume(TokenKind::LeftParen, "expected '(' after 'list'")?;
                let elements = self.array_elements(TokenKind::RightParen)?;
                Ok(self.finish(NodeKind::List { elements }, start))
            }

            TokenKind::Function | TokenKind::Fn => self.closure(false, start),
            TokenKind::Static
                if matches!(
                    self.peek_at(1).kind,
                    TokenKind::Function | TokenKind::Fn
                ) =>
            {
                self.advance();
                self.closure(true, start)
            }

            TokenKind::New => self.new_expression(),

            TokenKind::Clone => {
                self.advance();
                let expression = self.unary()?;
                Ok(self.finish(
                    NodeKind::Clone {
                        expression: Box::new(expression),
                    },
                    start,
                ))
            }

            TokenKind::Yield => self.yield_expression(),

            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "expected ')' after expression")?;
                Ok(expr)
            }

            TokenKind::Match
                if self.supports(Version::PHP_80)
                    && self.peek_at(1).kind == TokenKind::LeftParen =>
            {
                self.match_expression()
            }

            TokenKind::Include
            | TokenKind::IncludeOnce
            | TokenKind::Require
            | TokenKind::RequireOnce => {
                self.advance();
                let kind = match token.kind {
                    TokenKind::Include => IncludeKind::Include,
                    TokenKind::IncludeOnce => IncludeKind::IncludeOnce,
                    TokenKind::Require => IncludeKind::Require,
                    _ => IncludeKind::RequireOnce,
                };

                let path = self.parse_expression()?;
                Ok(self.finish(
                    NodeKind::Include {
                        kind,
                        path: Box::new(path),
                    },
                    start,
                ))
            }

            TokenKind::Isset => {
                self.advance();
                self.consume(TokenKind::LeftParen, "expected '(' after 'isset'")?;
                let variables = self.expression_list(TokenKind::RightParen)?;
                self.consume(TokenKind::RightParen, "expected ')' after isset variables")?;
                Ok(self.finish(NodeKind::Isset { variables }, start))
            }

            TokenKind::Empty | TokenKind::Eval => {
                self.advance();
                self.consume(TokenKind::LeftParen, "expected '('")?;
                let expression = Box::new(self.parse_expression()?);
                self.consume(TokenKind::RightParen, "expected ')'")?;

                let kind = if token.kind == TokenKind::Empty {
                    NodeKind::Empty { expression }
                } else {
                    NodeKind::Eval { expression }
                };

                Ok(self.finish(kind, start))
            }

            TokenKind::Exit => {
                self.advance();
                let value = if self.eat(TokenKind::LeftParen).is_some() {
                    let value = if self.check(TokenKind::RightParen) {
                        None
                    } else {
                        Some(Box::new(self.parse_expression()?))
                    };

                    self.consume(TokenKind::RightParen, "expected ')' after exit status")?;
                    value
                } else {
                    None
                };

                Ok(self.finish(NodeKind::Exit { value }, start))
            }

            TokenKind::Print => {
                self.advance();
                let expression = self.assignment()?;
                Ok(self.finish(
                    NodeKind::Print {
                        expression: Box::new(expression),
                    },
                    start,
                ))
            }

            TokenKind::Throw if self.supports(Version::PHP_80) => {
                self.advance();
                let expression = self.assignment()?;
                Ok(self.finish(
                    NodeKind::Throw {
                        expression: Box::new(expression),
                    },
                    start,
                ))
            }

            TokenKind::Static => {
                self.advance();
                Ok(Node::new(
                    NodeKind::Name {
                        name: token.text,
                        kind: NameKind::Unqualified,
                    },
                    start,
                ))
            }

            TokenKind::Identifier
            | TokenKind::Backslash
            | TokenKind::Namespace
            | TokenKind::Match
            | TokenKind::Enum
            | TokenKind::Readonly => self.name_expression(),

            _ => Err(self.error("expected an expression")),
        }
    }

    /// A name, or one of the constants `true`, `false` and `null`.
    fn name_expression(&mut self) -> Result<Node> {
        let start = self.peek().location;
        let (name, kind) = self.qualified_name()?;

        let node = match (kind, name.to_ascii_lowercase().as_str()) {
            (NameKind::Unqualified, "true") => NodeKind::BooleanLiteral { value: true },
            (NameKind::Unqualified, "false") => NodeKind::BooleanLiteral { value: false },
            (NameKind::Unqualified, "null") => NodeKind::NullLiteral,
            _ => NodeKind::Name { name, kind },
        };

        Ok(self.finish(node, start))
    }

    /// `$$name` or `${expression}`.
    fn variable_variable(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Dollar, "expected '$'")?.location;

        let expression = if self.eat(TokenKind::LeftBrace).is_some() {
            let expression = self.parse_expression()?;
            self.consume(TokenKind::RightBrace, "expected '}' after variable expression")?;
            expression
        } else if self.check(TokenKind::Dollar) {
            self.variable_variable()?
        } else {
            let token = self.consume(TokenKind::Variable, "expected a variable after '$'")?;
            Node::new(
                NodeKind::Variable {
                    name: name_of(&token),
                },
                token.location,
            )
        };

        Ok(self.finish(
            NodeKind::VariableVariable {
                expression: Box::new(expression),
            },
            start,
        ))
    }

    /// Comma separated expressions up to (but not including) `close`.
    pub(super) fn expression_list(&mut self, close: TokenKind) -> Result<Vec<Node>> {
        let mut expressions = Vec::new();

        while !self.check(close) {
            expressions.push(self.parse_expression()?);

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        Ok(expressions)
    }

    /// The parts of an interpolated string, up to (but not including) `end`.
    fn string_parts(&mut self, end: TokenKind, quote: Option<char>) -> Result<Vec<Node>> {
        let mut parts = Vec::new();

        while !self.check(end) && !self.is_at_end() {
            let token = self.peek().clone();

            let part = match token.kind {
                TokenKind::StringMiddle => {
                    self.advance();
                    let raw = match &token.value {
                        TokenValue::Str { value, .. } => value.as_str(),
                        _ => token.text.as_str(),
                    };

                    Node::new(
                        NodeKind::StringLiteral {
                            value: unescape_double(raw, quote),
                            quote: Quote::Double,
                        },
                        token.location,
                    )
                }

                TokenKind::Variable => self.simple_interpolation()?,

                TokenKind::CurlyOpen => {
                    self.advance();
                    let expr = self.parse_expression()?;
                    self.consume(
                        TokenKind::RightBrace,
                        "expected '}' after interpolated expression",
                    )?;
                    expr
                }

                TokenKind::DollarOpenCurlyBraces => self.dollar_brace_interpolation()?,

                _ => return Err(self.error("unexpected token in string")),
            };

            parts.push(part);
        }

        Ok(parts)
    }

    /// `$name`, `$name[offset]` or `$name->property` inside a string.
    fn simple_interpolation(&mut self) -> Result<Node> {
        let token = self.advance();
        let start = token.location;
        let variable = Node::new(
            NodeKind::Variable {
                name: name_of(&token),
            },
            start,
        );

        if self.eat(TokenKind::LeftBracket).is_some() {
            let key = self.advance();
            let index = match key.kind {
                TokenKind::Number => NodeKind::NumberLiteral {
                    value: match key.value {
                        TokenValue::Number(value) => value,
                        _ => Number::Int(0),
                    },
                },
                TokenKind::Identifier => NodeKind::StringLiteral {
                    value: key.text.clone(),
                    quote: Quote::Single,
                },
                TokenKind::Variable => NodeKind::Variable {
                    name: name_of(&key),
                },
                _ => return Err(ParseError::new("expected a string offset", key)),
            };

            let index = Node::new(index, key.location);
            self.consume(TokenKind::RightBracket, "expected ']' after string offset")?;

            return Ok(self.finish(
                NodeKind::Index {
                    object: Box::new(variable),
                    index: Some(Box::new(index)),
                },
                start,
            ));
        }

        if self.eat(TokenKind::Arrow).is_some() {
            let name = self.consume(TokenKind::Identifier, "expected a property name")?;
            let property = Node::new(NodeKind::Identifier { name: name.text }, name.location);

            return Ok(self.finish(
                NodeKind::Member {
                    object: Box::new(variable),
                    property: Box::new(property),
                    nullsafe: false,
                },
                start,
            ));
        }

        Ok(variable)
    }

    /// `${name}`, `${name[expression]}` or `${expression}` inside a string.
    fn dollar_brace_interpolation(&mut self) -> Result<Node> {
        let start = self.advance().location;
        let next = self.peek_at(1).kind;

        let node = if self.check(TokenKind::Identifier) && next == TokenKind::RightBrace {
            let name = self.advance();
            Node::new(NodeKind::Variable { name: name.text }, name.location)
        } else if self.check(TokenKind::Identifier) && next == TokenKind::LeftBracket {
            let name = self.advance();
            let variable = Node::new(NodeKind::Variable { name: name.text }, name.location);

            self.advance();
            let index = self.parse_expression()?;
            self.consume(TokenKind::RightBracket, "expected ']' after offset")?;

            self.finish(
                NodeKind::Index {
                    object: Box::new(variable),
                    index: Some(Box::new(index)),
                },
                start,
            )
        } else {
            let expression = self.parse_expression()?;
            self.finish(
                NodeKind::VariableVariable {
                    expression: Box::new(expression),
                },
                start,
            )
        };

        self.consume(TokenKind::RightBrace, "expected '}' after interpolation")?;
        Ok(node)
    }

    fn heredoc(&mut self) -> Result<Node> {
        let token = self.advance();
        let label = name_of(&token);
        let nowdoc = token.text.contains('\'');

        let parts = if nowdoc {
            self.eat(TokenKind::StringMiddle)
                .map(|body| {
                    Node::new(
                        NodeKind::StringLiteral {
                            value: body.text,
                            quote: Quote::Single,
                        },
                        body.location,
                    )
                })
                .into_iter()
                .collect()
        } else {
            self.string_parts(TokenKind::EndHeredoc, None)?
        };

        self.consume(TokenKind::EndHeredoc, "expected the closing heredoc label")?;
        Ok(self.finish(
            NodeKind::Heredoc {
                label,
                nowdoc,
                parts,
            },
            token.location,
        ))
    }

    /// `[...]` or `array(...)`.
    fn array_literal(&mut self) -> Result<Node> {
        let start = self.peek().location;
        let legacy = self.eat(TokenKind::Array).is_some();

        let close = if legacy {
            self.consume(TokenKind::LeftParen, "expected '(' after 'array'")?;
            TokenKind::RightParen
        } else {
            self.consume(TokenKind::LeftBracket, "expected '['")?;
            TokenKind::RightBracket
        };

        let elements = self.array_elements(close)?;
        Ok(self.finish(NodeKind::Array { elements, legacy }, start))
    }

    /// Array elements up to and including `close`. Empty slots, as used in
    /// destructuring, become `Nop` nodes.
    fn array_elements(&mut self, close: TokenKind) -> Result<Vec<Node>> {
        let mut elements = Vec::new();

        while !self.check(close) {
            if self.check(TokenKind::Comma) {
                let comma = self.advance();
                elements.push(Node::nop(Some(comma.location)));
                continue;
            }

            elements.push(self.array_element()?);

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.consume(close, "expected the end of the array")?;
        Ok(elements)
    }

    fn array_element(&mut self) -> Result<Node> {
        let start = self.peek().location;

        if self.eat(TokenKind::Ellipsis).is_some() {
            let value = self.parse_expression()?;
            return Ok(self.finish(
                NodeKind::ArrayElement {
                    key: None,
                    value: Box::new(value),
                    by_ref: false,
                    spread: true,
                },
                start,
            ));
        }

        let by_ref = self.eat(TokenKind::Amp).is_some();
        let first = self.parse_expression()?;

        if !by_ref && self.eat(TokenKind::DoubleArrow).is_some() {
            let by_ref = self.eat(TokenKind::Amp).is_some();
            let value = self.parse_expression()?;

            return Ok(self.finish(
                NodeKind::ArrayElement {
                    key: Some(Box::new(first)),
                    value: Box::new(value),
                    by_ref,
                    spread: false,
                },
                start,
            ));
        }

        Ok(self.finish(
            NodeKind::ArrayElement {
                key: None,
                value: Box::new(first),
                by_ref,
                spread: false,
            },
            start,
        ))
    }

    /// A closure or arrow function, starting at `function` or `fn`.
    fn closure(&mut self, is_static: bool, start: Location) -> Result<Node> {
        if self.eat(TokenKind::Fn).is_some() {
            let by_ref = self.eat(TokenKind::Amp).is_some();
            let params = self.parameters()?;
            let return_type = self.return_type()?;
            self.consume(TokenKind::DoubleArrow, "expected '=>' in arrow function")?;
            let body = self.parse_expression()?;

            return Ok(self.finish(
                NodeKind::ArrowFunction {
                    params,
                    return_type,
                    body: Box::new(body),
                    by_ref,
                    is_static,
                },
                start,
            ));
        }

        self.consume(TokenKind::Function, "expected 'function'")?;
        let by_ref = self.eat(TokenKind::Amp).is_some();
        let params = self.parameters()?;

        let mut uses = Vec::new();
        if self.eat(TokenKind::Use).is_some() {
            self.consume(TokenKind::LeftParen, "expected '(' after 'use'")?;

            while !self.check(TokenKind::RightParen) {
                let start = self.peek().location;
                let by_ref = self.eat(TokenKind::Amp).is_some();
                let variable =
                    self.consume(TokenKind::Variable, "expected a variable in the use list")?;

                uses.push(self.finish(
                    NodeKind::ClosureUse {
                        name: name_of(&variable),
                        by_ref,
                    },
                    start,
                ));

                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }

            self.consume(TokenKind::RightParen, "expected ')' after the use list")?;
        }

        let return_type = self.return_type()?;
        let body = self.block()?;

        Ok(self.finish(
            NodeKind::Closure {
                params,
                uses,
                return_type,
                body: Box::new(body),
                by_ref,
                is_static,
            },
            start,
        ))
    }

    fn new_expression(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::New, "expected 'new'")?.location;

        let (class, arguments) = if self.check(TokenKind::Class) {
            self.anonymous_class()?
        } else {
            let class = self.class_reference()?;
            let arguments = if self.check(TokenKind::LeftParen) {
                self.arguments()?
            } else {
                Vec::new()
            };

            (class, arguments)
        };

        Ok(self.finish(
            NodeKind::New {
                class: Box::new(class),
                arguments,
            },
            start,
        ))
    }

    /// The class in a `new` expression. Dynamic class references may use
    /// property and static property accesses, but no calls.
    fn class_reference(&mut self) -> Result<Node> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Static => {
                self.advance();
                Ok(Node::new(
                    NodeKind::Name {
                        name: token.text,
                        kind: NameKind::Unqualified,
                    },
                    token.location,
                ))
            }

            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "expected ')' after class expression")?;
                Ok(expr)
            }

            TokenKind::Variable | TokenKind::Dollar => {
                let mut class = if token.kind == TokenKind::Dollar {
                    self.variable_variable()?
                } else {
                    self.advance();
                    Node::new(
                        NodeKind::Variable {
                            name: name_of(&token),
                        },
                        token.location,
                    )
                };

                loop {
                    let start = span(&class);

                    class = match self.peek().kind {
                        kind @ (TokenKind::Arrow | TokenKind::NullsafeArrow) => {
                            self.advance();
                            let property = self.member_name()?;
                            self.finish(
                                NodeKind::Member {
                                    object: Box::new(class),
                                    property: Box::new(property),
                                    nullsafe: kind == TokenKind::NullsafeArrow,
                                },
                                start,
                            )
                        }

                        TokenKind::DoubleColon
                            if self.peek_at(1).kind == TokenKind::Variable =>
                        {
                            self.advance();
                            let member = self.static_member_name()?;
                            self.finish(
                                NodeKind::StaticMember {
                                    class: Box::new(class),
                                    member: Box::new(member),
                                },
                                start,
                            )
                        }

                        TokenKind::LeftBracket => {
                            self.advance();
                            let index = self.parse_expression()?;
                            self.consume(TokenKind::RightBracket, "expected ']' after index")?;
                            self.finish(
                                NodeKind::Index {
                                    object: Box::new(class),
                                    index: Some(Box::new(index)),
                                },
                                start,
                            )
                        }

                        _ => return Ok(class),
                    };
                }
            }

            _ => self.name_node(),
        }
    }

    fn yield_expression(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Yield, "expected 'yield'")?.location;

        if self.check(TokenKind::Identifier) && self.peek().text.eq_ignore_ascii_case("from") {
            self.advance();
            let expression = self.parse_expression()?;
            return Ok(self.finish(
                NodeKind::YieldFrom {
                    expression: Box::new(expression),
                },
                start,
            ));
        }

        const ENDS: &[TokenKind] = &[
            TokenKind::Semicolon,
            TokenKind::RightParen,
            TokenKind::RightBracket,
            TokenKind::Comma,
            TokenKind::CloseTag,
            TokenKind::Eof,
        ];

        if self.check(ENDS) {
            return Ok(self.finish(
                NodeKind::Yield {
                    key: None,
                    value: None,
                },
                start,
            ));
        }

        let value = self.ternary()?;
        let (key, value) = if self.eat(TokenKind::DoubleArrow).is_some() {
            (Some(Box::new(value)), self.ternary()?)
        } else {
            (None, value)
        };

        Ok(self.finish(
            NodeKind::Yield {
                key,
                value: Some(Box::new(value)),
            },
            start,
        ))
    }

    fn match_expression(&mut self) -> Result<Node> {
        let start = self.consume(TokenKind::Match, "expected 'match'")?.location;

        self.consume(TokenKind::LeftParen, "expected '(' after 'match'")?;
        let subject = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "expected ')' after match subject")?;
        self.consume(TokenKind::LeftBrace, "expected '{' before match arms")?;

        let mut arms = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            let arm_start = self.peek().location;
            let mut conditions = Vec::new();

            if self.eat(TokenKind::Default).is_none() {
                loop {
                    conditions.push(self.parse_expression()?);

                    if self.eat(TokenKind::Comma).is_none() || self.check(TokenKind::DoubleArrow) {
                        break;
                    }
                }
            }

            self.consume(TokenKind::DoubleArrow, "expected '=>' in match arm")?;
            let body = self.parse_expression()?;

            arms.push(self.finish(
                NodeKind::MatchArm {
                    conditions,
                    body: Box::new(body),
                },
                arm_start,
            ));

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.consume(TokenKind::RightBrace, "expected '}' after match arms")?;
        Ok(self.finish(
            NodeKind::Match {
                subject: Box::new(subject),
                arms,
            },
            start,
        ))
    }
}

fn binary(operator: BinaryOp, left: Node, right: Node) -> Node {
    let location = span(&left) + span(&right);
    Node::new(
        NodeKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
        location,
    )
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusAssign => AssignOp::Add,
        TokenKind::MinusAssign => AssignOp::Sub,
        TokenKind::StarAssign => AssignOp::Mul,
        TokenKind::SlashAssign => AssignOp::Div,
        TokenKind::PercentAssign => AssignOp::Mod,
        TokenKind::PowAssign => AssignOp::Pow,
        TokenKind::DotAssign => AssignOp::Concat,
        TokenKind::AmpAssign => AssignOp::BitAnd,
        TokenKind::PipeAssign => AssignOp::BitOr,
        TokenKind::CaretAssign => AssignOp::BitXor,
        TokenKind::ShlAssign => AssignOp::Shl,
        TokenKind::ShrAssign => AssignOp::Shr,
        TokenKind::CoalesceAssign => AssignOp::Coalesce,
        _ => return None,
    })
}

fn update_op(kind: TokenKind) -> Option<UpdateOp> {
    match kind {
        TokenKind::Increment => Some(UpdateOp::Increment),
        TokenKind::Decrement => Some(UpdateOp::Decrement),
        _ => None,
    }
}

/// The literal for a complete string token, with its escapes decoded.
fn string_literal(token: &Token) -> NodeKind {
    let (raw, quote) = match &token.value {
        TokenValue::Str { value, quote } => (value.as_str(), *quote),
        _ => (token.text.as_str(), Quote::Single),
    };

    let value = match quote {
        Quote::Single => unescape_single(raw),
        Quote::Double => unescape_double(raw, Some('"')),
    };

    NodeKind::StringLiteral { value, quote }
}

/// Decode `\\` and `\'`, the only escapes of single-quoted strings.
pub(super) fn unescape_single(raw: &str) -> String {
    let mut res = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next @ ('\\' | '\'')) = chars.peek() {
                res.push(next);
                chars.next();
                continue;
            }
        }

        res.push(c);
    }

    res
}

/// Decode the escapes of double-quoted strings, heredocs and shell commands.
/// `quote` is the delimiter which may be escaped, if there is one. Unknown
/// escapes are kept as they are.
pub(super) fn unescape_double(raw: &str, quote: Option<char>) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut res = String::with_capacity(raw.len());
    let mut i = 0;

    let digits = |from: usize, max: usize, radix: u32| {
        chars[from..]
            .iter()
            .take(max)
            .take_while(|c| c.is_digit(radix))
            .count()
    };

    let number = |from: usize, len: usize, radix: u32| {
        let text: String = chars[from..from + len].iter().collect();
        u32::from_str_radix(&text, radix).ok()
    };

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 >= chars.len() {
            res.push(c);
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        i += 2;

        match next {
            'n' => res.push('\n'),
            't' => res.push('\t'),
            'r' => res.push('\r'),
            'v' => res.push('\u{0b}'),
            'e' => res.push('\u{1b}'),
            'f' => res.push('\u{0c}'),
            '\\' => res.push('\\'),
            '$' => res.push('$'),

            '0'..='7' => {
                let len = 1 + digits(i, 2, 8);
                let value = number(i - 1, len, 8).unwrap_or(0);
                res.push(char::from((value % 256) as u8));
                i += len - 1;
            }

            'x' if digits(i, 2, 16) > 0 => {
                let len = digits(i, 2, 16);
                let value = number(i, len, 16).unwrap_or(0);
                res.push(char::from(value as u8));
                i += len;
            }

            'u' if chars.get(i) == Some(&'{') => {
                let len = digits(i + 1, 6, 16);
                let decoded = number(i + 1, len, 16).and_then(char::from_u32);

                match decoded {
                    Some(decoded) if len > 0 && chars.get(i + 1 + len) == Some(&'}') => {
                        res.push(decoded);
                        i += len + 2;
                    }
                    _ => {
                        res.push('\\');
                        res.push('u');
                    }
                }
            }

            other if Some(other) == quote => res.push(other),

            other => {
                res.push('\\');
                res.push(other);
            }
        }
    }

    res
}
