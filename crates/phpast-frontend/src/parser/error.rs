use phpast_common::Location;
use thiserror::Error;

use crate::lex::Token;

/// A syntax error at a particular token.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}, found {} at {location}", .token.kind)]
pub struct ParseError {
    pub message: String,
    pub location: Location,

    /// The token the parser could not make sense of.
    pub token: Token,
}

impl ParseError {
    pub fn new(message: impl Into<String>, token: Token) -> Self {
        Self {
            message: message.into(),
            location: token.location,
            token,
        }
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid PHP version {0:?}, expected something like \"8.1\"")]
pub struct InvalidVersion(pub String);
