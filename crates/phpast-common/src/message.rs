use std::fmt;

use crate::source::Location;
use crate::tree::Node;

/// A diagnostic is some message about the program produced by an analysis
/// pass. Errors mean the program is definitely wrong; warnings point at code
/// that is likely, but not certainly, wrong.
///
/// Diagnostics can be ergonomically created using [`MessageMaker`] and the
/// [`MessageContainer`] trait.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic<'a> {
    /// What kind of problem this is.
    pub code: Code,

    pub severity: Severity,

    /// A short, human readable description of the problem.
    pub message: String,

    /// The node the diagnostic is about.
    pub node: &'a Node,

    /// Where the problem occurred, if known.
    pub location: Option<Location>,
}

impl<'a> Diagnostic<'a> {
    pub fn error(code: Code, node: &'a Node) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: String::new(),
            node,
            location: node.location,
        }
    }

    pub fn warning(code: Code, node: &'a Node) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: String::new(),
            node,
            location: node.location,
        }
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Code {
    /// `break` or `continue` outside of any loop or switch.
    InvalidBreakContinue,
    /// A loop whose condition is always true.
    InfiniteLoop,
    /// A variable read with no visible definition.
    UndefinedVariable,
}

impl Code {
    /// The stable tag identifying this kind of diagnostic.
    pub fn tag(self) -> &'static str {
        match self {
            Self::InvalidBreakContinue => "invalid-break-continue",
            Self::InfiniteLoop => "infinite-loop",
            Self::UndefinedVariable => "undefined-variable",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// This is used as an intermediate struct to generate diagnostics using
/// syntax like `self.at(node).my_message_method()`. Particular methods can be
/// implemented as extension traits on this structure, and it takes care of
/// adding the diagnostic to the right container.
pub struct MessageMaker<'a, C> {
    pub node: &'a Node,
    container: C,
}

impl<'a, C> MessageMaker<'a, C> {
    pub fn new(container: C, node: &'a Node) -> Self {
        Self { node, container }
    }

    pub fn error(&self, code: Code) -> Diagnostic<'a> {
        Diagnostic::error(code, self.node)
    }

    pub fn warning(&self, code: Code) -> Diagnostic<'a> {
        Diagnostic::warning(code, self.node)
    }
}

impl<'a, C: MessageContainer<'a>> MessageMaker<'a, C> {
    pub fn add(&mut self, diagnostic: Diagnostic<'a>) {
        self.container.push(diagnostic);
    }
}

/// Anything able to accumulate diagnostics.
pub trait MessageContainer<'a> {
    fn push(&mut self, diagnostic: Diagnostic<'a>);
}

impl<'a> MessageContainer<'a> for &'_ mut Vec<Diagnostic<'a>> {
    fn push(&mut self, diagnostic: Diagnostic<'a>) {
        Vec::push(*self, diagnostic)
    }
}
