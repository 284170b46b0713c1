//! Rendering syntax errors and validation diagnostics with codespan.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use codespan_reporting::term::{self, Config, DisplayStyle};

use phpast_common::message::{self, Severity};
use phpast_frontend::ParseError;

pub struct Reporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: Config,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: Config {
                display_style: DisplayStyle::Rich,
                ..Default::default()
            },
        }
    }

    pub fn add(&mut self, name: String, source: String) -> usize {
        self.files.add(name, source)
    }

    pub fn source(&self, file: usize) -> anyhow::Result<&str> {
        Ok(self.files.get(file)?.source())
    }

    pub fn emit(&mut self, diagnostic: &Diagnostic<usize>) -> anyhow::Result<()> {
        term::emit(&mut self.writer, &self.config, &self.files, diagnostic)?;
        Ok(())
    }
}

pub fn syntax_error(file: usize, error: &ParseError) -> Diagnostic<usize> {
    Diagnostic::error()
        .with_code("syntax-error")
        .with_message(&error.message)
        .with_labels(vec![Label::primary(file, error.location.range())
            .with_message(format!("found {}", error.token.kind))])
}

pub fn validation(file: usize, diagnostic: &message::Diagnostic) -> Diagnostic<usize> {
    let result = match diagnostic.severity {
        Severity::Error => Diagnostic::error(),
        Severity::Warning => Diagnostic::warning(),
    }
    .with_code(diagnostic.code.tag())
    .with_message(&diagnostic.message);

    match diagnostic.location {
        Some(location) => result.with_labels(vec![Label::primary(file, location.range())]),
        None => result.with_notes(vec![format!(
            "in a {} without a location",
            diagnostic.node.kind_name()
        )]),
    }
}
