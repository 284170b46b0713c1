mod args;
mod input;
mod report;

use std::process::ExitCode;

use clap::Parser as _;
use console::{style, Term};
use log::{debug, info};

use phpast_common::tree::Prettier;
use phpast_frontend::{parse_with, tokenize, LexerOptions, Parsed, ParserOptions, TokenKind};
use phpast_midend::{optimize, statistics, validate, OptimizeOptions};

use args::{Arguments, Command, OptimizeArgs, ParseArgs, SourceArgs, TokensArgs};
use report::Reporter;

const DEFAULT_WIDTH: usize = 80;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Arguments::parse();
    debug!("arguments: {args:?}");

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{} {error:#}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Arguments) -> anyhow::Result<ExitCode> {
    match args.command {
        Command::Tokens(args) => tokens(args),
        Command::Parse(args) => parse(args),
        Command::Check(args) => check(args),
        Command::Optimize(args) => optimize_file(args),
        Command::Stats(args) => stats(args),
    }
}

fn tokens(args: TokensArgs) -> anyhow::Result<ExitCode> {
    let source = input::read_file(&args.path)?;
    let options = LexerOptions {
        preserve_comments: args.comments,
        preserve_whitespace: args.whitespace,
        ..Default::default()
    };

    for token in tokenize(&source, &options) {
        let kind = match token.kind {
            TokenKind::Unknown => style(format!("{:?}", token.kind)).red(),
            TokenKind::Comment
            | TokenKind::DocComment
            | TokenKind::Whitespace
            | TokenKind::Newline => style(format!("{:?}", token.kind)).dim(),
            _ => style(format!("{:?}", token.kind)).cyan(),
        };

        println!(
            "{:>4}:{:<4} {kind:<24} {:?}",
            token.location.start.line, token.location.start.column, token.text
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn parse(args: ParseArgs) -> anyhow::Result<ExitCode> {
    let mut reporter = Reporter::new();
    let Some((_, parsed)) = parse_file(&mut reporter, &args.source, args.strict)? else {
        return Ok(ExitCode::FAILURE);
    };

    let width = args.width.unwrap_or_else(terminal_width);
    let prettier = Prettier::new()
        .with_width(width)
        .with_locations(args.locations);
    println!("{}", prettier.pretty(&parsed.program));

    Ok(if parsed.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn check(args: SourceArgs) -> anyhow::Result<ExitCode> {
    let mut reporter = Reporter::new();
    let Some((file, parsed)) = parse_file(&mut reporter, &args, false)? else {
        return Ok(ExitCode::FAILURE);
    };

    let validation = validate(&parsed.program);
    info!(
        "{} errors and {} warnings",
        validation.errors.len(),
        validation.warnings.len()
    );

    for diagnostic in validation.errors.iter().chain(&validation.warnings) {
        reporter.emit(&report::validation(file, diagnostic))?;
    }

    Ok(if validation.valid && parsed.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn optimize_file(args: OptimizeArgs) -> anyhow::Result<ExitCode> {
    let mut reporter = Reporter::new();
    let Some((_, parsed)) = parse_file(&mut reporter, &args.source, false)? else {
        return Ok(ExitCode::FAILURE);
    };

    let options = OptimizeOptions {
        level: args.level,
        constant_folding: !args.no_folding,
        dead_code: !args.no_dead_code,
        unused_variables: !args.no_unused,
        inlining: !args.no_inlining,
        conservative: args.conservative,
    };

    let optimized = optimize(&parsed.program, &options);
    let prettier = Prettier::new().with_width(args.width.unwrap_or_else(terminal_width));
    println!("{}", prettier.pretty(&optimized));

    Ok(ExitCode::SUCCESS)
}

fn stats(args: SourceArgs) -> anyhow::Result<ExitCode> {
    let mut reporter = Reporter::new();
    let Some((_, parsed)) = parse_file(&mut reporter, &args, false)? else {
        return Ok(ExitCode::FAILURE);
    };

    print!("{}", statistics(&parsed.program));
    Ok(ExitCode::SUCCESS)
}

/// Read and parse the file named by `args`, reporting every syntax error.
/// Returns the id of the file in `reporter` along with the tree, or `None`
/// if no tree could be produced.
fn parse_file(
    reporter: &mut Reporter,
    args: &SourceArgs,
    strict: bool,
) -> anyhow::Result<Option<(usize, Parsed)>> {
    let source = input::read_file(&args.path)?;
    let file = reporter.add(args.path.display().to_string(), source);

    let options = ParserOptions {
        version: args.version,
        error_recovery: args.recover,
        strict,
    };

    info!("parsing `{}` as PHP {}", args.path.display(), args.version);
    let result = parse_with(
        reporter.source(file)?,
        Some(file),
        &LexerOptions::default(),
        &options,
    );

    match result {
        Ok(parsed) => {
            for error in &parsed.errors {
                reporter.emit(&report::syntax_error(file, error))?;
            }

            Ok(Some((file, parsed)))
        }

        Err(error) => {
            reporter.emit(&report::syntax_error(file, &error))?;
            Ok(None)
        }
    }
}

fn terminal_width() -> usize {
    Term::stdout()
        .size_checked()
        .map(|(_, columns)| usize::from(columns))
        .unwrap_or(DEFAULT_WIDTH)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use phpast_frontend::Version;

    use super::*;

    #[test]
    fn parsed_files_keep_their_own_id() {
        let path = std::env::temp_dir().join("phpast-second-file.php");
        fs::write(&path, "<?php echo $x;").expect("temporary file is writable");

        let mut reporter = Reporter::new();
        let first = reporter.add("first.php".into(), "<?php".into());

        let args = SourceArgs {
            version: Version::LATEST,
            recover: false,
            path,
        };

        let (file, parsed) = parse_file(&mut reporter, &args, false)
            .expect("file is readable")
            .expect("source parses");
        assert_ne!(first, file);

        let validation = validate(&parsed.program);
        let warning = validation.warnings.first().expect("one warning");
        assert_eq!(Some(file), warning.location.and_then(|location| location.source));
        assert_eq!(file, report::validation(file, warning).labels[0].file_id);
    }
}
