use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use phpast_frontend::Version;

/// Parse, check and optimize PHP source files.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
#[command(propagate_version = true)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the tokens of a file.
    #[command(visible_alias = "t")]
    Tokens(TokensArgs),

    /// Print the syntax tree of a file.
    #[command(visible_alias = "p")]
    Parse(ParseArgs),

    /// Report errors and suspicious code.
    #[command(visible_alias = "c")]
    Check(SourceArgs),

    /// Print the syntax tree of a file after optimizing it.
    #[command(visible_alias = "o")]
    Optimize(OptimizeArgs),

    /// Print a summary of the syntax tree of a file.
    Stats(SourceArgs),
}

#[derive(Debug, Args)]
pub struct TokensArgs {
    /// Include comments in the output.
    #[arg(long, action = ArgAction::SetTrue)]
    pub comments: bool,

    /// Include whitespace in the output.
    #[arg(long, action = ArgAction::SetTrue)]
    pub whitespace: bool,

    #[arg(required = true)]
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// The PHP version whose syntax is accepted.
    #[arg(long = "php-version", default_value_t = Version::LATEST)]
    pub version: Version,

    /// Skip over syntax errors instead of stopping at the first one.
    #[arg(long, action = ArgAction::SetTrue)]
    pub recover: bool,

    #[arg(required = true)]
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Fail if any syntax error was skipped over.
    #[arg(long, action = ArgAction::SetTrue)]
    pub strict: bool,

    /// Show the location of every node.
    #[arg(long, action = ArgAction::SetTrue)]
    pub locations: bool,

    /// The width to print the tree in. Defaults to the terminal width.
    #[arg(short, long)]
    pub width: Option<usize>,
}

#[derive(Debug, Args)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// The optimization level, from 0 (nothing) to 3 (everything).
    #[arg(short = 'O', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub level: u8,

    /// Do not fold constant expressions.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_folding: bool,

    /// Do not remove unreachable code.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_dead_code: bool,

    /// Do not remove assignments to unused variables.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_unused: bool,

    /// Do not inline small functions.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_inlining: bool,

    /// Keep unused assignments whose value may have side effects.
    #[arg(long, action = ArgAction::SetTrue)]
    pub conservative: bool,

    /// The width to print the tree in. Defaults to the terminal width.
    #[arg(short, long)]
    pub width: Option<usize>,
}
