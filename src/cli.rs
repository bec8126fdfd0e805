use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub root: PathBuf,  // global --root
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "fkit")]
#[command(
    about = "Structural reader and safe in-place editor for Fortran source trees"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root; every path must resolve inside it
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Only print results and errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Validate edits and print a diff without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Outline the programs, modules, subroutines and functions of a file
    Summary(SummaryArgs),

    /// Print the source of one named entity
    Symbol(SymbolArgs),

    /// Case-insensitive substring search across the sources
    Search(SearchArgs),

    /// List Fortran sources with line counts
    Sources(SourcesArgs),

    /// Print lines of a file (format: file.f90 or file.f90:10-20)
    Read(ReadArgs),

    /// Apply insert/delete line directives ("12 + text", "7 - text")
    Edit(EditArgs),

    /// Replace a line range, or insert before a line
    Replace(ReplaceArgs),

    /// Write a whole file (backing up an existing one)
    Write(WriteArgs),

    /// Insert a subroutine or function into a file
    AddCallable(AddCallableArgs),

    /// Invoke a registered tool with JSON arguments
    Tool(ToolArgs),

    /// Print the tool definitions as JSON
    Tools(ToolsArgs),

    /// Initialize a fkit.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Source file, relative to --root
    pub file: String,
}

#[derive(Debug, Args)]
pub struct SymbolArgs {
    /// Source file, relative to --root
    pub file: String,

    /// Entity name (case-insensitive)
    pub name: String,

    /// Restrict the lookup to one kind
    #[arg(short, long, value_enum)]
    pub kind: Option<SymbolKindArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SymbolKindArg {
    Program,
    Module,
    Subroutine,
    Function,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Substring to look for
    pub query: String,

    /// File extensions to scan (repeatable); defaults to Fortran sources
    #[arg(short, long = "ext")]
    pub extensions: Vec<String>,

    /// Maximum number of snippets
    #[arg(short, long)]
    pub max_matches: Option<usize>,

    /// Context lines before and after each match
    #[arg(short, long)]
    pub context: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SourcesArgs {
    /// Maximum number of files to list
    #[arg(short, long)]
    pub max_files: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// File with optional range (format: file.f90:10-20)
    pub target: String,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// File to edit, relative to --root
    pub file: String,

    /// Directive script; read from stdin when omitted
    #[arg(short, long)]
    pub script: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReplaceArgs {
    /// File to edit, relative to --root
    pub file: String,

    /// First line to replace (1-based)
    #[arg(long)]
    pub start: usize,

    /// Last line to replace; start - 1 inserts without deleting
    #[arg(long)]
    pub end: usize,

    /// Replacement text file; read from stdin when omitted
    #[arg(long, conflicts_with = "delete")]
    pub text_file: Option<PathBuf>,

    /// Use empty replacement text (pure deletion)
    #[arg(long)]
    pub delete: bool,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// File to write, relative to --root
    pub file: String,

    /// Content file; read from stdin when omitted
    #[arg(long)]
    pub content_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AddCallableArgs {
    /// File to update, relative to --root
    pub file: String,

    /// Callable kind
    #[arg(short, long, value_enum, default_value = "subroutine")]
    pub kind: CallableKindArg,

    /// Name of the new callable
    #[arg(short, long)]
    pub name: String,

    /// Module or program that should contain it
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Existing sibling callable to insert after
    #[arg(short, long)]
    pub after: Option<String>,

    /// Source of the new callable; read from stdin when omitted
    #[arg(long)]
    pub body_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CallableKindArg {
    Subroutine,
    Function,
}

#[derive(Debug, Args)]
pub struct ToolArgs {
    /// Registered tool name (see `fkit tools --names`)
    pub name: String,

    /// JSON arguments object; read from stdin when omitted
    #[arg(long)]
    pub args: Option<String>,
}

#[derive(Debug, Args)]
pub struct ToolsArgs {
    /// Print only the tool names
    #[arg(long)]
    pub names: bool,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize config in (defaults to --root)
    pub path: Option<PathBuf>,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
