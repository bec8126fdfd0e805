//! Shell completion generation using clap_complete.
//!
//! The generated scripts also complete `fkit tool <NAME>` with the names of
//! the registered tools. Parsing itself accepts any name so unknown tools
//! still get the registry's own error message.

use anyhow::{Context, Result};
use clap::{Command, CommandFactory, builder::PossibleValuesParser};
use clap_complete::{Shell as CompletionShell, generate, generate_to};
use std::{fs, io};

use crate::{
    cli::{Cli, CompletionsArgs, Shell},
    tools::ToolRegistry,
};

/// Binary name the scripts complete
const BIN_NAME: &str = "fkit";

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
            Shell::Elvish => CompletionShell::Elvish,
        }
    }
}

/// CLI definition with tool names attached as completion candidates.
fn completion_command() -> Command {
    let names: Vec<String> = ToolRegistry::standard()
        .names()
        .map(str::to_string)
        .collect();

    Cli::command().mut_subcommand("tool", |tool| {
        tool.mut_arg("name", |arg| arg.value_parser(PossibleValuesParser::new(names)))
    })
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = completion_command();
    let shell: CompletionShell = args.shell.into();

    if args.stdout {
        generate(shell, &mut cmd, BIN_NAME, &mut io::stdout());
        return Ok(());
    }

    let dir = args
        .out_dir
        .context("--out-dir is required unless --stdout is set")?;

    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = generate_to(shell, &mut cmd, BIN_NAME, &dir).context("Failed to generate completion file")?;

    eprintln!("Wrote completion to {}", path.display());
    Ok(())
}
