use anyhow::Result;
use clap::Parser;
use fortkit::cli::{AppContext, Cli};
use fortkit::cli_ext::commands;
use fortkit::infra::logging::init_tracing;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.quiet);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        root: cli.root,
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    commands::run(cli.command, &ctx)
}
