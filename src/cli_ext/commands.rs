//! CLI command handlers.
//!
//! Each subcommand builds the bound root and configuration, calls the same
//! operation the matching tool uses, and prints the text report on stdout.
//! Failures propagate as `anyhow` errors, so the process exits non-zero.

use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tracing::instrument;

use crate::{
    cli::{
        AddCallableArgs, AppContext, CallableKindArg, Commands, EditArgs, ReadArgs, ReplaceArgs,
        SearchArgs, SourcesArgs, SummaryArgs, SymbolArgs, SymbolKindArg, ToolArgs, ToolsArgs,
        WriteArgs,
    },
    completion,
    core::{
        callable::{CallableKind, CallableRequest, insert_callable},
        edit::{BlockReplace, parse_directives},
        extract::{ReadTarget, read_lines},
        search::{SearchOptions, search_codebase},
        sources::list_sources,
        symbols::{EntityKind, extract_symbol, summarise_file},
    },
    infra::{
        config::{init, load_config},
        paths::BoundRoot,
    },
    tools::{ToolContext, ToolRegistry},
};

/// Dispatch one parsed subcommand.
pub fn run(
    command: Commands,
    ctx: &AppContext,
) -> Result<()>
{
    match command
    {
        Commands::Summary(args) => summary(args, ctx),
        Commands::Symbol(args) => symbol(args, ctx),
        Commands::Search(args) => search(args, ctx),
        Commands::Sources(args) => sources(args, ctx),
        Commands::Read(args) => read(args, ctx),
        Commands::Edit(args) => edit(args, ctx),
        Commands::Replace(args) => replace(args, ctx),
        Commands::Write(args) => write(args, ctx),
        Commands::AddCallable(args) => add_callable(args, ctx),
        Commands::Tool(args) => tool(args, ctx),
        Commands::Tools(args) => tools(args, ctx),
        Commands::Init(args) => init(args, ctx).map(|_| ()),
        Commands::Completions(args) => completion::run(args),
    }
}

/// Bound root, layered configuration and dry-run flag for this run.
pub fn tool_context(ctx: &AppContext) -> Result<ToolContext>
{
    let root = BoundRoot::new(&ctx.root)
        .with_context(|| format!("Cannot use {} as project root", ctx.root.display()))?;
    let config = load_config(root.path())?;
    Ok(ToolContext::new(root, config).with_dry_run(ctx.dry_run))
}

/// Read a multi-line payload from `file`, or stdin when absent.
fn read_payload(
    file: Option<&Path>,
    what: &str,
) -> Result<String>
{
    match file
    {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {what} from {}", path.display())),
        None =>
        {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .with_context(|| format!("Failed to read {what} from stdin"))?;
            Ok(buf)
        }
    }
}

/// Result text on stdout; for mutations a short status line on stderr.
fn emit(
    ctx: &AppContext,
    report: &str,
    mutating: bool,
)
{
    println!("{report}");

    if !mutating || ctx.quiet
    {
        return;
    }
    let status = if ctx.dry_run { "dry run: nothing written" } else { "done" };
    if ctx.no_color
    {
        eprintln!("{status}");
    }
    else if ctx.dry_run
    {
        eprintln!("{}", status.yellow());
    }
    else
    {
        eprintln!("{}", status.green().bold());
    }
}

fn summary(
    args: SummaryArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    emit(ctx, &summarise_file(&tc.root, &args.file)?, false);
    Ok(())
}

fn symbol(
    args: SymbolArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    let kind = args
        .kind
        .map(|k| match k
        {
            SymbolKindArg::Program => EntityKind::Program,
            SymbolKindArg::Module => EntityKind::Module,
            SymbolKindArg::Subroutine => EntityKind::Subroutine,
            SymbolKindArg::Function => EntityKind::Function,
        });
    let out = extract_symbol(&tc.root, &args.file, &args.name, kind, tc.config.snippet.symbol_width)?;
    emit(ctx, &out, false);
    Ok(())
}

fn search(
    args: SearchArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    let defaults = &tc.config.search;
    let opts = SearchOptions {
        extensions: if args
            .extensions
            .is_empty()
        {
            defaults
                .extensions
                .clone()
        }
        else
        {
            args.extensions
        },
        ignore_patterns: tc
            .config
            .ignore_patterns
            .clone(),
        max_matches: args
            .max_matches
            .unwrap_or(defaults.max_matches),
        context_lines: args
            .context
            .unwrap_or(defaults.context_lines),
        width: tc
            .config
            .snippet
            .width,
    };
    emit(ctx, &search_codebase(&tc.root, &args.query, &opts)?, false);
    Ok(())
}

fn sources(
    args: SourcesArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    let out = list_sources(
        &tc.root,
        &tc.config
            .search
            .extensions,
        &tc.config.ignore_patterns,
        args.max_files
            .unwrap_or(
                tc.config
                    .sources
                    .max_files,
            ),
    )?;
    emit(ctx, &out, false);
    Ok(())
}

fn read(
    args: ReadArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    let target = ReadTarget::parse(&args.target)
        .with_context(|| format!("Invalid read target '{}'", args.target))?;
    let out = read_lines(
        &tc.root,
        &target.file,
        target.start,
        target.end,
        tc.config
            .snippet
            .width,
    )?;
    emit(ctx, &out, false);
    Ok(())
}

#[instrument(skip(ctx))]
fn edit(
    args: EditArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    let script = read_payload(
        args.script
            .as_deref(),
        "directive script",
    )?;
    let directives = parse_directives(&script)?;
    let out = tc
        .mutator()
        .edit_lines(&args.file, &directives)?;
    emit(ctx, &out, true);
    Ok(())
}

#[instrument(skip(ctx))]
fn replace(
    args: ReplaceArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    let text = if args.delete
    {
        String::new()
    }
    else
    {
        read_payload(
            args.text_file
                .as_deref(),
            "replacement text",
        )?
    };
    let block = BlockReplace { start_line: args.start, end_line: args.end, text };
    let out = tc
        .mutator()
        .replace_block(&args.file, &block)?;
    emit(ctx, &out, true);
    Ok(())
}

#[instrument(skip(ctx))]
fn write(
    args: WriteArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    let content = read_payload(
        args.content_file
            .as_deref(),
        "file content",
    )?;
    let out = tc
        .mutator()
        .write_whole(&args.file, &content)?;
    emit(ctx, &out, true);
    Ok(())
}

#[instrument(skip(ctx))]
fn add_callable(
    args: AddCallableArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    let body = read_payload(
        args.body_file
            .as_deref(),
        "callable body",
    )?;
    let request = CallableRequest {
        kind: match args.kind
        {
            CallableKindArg::Subroutine => CallableKind::Subroutine,
            CallableKindArg::Function => CallableKind::Function,
        },
        name: args.name,
        parent: args.parent,
        append_after: args.after,
        body,
    };
    let out = insert_callable(&tc.mutator(), &args.file, &request)?;
    emit(ctx, &out, true);
    Ok(())
}

fn tool(
    args: ToolArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let tc = tool_context(ctx)?;
    let payload = match args.args
    {
        Some(json) => json,
        None => read_payload(None, "tool arguments")?,
    };

    let registry = ToolRegistry::standard();
    let out = registry.try_invoke(&tc, &args.name, &payload)?;
    emit(ctx, &out, false);
    Ok(())
}

fn tools(
    args: ToolsArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let registry = ToolRegistry::standard();
    if args.names
    {
        let names: Vec<&str> = registry
            .names()
            .collect();
        emit(ctx, &names.join("\n"), false);
        return Ok(());
    }

    let defs = serde_json::to_string_pretty(&registry.definitions())
        .context("Failed to serialize tool definitions")?;
    emit(ctx, &defs, false);
    Ok(())
}
