//! Tool handlers and the standard registration list.

use crate::{
    core::{
        callable::{CallableRequest, insert_callable},
        edit::BlockReplace,
        extract::read_lines,
        search::{SearchOptions, search_codebase},
        sources::list_sources,
        symbols::{EntityKind, extract_symbol, summarise_file},
    },
    tools::{
        ToolContext, ToolError, ToolRegistry, TypedTool,
        inputs::{
            CreateCallableInput, EditLinesInput, FileInput, ListSourcesInput, NamedSymbolInput,
            ReadLinesInput, ReplaceLinesInput, SearchInput, SymbolInput, WriteFileInput,
        },
    },
};

/// Per-kind reader tools, in registration order.
const KIND_READERS: [(&str, EntityKind); 4] = [
    ("ReadFortranProgram", EntityKind::Program),
    ("ReadFortranModule", EntityKind::Module),
    ("ReadFortranSubroutine", EntityKind::Subroutine),
    ("ReadFortranFunction", EntityKind::Function),
];

pub fn register_all(registry: &mut ToolRegistry) {
    registry.register(TypedTool::new(
        "SummariseFortranFile",
        "Summarise a Fortran source file by listing its program, module, subroutine, \
         and function declarations in hierarchical order.",
        summarise,
    ));
    registry.register(TypedTool::new(
        "ReadFortranSymbol",
        "Return the exact source code of a named Fortran program, module, subroutine \
         or function, optionally restricted to one kind.",
        read_symbol,
    ));
    for (name, kind) in KIND_READERS {
        registry.register(TypedTool::new(
            name,
            format!("Return the exact source code for a specific Fortran {kind} identified by name."),
            move |ctx: &ToolContext, input: NamedSymbolInput| read_kind(ctx, input, kind),
        ));
    }
    registry.register(TypedTool::new(
        "SearchCodebase",
        "Search the Fortran project for occurrences of a string. Useful when hunting for \
         subroutines, variables, or constants.",
        search,
    ));
    registry.register(TypedTool::new(
        "ListFortranSources",
        "List the Fortran source files of the project with their line counts.",
        sources,
    ));
    registry.register(TypedTool::new(
        "ReadFileLines",
        "Read a file, or a range of its lines, with line numbers.",
        read_file_lines,
    ));
    registry.register(TypedTool::new(
        "EditFileLines",
        "Insert or delete individual lines by number. All line numbers refer to the file \
         before the edit; the batch is applied all-or-nothing and the original is backed \
         up on first edit.",
        edit_file_lines,
    ));
    registry.register(TypedTool::new(
        "ReplaceFileLines",
        "Replace an inclusive range of lines with new text, or insert before start_line \
         when end_line = start_line - 1. The original is backed up on first edit.",
        replace_file_lines,
    ));
    registry.register(TypedTool::new(
        "WriteFile",
        "Write a whole file, creating it if needed. Existing files are backed up first.",
        write_file,
    ));
    registry.register(TypedTool::new(
        "CreateFortranCallableInFile",
        "Insert a Fortran subroutine or function into an existing source file, optionally \
         inside a specific module/program and/or after another callable.",
        create_callable,
    ));
}

/// Reject blank required strings with the agent-facing hint.
fn require(value: &str, hint: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::Input(hint.to_string()));
    }
    Ok(())
}

fn require_file(file_path: &str) -> Result<(), ToolError> {
    require(file_path, "Provide 'file_path' pointing to the file to use.")
}

fn summarise(ctx: &ToolContext, input: FileInput) -> Result<String, ToolError> {
    require_file(&input.file_path)?;
    Ok(summarise_file(&ctx.root, &input.file_path)?)
}

fn read_symbol(ctx: &ToolContext, input: SymbolInput) -> Result<String, ToolError> {
    require_file(&input.file_path)?;
    require(&input.symbol_name, "Provide 'symbol_name' for the symbol to extract.")?;

    let kind = match input.symbol_kind.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(k) => Some(
            k.parse::<EntityKind>()
                .map_err(|e| ToolError::Input(e.to_string()))?,
        ),
    };

    Ok(extract_symbol(
        &ctx.root,
        &input.file_path,
        input.symbol_name.trim(),
        kind,
        ctx.config.snippet.symbol_width,
    )?)
}

fn read_kind(ctx: &ToolContext, input: NamedSymbolInput, kind: EntityKind) -> Result<String, ToolError> {
    require_file(&input.file_path)?;
    require(
        &input.symbol_name,
        &format!("Provide 'symbol_name' for the {kind} to extract."),
    )?;

    Ok(extract_symbol(
        &ctx.root,
        &input.file_path,
        input.symbol_name.trim(),
        Some(kind),
        ctx.config.snippet.symbol_width,
    )?)
}

fn search(ctx: &ToolContext, input: SearchInput) -> Result<String, ToolError> {
    let defaults = &ctx.config.search;
    let opts = SearchOptions {
        extensions: input.include_extensions.unwrap_or_else(|| defaults.extensions.clone()),
        ignore_patterns: ctx.config.ignore_patterns.clone(),
        max_matches: input.max_matches.unwrap_or(defaults.max_matches),
        context_lines: input.context_lines.unwrap_or(defaults.context_lines),
        width: ctx.config.snippet.width,
    };
    Ok(search_codebase(&ctx.root, &input.query, &opts)?)
}

fn sources(ctx: &ToolContext, input: ListSourcesInput) -> Result<String, ToolError> {
    Ok(list_sources(
        &ctx.root,
        &ctx.config.search.extensions,
        &ctx.config.ignore_patterns,
        input.max_files.unwrap_or(ctx.config.sources.max_files),
    )?)
}

fn read_file_lines(ctx: &ToolContext, input: ReadLinesInput) -> Result<String, ToolError> {
    require_file(&input.file_path)?;
    Ok(read_lines(
        &ctx.root,
        &input.file_path,
        input.start_line,
        input.end_line,
        ctx.config.snippet.width,
    )?)
}

fn edit_file_lines(ctx: &ToolContext, input: EditLinesInput) -> Result<String, ToolError> {
    require_file(&input.file_path)?;
    Ok(ctx.mutator().edit_lines(&input.file_path, &input.edits)?)
}

fn replace_file_lines(ctx: &ToolContext, input: ReplaceLinesInput) -> Result<String, ToolError> {
    require_file(&input.file_path)?;
    let block = BlockReplace {
        start_line: input.start_line,
        end_line: input.end_line,
        text: input.new_content,
    };
    Ok(ctx.mutator().replace_block(&input.file_path, &block)?)
}

fn write_file(ctx: &ToolContext, input: WriteFileInput) -> Result<String, ToolError> {
    require_file(&input.file_path)?;
    Ok(ctx.mutator().write_whole(&input.file_path, &input.content)?)
}

fn create_callable(ctx: &ToolContext, input: CreateCallableInput) -> Result<String, ToolError> {
    require_file(&input.file_path)?;
    require(&input.name, "Provide 'name' for the new callable.")?;

    let request = CallableRequest {
        kind: input.callable_type,
        name: input.name.trim().to_string(),
        parent: input.parent_module,
        append_after: input.append_after,
        body: input.callable_content,
    };
    Ok(insert_callable(&ctx.mutator(), &input.file_path, &request)?)
}
