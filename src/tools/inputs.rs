//! Argument types of the registered tools.
//!
//! Field names are the JSON keys the agent sends; doc comments become the
//! schema descriptions.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::{callable::CallableKind, edit::LineDirective};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FileInput {
    /// Path to the Fortran source file, relative to the project root.
    pub file_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SymbolInput {
    /// Path to the Fortran source file, relative to the project root.
    pub file_path: String,
    /// Name of the program, module, subroutine or function (case-insensitive).
    pub symbol_name: String,
    /// Optional kind filter: program, module, subroutine or function.
    #[serde(default)]
    pub symbol_kind: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NamedSymbolInput {
    /// Path to the Fortran source file, relative to the project root.
    pub file_path: String,
    /// Name of the target entity (case-insensitive).
    pub symbol_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchInput {
    /// Substring to search for (case-insensitive).
    pub query: String,
    /// File extensions to scan, e.g. [".f90", ".f"]. Defaults to Fortran sources.
    #[serde(default)]
    pub include_extensions: Option<Vec<String>>,
    /// Maximum number of snippets to return.
    #[serde(default)]
    pub max_matches: Option<usize>,
    /// Lines of context before and after each match.
    #[serde(default)]
    pub context_lines: Option<usize>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListSourcesInput {
    /// Maximum number of files to list.
    #[serde(default)]
    pub max_files: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReadLinesInput {
    /// Path to the file, relative to the project root.
    pub file_path: String,
    /// First line to show (1-based, default 1).
    #[serde(default)]
    pub start_line: Option<usize>,
    /// Last line to show (inclusive, default end of file).
    #[serde(default)]
    pub end_line: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EditLinesInput {
    /// Path to the file to edit, relative to the project root.
    pub file_path: String,
    /// Insert/delete directives. Line numbers refer to the file as it is
    /// before this call; a delete with non-empty content must match the
    /// current line exactly.
    pub edits: Vec<LineDirective>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReplaceLinesInput {
    /// Path to the file to edit, relative to the project root.
    pub file_path: String,
    /// First line to replace (1-based).
    pub start_line: usize,
    /// Last line to replace (inclusive). Use start_line - 1 to insert
    /// before start_line without deleting anything.
    pub end_line: usize,
    /// Replacement text; may span several lines or be empty.
    #[serde(default)]
    pub new_content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WriteFileInput {
    /// Path to the file to write, relative to the project root.
    pub file_path: String,
    /// Complete new file content.
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCallableInput {
    /// Path to the Fortran source file to update.
    pub file_path: String,
    /// Type of callable to insert.
    pub callable_type: CallableKind,
    /// Name of the new subroutine or function.
    pub name: String,
    /// Module/program that should contain the new callable.
    #[serde(default)]
    pub parent_module: Option<String>,
    /// Existing callable name to insert after.
    #[serde(default)]
    pub append_after: Option<String>,
    /// Full Fortran source text for the new callable.
    pub callable_content: String,
}
