//! Filepath: src/core/symbols.rs
//! Entity model for parsed Fortran sources plus the read-only
//! operations built on it: name lookup, file outlines and
//! symbol extraction. Trees are rebuilt from text on every
//! call and never cached.
use std::{fmt, str::FromStr};

use serde::Serialize;
use tracing::debug;

use crate::{
    infra::{
        io::{FileError, read_source},
        paths::BoundRoot,
        snippet::format_numbered_snippet,
    },
    parsers::fortran_parser::FortranParser,
};

/// Structural block kinds recognized by the parser
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind
{
    /// Synthetic file root (never matched by lookup)
    Root,

    /// Main program unit
    Program,

    /// Module unit
    Module,

    /// Subroutine
    Subroutine,

    /// Function
    Function,
}

impl EntityKind
{
    /// Declaration keyword for the kind (lowercase)
    pub fn keyword(self) -> &'static str
    {
        match self
        {
            EntityKind::Root => "__root__",
            EntityKind::Program => "program",
            EntityKind::Module => "module",
            EntityKind::Subroutine => "subroutine",
            EntityKind::Function => "function",
        }
    }

    /// Capitalized label used in reports
    pub fn title(self) -> &'static str
    {
        match self
        {
            EntityKind::Root => "Root",
            EntityKind::Program => "Program",
            EntityKind::Module => "Module",
            EntityKind::Subroutine => "Subroutine",
            EntityKind::Function => "Function",
        }
    }

    /// Modules and programs may own a `contains` section
    pub fn is_scope(self) -> bool
    {
        matches!(self, EntityKind::Module | EntityKind::Program)
    }

    /// Subroutines and functions
    pub fn is_callable(self) -> bool
    {
        matches!(self, EntityKind::Subroutine | EntityKind::Function)
    }
}

impl fmt::Display for EntityKind
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(self.keyword())
    }
}

/// Unknown kind label
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown symbol kind '{0}'; expected program, module, subroutine or function.")]
pub struct UnknownKind(pub String);

impl FromStr for EntityKind
{
    type Err = UnknownKind;

    /// Case-insensitive; the root marker is not parseable
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "program" => Ok(EntityKind::Program),
            "module" => Ok(EntityKind::Module),
            "subroutine" => Ok(EntityKind::Subroutine),
            "function" => Ok(EntityKind::Function),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// One named structural block and its nested children
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Entity
{
    pub kind: EntityKind,

    /// Declared name as spelled in the source
    pub name: String,

    /// 1-based first line (0 for the root)
    pub start_line: usize,

    /// 0-based index of the first line
    pub start_index: usize,

    /// 1-based last line, once the terminator is known
    pub end_line: Option<usize>,

    /// 0-based index of the last line
    pub end_index: Option<usize>,

    /// Nested entities in file order
    pub children: Vec<Entity>,
}

impl Entity
{
    /// Synthetic root that owns every top-level unit
    pub fn root() -> Self
    {
        Self {
            kind: EntityKind::Root,
            name: EntityKind::Root
                .keyword()
                .to_string(),
            start_line: 0,
            start_index: 0,
            end_line: None,
            end_index: None,
            children: Vec::new(),
        }
    }

    /// Open a new entity at a 0-based line index
    pub fn open(
        kind: EntityKind,
        name: &str,
        index: usize,
    ) -> Self
    {
        Self {
            kind,
            name: name.to_string(),
            start_line: index + 1,
            start_index: index,
            end_line: None,
            end_index: None,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool
    {
        self.kind == EntityKind::Root
    }

    /// Case-insensitive name comparison
    pub fn is_named(
        &self,
        name: &str,
    ) -> bool
    {
        self.name
            .eq_ignore_ascii_case(name.trim())
    }

    /// Last line index, falling back to the start when unterminated
    pub fn last_index(&self) -> usize
    {
        self.end_index
            .unwrap_or(self.start_index)
    }

    /// Depth-first pre-order search below `self`.
    ///
    /// `self` is never a candidate; outer entities and earlier
    /// siblings win over deeper or later ones.
    pub fn find(
        &self,
        name: &str,
        kind: Option<EntityKind>,
    ) -> Option<&Entity>
    {
        for child in &self.children
        {
            let kind_ok = kind.is_none_or(|k| child.kind == k);
            if kind_ok && child.is_named(name)
            {
                return Some(child);
            }

            if let Some(found) = child.find(name, kind)
            {
                return Some(found);
            }
        }

        None
    }

    /// First direct child with the given name and one of `kinds`
    /// (any kind when `kinds` is empty)
    pub fn direct_child(
        &self,
        name: &str,
        kinds: &[EntityKind],
    ) -> Option<&Entity>
    {
        self.children
            .iter()
            .find(|c| c.is_named(name) && (kinds.is_empty() || kinds.contains(&c.kind)))
    }

    /// Indented `<Kind> <name> (line N)` outline of the descendants
    pub fn outline(&self) -> Vec<String>
    {
        let mut out = Vec::new();
        self.outline_into(0, &mut out);
        out
    }

    fn outline_into(
        &self,
        depth: usize,
        out: &mut Vec<String>,
    )
    {
        for child in &self.children
        {
            out.push(format!(
                "{}{} {} (line {})",
                "  ".repeat(depth),
                child
                    .kind
                    .title(),
                child.name,
                child.start_line
            ));
            child.outline_into(depth + 1, out);
        }
    }

    /// Human label such as `module physics` or `file root`
    pub fn describe(&self) -> String
    {
        if self.is_root()
        {
            "file root".to_string()
        }
        else
        {
            format!("{} {}", self.kind, self.name)
        }
    }
}

/// Failures of the read-only symbol operations
#[derive(Debug, thiserror::Error)]
pub enum SymbolError
{
    #[error(transparent)]
    File(#[from] FileError),

    #[error("Could not find {target} in {rel}.")]
    NotFound
    {
        target: String,
        rel: String,
    },
}

/// Render the structure of a file as an indented outline
pub fn summarise_file(
    root: &BoundRoot,
    file_path: &str,
) -> Result<String, SymbolError>
{
    let resolved = root
        .existing_file(file_path)
        .map_err(FileError::from)?;
    let text = read_source(&resolved.path).map_err(|source| FileError::Read {
        rel: resolved
            .rel
            .clone(),
        source,
    })?;

    let tree = FortranParser::parse(&text);
    let outline = tree
        .root
        .outline();
    debug!(file = %resolved.rel, entities = outline.len(), "summarised file");

    if outline.is_empty()
    {
        return Ok(format!(
            "No program/module/subroutine/function declarations found in {}.",
            resolved.rel
        ));
    }

    Ok(format!("# Structure of {}\n{}", resolved.rel, outline.join("\n")))
}

/// Return the numbered source lines of one named entity
pub fn extract_symbol(
    root: &BoundRoot,
    file_path: &str,
    name: &str,
    kind: Option<EntityKind>,
    width: usize,
) -> Result<String, SymbolError>
{
    let resolved = root
        .existing_file(file_path)
        .map_err(FileError::from)?;
    let text = read_source(&resolved.path).map_err(|source| FileError::Read {
        rel: resolved
            .rel
            .clone(),
        source,
    })?;

    let tree = FortranParser::parse(&text);
    let Some(entity) = tree
        .root
        .find(name, kind)
    else
    {
        let target = match kind
        {
            Some(k) => format!("{k} '{name}'"),
            None => format!("symbol '{name}'"),
        };
        return Err(SymbolError::NotFound { target, rel: resolved.rel });
    };

    let end = entity
        .last_index()
        .min(
            tree.lines
                .len()
                .saturating_sub(1),
        );
    let body = tree
        .lines
        .get(entity.start_index..=end)
        .unwrap_or_default();
    let snippet = format_numbered_snippet(body, entity.start_index + 1, width);

    Ok(format!(
        "# {} {} from {} (lines {}-{})\n{}",
        entity
            .kind
            .title(),
        entity.name,
        resolved.rel,
        entity.start_line,
        entity
            .end_line
            .unwrap_or(entity.start_line),
        snippet
    ))
}
