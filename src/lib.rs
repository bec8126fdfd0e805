//! **fortkit** - structural reader and safe in-place editor for Fortran source trees
//!
//! Builds a shallow program/module/subroutine/function containment tree from
//! source text, and edits files through validated, atomic, backed-up
//! rewrites. Every operation is exposed both as a named agent tool with a
//! JSON-schema'd input and as an `fkit` subcommand.

/// Command-line interface with clap integration
pub mod cli;

/// CLI command handlers
pub mod cli_ext {
    pub mod commands;
}

/// Shell completion generation
pub mod completion;

/// Core operations - lookup, extraction, editing, insertion and search
pub mod core {
    /// Entity model, name lookup, file outlines and symbol extraction
    pub mod symbols;
    pub use symbols::{Entity, EntityKind, extract_symbol, summarise_file};

    /// One-time sibling backups
    pub mod backup;

    /// Line-directive and block-replace edits with atomic rewrite
    pub mod edit;
    pub use edit::{BlockReplace, FileMutator, LineDirective, LineOp};

    /// Subroutine/function insertion with `contains` synthesis
    pub mod callable;
    pub use callable::{CallableKind, CallableRequest, insert_callable};

    /// Line-range reads
    pub mod extract;

    /// Substring search with context snippets
    pub mod search;

    /// Fortran source listing
    pub mod sources;
}

/// Language processing - comment stripping and the entity tree builder
pub mod parsers {
    /// Quote-aware `!` comment stripping
    pub mod sanitize;

    /// Stack-based program/module/subroutine/function tree builder
    pub mod fortran_parser;
    pub use fortran_parser::{FortranParser, SourceTree};
}

/// Infrastructure - paths, I/O, configuration, walking and logging
pub mod infra {
    /// Layered configuration (fkit.toml + FKIT_* environment)
    pub mod config;
    pub use config::{Config, load_config};

    /// Lossy reads, line buffers and atomic writes
    pub mod io;

    /// Bound-root path resolution
    pub mod paths;
    pub use paths::BoundRoot;

    /// Fixed-width numbered snippets
    pub mod snippet;

    /// Gitignore-aware source walking
    pub mod walk;
    pub use walk::FileWalker;

    /// Tracing subscriber setup
    pub mod logging;
}

/// Agent-facing tool registry
pub mod tools;

// Strategic re-exports for embedding callers
pub use cli::{AppContext, Cli, Commands};
pub use infra::{BoundRoot, Config, load_config};
pub use parsers::FortranParser;
pub use tools::{ToolContext, ToolRegistry};
