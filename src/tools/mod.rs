//! Named tools with typed, schema-described inputs.
//!
//! Each tool deserializes its JSON arguments into a concrete input struct
//! (unknown fields rejected) and returns plain text. [`ToolRegistry::invoke`]
//! never fails: errors come back as their display text, which is what the
//! calling agent reads.

pub mod handlers;
pub mod inputs;

use std::marker::PhantomData;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
    core::{
        callable::InsertError,
        edit::{FileMutator, MutateError},
        extract::ReadError,
        search::SearchError,
        symbols::SymbolError,
    },
    infra::{config::Config, paths::BoundRoot, walk::WalkError},
};

/// Everything a tool call may touch: the bound root, settings, dry-run flag.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub root: BoundRoot,
    pub config: Config,
    pub dry_run: bool,
}

impl ToolContext {
    pub fn new(root: BoundRoot, config: Config) -> Self {
        Self {
            root,
            config,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Mutator bound to this context's root, backup suffix and dry-run mode.
    pub fn mutator(&self) -> FileMutator<'_> {
        FileMutator::new(&self.root, &self.config.backup_suffix).with_dry_run(self.dry_run)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool '{name}'. Available tools: {available}.")]
    UnknownTool { name: String, available: String },

    #[error("Invalid arguments for {tool}: {source}")]
    Arguments {
        tool: String,
        source: serde_json::Error,
    },

    /// Missing or blank required field
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Mutate(#[from] MutateError),

    #[error(transparent)]
    Insert(#[from] InsertError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Walk(#[from] WalkError),
}

/// Object-safe view of a tool, as stored in the registry.
pub trait Tool {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError>;

    /// Function-tool advertisement for the agent runtime.
    fn definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }
}

/// A tool whose input type `I` drives both parsing and the schema.
pub struct TypedTool<I, F> {
    name: &'static str,
    description: String,
    handler: F,
    input: PhantomData<fn() -> I>,
}

impl<I, F> TypedTool<I, F>
where
    I: DeserializeOwned + JsonSchema,
    F: Fn(&ToolContext, I) -> Result<String, ToolError>,
{
    pub fn new(name: &'static str, description: impl Into<String>, handler: F) -> Self {
        Self {
            name,
            description: description.into(),
            handler,
            input: PhantomData,
        }
    }
}

impl<I, F> Tool for TypedTool<I, F>
where
    I: DeserializeOwned + JsonSchema,
    F: Fn(&ToolContext, I) -> Result<String, ToolError>,
{
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        let mut schema = schemars::schema_for!(I).to_value();
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
        }
        schema
    }

    fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let input: I = serde_json::from_value(args).map_err(|source| ToolError::Arguments {
            tool: self.name.to_string(),
            source,
        })?;
        (self.handler)(ctx, input)
    }
}

/// Tools in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tool this crate provides.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        handlers::register_all(&mut registry);
        registry
    }

    /// Add a tool; a later registration under the same name replaces it.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function-tool JSON for every registered tool.
    pub fn definitions(&self) -> Vec<Value> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Dispatch with the error kept typed (the CLI maps it to an exit code).
    pub fn try_invoke(&self, ctx: &ToolContext, name: &str, args: &str) -> Result<String, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
            available: self.names().collect::<Vec<_>>().join(", "),
        })?;

        // Absent arguments are an empty object.
        let value = if args.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(args).map_err(|source| ToolError::Arguments {
                tool: name.to_string(),
                source,
            })?
        };

        debug!(tool = name, "invoking tool");
        tool.call(ctx, value)
    }

    /// Dispatch and flatten the outcome to text.
    pub fn invoke(&self, ctx: &ToolContext, name: &str, args: &str) -> String {
        match self.try_invoke(ctx, name, args) {
            Ok(text) => text,
            Err(err) => {
                warn!(tool = name, error = %err, "tool call failed");
                err.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn context() -> (TempDir, ToolContext) {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("m.f90"),
            "module m\ncontains\n  subroutine s()\n  end subroutine s\nend module m\n",
        )
        .unwrap();
        let root = BoundRoot::new(tmp.path()).unwrap();
        (tmp, ToolContext::new(root, Config::default()))
    }

    #[test]
    fn standard_registry_order_and_definitions() {
        let registry = ToolRegistry::standard();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "SummariseFortranFile",
                "ReadFortranSymbol",
                "ReadFortranProgram",
                "ReadFortranModule",
                "ReadFortranSubroutine",
                "ReadFortranFunction",
                "SearchCodebase",
                "ListFortranSources",
                "ReadFileLines",
                "EditFileLines",
                "ReplaceFileLines",
                "WriteFile",
                "CreateFortranCallableInFile",
            ]
        );

        let defs = registry.definitions();
        assert_eq!(defs.len(), registry.len());
        let summary = &defs[0];
        assert_eq!(summary["type"], "function");
        assert_eq!(summary["function"]["name"], "SummariseFortranFile");
        let params = &summary["function"]["parameters"];
        assert_eq!(params["type"], "object");
        assert!(params["properties"]["file_path"].is_object());
        assert_eq!(params["required"], json!(["file_path"]));
    }

    #[test]
    fn invoke_returns_text_for_success_and_failure() {
        let (_tmp, ctx) = context();
        let registry = ToolRegistry::standard();

        let ok = registry.invoke(&ctx, "SummariseFortranFile", r#"{"file_path":"m.f90"}"#);
        assert_eq!(ok, "# Structure of m.f90\nModule m (line 1)\n  Subroutine s (line 3)");

        let unknown = registry.invoke(&ctx, "Nope", "{}");
        assert!(unknown.starts_with("Unknown tool 'Nope'. Available tools: SummariseFortranFile"));

        let extra = registry.invoke(&ctx, "SummariseFortranFile", r#"{"file_path":"m.f90","x":1}"#);
        assert!(extra.starts_with("Invalid arguments for SummariseFortranFile"));

        let missing = registry.invoke(&ctx, "SummariseFortranFile", "");
        assert!(missing.contains("missing field `file_path`"));

        let garbage = registry.invoke(&ctx, "SummariseFortranFile", "{not json");
        assert!(garbage.starts_with("Invalid arguments for SummariseFortranFile"));
    }

    #[test]
    fn dry_run_context_reaches_mutator() {
        let (tmp, ctx) = context();
        let ctx = ctx.with_dry_run(true);
        let registry = ToolRegistry::standard();
        let out = registry.invoke(
            &ctx,
            "WriteFile",
            r#"{"file_path":"m.f90","content":"program p\nend\n"}"#,
        );
        assert!(out.starts_with("Dry run"));
        assert!(!tmp.path().join("m.f90.orig").exists());
    }
}
