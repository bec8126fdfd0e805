use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    cli::{AppContext, InitArgs},
    core::backup::DEFAULT_BACKUP_SUFFIX,
    infra::{snippet::DEFAULT_WIDTH, walk::FORTRAN_EXTENSIONS},
};

/// Config file names looked up in the bound root, first match wins
pub const CONFIG_FILES: [&str; 4] = ["fkit.toml", "fkit.yaml", "fkit.json", ".fkit.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Extra ignore globs (in addition to .gitignore)
    pub ignore_patterns: Vec<String>,

    /// Suffix of the one-time backup written next to an edited file
    pub backup_suffix: String,

    /// Line-number prefixes
    pub snippet: SnippetConfig,

    /// Codebase search defaults
    pub search: SearchConfig,

    /// Source listing defaults
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig
{
    /// Width for plain line reads and search context
    pub width: usize,

    /// Width for extracted symbols
    pub symbol_width: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig
{
    pub extensions: Vec<String>,
    pub max_matches: usize,
    pub context_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig
{
    pub max_files: usize,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            ignore_patterns: vec![
                ".git/**".to_string(),
                "build/**".to_string(),
                "target/**".to_string(),
                "*.o".to_string(),
                "*.mod".to_string(),
            ],
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            snippet: SnippetConfig::default(),
            search: SearchConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl Default for SnippetConfig
{
    fn default() -> Self
    {
        Self { width: DEFAULT_WIDTH, symbol_width: 6 }
    }
}

impl Default for SearchConfig
{
    fn default() -> Self
    {
        Self {
            extensions: FORTRAN_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_matches: 10,
            context_lines: 3,
        }
    }
}

impl Default for SourcesConfig
{
    fn default() -> Self
    {
        Self { max_files: 30 }
    }
}

/// Load the first config file found in `root`, then `FKIT_*` overrides.
///
/// `FKIT_BACKUP_SUFFIX=.bak` or `FKIT_SEARCH__MAX_MATCHES=25`; list values
/// are comma-separated.
pub fn load_config(root: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    if let Some(path) = CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.is_file())
    {
        debug!(path = %path.display(), "loading config file");
        builder = builder.add_source(config::File::from(path));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FKIT")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("ignore_patterns")
            .with_list_parse_key("search.extensions"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

/// Write the default configuration as `fkit.toml`.
pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<PathBuf>
{
    let dir = args
        .path
        .unwrap_or_else(|| {
            ctx.root
                .clone()
        });
    let config_path = dir.join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        println!("{toml_string}");
        return Ok(config_path);
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(config_path)
}
