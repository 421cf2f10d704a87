use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "layered configuration resolver",
    propagate_version = true
)]
pub struct Cli {
    /// Engine settings file (YAML or TOML); defaults to the user config dir.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load configuration and print the merged property sources.
    Resolve(ResolveArgs),
    /// Load configuration and print one property.
    Get(GetArgs),
    /// Print the locations and names that would be probed.
    Locations(LoadArgs),
    Settings(SettingsArgs),
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Replaces the search locations (`config.location`).
    #[arg(long)]
    pub location: Option<String>,
    /// Adds search locations (`config.additional-location`).
    #[arg(long)]
    pub additional_location: Option<String>,
    /// File stems to search for (`config.name`).
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "profile")]
    pub profiles: Vec<String>,
    #[arg(long = "include")]
    pub includes: Vec<String>,
    /// Directory searched for `classpath:` locations; repeatable.
    #[arg(long = "classpath")]
    pub classpath: Vec<PathBuf>,
    #[arg(long = "set", value_parser = parse_kv_pair)]
    pub values: Vec<(String, String)>,
    /// Directory `file:` locations are relative to.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,
    /// Do not expose process environment variables as properties.
    #[arg(long)]
    pub no_system_env: bool,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub load: LoadArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub key: String,
    #[command(flatten)]
    pub load: LoadArgs,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Show,
    Path,
}

fn parse_kv_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| "expected KEY=VALUE format".to_string())?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        return Err("key cannot be empty".into());
    }
    Ok((key.to_string(), value.to_string()))
}
