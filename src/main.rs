mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Map, Value, json};

use layercfg::environment::{ACTIVE_PROFILES_PROPERTY, INCLUDE_PROFILES_PROPERTY};
use layercfg::property_source::SourceKind;
use layercfg::search::{
    CONFIG_ADDITIONAL_LOCATION_PROPERTY, CONFIG_LOCATION_PROPERTY, CONFIG_NAME_PROPERTY,
};
use layercfg::{
    EngineSettings, Environment, LoadReport, LogSink, PropertySource, PropertyValue,
    reorder_sources,
};

use crate::cli::{Commands, LoadArgs, OutputFormat, SettingsCommand};

const COMMAND_LINE_SOURCE: &str = "commandLineArgs";

fn main() -> Result<()> {
    env_logger::init();

    let cli = cli::Cli::parse();
    let settings_path = cli.settings.clone().or_else(EngineSettings::default_path);
    let settings = match &settings_path {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("failed to load settings from {:?}", path))?,
        None => EngineSettings::default(),
    };

    match cli.command {
        Commands::Resolve(args) => {
            let (env, report) = load(&settings, settings_path.as_deref(), &args.load)?;
            print_resolved(&env, &report, &args.format)?;
        }
        Commands::Get(args) => {
            let (env, _) = load(&settings, settings_path.as_deref(), &args.load)?;
            match env
                .get_property(&args.key)
                .with_context(|| format!("failed to resolve '{}'", args.key))?
            {
                Some(value) => println!("{value}"),
                None => bail!("property '{}' is not defined", args.key),
            }
        }
        Commands::Locations(args) => {
            let env = build_environment(&settings, settings_path.as_deref(), &args)?;
            let (locations, names) = settings
                .loader()
                .search_path(&env)
                .context("failed to resolve search locations")?;
            println!("locations (highest precedence first):");
            for location in locations {
                println!("  {location}");
            }
            println!("names: {}", names.join(", "));
        }
        Commands::Settings(args) => match args.command {
            SettingsCommand::Show => {
                println!(
                    "{}",
                    serde_yaml::to_string(&settings)
                        .context("failed to serialize settings for display")?
                );
            }
            SettingsCommand::Path => match &settings_path {
                Some(path) => println!("settings: {:?}", path),
                None => println!("settings: (no platform config directory)"),
            },
        },
    }

    Ok(())
}

fn load(
    settings: &EngineSettings,
    settings_path: Option<&Path>,
    args: &LoadArgs,
) -> Result<(Environment, LoadReport)> {
    let mut env = build_environment(settings, settings_path, args)?;
    let base_dir = match &args.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let resources = if args.classpath.is_empty() {
        settings.resource_loader(&base_dir)
    } else {
        EngineSettings {
            classpath: args.classpath.clone(),
            ..settings.clone()
        }
        .resource_loader(&base_dir)
    };
    let report = settings
        .loader()
        .process(&mut env, &resources, &LogSink)
        .context("failed to load configuration")?;
    reorder_sources(&mut env);
    log::debug!(
        "processed profiles: {}",
        report
            .processed_profiles
            .iter()
            .map(|profile| profile.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok((env, report))
}

fn build_environment(
    settings: &EngineSettings,
    settings_path: Option<&Path>,
    args: &LoadArgs,
) -> Result<Environment> {
    let mut command_line = PropertySource::new(COMMAND_LINE_SOURCE);
    for (key, value) in &args.values {
        command_line.insert(key.clone(), PropertyValue::new(value.clone()));
    }
    let overrides = [
        (CONFIG_LOCATION_PROPERTY, args.location.clone()),
        (
            CONFIG_ADDITIONAL_LOCATION_PROPERTY,
            args.additional_location.clone(),
        ),
        (CONFIG_NAME_PROPERTY, args.name.clone()),
        (ACTIVE_PROFILES_PROPERTY, joined(&args.profiles)),
        (INCLUDE_PROFILES_PROPERTY, joined(&args.includes)),
    ];
    for (key, value) in overrides {
        if let Some(value) = value {
            command_line.insert(key, PropertyValue::new(value));
        }
    }

    let mut env = Environment::new();
    env.property_sources_mut().add_last(Arc::new(command_line));
    if !args.no_system_env {
        env.property_sources_mut()
            .add_last(Arc::new(PropertySource::system_environment()));
    }
    let origin = settings_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "settings".to_string());
    settings
        .apply_to(&mut env, &origin)
        .context("failed to apply settings")?;
    Ok(env)
}

fn joined(values: &[String]) -> Option<String> {
    (!values.is_empty()).then(|| values.join(","))
}

fn print_resolved(env: &Environment, report: &LoadReport, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("active profiles: {}", report.active_profiles.join(", "));
            for source in env.property_sources().iter() {
                println!();
                println!("[{}]", source.name());
                if source.kind() == SourceKind::SystemEnvironment {
                    println!("  ({} variables)", source.len());
                    continue;
                }
                for (key, value) in source.entries() {
                    match &value.origin {
                        Some(origin) => println!("  {key} = {}    # {origin}", value.value),
                        None => println!("  {key} = {}", value.value),
                    }
                }
            }
        }
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&resolved_value(env, report))
                .context("failed to serialize configuration to JSON")?;
            println!("{rendered}");
        }
        OutputFormat::Yaml => {
            let rendered = serde_yaml::to_string(&resolved_value(env, report))
                .context("failed to serialize configuration to YAML")?;
            println!("{rendered}");
        }
    }
    Ok(())
}

fn resolved_value(env: &Environment, report: &LoadReport) -> Value {
    let sources: Vec<Value> = env
        .property_sources()
        .iter()
        .filter(|source| source.kind() != SourceKind::SystemEnvironment)
        .map(|source| {
            let properties: Map<String, Value> = source
                .entries()
                .map(|(key, value)| (key.to_string(), Value::String(value.value.clone())))
                .collect();
            json!({ "name": source.name(), "properties": properties })
        })
        .collect();
    json!({
        "activeProfiles": report.active_profiles,
        "locations": report.locations,
        "propertySources": sources,
    })
}
