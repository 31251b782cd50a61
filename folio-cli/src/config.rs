use anyhow::{Context, Result};
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use folio_core::BuildConfig;
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "./folio.toml";

/// CLI flags and the build config keys they override.
const CLI_OVERRIDES: [(&str, &str); 8] = [
    ("output", "output_dir"),
    ("static", "static_dir"),
    ("standalone", "standalone_dir"),
    ("projects", "projects_subdir"),
    ("templates", "templates_dir"),
    ("content", "content_file"),
    ("base-url", "base_url"),
    ("domain", "domain"),
];

/// Load configuration with cascading precedence:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (FOLIO_*)
/// 3. Configuration file
/// 4. Defaults (lowest priority)
pub fn load_build_config(args: &ArgMatches) -> Result<BuildConfig> {
    let config_file = args
        .try_get_one::<String>("config")
        .ok()
        .flatten()
        .cloned()
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    let mut builder = ConfigBuilder::builder();

    // 1. Start with defaults
    builder = builder.add_source(ConfigBuilder::try_from(&BuildConfig::default())?);

    // 2. Add configuration file if it exists
    if Path::new(&config_file).exists() {
        builder = builder.add_source(File::from(Path::new(&config_file)));
    }

    // 3. Add environment variables with FOLIO_ prefix
    builder = builder.add_source(
        Environment::with_prefix("FOLIO")
            .prefix_separator("_")
            .separator("__"),
    );

    // 4. Override with CLI arguments, only those actually passed
    let mut cli_overrides = HashMap::new();
    for (flag, key) in CLI_OVERRIDES {
        if let Some(value) = args.try_get_one::<String>(flag).ok().flatten() {
            cli_overrides.insert(key.to_string(), value.clone());
        }
    }
    if !cli_overrides.is_empty() {
        builder = builder.add_source(ConfigBuilder::try_from(&cli_overrides)?);
    }

    let config = builder
        .build()
        .with_context(|| format!("failed to load configuration from {config_file}"))?;
    let build_config: BuildConfig = config.try_deserialize()?;

    Ok(build_config)
}

/// Render the effective configuration as TOML-ish `key = value` lines.
pub fn describe(config: &BuildConfig) -> Vec<String> {
    vec![
        format!("output_dir = {}", config.output_dir.display()),
        format!("static_dir = {}", config.static_dir.display()),
        format!("standalone_dir = {}", config.standalone_dir.display()),
        format!("projects_subdir = {}", config.projects_subdir.display()),
        format!("templates_dir = {}", config.templates_dir.display()),
        format!("content_file = {}", config.content_file.display()),
        format!("base_url = {}", config.base_url),
        format!("domain = {}", config.domain.as_deref().unwrap_or("<from base_url>")),
    ]
}
