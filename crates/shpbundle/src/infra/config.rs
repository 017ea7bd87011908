//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::io::{InputFormat, OutputFormat};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".shpbundle/config.toml";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub logging: Logging,
}

/// Per-layer settings. Unset fields fall through to the layer below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub input_format: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub pretty: Option<bool>,
}

impl Defaults {
    fn default_pretty() -> bool {
        true
    }

    /// Configured input format, falling back to JSON when unset or unknown.
    pub fn input_format(&self) -> InputFormat {
        match self.input_format.as_deref().map(str::parse::<InputFormat>) {
            Some(Ok(format)) => format,
            Some(Err(err)) => {
                tracing::warn!(%err, "falling back to json input");
                InputFormat::Json
            }
            None => InputFormat::Json,
        }
    }

    /// Configured output format, falling back to JSON when unset or unknown.
    pub fn output_format(&self) -> OutputFormat {
        match self.output_format.as_deref().map(str::parse::<OutputFormat>) {
            Some(Ok(format)) => format,
            Some(Err(err)) => {
                tracing::warn!(%err, "falling back to json output");
                OutputFormat::Json
            }
            None => OutputFormat::Json,
        }
    }

    pub fn pretty(&self) -> bool {
        self.pretty.unwrap_or_else(Self::default_pretty)
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            input_format: Some(InputFormat::Json.as_str().to_owned()),
            output_format: Some(OutputFormat::Json.as_str().to_owned()),
            pretty: Some(Self::default_pretty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logging {
    /// `tracing` filter directive used when `SHPBUNDLE_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
}

impl Logging {
    pub fn filter(&self) -> &str {
        self.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            filter: Some(DEFAULT_LOG_FILTER.to_owned()),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    input_format: Option<String>,
    output_format: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            input_format: env::var("SHPBUNDLE_INPUT_FORMAT").ok(),
            output_format: env::var("SHPBUNDLE_OUTPUT_FORMAT").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(input_format: &str, output_format: &str) -> Self {
        Self {
            input_format: Some(input_format.to_owned()),
            output_format: Some(output_format.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).context("failed to parse TOML config")?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            logging: merge_logging(self.logging, other.logging),
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        input_format: overlay.input_format.or(base.input_format),
        output_format: overlay.output_format.or(base.output_format),
        pretty: overlay.pretty.or(base.pretty),
    }
}

fn merge_logging(base: Logging, overlay: Logging) -> Logging {
    Logging {
        filter: overlay.filter.or(base.filter),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("shpbundle/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(input_format) = env.input_format {
        config.defaults.input_format = Some(input_format);
    }
    if let Some(output_format) = env.output_format {
        config.defaults.output_format = Some(output_format);
    }
    config
}
