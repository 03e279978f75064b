// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fs;
use std::path::PathBuf;

use libsdk_updater::{Config, Error, Result, Verbosity};
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "sdk-updater.toml";

fn config_dir() -> Option<PathBuf> {
    dirs::config_dir()
}

fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TomlConfig {
    sdk_root: Option<PathBuf>,
    sources: Vec<String>,
    include_obsoletes: bool,
    force_http: bool,
    suggest_new: bool,
    verbosity: Option<String>,
}

/// cli configuration wrapper that combines toml file parsing with the library's config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub inner: Config,
}

impl std::ops::Deref for CliConfig {
    type Target = Config;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl CliConfig {
    pub fn load() -> Result<Self> {
        let Some(path) = config_path() else {
            return Ok(Self::from_toml(TomlConfig::default()));
        };

        if !path.exists() {
            return Ok(Self::from_toml(TomlConfig::default()));
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        Self::parse(&content).map_err(|e| {
            Error::config(format!(
                "failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    fn from_toml(toml_config: TomlConfig) -> Self {
        let verbosity = match toml_config.verbosity.as_deref() {
            Some("quiet") => Verbosity::Quiet,
            Some("verbose") => Verbosity::Verbose,
            _ => Verbosity::Normal,
        };

        let mut inner = Config::new()
            .with_sources(toml_config.sources)
            .with_include_obsoletes(toml_config.include_obsoletes)
            .with_force_http(toml_config.force_http)
            .with_suggest_new(toml_config.suggest_new)
            .with_verbosity(verbosity);
        if let Some(root) = toml_config.sdk_root {
            inner = inner.with_sdk_root(root);
        }

        Self { inner }
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map(Self::from_toml)
            .map_err(|e| Error::config(e.to_string()))
    }

    pub fn edit_config() -> Result<()> {
        let Some(path) = config_path() else {
            return Err(Error::config("could not determine config directory"));
        };

        if !path.exists() {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).map_err(|e| {
                    Error::config(format!(
                        "failed to create config directory {}: {e}",
                        dir.display()
                    ))
                })?;
            }

            let default_content = r#"# sdk-updater configuration
# sdk_root = "/home/user/Android/Sdk"  # defaults to $ANDROID_SDK_ROOT or $ANDROID_HOME
# sources = ["https://dl.example.com/android/repository.json"]
# include_obsoletes = false
# force_http = false
# suggest_new = false
# verbosity = "normal"  # quiet, normal, verbose
"#;
            fs::write(&path, default_content).map_err(|e| {
                Error::config(format!(
                    "failed to create config file {}: {e}",
                    path.display()
                ))
            })?;
        }

        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
        std::process::Command::new(&editor)
            .arg(&path)
            .status()
            .map_err(|e| Error::other(format!("failed to open editor {editor}: {e}")))?;

        Ok(())
    }
}
