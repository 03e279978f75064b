// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

use crate::Host;

/// verbosity level for operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

/// configuration for sdk-updater operations.
///
/// consumers can construct this directly without needing config file parsing.
#[derive(Debug, Clone)]
pub struct Config {
    /// root of the local sdk installation.
    pub sdk_root: PathBuf,

    /// catalog urls or paths, in priority order.
    pub sources: Vec<String>,

    /// consider obsolete remote packages as updates and suggestions.
    pub include_obsoletes: bool,

    /// fetch https catalogs over plain http.
    pub force_http: bool,

    /// also suggest new platforms, samples, add-ons, extras and docs.
    pub suggest_new: bool,

    /// verbosity level for output.
    pub verbosity: Verbosity,

    /// the machine archives are resolved for.
    pub host: Host,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sdk_root: default_sdk_root(),
            sources: Vec::new(),
            include_obsoletes: false,
            force_http: false,
            suggest_new: false,
            verbosity: Verbosity::default(),
            host: Host::current(),
        }
    }
}

impl Config {
    /// creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sdk_root(mut self, sdk_root: impl Into<PathBuf>) -> Self {
        self.sdk_root = sdk_root.into();
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_include_obsoletes(mut self, include_obsoletes: bool) -> Self {
        self.include_obsoletes = include_obsoletes;
        self
    }

    pub fn with_force_http(mut self, force_http: bool) -> Self {
        self.force_http = force_http;
        self
    }

    pub fn with_suggest_new(mut self, suggest_new: bool) -> Self {
        self.suggest_new = suggest_new;
        self
    }

    /// creates a config with the given verbosity level.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_host(mut self, host: Host) -> Self {
        self.host = host;
        self
    }
}

/// `ANDROID_SDK_ROOT`, then `ANDROID_HOME`, then `~/Android/Sdk`.
pub fn default_sdk_root() -> PathBuf {
    ["ANDROID_SDK_ROOT", "ANDROID_HOME"]
        .iter()
        .filter_map(std::env::var_os)
        .find(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join("Android").join("Sdk")))
        .unwrap_or_else(|| PathBuf::from("Android/Sdk"))
}
