//! The configuration file.
//!
//! ```toml
//! selection = "auto"
//!
//! [defaults]
//! provider = "OpenAI"
//! model = "gpt-4o"
//!
//! [[providers]]
//! name = "Ollama"
//!
//! [[providers]]
//! name = "OpenRouter"
//! enabled = false
//!
//! [delegate]
//! command = ["/usr/local/bin/route-chat", "--json"]
//! timeout_ms = 2000
//! ```
//!
//! Providers are listed in priority order. Keys which are not recognized
//! produce a warning and are otherwise ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use toml;

use crate::dispatch::ModelSelection;
use crate::providers::{ActiveProviders, ProviderInfo};
use crate::resolver::Preferred;
use crate::warn;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("failed to read config \"{0}\": {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to reserialize config: {0}")]
    Reserialize(#[from] toml::ser::Error),

    #[error("selection is \"fixed\" but no default provider is configured")]
    FixedWithoutDefault,
}

#[derive(Deserialize, Serialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Selection {
    #[default]
    Auto,
    Fixed,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub(crate) struct Provider {
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub(crate) struct Defaults {
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub(crate) struct Delegate {
    /// When false, no delegate is used, not even a discovered one.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub command: Option<Vec<String>>,
    pub url: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl Default for Delegate {
    fn default() -> Self {
        Delegate {
            enabled: true,
            command: None,
            url: None,
            timeout_ms: None,
        }
    }
}

impl Delegate {
    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub(crate) struct Config {
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub delegate: Delegate,
}

impl Config {
    /// The enabled providers, in the order they were listed.
    pub(crate) fn active_providers(&self) -> ActiveProviders {
        self.providers
            .iter()
            .filter(|p| p.enabled)
            .map(|p| ProviderInfo::new(p.name.as_str()))
            .collect()
    }

    pub(crate) fn default_selection(&self) -> Option<Preferred> {
        self.defaults.provider.as_ref().map(|provider| Preferred {
            provider: ProviderInfo::new(provider.as_str()),
            model: self.defaults.model.clone(),
        })
    }

    pub(crate) fn model_selection(&self) -> Result<ModelSelection, Error> {
        match self.selection {
            Selection::Auto => Ok(ModelSelection::Automatic),
            Selection::Fixed => match self.default_selection() {
                Some(Preferred { provider, model }) => Ok(ModelSelection::Fixed { provider, model }),
                None => Err(Error::FixedWithoutDefault),
            },
        }
    }
}

fn get_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME");

    if let Some(home) = home {
        let home = PathBuf::from(home);

        const USER_PATHS: [&str; 2] = [".config/switchboard/config.toml", ".switchboard.toml"];

        for &path in USER_PATHS.iter() {
            let fullpath = home.join(path);

            if fullpath.exists() {
                return Some(fullpath);
            }
        }
    }

    let system_config = PathBuf::from("/etc/switchboard.toml");

    if system_config.exists() {
        Some(system_config)
    } else {
        None
    }
}

/// Collects the dotted paths of keys in `user_config` which do not appear in
/// `config`.
fn extra_fields_helper<'a>(
    path: &mut Vec<&'a str>,
    user_config: &'a toml::Table,
    config: &'a toml::Table,
    extra: &mut Vec<String>,
) {
    for (user_key, user_value) in user_config {
        path.push(user_key);

        if let Some(config_value) = config.get(user_key) {
            match (user_value, config_value) {
                (toml::Value::Table(user_value), toml::Value::Table(config_value)) => {
                    extra_fields_helper(path, user_value, config_value, extra)
                }
                (toml::Value::Array(user_values), toml::Value::Array(config_values)) => {
                    for (user_value, config_value) in user_values.iter().zip(config_values) {
                        if let (toml::Value::Table(user_value), toml::Value::Table(config_value)) =
                            (user_value, config_value)
                        {
                            extra_fields_helper(path, user_value, config_value, extra)
                        }
                    }
                }
                _ => {}
            }
        } else {
            extra.push(path.join("."));
        }

        path.pop();
    }
}

fn extra_fields(config: &Config, raw_config: &str) -> Result<Vec<String>, Error> {
    let user_config: toml::Table = toml::de::from_str(raw_config)?;

    let config: toml::Table = {
        let seralized_config = toml::ser::to_string(config)?;

        toml::de::from_str(&seralized_config)?
    };

    let mut path = Vec::new();
    let mut extra = Vec::new();

    extra_fields_helper(&mut path, &user_config, &config, &mut extra);

    Ok(extra)
}

pub(crate) fn parse_config(raw_config: &str) -> Result<Config, Error> {
    let config: Config = toml::de::from_str(raw_config)?;

    for key in extra_fields(&config, raw_config)? {
        warn!("config contains extraneous key \"{}\", ignoring", key);
    }

    Ok(config)
}

fn read_config_at(path: &Path) -> Result<Config, Error> {
    let raw_config =
        std::fs::read_to_string(path).map_err(|e| Error::Read(path.to_path_buf(), e))?;

    tracing::debug!(path = %path.display(), "loaded config");

    parse_config(&raw_config)
}

pub(crate) fn read_config(config: Option<PathBuf>) -> Result<Config, Error> {
    let config_path = config.or_else(get_config_path);

    match config_path {
        Some(path) => read_config_at(&path),
        None => Ok(Config::default()),
    }
}
