use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::feed::Author;
use crate::snapshot;

const DEFAULT_ENV_PREFIX: &str = "CHIRP";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub author: AuthorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UIConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorConfig {
    #[serde(default = "default_handle")]
    pub handle: String,
    #[serde(default = "default_avatar")]
    pub avatar: String,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            handle: default_handle(),
            avatar: default_avatar(),
        }
    }
}

impl AuthorConfig {
    pub fn to_author(&self) -> Author {
        Author {
            handle: self.handle.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

fn default_handle() -> String {
    Author::default().handle
}

fn default_avatar() -> String {
    Author::default().avatar
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_key(),
        }
    }
}

fn default_key() -> String {
    snapshot::DEFAULT_KEY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIConfig {
    #[serde(default = "default_tick_rate", with = "humantime_serde")]
    pub tick_rate: Duration,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
        }
    }
}

fn default_tick_rate() -> Duration {
    Duration::from_millis(250)
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    cfg = merge_env(cfg, load_env(prefix));

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.author.handle.is_empty() {
        base.author.handle = other.author.handle;
    }
    if !other.author.avatar.is_empty() {
        base.author.avatar = other.author.avatar;
    }

    if other.storage.path.is_some() {
        base.storage.path = other.storage.path;
    }
    if !other.storage.key.is_empty() {
        base.storage.key = other.storage.key;
    }

    if !other.ui.tick_rate.is_zero() {
        base.ui.tick_rate = other.ui.tick_rate;
    }

    base
}

fn load_env(prefix: &str) -> HashMap<String, String> {
    let upper_prefix = format!("{}_", prefix.to_uppercase());
    env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(&upper_prefix)
                .map(|stripped| (stripped.to_ascii_lowercase().replace("__", "."), value))
        })
        .collect()
}

fn merge_env(mut cfg: Config, vars: HashMap<String, String>) -> Config {
    for (key, value) in vars {
        apply_env_value(&mut cfg, &key, value);
    }
    cfg
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "author.handle" => cfg.author.handle = value,
        "author.avatar" => cfg.author.avatar = value,
        "storage.path" => cfg.storage.path = Some(PathBuf::from(value)),
        "storage.key" => {
            if !value.trim().is_empty() {
                cfg.storage.key = value;
            }
        }
        "ui.tick_rate" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.ui.tick_rate = duration;
            }
        }
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chirp").join("config.yaml"))
}
