use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "lyra";
const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "LYRA_CONFIG";

/// One layer of Lyra settings, keyed like the command-line flags.
///
/// Used both for the on-disk config file and for the flags themselves; an
/// unset field defers to the next layer down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LyraConfig {
    pub cygnus_host: Option<String>,
    pub cygnus_connection_timeout: Option<u64>,
    pub kubeconfig: Option<PathBuf>,
    pub kube_context: Option<String>,
    pub kube_namespace: Option<String>,
}

impl LyraConfig {
    /// Fill every unset field of `self` from `lower`
    pub fn or(self, lower: LyraConfig) -> LyraConfig {
        LyraConfig {
            cygnus_host: self.cygnus_host.or(lower.cygnus_host),
            cygnus_connection_timeout: self
                .cygnus_connection_timeout
                .or(lower.cygnus_connection_timeout),
            kubeconfig: self.kubeconfig.or(lower.kubeconfig),
            kube_context: self.kube_context.or(lower.kube_context),
            kube_namespace: self.kube_namespace.or(lower.kube_namespace),
        }
    }
}

pub fn get_home_dir() -> Result<PathBuf> {
    home_dir_from(|name| std::env::var(name).ok())
}

fn home_dir_from(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    lookup("HOME")
        .filter(|home| !home.is_empty())
        .or_else(|| lookup("USERPROFILE").filter(|home| !home.is_empty())) // Windows fallback
        .map(PathBuf::from)
        .with_context(|| "Could not determine home directory")
}

/// `$LYRA_CONFIG`, else `~/.config/lyra/config.toml`
pub fn get_config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let home = get_home_dir().ok()?;
    Some(home.join(".config").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load_config() -> Result<LyraConfig> {
    match get_config_file_path() {
        Some(path) => load_config_from(&path),
        None => Ok(LyraConfig::default()),
    }
}

pub fn load_config_from(config_path: &Path) -> Result<LyraConfig> {
    if !config_path.exists() {
        tracing::trace!(path = %config_path.display(), "no config file");
        return Ok(LyraConfig::default());
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    let config: LyraConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "loaded config file");
    Ok(config)
}
