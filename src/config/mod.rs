//! Resolved Cygnus connection settings
//!
//! Settings are layered: command-line flags, then the config file, then the
//! built-in defaults. The Cygnus host is the only value with a computed
//! default, taken from the kubeconfig's API server.

use crate::config_manager::LyraConfig;
use crate::services::kubeconfig::{KubeconfigError, resolve_api_host};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_KUBE_NAMESPACE: &str = "kube-system";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the Cygnus host from kubeconfig '{}' (pass --cygnus-host to set it explicitly)", .path.display())]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: KubeconfigError,
    },
}

/// Keys of the resolved configuration, named as the command-line flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    CygnusHost,
    CygnusConnectionTimeout,
    Kubeconfig,
    KubeContext,
    KubeNamespace,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::CygnusHost,
        ConfigKey::CygnusConnectionTimeout,
        ConfigKey::Kubeconfig,
        ConfigKey::KubeContext,
        ConfigKey::KubeNamespace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::CygnusHost => "cygnus-host",
            ConfigKey::CygnusConnectionTimeout => "cygnus-connection-timeout",
            ConfigKey::Kubeconfig => "kubeconfig",
            ConfigKey::KubeContext => "kube-context",
            ConfigKey::KubeNamespace => "kube-namespace",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cygnus_host: String,
    /// Seconds to wait for a connection to Cygnus
    pub connection_timeout: u64,
    /// Empty when no home directory could be determined
    pub kubeconfig: PathBuf,
    /// Empty means the kubeconfig's current context
    pub kube_context: String,
    pub kube_namespace: String,
}

impl Settings {
    /// Merge `flags` over `file` over the defaults.
    ///
    /// The kubeconfig is only read when neither layer names a Cygnus host.
    pub fn resolve(
        flags: &LyraConfig,
        file: &LyraConfig,
        home: Option<&Path>,
    ) -> Result<Settings, ConfigError> {
        let layer = flags.clone().or(file.clone());

        let kubeconfig = layer
            .kubeconfig
            .unwrap_or_else(|| default_kubeconfig_path(home));
        let kube_context = layer.kube_context.unwrap_or_default();
        let kube_namespace = layer
            .kube_namespace
            .unwrap_or_else(|| DEFAULT_KUBE_NAMESPACE.to_string());
        let connection_timeout = layer
            .cygnus_connection_timeout
            .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS);

        let cygnus_host = match layer.cygnus_host {
            Some(host) => host,
            None => {
                let context = Some(kube_context.as_str()).filter(|c| !c.is_empty());
                resolve_api_host(&kubeconfig, context).map_err(|source| {
                    ConfigError::Kubeconfig {
                        path: kubeconfig.clone(),
                        source,
                    }
                })?
            }
        };

        Ok(Settings {
            cygnus_host,
            connection_timeout,
            kubeconfig,
            kube_context,
            kube_namespace,
        })
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    /// Value of `key` rendered as a string
    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::CygnusHost => self.cygnus_host.clone(),
            ConfigKey::CygnusConnectionTimeout => self.connection_timeout.to_string(),
            ConfigKey::Kubeconfig => self.kubeconfig.display().to_string(),
            ConfigKey::KubeContext => self.kube_context.clone(),
            ConfigKey::KubeNamespace => self.kube_namespace.clone(),
        }
    }
}

/// `<home>/.kube/config`, or an empty path without a home directory
pub fn default_kubeconfig_path(home: Option<&Path>) -> PathBuf {
    home.map(|home| home.join(".kube").join("config"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const KUBECONFIG: &str = "\
current-context: local
clusters:
- name: local
  cluster:
    server: https://10.0.0.1:6443
- name: remote
  cluster:
    server: https://remote.example.com:6443
contexts:
- name: local
  context:
    cluster: local
- name: remote
  context:
    cluster: remote
";

    /// Temp home with `~/.kube/config` populated
    fn home_with_kubeconfig() -> TempDir {
        let home = tempdir().unwrap();
        fs::create_dir_all(home.path().join(".kube")).unwrap();
        fs::write(home.path().join(".kube").join("config"), KUBECONFIG).unwrap();
        home
    }

    fn no_layer() -> LyraConfig {
        LyraConfig::default()
    }

    #[test]
    fn test_defaults() {
        let home = home_with_kubeconfig();
        let settings = Settings::resolve(&no_layer(), &no_layer(), Some(home.path())).unwrap();

        assert_eq!(settings.connection_timeout, 300);
        assert_eq!(settings.kube_namespace, "kube-system");
        assert_eq!(settings.kube_context, "");
        assert_eq!(settings.kubeconfig, home.path().join(".kube").join("config"));
        assert_eq!(settings.cygnus_host, "https://10.0.0.1:6443");
        assert_eq!(settings.connection_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_no_home_leaves_kubeconfig_empty() {
        let flags = LyraConfig {
            cygnus_host: Some("https://cygnus:6443".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve(&flags, &no_layer(), None).unwrap();

        assert_eq!(settings.kubeconfig, PathBuf::new());
        assert_eq!(settings.get(ConfigKey::Kubeconfig), "");
    }

    #[test]
    fn test_explicit_host_skips_kubeconfig() {
        let dir = tempdir().unwrap();
        let flags = LyraConfig {
            cygnus_host: Some("10.1.1.1".to_string()),
            kubeconfig: Some(dir.path().join("does-not-exist")),
            ..Default::default()
        };

        let settings = Settings::resolve(&flags, &no_layer(), None).unwrap();
        assert_eq!(settings.cygnus_host, "10.1.1.1");
    }

    #[test]
    fn test_context_selects_cluster() {
        let home = home_with_kubeconfig();
        let flags = LyraConfig {
            kube_context: Some("remote".to_string()),
            ..Default::default()
        };

        let settings = Settings::resolve(&flags, &no_layer(), Some(home.path())).unwrap();
        assert_eq!(settings.cygnus_host, "https://remote.example.com:6443");
        assert_eq!(settings.kube_context, "remote");
    }

    #[test]
    fn test_flags_beat_file_beat_defaults() {
        let home = home_with_kubeconfig();
        let flags = LyraConfig {
            cygnus_connection_timeout: Some(30),
            ..Default::default()
        };
        let file = LyraConfig {
            cygnus_connection_timeout: Some(90),
            kube_namespace: Some("lyra".to_string()),
            cygnus_host: Some("https://from-file:6443".to_string()),
            ..Default::default()
        };

        let settings = Settings::resolve(&flags, &file, Some(home.path())).unwrap();
        assert_eq!(settings.connection_timeout, 30);
        assert_eq!(settings.kube_namespace, "lyra");
        assert_eq!(settings.cygnus_host, "https://from-file:6443");
    }

    #[test]
    fn test_missing_kubeconfig_is_an_error() {
        let home = tempdir().unwrap();
        let err = Settings::resolve(&no_layer(), &no_layer(), Some(home.path())).unwrap_err();

        let ConfigError::Kubeconfig { path, source } = err;
        assert_eq!(path, home.path().join(".kube").join("config"));
        assert!(matches!(source, KubeconfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_kubeconfig_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kc");
        fs::write(&path, "clusters: [").unwrap();
        let flags = LyraConfig {
            kubeconfig: Some(path),
            ..Default::default()
        };

        let err = Settings::resolve(&flags, &no_layer(), None).unwrap_err();
        assert!(err.to_string().contains("--cygnus-host"));
    }

    #[test]
    fn test_get_by_key() {
        let settings = Settings {
            cygnus_host: "https://10.0.0.1:6443".to_string(),
            connection_timeout: 300,
            kubeconfig: PathBuf::from("/home/lyra/.kube/config"),
            kube_context: String::new(),
            kube_namespace: "kube-system".to_string(),
        };

        assert_eq!(settings.get(ConfigKey::CygnusHost), "https://10.0.0.1:6443");
        assert_eq!(settings.get(ConfigKey::CygnusConnectionTimeout), "300");
        assert_eq!(
            settings.get(ConfigKey::Kubeconfig),
            "/home/lyra/.kube/config"
        );
        assert_eq!(settings.get(ConfigKey::KubeContext), "");
        assert_eq!(settings.get(ConfigKey::KubeNamespace), "kube-system");
    }

    #[test]
    fn test_key_names() {
        let names: Vec<&str> = ConfigKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            [
                "cygnus-host",
                "cygnus-connection-timeout",
                "kubeconfig",
                "kube-context",
                "kube-namespace"
            ]
        );
        for key in ConfigKey::ALL {
            assert_eq!(key.to_string(), key.as_str());
        }
    }
}
