//! Kubeconfig parsing and API server lookup

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use yaml_rust::{Yaml, YamlLoader};

const SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
const SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";

/// Errors that can occur while locating the API server from a kubeconfig
#[derive(Debug, Error)]
pub enum KubeconfigError {
    #[error("failed to read kubeconfig {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse kubeconfig {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: yaml_rust::ScanError,
    },

    #[error("malformed kubeconfig {}: {}", .path.display(), .reason)]
    Malformed { path: PathBuf, reason: String },

    #[error("no current context is set and no context was requested")]
    NoContext,

    #[error("context '{0}' not found in kubeconfig")]
    ContextNotFound(String),

    #[error("cluster '{0}' not found in kubeconfig")]
    ClusterNotFound(String),

    #[error("no server found for cluster '{0}'")]
    NoServer(String),

    #[error("no kubeconfig path was given and no in-cluster service environment is set")]
    NoConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedCluster {
    pub name: String,
    /// API server address, empty when the entry has none
    pub server: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedContext {
    pub name: String,
    pub cluster: String,
}

/// The parts of a kubeconfig needed to find an API server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kubeconfig {
    pub current_context: Option<String>,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
}

impl Kubeconfig {
    pub fn load(path: &Path) -> Result<Self, KubeconfigError> {
        let content = fs::read_to_string(path).map_err(|source| KubeconfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse kubeconfig YAML; `origin` only labels errors
    pub fn parse(content: &str, origin: &Path) -> Result<Self, KubeconfigError> {
        let docs = YamlLoader::load_from_str(content).map_err(|source| KubeconfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        let malformed = |reason: &str| KubeconfigError::Malformed {
            path: origin.to_path_buf(),
            reason: reason.to_string(),
        };

        let doc = match docs.into_iter().next() {
            None | Some(Yaml::Null) => return Ok(Self::default()),
            Some(doc @ Yaml::Hash(_)) => doc,
            Some(_) => return Err(malformed("top level is not a mapping")),
        };

        let current_context = doc["current-context"]
            .as_str()
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let clusters: Vec<NamedCluster> = named_entries(&doc["clusters"])
            .ok_or_else(|| malformed("'clusters' is not a list"))?
            .map(|(name, entry)| NamedCluster {
                name,
                server: entry["cluster"]["server"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();

        let contexts: Vec<NamedContext> = named_entries(&doc["contexts"])
            .ok_or_else(|| malformed("'contexts' is not a list"))?
            .map(|(name, entry)| NamedContext {
                name,
                cluster: entry["context"]["cluster"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();

        if let Some(name) = first_duplicate(clusters.iter().map(|c| c.name.as_str())) {
            return Err(malformed(&format!("duplicate cluster name '{}'", name)));
        }
        if let Some(name) = first_duplicate(contexts.iter().map(|c| c.name.as_str())) {
            return Err(malformed(&format!("duplicate context name '{}'", name)));
        }

        Ok(Self {
            current_context,
            clusters,
            contexts,
        })
    }

    /// API server of `context`, or of the current context when none is given
    pub fn server_for(&self, context: Option<&str>) -> Result<String, KubeconfigError> {
        let context_name = match context.filter(|name| !name.is_empty()) {
            Some(name) => name,
            None => self
                .current_context
                .as_deref()
                .ok_or(KubeconfigError::NoContext)?,
        };

        let context = self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .ok_or_else(|| KubeconfigError::ContextNotFound(context_name.to_string()))?;

        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .ok_or_else(|| KubeconfigError::ClusterNotFound(context.cluster.clone()))?;

        if cluster.server.is_empty() {
            return Err(KubeconfigError::NoServer(cluster.name.clone()));
        }
        Ok(cluster.server.clone())
    }
}

/// `name`-keyed list entries; `None` if the section is present but not a list
fn named_entries(section: &Yaml) -> Option<impl Iterator<Item = (String, &Yaml)>> {
    let entries: &[Yaml] = match section {
        Yaml::BadValue | Yaml::Null => &[],
        Yaml::Array(entries) => entries,
        _ => return None,
    };
    Some(
        entries
            .iter()
            .filter_map(|entry| entry["name"].as_str().map(|name| (name.to_string(), entry))),
    )
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}

/// Resolve the API server host for a kubeconfig path and optional context.
///
/// An empty path means no kubeconfig is available; the in-cluster service
/// environment is used instead.
pub fn resolve_api_host(path: &Path, context: Option<&str>) -> Result<String, KubeconfigError> {
    if path.as_os_str().is_empty() {
        tracing::debug!("no kubeconfig path, trying in-cluster service environment");
        return in_cluster_host(|name| std::env::var(name).ok())
            .ok_or(KubeconfigError::NoConfiguration);
    }

    tracing::debug!(path = %path.display(), context = ?context, "reading kubeconfig");
    Kubeconfig::load(path)?.server_for(context)
}

fn in_cluster_host(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let host = lookup(SERVICE_HOST_ENV).filter(|h| !h.is_empty())?;
    let port = lookup(SERVICE_PORT_ENV).filter(|p| !p.is_empty())?;

    // IPv6 literals need brackets in a URL
    let host = if host.contains(':') {
        format!("[{}]", host)
    } else {
        host
    };
    Some(format!("https://{}:{}", host, port))
}
