//! Report the Cygnus installation (post-install connection info)

use crate::config::Settings;
use crate::config_manager::{self, LyraConfig};
use anyhow::{Context, Result};
use clap::Args;
use clap::builder::{OsStringValueParser, TypedValueParser};
use std::io::{self, Write};
use std::path::PathBuf;

const CYGNUS_DOCS_URL: &str = "https://github.com/lyraproj/docs/cygnus.md";

/// Connection flags shared by `init` and anything nested under it.
///
/// Every flag is optional so an unset flag can fall through to the config file
/// and then to the built-in default.
#[derive(Args, Clone, Debug, Default)]
pub struct InitArgs {
    /// absolute path to the kubeconfig file to use [default: ~/.kube/config]
    ///
    /// An empty path selects the in-cluster service environment.
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        value_parser = OsStringValueParser::new().map(PathBuf::from)
    )]
    pub kubeconfig: Option<PathBuf>,
    /// the duration (in seconds) Lyra will wait to establish a connection to Cygnus [default: 300]
    #[arg(
        long = "cygnus-connection-timeout",
        short = 't',
        global = true,
        value_name = "SECONDS"
    )]
    pub connection_timeout: Option<u64>,
    /// Address of Cygnus (probably a Kubernetes master) [default: API server from kubeconfig]
    #[arg(long = "cygnus-host", global = true, value_name = "ADDRESS")]
    pub cygnus_host: Option<String>,
    /// Kubernetes namespace for Cygnus [default: kube-system]
    #[arg(long = "kube-namespace", short = 'n', global = true, value_name = "NAME")]
    pub kube_namespace: Option<String>,
    /// Name of the kubeconfig context to use
    #[arg(long = "kube-context", global = true, value_name = "NAME")]
    pub kube_context: Option<String>,
}

impl InitArgs {
    /// Flags as a configuration layer, to be merged over the config file
    pub fn to_layer(&self) -> LyraConfig {
        LyraConfig {
            cygnus_host: self.cygnus_host.clone(),
            cygnus_connection_timeout: self.connection_timeout,
            kubeconfig: self.kubeconfig.clone(),
            kube_context: self.kube_context.clone(),
            kube_namespace: self.kube_namespace.clone(),
        }
    }
}

/// Handle init command - resolve settings and print where Cygnus lives
pub fn handle_init(args: &InitArgs) -> Result<()> {
    let file_config = config_manager::load_config()?;
    let home = config_manager::get_home_dir().ok();

    let settings = Settings::resolve(&args.to_layer(), &file_config, home.as_deref())
        .context("Failed to resolve Cygnus connection settings")?;

    tracing::debug!(
        host = %settings.cygnus_host,
        timeout = ?settings.connection_timeout(),
        kubeconfig = %settings.kubeconfig.display(),
        context = %settings.kube_context,
        namespace = %settings.kube_namespace,
        "resolved Cygnus settings"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_init_message(&mut out, &settings.cygnus_host).context("Failed to write to stdout")?;
    Ok(())
}

/// Write the post-install message for a Cygnus host
pub fn write_init_message<W: Write>(out: &mut W, host: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Cygnus (the Lyra server components) has been installed into a Kubernetes cluster at {}.",
        host
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "For more information on using Lyra with Cygnus, see {}",
        CYGNUS_DOCS_URL
    )?;
    out.flush()
}
