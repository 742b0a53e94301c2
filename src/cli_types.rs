use crate::commands::init::InitArgs;
use clap::Subcommand;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Report where Cygnus (the Lyra server components) was installed
    #[command(long_about = "Report where Cygnus (the Lyra server components) was installed.\n\n\
        The Cygnus host defaults to the API server of the selected kubeconfig context.")]
    Init(InitArgs),
}
