// Command module routing
//
// To add a new command:
// 1. Create a new file in this directory (e.g., `mycommand.rs`)
// 2. Add `pub mod mycommand;` below
// 3. Add the variant to `Commands` in cli_types.rs and the match arm in `handle_command`

pub mod init;

use crate::Commands;
use anyhow::Result;

/// Dispatch command to appropriate handler
pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Init(args) => {
            init::handle_init(&args)?;
        }
    }
    Ok(())
}
