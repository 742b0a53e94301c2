// Lyra CLI Library
// Command definitions and the configuration they resolve; main.rs only parses and dispatches

mod cli_types;
pub mod commands;
pub mod config;
pub mod config_manager;
pub mod services;

pub use cli_types::Commands;

// Re-export commands module
pub use commands::handle_command;
