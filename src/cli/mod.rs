// src/cli/mod.rs — CLI definition (clap derive)

pub mod definition;
pub mod fetch;
pub mod status;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tsengine",
    about = "Resolve TokenScript definitions and token metadata",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a contract's definition and print its metadata
    Fetch {
        /// Contract identifier (e.g. 0xd0d0...)
        id: String,
        /// How the result is consumed
        #[arg(long, value_enum, default_value_t = FetchStyle::Callbacks)]
        style: FetchStyle,
    },
    /// Inspect or edit the local definition store
    Definition {
        #[command(subcommand)]
        action: DefinitionAction,
    },
    /// Show paths, store backend and configured sources
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetchStyle {
    /// Success/error callback pair
    Callbacks,
    /// Single continuation receiving a tagged result
    Continuation,
    /// Native async/await
    Await,
}

#[derive(Subcommand, Clone)]
pub enum DefinitionAction {
    /// Print a stored definition
    Get { id: String },
    /// Store a definition read from a file
    Put { id: String, file: PathBuf },
    /// Delete a stored definition
    Remove { id: String },
    /// List stored identifiers
    List,
    /// Delete every stored definition
    Clear,
}
