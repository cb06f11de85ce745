use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{
    cache::CacheCommand, network::NetworkCommand, prepare::PrepareCommand,
    resolve::ResolveCommand,
};

#[derive(Parser)]
#[command(name = "walletenv")]
#[command(about = "Fetch and cache wallet extension builds for end-to-end tests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

#[derive(clap::Args, Clone)]
pub struct GlobalArgs {
    /// Use a different location for walletenv's data, where provider builds are kept (useful for testing)
    #[arg(long, global = true)]
    pub datadir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and extract a provider build unless it is already cached
    #[command(alias = "install")]
    Prepare(PrepareCommand),

    /// Show which build a provider version resolves to
    Resolve(ResolveCommand),

    /// Resolve a network selection
    Network(NetworkCommand),

    /// Manage cached provider builds
    Cache(CacheCommand),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(cmd) => cmd.run(self.global_args).await,
            Commands::Resolve(cmd) => cmd.run(self.global_args).await,
            Commands::Network(cmd) => cmd.run(self.global_args).await,
            Commands::Cache(cmd) => cmd.run(self.global_args).await,
        }
    }
}
