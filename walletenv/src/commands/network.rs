use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::{Context, Result};
use clap::Args;
use walletenv_lib::config::Config;
use walletenv_lib::network::{NetworkRegistry, NetworkSelection, preset_networks};

#[derive(Args)]
pub struct NetworkCommand {
    /// A preset network (mainnet, goerli, sepolia) or `localhost`
    #[arg(conflicts_with_all = ["name", "chain_id", "testnet"])]
    pub network: Option<String>,

    /// Name of a custom network
    #[arg(long, requires = "chain_id")]
    pub name: Option<String>,

    /// Chain id of a custom network (decimal or 0x-prefixed hex)
    #[arg(long, requires = "name")]
    pub chain_id: Option<String>,

    /// Mark the custom network as a testnet
    #[arg(long, requires = "name")]
    pub testnet: bool,
}

impl NetworkCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = Config::setup(global_args.datadir.as_deref())?;
        let mut registry = NetworkRegistry::new(&config.local_rpc_url);

        let selection = match (self.network, self.name, self.chain_id) {
            (Some(network), _, _) => network.parse::<NetworkSelection>()?,
            (None, Some(network_name), Some(chain_id)) => NetworkSelection::Custom {
                network_name,
                chain_id,
                is_testnet: self.testnet,
            },
            _ => {
                ui::info("Preset networks:");
                for network in preset_networks() {
                    ui::info(&format!("  {network}"));
                }
                ui::tip("Use `walletenv network localhost` to query a local node.");
                return Ok(());
            }
        };

        registry
            .set_network(selection)
            .await
            .context("Failed to select network")?;

        ui::success(&format!("Network: {}", registry.network()));
        Ok(())
    }
}
