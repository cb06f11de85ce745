use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::{Context, Result};
use clap::Args;
use walletenv_lib::Provider;
use walletenv_lib::config::Config;

#[derive(Args)]
pub struct PrepareCommand {
    /// The wallet extension to prepare (metamask or phantom)
    pub provider: String,

    /// The version to prepare (e.g., 11.16.0). Defaults to the latest release
    pub version: Option<String>,
}

impl PrepareCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = Config::setup(global_args.datadir.as_deref())?;
        let provider: Provider = self.provider.parse()?;

        if config.credentials.is_none() {
            ui::tip("Set GH_USERNAME and GH_PAT to avoid GitHub rate limits.");
        }

        let provider_dir = walletenv_lib::prepare(&config, provider, self.version.as_deref())
            .await
            .context(format!("Failed to prepare {provider}"))?;

        ui::success(&format!("{provider} is ready at: {}", provider_dir.display()));
        Ok(())
    }
}
