use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::{Context, Result};
use clap::Args;
use walletenv_lib::Provider;
use walletenv_lib::config::Config;
use walletenv_lib::release::ReleaseResolver;

#[derive(Args)]
pub struct ResolveCommand {
    /// The wallet extension (metamask or phantom)
    pub provider: String,

    /// The version to resolve. Defaults to the latest release
    pub version: Option<String>,
}

impl ResolveCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = Config::setup(global_args.datadir.as_deref())?;
        let provider: Provider = self.provider.parse()?;

        let release = provider
            .resolver(&config)
            .resolve(self.version.as_deref())
            .await
            .context(format!("Failed to resolve {provider} release"))?;

        ui::info(&format!("Filename:     {}", release.filename));
        ui::info(&format!("Download url: {}", release.download_url));
        ui::info(&format!("Tag name:     {}", release.tag_name));
        ui::info(&format!(
            "Cache path:   {}",
            config.cache_dir.join(&release.tag_name).display()
        ));
        Ok(())
    }
}
