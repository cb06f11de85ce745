use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::Result;
use clap::{Args, Subcommand};
use walletenv_lib::cache::{cached_providers, clear, format_size};
use walletenv_lib::config::Config;

#[derive(Args)]
pub struct CacheCommand {
    #[command(subcommand)]
    pub action: Option<CacheAction>,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show cache size, location and cached providers
    Info,
    /// Remove all cached provider builds
    Clear,
}

impl CacheCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = Config::setup(global_args.datadir.as_deref())?;

        match self.action {
            Some(CacheAction::Clear) => self.clear_cache(&config)?,
            Some(CacheAction::Info) | None => self.show_cache_info(&config)?,
        }

        Ok(())
    }

    fn clear_cache(&self, config: &Config) -> Result<()> {
        let removed = clear(&config.cache_dir)?;
        if removed == 0 {
            ui::success("Cache is already empty");
        } else {
            ui::success(&format!("Removed {removed} cached provider builds"));
        }
        Ok(())
    }

    fn show_cache_info(&self, config: &Config) -> Result<()> {
        ui::info(&format!("Cache location: {}", config.cache_dir.display()));

        let entries = cached_providers(&config.cache_dir)?;
        if entries.is_empty() {
            ui::info("Cache is empty");
            return Ok(());
        }

        let total: u64 = entries.iter().map(|entry| entry.size).sum();
        ui::info(&format!("Cache size: {}", format_size(total)));
        for entry in &entries {
            ui::info(&format!("  {} ({})", entry.tag_name, format_size(entry.size)));
            if !entry.has_manifest {
                ui::warning(&format!(
                    "    missing manifest.json, {} will be downloaded again",
                    entry.tag_name
                ));
            }
        }
        ui::tip("Run `walletenv cache clear` to free up space");

        Ok(())
    }
}
