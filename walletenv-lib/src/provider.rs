use crate::cache::{self, MANIFEST_FILE};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::{ArchiveFetcher, HttpArchiveFetcher};
use crate::release::{
    GitHubReleaseResolver, ProviderResolver, ReleaseResolver, StaticReleaseResolver,
};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A wallet browser extension whose build can be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    MetaMask,
    Phantom,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::MetaMask => "metamask",
            Provider::Phantom => "phantom",
        }
    }

    /// Whether the build archive wraps its payload in a `dist` directory.
    pub fn nests_payload(self) -> bool {
        matches!(self, Provider::Phantom)
    }

    pub fn resolver(self, config: &Config) -> ProviderResolver {
        match self {
            Provider::MetaMask => ProviderResolver::GitHub(GitHubReleaseResolver::new(config)),
            Provider::Phantom => ProviderResolver::Static(StaticReleaseResolver::phantom()),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "metamask" => Ok(Provider::MetaMask),
            "phantom" => Ok(Provider::Phantom),
            _ => Err(Error::UnknownProvider(s.to_string())),
        }
    }
}

/// Makes sure the build of `provider` at `version` is extracted in the cache and
/// returns its directory.
///
/// The fetch is skipped when both the provider directory and its `manifest.json`
/// already exist. The directory is returned either way, so a caller that needs
/// more than the manifest has to check the contents itself.
pub async fn prepare_provider<R, F>(
    config: &Config,
    provider: Provider,
    version: Option<&str>,
    resolver: &R,
    fetcher: &F,
) -> Result<PathBuf>
where
    R: ReleaseResolver,
    F: ArchiveFetcher,
{
    let release = resolver.resolve(version).await?;

    cache::ensure_dir(&config.cache_dir).await?;

    let provider_dir = config.cache_dir.join(&release.tag_name);
    let manifest = provider_dir.join(MANIFEST_FILE);

    if !cache::exists(&provider_dir).await? || !cache::exists(&manifest).await? {
        tracing::info!("Downloading {} ({})", provider, release.tag_name);
        fetcher
            .fetch_and_extract(provider, &release.download_url, &provider_dir)
            .await?;
    } else {
        tracing::info!("{} is already downloaded", release.tag_name);
    }

    Ok(provider_dir)
}

/// [`prepare_provider`] with the provider's own resolver and an HTTP fetcher.
pub async fn prepare(config: &Config, provider: Provider, version: Option<&str>) -> Result<PathBuf> {
    let resolver = provider.resolver(config);
    let fetcher = HttpArchiveFetcher::new(config);
    prepare_provider(config, provider, version, &resolver, &fetcher).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::ReleaseDescriptor;
    use crate::test_helpers::MockArchiveFetcher;
    use std::fs;
    use tempfile::TempDir;

    fn pinned(tag_name: &str) -> StaticReleaseResolver {
        StaticReleaseResolver::new(ReleaseDescriptor {
            filename: format!("{tag_name}.zip"),
            download_url: format!("https://example.com/{tag_name}.zip"),
            tag_name: tag_name.to_string(),
        })
    }

    #[tokio::test]
    async fn test_prepare_downloads_once() -> Result<()> {
        let tmp_dir = TempDir::new().unwrap();
        let config = Config::new_for_path(tmp_dir.path());
        let resolver = pinned("metamask-chrome-11.0.0");
        let fetcher = MockArchiveFetcher::default();

        let first =
            prepare_provider(&config, Provider::MetaMask, Some("11.0.0"), &resolver, &fetcher)
                .await?;
        assert_eq!(first, config.cache_dir.join("metamask-chrome-11.0.0"));
        assert!(first.join(MANIFEST_FILE).is_file());
        assert_eq!(fetcher.calls(), 1);

        let second =
            prepare_provider(&config, Provider::MetaMask, Some("11.0.0"), &resolver, &fetcher)
                .await?;
        assert_eq!(second, first);
        assert_eq!(fetcher.calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_prepare_refetches_without_manifest() -> Result<()> {
        let tmp_dir = TempDir::new().unwrap();
        let config = Config::new_for_path(tmp_dir.path());
        let resolver = pinned("phantom-chrome-latest");
        let fetcher = MockArchiveFetcher::default();

        // Directory left behind by an interrupted extraction
        fs::create_dir_all(config.cache_dir.join("phantom-chrome-latest")).unwrap();

        let dir = prepare_provider(&config, Provider::Phantom, None, &resolver, &fetcher).await?;
        assert_eq!(fetcher.calls(), 1);
        assert!(dir.join(MANIFEST_FILE).is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_prepare_passes_provider_and_url() -> Result<()> {
        let tmp_dir = TempDir::new().unwrap();
        let config = Config::new_for_path(tmp_dir.path());
        let fetcher = MockArchiveFetcher::default();

        prepare_provider(
            &config,
            Provider::Phantom,
            None,
            &StaticReleaseResolver::phantom(),
            &fetcher,
        )
        .await?;

        assert_eq!(
            fetcher.requests(),
            vec![(
                Provider::Phantom,
                "chrome-dist.zip".to_string(),
                config.cache_dir.join("phantom-chrome-latest")
            )]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_prepare_propagates_fetch_errors() {
        let tmp_dir = TempDir::new().unwrap();
        let config = Config::new_for_path(tmp_dir.path());
        let fetcher = MockArchiveFetcher::failing();

        let result = prepare_provider(
            &config,
            Provider::MetaMask,
            Some("11.0.0"),
            &pinned("metamask-chrome-11.0.0"),
            &fetcher,
        )
        .await;

        assert!(matches!(result, Err(Error::Download { .. })));
        // The cache root is still created before the fetch
        assert!(config.cache_dir.is_dir());
    }

    #[tokio::test]
    async fn test_prepare_with_explicit_metamask_version() -> Result<()> {
        let tmp_dir = TempDir::new().unwrap();
        let config = Config::new_for_path(tmp_dir.path());
        let fetcher = MockArchiveFetcher::default();

        let dir = prepare_provider(
            &config,
            Provider::MetaMask,
            Some("10.25.0"),
            &Provider::MetaMask.resolver(&config),
            &fetcher,
        )
        .await?;

        assert_eq!(dir, config.cache_dir.join("metamask-chrome-10.25.0"));
        assert_eq!(
            fetcher.requests()[0].1,
            "https://github.com/MetaMask/metamask-extension/releases/download/v10.25.0/metamask-chrome-10.25.0.zip"
        );
        Ok(())
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("metamask".parse::<Provider>().unwrap(), Provider::MetaMask);
        assert_eq!("Phantom".parse::<Provider>().unwrap(), Provider::Phantom);
        assert!(matches!(
            "coinbase".parse::<Provider>(),
            Err(Error::UnknownProvider(_))
        ));
    }
}
