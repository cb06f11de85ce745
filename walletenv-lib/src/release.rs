use crate::config::{Config, Credentials};
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const LATEST: &str = "latest";
const USER_AGENT: &str = concat!("walletenv/", env!("CARGO_PKG_VERSION"));

/// Identifies one downloadable build of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub filename: String,
    pub download_url: String,
    /// Also the name of the cache directory the build is extracted into.
    pub tag_name: String,
}

impl fmt::Display for ReleaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Filename: {}; Download url: {}; Tag name: {}",
            self.filename, self.download_url, self.tag_name
        )
    }
}

pub trait ReleaseResolver {
    /// `None`, `""` and `"latest"` all request the newest release.
    fn resolve(
        &self,
        version: Option<&str>,
    ) -> impl Future<Output = Result<ReleaseDescriptor>> + Send;
}

pub fn is_latest(version: Option<&str>) -> bool {
    matches!(version.map(str::trim), None | Some("") | Some(LATEST))
}

/// Matches the GitHub API JSON response for a single release
#[derive(Debug, Clone, Deserialize)]
struct GitHubReleaseJson {
    tag_name: String,
    assets: Vec<GitHubAssetJson>,
}

/// Matches the GitHub API JSON response for a single release asset
#[derive(Debug, Clone, Deserialize)]
struct GitHubAssetJson {
    name: String,
    browser_download_url: String,
}

/// Resolves MetaMask builds from the `metamask/metamask-extension` GitHub releases.
pub struct GitHubReleaseResolver {
    client: Client,
    api_base_url: String,
    credentials: Option<Credentials>,
}

impl GitHubReleaseResolver {
    pub const REPOSITORY: &'static str = "metamask/metamask-extension";

    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.github_api_url.clone(),
            credentials: config.credentials.clone(),
        }
    }

    fn releases_url(&self) -> String {
        format!("{}/repos/{}/releases", self.api_base_url, Self::REPOSITORY)
    }

    /// Deterministic descriptor for an explicit version. Performs no I/O.
    pub fn descriptor_for_version(version: &str) -> ReleaseDescriptor {
        let version = version.trim();
        let version = version.strip_prefix('v').unwrap_or(version);
        ReleaseDescriptor {
            filename: format!("metamask-chrome-{version}.zip"),
            download_url: format!(
                "https://github.com/MetaMask/metamask-extension/releases/download/v{version}/metamask-chrome-{version}.zip"
            ),
            tag_name: format!("metamask-chrome-{version}"),
        }
    }

    async fn fetch_latest(&self) -> Result<ReleaseDescriptor> {
        let resolution = |reason: String| Error::Resolution {
            provider: "metamask".to_string(),
            reason,
        };

        let mut request = self
            .client
            .get(self.releases_url())
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.token));
        }

        let response = request.send().await.map_err(|e| resolution(e.to_string()))?;

        match response.status() {
            StatusCode::FORBIDDEN => return Err(Error::RateLimited("metamask".to_string())),
            status if !status.is_success() => {
                return Err(resolution(format!("GitHub API request failed: {status}")));
            }
            _ => {}
        }

        let releases: Vec<GitHubReleaseJson> =
            response.json().await.map_err(|e| resolution(e.to_string()))?;

        let release = releases
            .into_iter()
            .next()
            .ok_or_else(|| resolution("No releases were published".to_string()))?;
        let asset = release
            .assets
            .into_iter()
            .next()
            .ok_or_else(|| resolution(format!("Release {} has no assets", release.tag_name)))?;

        Ok(ReleaseDescriptor {
            filename: asset.name,
            download_url: asset.browser_download_url,
            tag_name: release.tag_name,
        })
    }
}

impl ReleaseResolver for GitHubReleaseResolver {
    async fn resolve(&self, version: Option<&str>) -> Result<ReleaseDescriptor> {
        tracing::debug!(
            "Trying to find metamask version {} in GitHub releases..",
            version.unwrap_or(LATEST)
        );

        let release = if is_latest(version) {
            self.fetch_latest().await?
        } else {
            Self::descriptor_for_version(version.unwrap_or_default())
        };

        tracing::debug!("Metamask version found! {}", release);
        Ok(release)
    }
}

/// Always resolves to the same descriptor.
///
/// Phantom publishes no public release feed, so its build is pinned until one exists.
pub struct StaticReleaseResolver {
    release: ReleaseDescriptor,
}

impl StaticReleaseResolver {
    pub fn new(release: ReleaseDescriptor) -> Self {
        Self { release }
    }

    pub fn phantom() -> Self {
        Self::new(ReleaseDescriptor {
            filename: "phantom-chrome-latest".to_string(),
            download_url: "chrome-dist.zip".to_string(),
            tag_name: "phantom-chrome-latest".to_string(),
        })
    }
}

impl ReleaseResolver for StaticReleaseResolver {
    async fn resolve(&self, version: Option<&str>) -> Result<ReleaseDescriptor> {
        tracing::debug!(
            "Using pinned release {} (requested version {})",
            self.release.tag_name,
            version.unwrap_or(LATEST)
        );
        Ok(self.release.clone())
    }
}

/// The resolver a [`crate::provider::Provider`] uses.
pub enum ProviderResolver {
    GitHub(GitHubReleaseResolver),
    Static(StaticReleaseResolver),
}

impl ReleaseResolver for ProviderResolver {
    async fn resolve(&self, version: Option<&str>) -> Result<ReleaseDescriptor> {
        match self {
            Self::GitHub(resolver) => resolver.resolve(version).await,
            Self::Static(resolver) => resolver.resolve(version).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RELEASES_PATH: &str = "/repos/metamask/metamask-extension/releases";

    fn config_for(server: &MockServer, credentials: Option<Credentials>) -> Config {
        Config {
            github_api_url: server.uri(),
            ..Config::new_for_path(Path::new("/unused"))
        }
        .with_credentials(credentials)
    }

    fn releases_body() -> serde_json::Value {
        json!([
            {
                "tag_name": "v11.16.0",
                "assets": [
                    {
                        "name": "metamask-chrome-11.16.0.zip",
                        "browser_download_url": "https://example.com/metamask-chrome-11.16.0.zip",
                        "size": 1000
                    },
                    {
                        "name": "metamask-firefox-11.16.0.zip",
                        "browser_download_url": "https://example.com/metamask-firefox-11.16.0.zip",
                        "size": 1000
                    }
                ]
            },
            {
                "tag_name": "v11.15.0",
                "assets": []
            }
        ])
    }

    #[tokio::test]
    async fn test_explicit_version_is_deterministic_and_offline() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let resolver = GitHubReleaseResolver::new(&config_for(&server, None));
        let first = resolver.resolve(Some("10.25.0")).await?;
        let second = resolver.resolve(Some("10.25.0")).await?;

        assert_eq!(first, second);
        assert_eq!(first.filename, "metamask-chrome-10.25.0.zip");
        assert_eq!(
            first.download_url,
            "https://github.com/MetaMask/metamask-extension/releases/download/v10.25.0/metamask-chrome-10.25.0.zip"
        );
        assert_eq!(first.tag_name, "metamask-chrome-10.25.0");

        assert_eq!(resolver.resolve(Some("v10.25.0")).await?, first);
        Ok(())
    }

    #[tokio::test]
    async fn test_latest_takes_first_release_and_asset() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(releases_body()))
            .expect(2)
            .mount(&server)
            .await;

        let resolver = GitHubReleaseResolver::new(&config_for(&server, None));
        let release = resolver.resolve(None).await?;

        assert_eq!(
            release,
            ReleaseDescriptor {
                filename: "metamask-chrome-11.16.0.zip".to_string(),
                download_url: "https://example.com/metamask-chrome-11.16.0.zip".to_string(),
                tag_name: "v11.16.0".to_string(),
            }
        );
        assert_eq!(resolver.resolve(Some(LATEST)).await?, release);
        Ok(())
    }

    #[tokio::test]
    async fn test_latest_sends_basic_auth_with_credentials() -> Result<()> {
        let server = MockServer::start().await;
        // "user:token" base64 encoded
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .and(header("authorization", "Basic dXNlcjp0b2tlbg=="))
            .respond_with(ResponseTemplate::new(200).set_body_json(releases_body()))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = Credentials::new(Some("user".into()), Some("token".into()));
        let resolver = GitHubReleaseResolver::new(&config_for(&server, credentials));
        let release = resolver.resolve(Some("latest")).await?;

        assert_eq!(release.tag_name, "v11.16.0");
        Ok(())
    }

    #[tokio::test]
    async fn test_latest_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let resolver = GitHubReleaseResolver::new(&config_for(&server, None));
        let err = resolver.resolve(None).await.unwrap_err();

        assert!(matches!(err, Error::RateLimited(_)));
        let message = err.to_string();
        assert!(message.contains("GH_USERNAME"));
        assert!(message.contains("GH_PAT"));
    }

    #[tokio::test]
    async fn test_latest_other_failures_are_resolution_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let resolver = GitHubReleaseResolver::new(&config_for(&server, None));
        let result = resolver.resolve(None).await;
        assert!(matches!(result, Err(Error::Resolution { .. })));
    }

    #[tokio::test]
    async fn test_latest_empty_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let resolver = GitHubReleaseResolver::new(&config_for(&server, None));
        let result = resolver.resolve(None).await;
        assert!(matches!(result, Err(Error::Resolution { .. })));
    }

    #[tokio::test]
    async fn test_latest_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RELEASES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let resolver = GitHubReleaseResolver::new(&config_for(&server, None));
        let result = resolver.resolve(None).await;
        assert!(matches!(result, Err(Error::Resolution { .. })));
    }

    #[tokio::test]
    async fn test_static_resolver_ignores_version() -> Result<()> {
        let resolver = StaticReleaseResolver::phantom();
        let latest = resolver.resolve(None).await?;
        let pinned = resolver.resolve(Some("23.1.0")).await?;

        assert_eq!(latest, pinned);
        assert_eq!(latest.tag_name, "phantom-chrome-latest");
        assert_eq!(latest.download_url, "chrome-dist.zip");
        Ok(())
    }

    #[test]
    fn test_is_latest() {
        assert!(is_latest(None));
        assert!(is_latest(Some("")));
        assert!(is_latest(Some("latest")));
        assert!(!is_latest(Some("11.0.0")));
    }
}
