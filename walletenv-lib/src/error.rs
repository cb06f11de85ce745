use crate::fetcher::FlattenReport;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "[release] Unable to fetch {0} releases from GitHub because you've been rate limited! \
         Please set GH_USERNAME and GH_PAT environment variables to avoid this issue or retry again."
    )]
    RateLimited(String),

    #[error("[release] Unable to fetch {provider} releases from GitHub with following error:\n{reason}")]
    Resolution { provider: String, reason: String },

    #[error(
        "[download] Unable to download provider release from: {url} to: {} with following error:\n{source}",
        .destination.display()
    )]
    Download {
        url: String,
        destination: PathBuf,
        #[source]
        source: DownloadFailure,
    },

    #[error("[probe] Unhandled error while accessing {} with following error:\n{source}", .path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[network] Unable to reach local chain endpoint {url}: {source}")]
    NetworkUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("[network] Local chain endpoint {url} returned an invalid response: {reason}")]
    InvalidRpcResponse { url: String, reason: String },

    #[error("[network] Unknown network '{0}'")]
    UnknownNetwork(String),

    #[error("[network] Chain id '{0}' is not a number")]
    InvalidChainId(String),

    #[error("Unknown provider '{0}', expected 'metamask' or 'phantom'")]
    UnknownProvider(String),

    #[error("[config] {0}")]
    Config(String),
}

/// Underlying cause of an [`Error::Download`].
#[derive(Error, Debug)]
pub enum DownloadFailure {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed: {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to extract archive: {0}")]
    Extraction(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} of {} entries could not be moved out of dist", .0.failed.len(), .0.total())]
    Flatten(FlattenReport),
}
