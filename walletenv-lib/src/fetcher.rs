use crate::config::{Config, Credentials};
use crate::error::{DownloadFailure, Error, Result};
use crate::logging::{progress_bar_style, spinner_style};
use crate::provider::Provider;
use futures_util::StreamExt;
use futures_util::future::join_all;
use reqwest::Client;
use reqwest::header::ACCEPT;
use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::instrument;
use tracing_indicatif::span_ext::IndicatifSpanExt;

pub const DIST_DIR: &str = "dist";

pub trait ArchiveFetcher {
    /// Downloads the archive at `url` and extracts it into `destination`.
    fn fetch_and_extract(
        &self,
        provider: Provider,
        url: &str,
        destination: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Outcome of moving the entries of a nested directory up one level.
#[derive(Debug, Default)]
pub struct FlattenReport {
    pub moved: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

impl FlattenReport {
    pub fn total(&self) -> usize {
        self.moved.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct HttpArchiveFetcher {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpArchiveFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            credentials: config.credentials.clone(),
        }
    }

    async fn try_fetch_and_extract(
        &self,
        provider: Provider,
        url: &str,
        destination: &Path,
    ) -> Result<(), DownloadFailure> {
        let archive = self.download(url).await?;
        extract_archive(Cursor::new(archive), destination)?;

        // Some extensions zip their dist folder
        if provider.nests_payload() {
            let report = move_entries(&destination.join(DIST_DIR), destination).await?;
            if !report.is_complete() {
                return Err(DownloadFailure::Flatten(report));
            }
            tracing::debug!("Moved {} entries out of {}", report.moved.len(), DIST_DIR);
        }

        Ok(())
    }

    #[instrument(skip_all)]
    async fn download(&self, url: &str) -> Result<Vec<u8>, DownloadFailure> {
        let mut request = self.client.get(url);
        if let Some(credentials) = &self.credentials {
            request = request
                .basic_auth(&credentials.username, Some(&credentials.token))
                .header(ACCEPT, "application/octet-stream");
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(DownloadFailure::Status(response.status()));
        }

        let current_span = tracing::Span::current();
        if let Ok(style) = progress_bar_style() {
            current_span.pb_set_style(&style);
        }
        current_span.pb_set_length(response.content_length().unwrap_or(0));
        current_span.pb_set_message(&format!("Downloading {url}..."));
        current_span.pb_set_finish_message(&format!("Downloading {url}... Complete!"));

        let mut archive = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            archive.extend_from_slice(&chunk);
            current_span.pb_set_position(archive.len() as u64);
        }

        Ok(archive)
    }
}

impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch_and_extract(&self, provider: Provider, url: &str, destination: &Path) -> Result<()> {
        tracing::debug!(
            "Trying to download and extract file from: {} to following path: {}",
            url,
            destination.display()
        );

        self.try_fetch_and_extract(provider, url, destination)
            .await
            .map_err(|source| Error::Download {
                url: url.to_string(),
                destination: destination.to_path_buf(),
                source,
            })
    }
}

/// Extracts a zip archive into `destination`, creating it if needed.
#[instrument(skip_all)]
pub fn extract_archive<R: Read + Seek>(reader: R, destination: &Path) -> Result<(), DownloadFailure> {
    let current_span = tracing::Span::current();
    if let Ok(style) = spinner_style("{msg}") {
        current_span.pb_set_style(&style);
    }
    current_span.pb_set_message("Extracting...");
    current_span.pb_set_finish_message("Extracting... Done");

    fs::create_dir_all(destination)?;
    let mut archive = zip::ZipArchive::new(reader)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(path) => destination.join(path),
            None => {
                tracing::warn!("Skipping archive entry outside of destination: {}", file.name());
                continue;
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(p) = outpath.parent()
                && !p.exists()
            {
                fs::create_dir_all(p)?;
            }
            let mut outfile = fs::File::create(&outpath)?;
            std::io::copy(&mut file, &mut outfile)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

/// Moves every entry of `source_dir` into `destination_dir`, issuing all renames at
/// once. `source_dir` itself is left in place. Failing to list `source_dir` is an
/// error; failed renames are collected in the report.
pub async fn move_entries(
    source_dir: &Path,
    destination_dir: &Path,
) -> std::io::Result<FlattenReport> {
    let mut names = Vec::new();
    let mut read_dir = tokio::fs::read_dir(source_dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        names.push(entry.file_name());
    }

    let renames = names.iter().map(|name| {
        let from = source_dir.join(name);
        let to = destination_dir.join(name);
        async move {
            let result = tokio::fs::rename(&from, &to).await;
            (to, result)
        }
    });

    let mut report = FlattenReport::default();
    for (path, result) in join_all(renames).await {
        match result {
            Ok(()) => report.moved.push(path),
            Err(e) => report.failed.push((path, e)),
        }
    }
    Ok(report)
}
