use crate::error::{DownloadFailure, Error};
use crate::fetcher::{ArchiveFetcher, extract_archive};
use crate::provider::Provider;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Builds an in-memory zip archive from `(path, content)` pairs.
pub fn zip_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip_buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
    let options = SimpleFileOptions::default();

    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    zip_buffer
}

/// Records every request and extracts an archive holding a single `manifest.json`.
#[derive(Default)]
pub struct MockArchiveFetcher {
    requests: Mutex<Vec<(Provider, String, PathBuf)>>,
    fail: bool,
}

impl MockArchiveFetcher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(Provider, String, PathBuf)> {
        self.requests.lock().unwrap().clone()
    }
}

impl ArchiveFetcher for MockArchiveFetcher {
    async fn fetch_and_extract(
        &self,
        provider: Provider,
        url: &str,
        destination: &Path,
    ) -> crate::error::Result<()> {
        self.requests
            .lock()
            .unwrap()
            .push((provider, url.to_string(), destination.to_path_buf()));

        let result = if self.fail {
            Err(DownloadFailure::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        } else {
            let archive = zip_archive(&[("manifest.json", r#"{"manifest_version": 3}"#)]);
            extract_archive(Cursor::new(archive), destination)
        };

        result.map_err(|source| Error::Download {
            url: url.to_string(),
            destination: destination.to_path_buf(),
            source,
        })
    }
}
