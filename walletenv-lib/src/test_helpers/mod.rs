mod mock_archive_fetcher;

pub use mock_archive_fetcher::{MockArchiveFetcher, zip_archive};
