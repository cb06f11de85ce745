pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod network;
pub mod provider;
pub mod release;

#[cfg(test)]
pub mod test_helpers;

pub use error::{Error, Result};
pub use provider::{Provider, prepare, prepare_provider};
