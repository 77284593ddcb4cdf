use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::BiError;

/// Transport used by the store to populate its archive cache.
pub trait ArchiveClient: Send + Sync {
    fn download(&self, url: &str, destination: &Path) -> Result<(), BiError>;
}

#[derive(Clone)]
pub struct ZenodoHttpClient {
    client: Client,
}

impl ZenodoHttpClient {
    pub fn new() -> Result<Self, BiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("bi-data/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| BiError::Http(err.to_string()))?,
        );
        // Per-subject archives run to several hundred MB.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|err| BiError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, BiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "Zenodo request failed".to_string());
        Err(BiError::HttpStatus { status, message })
    }
}

impl ArchiveClient for ZenodoHttpClient {
    fn download(&self, url: &str, destination: &Path) -> Result<(), BiError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| BiError::Http(err.to_string()))?;
        let mut response = Self::handle_status(response)?;
        let mut file =
            File::create(destination).map_err(|err| BiError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file).map_err(|err| BiError::Http(err.to_string()))?;
        Ok(())
    }
}
