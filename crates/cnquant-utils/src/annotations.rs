//! Annotation sheet download.
//!
//! The sample annotation and the reference annotation are maintained as
//! published spreadsheets and fetched as CSV. A sheet that answers with
//! anything but HTTP 200 is skipped with a warning; the other sheet is still
//! fetched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// CSV export of the published sample annotation sheet.
pub const DATA_ANNOTATION_SHEET: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRhQ7Cr3aBo8W9Ne8DAehMvFRxYd395ENIW9giK2ATQ3QSrM8jA2E7xXbnW7CWKMdh0IhN0YqWn37Wr/pub?gid=0&single=true&output=csv";

/// CSV export of the published reference annotation sheet.
pub const REFERENCE_DATA_ANNOTATION_SHEET: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRhQ7Cr3aBo8W9Ne8DAehMvFRxYd395ENIW9giK2ATQ3QSrM8jA2E7xXbnW7CWKMdh0IhN0YqWn37Wr/pub?gid=522048357&single=true&output=csv";

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// A fetched sheet: HTTP status and raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSheet {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

/// Fetches a sheet by URL.
#[async_trait]
pub trait SheetFetcher: Send + Sync {
    /// Fetch `url`. Non-success statuses are returned, not raised.
    ///
    /// # Errors
    ///
    /// Returns an error if no response could be obtained.
    async fn fetch(&self, url: &str) -> Result<FetchedSheet>;
}

/// Fetches sheets over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a 60 second timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SheetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedSheet> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(FetchedSheet { status, body })
    }
}

/// What happened to one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOutcome {
    /// The sheet was written to `path`.
    Saved {
        /// Target file.
        path: PathBuf,
        /// Bytes written.
        bytes: usize,
    },
    /// The server did not answer with 200.
    Failed {
        /// HTTP status code received.
        status: u16,
    },
}

impl SheetOutcome {
    /// Whether the sheet was saved.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// Outcome of [`download_annotation_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Sample annotation sheet.
    pub annotation: SheetOutcome,
    /// Reference annotation sheet.
    pub reference: SheetOutcome,
}

impl DownloadReport {
    /// Whether both sheets were saved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.annotation.is_saved() && self.reference.is_saved()
    }
}

/// Download both annotation sheets.
///
/// # Errors
///
/// Returns an error on transport failures or if a target file cannot be
/// written. HTTP error statuses are reported in the [`DownloadReport`].
pub async fn download_annotation_data(
    fetcher: &dyn SheetFetcher,
    annotation_url: &str,
    reference_data_url: &str,
    annotation_path: impl AsRef<Path>,
    reference_annotation_path: impl AsRef<Path>,
) -> Result<DownloadReport> {
    let annotation = download_sheet(fetcher, annotation_url, annotation_path.as_ref()).await?;
    let reference =
        download_sheet(fetcher, reference_data_url, reference_annotation_path.as_ref()).await?;
    Ok(DownloadReport {
        annotation,
        reference,
    })
}

async fn download_sheet(fetcher: &dyn SheetFetcher, url: &str, path: &Path) -> Result<SheetOutcome> {
    let sheet = fetcher.fetch(url).await?;
    if sheet.status != 200 {
        warn!("Failed to fetch the sheet. Status code: {}", sheet.status);
        return Ok(SheetOutcome::Failed {
            status: sheet.status,
        });
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
    }
    tokio::fs::write(path, &sheet.body).await?;
    info!("Saved {} bytes to {}", sheet.body.len(), path.display());
    Ok(SheetOutcome::Saved {
        path: path.to_path_buf(),
        bytes: sheet.body.len(),
    })
}
