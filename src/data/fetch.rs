//! Published-CSV retrieval: the only suspend point of a refresh.
//!
//! A source is either an HTTP(S) URL (a spreadsheet "publish to web" CSV link)
//! or a local file path. Errors are returned as transport `AppError`s; the
//! pipeline boundary decides to degrade them to an empty snapshot.

use std::path::PathBuf;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::AppError;

/// Environment variable consulted when no `--source` is given.
pub const SOURCE_ENV: &str = "KPI_SHEET_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    /// `http://` / `https://` means URL, anything else is a file path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(raw.to_string())
        } else {
            DataSource::File(PathBuf::from(raw))
        }
    }

    /// Resolve the source from an explicit argument, falling back to the
    /// environment (`.env` included).
    pub fn resolve(arg: Option<&str>) -> Result<Self, AppError> {
        if let Some(raw) = arg.filter(|s| !s.trim().is_empty()) {
            return Ok(Self::parse(raw));
        }
        dotenvy::dotenv().ok();
        let raw = std::env::var(SOURCE_ENV).map_err(|_| {
            AppError::config(format!(
                "No data source: pass --source or set {SOURCE_ENV} in the environment (.env)."
            ))
        })?;
        if raw.trim().is_empty() {
            return Err(AppError::config(format!("{SOURCE_ENV} is empty.")));
        }
        Ok(Self::parse(&raw))
    }

    pub fn label(&self) -> String {
        match self {
            DataSource::Url(url) => url.clone(),
            DataSource::File(path) => path.display().to_string(),
        }
    }
}

pub struct CsvFetcher {
    client: Client,
}

impl CsvFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Retrieve the raw CSV text of a source.
    pub async fn fetch_text(&self, source: &DataSource) -> Result<String, AppError> {
        match source {
            DataSource::Url(url) => self.fetch_url(url).await,
            DataSource::File(path) => {
                debug!(path = %path.display(), "reading CSV file");
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    AppError::transport(format!("Failed to read CSV '{}': {e}", path.display()))
                })
            }
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<String, AppError> {
        info!(url, "fetching published CSV");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::transport(format!("CSV request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::transport(format!(
                "CSV request failed with status {status}."
            )));
        }

        resp.text()
            .await
            .map_err(|e| AppError::transport(format!("Failed to read CSV response body: {e}")))
    }
}

impl Default for CsvFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Answer one HTTP request on a local port with `status` and an empty body.
    pub(crate) fn serve_status_once(status: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response =
                format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/sheet.csv")
    }

    #[test]
    fn parse_distinguishes_urls_from_paths() {
        assert_eq!(
            DataSource::parse(" https://example.org/pub?output=csv "),
            DataSource::Url("https://example.org/pub?output=csv".to_string())
        );
        assert_eq!(
            DataSource::parse("data/sheet.csv"),
            DataSource::File(PathBuf::from("data/sheet.csv"))
        );
    }

    #[test]
    fn explicit_source_wins_over_environment() {
        let source = DataSource::resolve(Some("sheet.csv")).unwrap();
        assert_eq!(source, DataSource::File(PathBuf::from("sheet.csv")));
    }

    #[tokio::test]
    async fn reads_file_sources() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Organization Name,Membership Reach\nA,1\n").unwrap();

        let fetcher = CsvFetcher::new();
        let text = fetcher
            .fetch_text(&DataSource::File(file.path().to_path_buf()))
            .await
            .unwrap();
        assert!(text.starts_with("Organization Name"));
    }

    #[tokio::test]
    async fn missing_file_is_a_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = CsvFetcher::new();
        let err = fetcher
            .fetch_text(&DataSource::File(dir.path().join("absent.csv")))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn error_status_is_a_transport_failure() {
        let url = serve_status_once("404 Not Found");
        let err = CsvFetcher::new()
            .fetch_text(&DataSource::Url(url))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("404"));
    }
}
