use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::DictionaryConfig;

/// Supplies the raw bytes of the supplemental dictionary.
/// `Ok(None)` means there is nothing to load.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    async fn fetch(&self) -> Result<Option<Vec<u8>>>;
    fn describe(&self) -> String;
}

pub fn from_config(config: &DictionaryConfig) -> Arc<dyn DictionarySource> {
    match config {
        DictionaryConfig::None => Arc::new(NoDictionary),
        DictionaryConfig::File { path } => Arc::new(FileDictionarySource::new(path.clone())),
        DictionaryConfig::Http { url } => Arc::new(HttpDictionarySource::new(url)),
    }
}

pub struct NoDictionary;

#[async_trait]
impl DictionarySource for NoDictionary {
    async fn fetch(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

pub struct FileDictionarySource {
    path: PathBuf,
}

impl FileDictionarySource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DictionarySource for FileDictionarySource {
    async fn fetch(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("dictionary file {} does not exist", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

pub struct HttpDictionarySource {
    client: Client,
    url: String,
}

impl HttpDictionarySource {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl DictionarySource for HttpDictionarySource {
    async fn fetch(&self) -> Result<Option<Vec<u8>>> {
        debug!("downloading dictionary from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| anyhow!("failed to download from {}: {}", self.url, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!(
                "failed to download from {}: status {}",
                self.url,
                response.status()
            ));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| anyhow!("failed to read response body: {}", e))?;
        Ok(Some(data.to_vec()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[tokio::test]
    async fn file_source_reads_bytes() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "予算案,予算 案,ヨサン アン,カスタム名詞").expect("write");

        let source = FileDictionarySource::new(file.path().to_path_buf());
        let bytes = source.fetch().await.expect("fetch").expect("bytes");
        assert!(String::from_utf8(bytes).expect("utf8").starts_with("予算案"));
        assert!(source.describe().starts_with("file:"));
    }

    #[tokio::test]
    async fn missing_file_is_absent_not_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = FileDictionarySource::new(dir.path().join("dictionary.txt"));
        assert!(source.fetch().await.expect("fetch").is_none());
    }

    #[tokio::test]
    async fn directory_path_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = FileDictionarySource::new(dir.path().to_path_buf());
        assert!(source.fetch().await.is_err());
    }

    #[tokio::test]
    async fn none_config_yields_nothing() {
        let source = from_config(&DictionaryConfig::None);
        assert!(source.fetch().await.expect("fetch").is_none());
        assert_eq!(source.describe(), "none");
    }
}
