use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tempfile::Builder;

use crate::error::BiError;
use crate::fetch::ArchiveClient;

/// On-disk archive cache. Every dataset variant owns one namespace directory
/// under the cache root; archives, their download records and the extracted
/// subject trees all live inside it.
#[derive(Debug, Clone)]
pub struct Store {
    cache_root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, BiError> {
        let cache_root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("bi-data")).ok()
            })
            .ok_or_else(|| BiError::Filesystem("unable to resolve cache directory".to_string()))?;
        Ok(Self { cache_root })
    }

    pub fn new_with_root(cache_root: Utf8PathBuf) -> Self {
        Self { cache_root }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn namespace_dir(&self, namespace: &str) -> Utf8PathBuf {
        self.cache_root.join(namespace)
    }

    pub fn archive_path(&self, url: &str, namespace: &str) -> Result<Utf8PathBuf, BiError> {
        Ok(self.namespace_dir(namespace).join(archive_name(url)?))
    }

    pub fn record_path(&self, namespace: &str, archive: &str) -> Utf8PathBuf {
        self.namespace_dir(namespace)
            .join("metadata")
            .join(format!("{archive}.json"))
    }

    /// Returns the cached copy of `url`, downloading it first when the
    /// namespace does not hold it yet. Download errors are not retried.
    pub fn fetch_archive(
        &self,
        client: &dyn ArchiveClient,
        url: &str,
        namespace: &str,
    ) -> Result<Utf8PathBuf, BiError> {
        let path = self.archive_path(url, namespace)?;
        if path.as_std_path().is_file() {
            tracing::debug!(%path, "archive already cached");
            return Ok(path);
        }

        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(dir.as_std_path()).map_err(|err| BiError::Filesystem(err.to_string()))?;
        let temp = Builder::new()
            .prefix(".bi-data-download")
            .tempfile_in(dir.as_std_path())
            .map_err(|err| BiError::Filesystem(err.to_string()))?;

        tracing::info!(%url, "downloading archive");
        let start = std::time::Instant::now();
        client.download(url, temp.path())?;
        temp.persist(path.as_std_path())
            .map_err(|err| BiError::Filesystem(err.to_string()))?;
        tracing::info!(%path, latency_ms = start.elapsed().as_millis() as u64, "archive stored");

        let archive = archive_name(url)?;
        let record = DownloadRecord {
            namespace: namespace.to_string(),
            archive: archive.to_string(),
            url: url.to_string(),
            downloaded_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("bi-data/{}", env!("CARGO_PKG_VERSION")),
            resolved_path: path.to_string(),
        };
        Self::write_record(&self.record_path(namespace, archive), &record)?;
        Ok(path)
    }

    pub fn write_record(path: &Utf8Path, record: &DownloadRecord) -> Result<(), BiError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| BiError::Filesystem(err.to_string()))?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(record)
            .map_err(|err| BiError::Filesystem(err.to_string()))?;
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| BiError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| BiError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn list_records(&self) -> Result<Vec<DownloadRecord>, BiError> {
        if !self.cache_root.as_std_path().is_dir() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        let namespaces = fs::read_dir(self.cache_root.as_std_path())
            .map_err(|err| BiError::Filesystem(err.to_string()))?;
        for namespace in namespaces {
            let namespace = namespace.map_err(|err| BiError::Filesystem(err.to_string()))?;
            let metadata_dir = namespace.path().join("metadata");
            if !metadata_dir.is_dir() {
                continue;
            }
            let entries =
                fs::read_dir(&metadata_dir).map_err(|err| BiError::Filesystem(err.to_string()))?;
            for entry in entries {
                let path = entry
                    .map_err(|err| BiError::Filesystem(err.to_string()))?
                    .path();
                if path.extension().map(|ext| ext == "json").unwrap_or(false) {
                    let content = fs::read_to_string(&path)
                        .map_err(|err| BiError::Filesystem(err.to_string()))?;
                    let record: DownloadRecord = serde_json::from_str(&content)
                        .map_err(|err| BiError::Filesystem(err.to_string()))?;
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| (&a.namespace, &a.archive).cmp(&(&b.namespace, &b.archive)));
        Ok(records)
    }

    /// Removes a namespace with its archives and extracted subjects. This is
    /// the only way to repair a stale or partial extraction.
    pub fn clear_namespace(&self, namespace: &str) -> Result<bool, BiError> {
        let dir = self.namespace_dir(namespace);
        if !dir.as_std_path().exists() {
            return Ok(false);
        }
        fs::remove_dir_all(dir.as_std_path()).map_err(|err| BiError::Filesystem(err.to_string()))?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub namespace: String,
    pub archive: String,
    pub url: String,
    pub downloaded_at: String,
    pub tool: String,
    pub resolved_path: String,
}

pub fn archive_name(url: &str) -> Result<&str, BiError> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    match without_query.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(BiError::Http(format!("url has no file name: {url}"))),
    }
}
