use crate::storage::traits::{ContentStore, StorageError, StorageResult};
use crate::url::extract_domain;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;

/// File-system content store that lays the mirror out as `<root>/<domain>/<path>`
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates a store writing below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Computes where the content for `url` is written
    ///
    /// # Mapping Rules
    ///
    /// - An empty path, or one ending in `/`, gets `index.html`
    /// - With a query string, dots in the path become `_`, then `_<query>` (with `&`
    ///   replaced by `_`) and the extension for `content_type` are appended
    /// - Otherwise an extension-less path served as `text/html` gets `.html`
    /// - Empty, `.` and `..` segments are dropped so the result stays below the root
    pub fn local_path(&self, url: &Url, content_type: &str) -> StorageResult<PathBuf> {
        let domain =
            extract_domain(url).ok_or_else(|| StorageError::MissingHost(url.to_string()))?;

        let mut path = url.path().trim_start_matches('/').to_string();
        if path.is_empty() || path.ends_with('/') {
            path.push_str("index.html");
        }

        match url.query() {
            Some(query) if !query.is_empty() => {
                path = format!(
                    "{}_{}{}",
                    path.replace('.', "_"),
                    query.replace('&', "_"),
                    extension_for(content_type)
                );
            }
            _ => {
                if !has_extension(&path) && is_html(content_type) {
                    path.push_str(".html");
                }
            }
        }

        let mut local = self.root.join(domain);
        for segment in path.split('/') {
            if !matches!(segment, "" | "." | "..") {
                local.push(segment);
            }
        }

        Ok(local)
    }
}

#[async_trait]
impl ContentStore for FileStorage {
    async fn save(
        &self,
        url: &Url,
        content: &[u8],
        content_type: &str,
    ) -> StorageResult<PathBuf> {
        let path = self.local_path(url, content_type)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Saved {} ({} bytes) to {}", url, content.len(), path.display());
        Ok(path)
    }
}

/// Maps a MIME type to a file extension, defaulting to `.html`
pub fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type.split(';').next().unwrap_or("").trim();

    match mime.to_ascii_lowercase().as_str() {
        "text/css" => ".css",
        "application/javascript" | "text/javascript" => ".js",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        _ => ".html",
    }
}

fn is_html(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("text/html")
}

fn has_extension(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    Path::new(file_name).extension().is_some()
}
