// brandforge: Capabilities injected into logo acquisition

use crate::asset::{AssetRef, AssetStore};
use crate::error::{BrandError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Durable logo persistence. Implemented by [`AssetStore`].
#[async_trait]
pub trait LogoSaver: Send + Sync {
    async fn save_logo(&self, bytes: &[u8], mime_type: &str) -> Result<AssetRef>;
}

#[async_trait]
impl LogoSaver for AssetStore {
    async fn save_logo(&self, bytes: &[u8], mime_type: &str) -> Result<AssetRef> {
        self.put(bytes, mime_type, None).await
    }
}

/// Hands bytes to the user as a file they can move somewhere safe.
pub trait DownloadSink: Send + Sync {
    fn offer(&self, bytes: &[u8], filename: &str) -> Result<PathBuf>;
}

/// Writes offered files into a directory, never replacing an existing file:
/// `logo.png`, then `logo (1).png`, `logo (2).png`, ...
pub struct DirectoryDownloadSink {
    dir: PathBuf,
}

impl DirectoryDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn free_path(&self, filename: &str) -> PathBuf {
        let candidate = self.dir.join(filename);
        if !candidate.exists() {
            return candidate;
        }

        let path = Path::new(filename);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("download");
        let ext = path.extension().and_then(|e| e.to_str());

        (1..)
            .map(|n| match ext {
                Some(ext) => self.dir.join(format!("{} ({}).{}", stem, n, ext)),
                None => self.dir.join(format!("{} ({})", stem, n)),
            })
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl DownloadSink for DirectoryDownloadSink {
    fn offer(&self, bytes: &[u8], filename: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(BrandError::storage)?;
        let safe_name = filename.replace(['/', '\\', ':', '|'], "_");
        let path = self.free_path(&safe_name);
        std::fs::write(&path, bytes).map_err(BrandError::storage)?;
        tracing::info!(path = %path.display(), "Logo offered as download");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_download_sink_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let sink = DirectoryDownloadSink::new(tmp.path().join("downloads"));

        let first = sink.offer(b"one", "logo.png").unwrap();
        let second = sink.offer(b"two", "logo.png").unwrap();
        let third = sink.offer(b"three", "logo.png").unwrap();

        assert_eq!(first.file_name().unwrap(), "logo.png");
        assert_eq!(second.file_name().unwrap(), "logo (1).png");
        assert_eq!(third.file_name().unwrap(), "logo (2).png");
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(first.parent().unwrap(), sink.dir());
    }

    #[test]
    fn test_download_sink_sanitizes_name() {
        let tmp = TempDir::new().unwrap();
        let sink = DirectoryDownloadSink::new(tmp.path());
        let path = sink.offer(b"x", "../evil.svg").unwrap();
        assert_eq!(path.parent().unwrap(), tmp.path());
    }
}
