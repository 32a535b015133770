//! Resolution of embedded resources (image sources) referenced by the
//! previewed document.

use crate::{Error, Result};
use base64::Engine as Base64Engine;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Loads the bytes behind an `src` attribute.
///
/// Capture awaits every load before rasterizing; a failed load settles the
/// image as errored and never aborts the capture.
pub trait ResourceLoader: Send + Sync {
    fn load(&self, src: &str, allow_cross_origin: bool) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Loader for `data:` URIs and local files resolved against a base directory.
/// Remote sources are refused: the editor makes no network calls.
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    base_dir: PathBuf,
}

impl FsResourceLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve_path(&self, src: &str) -> Result<PathBuf> {
        if src.starts_with("file:") {
            let parsed = url::Url::parse(src).map_err(|e| resource_err(src, e))?;
            return parsed
                .to_file_path()
                .map_err(|_| resource_err(src, "not a local file URL"));
        }
        Ok(self.base_dir.join(src))
    }
}

impl Default for FsResourceLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ResourceLoader for FsResourceLoader {
    async fn load(&self, src: &str, allow_cross_origin: bool) -> Result<Vec<u8>> {
        let src = src.trim();
        if src.is_empty() {
            return Err(resource_err(src, "empty source"));
        }
        if let Some(rest) = src.strip_prefix("data:") {
            return decode_data_uri(src, rest);
        }
        if src.starts_with("http://") || src.starts_with("https://") || src.starts_with("//") {
            let reason = if allow_cross_origin {
                "remote resources are not fetched"
            } else {
                "cross-origin load refused"
            };
            return Err(resource_err(src, reason));
        }
        let path = self.resolve_path(src)?;
        tokio::fs::read(&path).await.map_err(|e| resource_err(src, e))
    }
}

fn decode_data_uri(src: &str, rest: &str) -> Result<Vec<u8>> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| resource_err(src, "malformed data URI"))?;
    if meta.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| resource_err(src, e))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

fn resource_err(src: &str, reason: impl std::fmt::Display) -> Error {
    // Long data URIs make unreadable messages.
    let shown: String = src.chars().take(64).collect();
    Error::ResourceError {
        src: shown,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn decodes_base64_data_uri() {
        let loader = FsResourceLoader::default();
        let bytes = loader.load("data:text/plain;base64,aGk=", true).await.unwrap();
        assert_eq!(bytes, b"hi");
        let plain = loader.load("data:text/plain,hey", true).await.unwrap();
        assert_eq!(plain, b"hey");
    }

    #[tokio::test]
    async fn remote_sources_are_errors() {
        let loader = FsResourceLoader::default();
        let err = loader.load("https://example.com/a.png", false).await.unwrap_err();
        assert!(err.to_string().contains("cross-origin"));
        assert!(loader.load("http://example.com/a.png", true).await.is_err());
    }

    #[tokio::test]
    async fn relative_paths_resolve_against_base() {
        let dir = std::env::temp_dir().join(format!("pagesmith-res-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pic.bin"), [1u8, 2, 3]).unwrap();
        let loader = FsResourceLoader::new(&dir);
        assert_eq!(loader.load("pic.bin", true).await.unwrap(), vec![1, 2, 3]);
        assert!(loader.load("missing.bin", true).await.is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn file_loads_yield_to_the_runtime() {
        let dir = std::env::temp_dir().join(format!("pagesmith-yield-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("big.bin"), vec![7u8; 4 << 20]).unwrap();
        let loader = FsResourceLoader::new(&dir);

        let mut load = Box::pin(loader.load("big.bin", true));
        assert!(futures::poll!(load.as_mut()).is_pending());
        assert_eq!(load.await.unwrap().len(), 4 << 20);
        std::fs::remove_dir_all(&dir).ok();
    }
}
