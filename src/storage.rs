use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Where uploaded product images live.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Writes `body` under `name`, replacing any existing image with that name.
    /// Returns the path recorded on the product.
    async fn put_image(&self, name: &str, body: Bytes) -> anyhow::Result<String>;
    async fn get_image(&self, name: &str) -> anyhow::Result<Option<Bytes>>;
}

#[derive(Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create images dir {}", root.display()))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put_image(&self, name: &str, body: Bytes) -> anyhow::Result<String> {
        let name = upload_file_name(name).context("invalid image file name")?;
        let path = self.root.join(name);
        // Last writer wins; same-name uploads are not serialized.
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write image {}", path.display()))?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn get_image(&self, name: &str) -> anyhow::Result<Option<Bytes>> {
        if !is_plain_name(name) {
            return Ok(None);
        }
        let path = self.root.join(name);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read image {}", path.display())),
        }
    }
}

/// Content type for the image extensions we serve.
pub fn content_type_for(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// Only the last path component of a client supplied file name is kept.
pub fn upload_file_name(raw: &str) -> Option<&str> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    is_plain_name(name).then_some(name)
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}
