use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::Result;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Persists an avatar for `tg_id` and returns the stored file name.
    async fn save(&self, tg_id: i64, source_path: &str, data: Bytes) -> Result<String>;
}

/// Writes avatars into a directory that is served under `/uploads`.
#[derive(Clone)]
pub struct FsAvatarStore {
    dir: PathBuf,
}

impl FsAvatarStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn avatar_extension(source_path: &str) -> String {
    let ext = Path::new(source_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "webp" => ext,
        _ => "jpg".to_string(),
    }
}

#[async_trait]
impl AvatarStore for FsAvatarStore {
    async fn save(&self, tg_id: i64, source_path: &str, data: Bytes) -> Result<String> {
        fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}.{}", tg_id, avatar_extension(source_path));
        fs::write(self.dir.join(&file_name), &data).await?;
        tracing::info!(tg_id, file_name = %file_name, bytes = data.len(), "Stored avatar");
        Ok(file_name)
    }
}
