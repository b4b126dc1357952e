use std::path::{Component, Path, PathBuf};

use crate::forms::CleanImage;

/// Uploaded files on disk. Stored paths are relative to the media root.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write a post image under `posts/` and return its relative path.
    pub fn save_post_image(&self, image: &CleanImage) -> std::io::Result<String> {
        let dir = self.root.join("posts");
        std::fs::create_dir_all(&dir)?;

        let name = format!("{}.{}", uuid::Uuid::now_v7(), image.extension);
        std::fs::write(dir.join(&name), &image.data)?;

        let relative = format!("posts/{}", name);
        tracing::info!("Stored image {} ({} bytes)", relative, image.data.len());
        Ok(relative)
    }

    /// Map a relative media path to a file under the root. Anything that
    /// could escape the root is rejected.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        if relative.is_empty() || !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(path))
    }
}
