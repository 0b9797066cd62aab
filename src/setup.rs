use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use reqwest::Client;
use tracing::{info, warn};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Result, VidsubError};

/// Whisper model sizes offered to the user, smallest first
pub const MODEL_SIZES: [&str; 6] = ["tiny", "base", "small", "medium", "large-v2", "large-v3"];

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub filename: String,
    pub url: String,
    pub size_mb: f64,
}

impl ModelInfo {
    fn new(name: &str, size_mb: f64) -> Self {
        let filename = format!("ggml-{}.bin", name);
        Self {
            name: name.to_string(),
            url: format!("{}/{}", MODEL_BASE_URL, filename),
            filename,
            size_mb,
        }
    }
}

/// Local store of ggml model files, downloading on demand
pub struct ModelStore {
    client: Client,
    models_dir: PathBuf,
    auto_download: bool,
}

impl ModelStore {
    pub fn new<P: AsRef<Path>>(models_dir: P, auto_download: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("vidsub/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            models_dir: models_dir.as_ref().to_path_buf(),
            auto_download,
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn available_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new("tiny", 75.0),
            ModelInfo::new("base", 142.0),
            ModelInfo::new("small", 466.0),
            ModelInfo::new("medium", 1500.0),
            ModelInfo::new("large-v2", 2900.0),
            ModelInfo::new("large-v3", 2900.0),
        ]
    }

    pub fn find_model(name: &str) -> Option<ModelInfo> {
        Self::available_models().into_iter().find(|m| m.name == name)
    }

    /// Local path a known model is stored under
    pub fn local_path(&self, model: &ModelInfo) -> PathBuf {
        self.models_dir.join(&model.filename)
    }

    /// Known models paired with whether they are already downloaded
    pub fn list(&self) -> Vec<(ModelInfo, bool)> {
        Self::available_models()
            .into_iter()
            .map(|model| {
                let present = self.local_path(&model).exists();
                (model, present)
            })
            .collect()
    }

    /// Resolve a model size or model file path to a local file.
    pub async fn resolve(&self, size_or_path: &str) -> Result<PathBuf> {
        let as_path = Path::new(size_or_path);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let model = Self::find_model(size_or_path).ok_or_else(|| {
            VidsubError::ModelLoad(format!(
                "Unknown model '{}'. Available: {}",
                size_or_path,
                MODEL_SIZES.join(", ")
            ))
        })?;

        let local_path = self.local_path(&model);
        if local_path.exists() {
            return Ok(local_path);
        }

        if !self.auto_download {
            return Err(VidsubError::ModelLoad(format!(
                "Model '{}' is not downloaded ({}); run `vidsub models --download`",
                model.name,
                local_path.display()
            )));
        }

        self.download_model(&model).await
    }

    pub async fn download_model(&self, model: &ModelInfo) -> Result<PathBuf> {
        let local_path = self.local_path(model);

        if local_path.exists() {
            info!("Model {} already exists at {}", model.name, local_path.display());
            return Ok(local_path);
        }

        async_fs::create_dir_all(&self.models_dir).await?;
        info!("Downloading {} model ({:.1} MB)...", model.name, model.size_mb);

        let mut response = self
            .client
            .get(&model.url)
            .send()
            .await
            .map_err(|e| VidsubError::ModelLoad(format!("Failed to download {}: {}", model.name, e)))?;

        if !response.status().is_success() {
            return Err(VidsubError::ModelLoad(format!(
                "Failed to download model {}: HTTP {}",
                model.name,
                response.status()
            )));
        }

        let total = response
            .content_length()
            .unwrap_or((model.size_mb * 1_000_000.0) as u64);
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        // Stream into a temp file so an interrupted download never looks complete
        let temp_path = local_path.with_extension("tmp");
        commit_download(&temp_path, &local_path, async {
            let mut file = async_fs::File::create(&temp_path).await?;
            while let Some(chunk) = response.chunk().await.map_err(|e| {
                VidsubError::ModelLoad(format!("Download of {} interrupted: {}", model.name, e))
            })? {
                file.write_all(&chunk).await?;
                pb.inc(chunk.len() as u64);
            }
            file.flush().await?;
            Ok::<(), VidsubError>(())
        })
        .await?;

        pb.finish_with_message(format!("Downloaded {}", model.name));
        info!("Successfully downloaded {} to {}", model.name, local_path.display());

        Ok(local_path)
    }

    /// Download every known model that is not present yet
    pub async fn download_missing(&self) -> Result<usize> {
        let mut downloaded = 0;
        for (model, present) in self.list() {
            if present {
                continue;
            }
            match self.download_model(&model).await {
                Ok(_) => downloaded += 1,
                Err(e) => warn!("Skipping {}: {}", model.name, e),
            }
        }
        Ok(downloaded)
    }
}

/// Await `write`, which fills `temp_path`, then move the file to `final_path`.
/// The temp file is removed when either step fails.
async fn commit_download<F>(temp_path: &Path, final_path: &Path, write: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let outcome = match write.await {
        Ok(()) => async_fs::rename(temp_path, final_path).await.map_err(VidsubError::from),
        Err(e) => Err(e),
    };

    if outcome.is_err() && temp_path.exists() {
        if let Err(e) = async_fs::remove_file(temp_path).await {
            warn!("Could not remove {}: {}", temp_path.display(), e);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_sizes_are_known() {
        for size in MODEL_SIZES {
            let model = ModelStore::find_model(size).unwrap();
            assert_eq!(model.filename, format!("ggml-{}.bin", size));
            assert!(model.url.ends_with(&model.filename));
        }
        assert!(ModelStore::find_model("huge").is_none());
    }

    #[tokio::test]
    async fn test_resolve_existing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path(), false).unwrap();
        let base = dir.path().join("ggml-base.bin");
        std::fs::write(&base, b"model").unwrap();

        assert_eq!(store.resolve("base").await.unwrap(), base);
        assert_eq!(store.resolve(base.to_str().unwrap()).await.unwrap(), base);

        let listed = store.list();
        assert!(listed.iter().any(|(m, present)| m.name == "base" && *present));
        assert!(listed.iter().any(|(m, present)| m.name == "tiny" && !*present));
    }

    #[tokio::test]
    async fn test_resolve_missing_without_download_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path(), false).unwrap();

        let err = store.resolve("small").await.unwrap_err();
        assert!(matches!(err, VidsubError::ModelLoad(_)));
        let err = store.resolve("gigantic").await.unwrap_err();
        assert!(err.is_environment());
    }

    #[tokio::test]
    async fn test_interrupted_download_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("ggml-tiny.tmp");
        let final_path = dir.path().join("ggml-tiny.bin");

        let err = commit_download(&temp_path, &final_path, async {
            async_fs::write(&temp_path, b"partial").await?;
            Err::<(), VidsubError>(VidsubError::ModelLoad("Download of tiny interrupted: reset".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, VidsubError::ModelLoad(_)));
        assert!(!temp_path.exists());
        assert!(!final_path.exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("ggml-tiny.tmp");
        let final_path = dir.path().join("gone").join("ggml-tiny.bin");

        let err = commit_download(&temp_path, &final_path, async {
            async_fs::write(&temp_path, b"model").await?;
            Ok::<(), VidsubError>(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, VidsubError::Io(_)));
        assert!(!temp_path.exists());
    }

    #[tokio::test]
    async fn test_completed_download_is_moved_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("ggml-tiny.tmp");
        let final_path = dir.path().join("ggml-tiny.bin");

        commit_download(&temp_path, &final_path, async {
            async_fs::write(&temp_path, b"model").await?;
            Ok::<(), VidsubError>(())
        })
        .await
        .unwrap();

        assert!(!temp_path.exists());
        assert_eq!(std::fs::read(&final_path).unwrap(), b"model");
    }
}
