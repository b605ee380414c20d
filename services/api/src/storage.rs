//! Media storage: S3 upload with scoped temporary artifacts
//!
//! Uploaded parts are persisted to a uniquely named temporary file wrapped
//! in [`TempMedia`]; the file is removed when the guard drops, so both the
//! success and the failure path release the local artifact. The upload
//! itself is best-effort and yields `None` on failure — the caller decides
//! whether that is fatal.

use anyhow::Result;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info};
use uuid::Uuid;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket receiving uploaded media
    pub bucket: String,
    /// Base URL under which uploaded keys are publicly reachable
    pub public_base_url: String,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    pub fn from_env() -> Self {
        let bucket =
            env::var("MEDIA_BUCKET_NAME").unwrap_or_else(|_| "cliptide-media".to_string());

        let public_base_url = env::var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{bucket}.s3.amazonaws.com"));

        StorageConfig {
            bucket,
            public_base_url,
        }
    }
}

/// A successfully uploaded media object
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    /// Public URL of the object
    pub url: String,
    /// Duration in seconds, when the artifact was probed as audio/video
    pub duration: Option<f64>,
}

/// Media storage client
#[derive(Clone)]
pub struct MediaStorage {
    client: aws_sdk_s3::Client,
    config: StorageConfig,
}

impl MediaStorage {
    /// Initialize the storage client from the ambient AWS configuration
    pub async fn from_env() -> Self {
        let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let client = aws_sdk_s3::Client::new(&aws_config);
        let config = StorageConfig::from_env();

        info!("Media storage initialized for bucket: {}", config.bucket);

        MediaStorage { client, config }
    }

    /// Upload a temporary artifact under the given key prefix.
    ///
    /// Best-effort: failures are logged and reported as `None`. The
    /// temporary file is removed when `media` drops, whichever path is
    /// taken.
    pub async fn upload(&self, media: TempMedia, folder: &str) -> Option<UploadedMedia> {
        let key = format!("{folder}/{}", media.file_name());

        let body = match ByteStream::from_path(media.path()).await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to read temporary media file: {}", e);
                return None;
            }
        };

        match self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(body)
            .send()
            .await
        {
            Ok(_) => Some(UploadedMedia {
                url: format!("{}/{}", self.config.public_base_url, key),
                duration: media.duration(),
            }),
            Err(e) => {
                error!("Failed to upload media to storage: {}", e);
                None
            }
        }
    }
}

/// A temporary media artifact on local disk, removed on drop
#[derive(Debug)]
pub struct TempMedia {
    path: PathBuf,
    file_name: String,
    duration: Option<f64>,
}

impl TempMedia {
    /// Persist uploaded bytes to a uniquely named temporary file, keeping
    /// the original extension
    pub async fn persist(original_name: &str, bytes: &[u8]) -> Result<Self> {
        let file_name = match Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };

        let path = env::temp_dir().join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        Ok(TempMedia {
            path,
            file_name,
            duration: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Duration captured by [`TempMedia::probe_duration`], if any
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Probe the artifact with ffprobe and remember its duration.
    ///
    /// Failures are logged and leave the duration unset; a video without a
    /// readable duration is still publishable.
    pub fn probe_duration(&mut self) -> Option<f64> {
        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg(&self.path)
            .output();

        let output = match output {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                error!("ffprobe failed with status: {:?}", output.status);
                return None;
            }
            Err(e) => {
                error!("Failed to run ffprobe: {}", e);
                return None;
            }
        };

        let parsed: serde_json::Value = match serde_json::from_slice(&output.stdout) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Failed to parse ffprobe output: {}", e);
                return None;
            }
        };

        self.duration = parsed
            .get("format")
            .and_then(|format| format.get("duration"))
            .and_then(|duration| duration.as_str())
            .and_then(|duration| duration.parse::<f64>().ok());

        self.duration
    }
}

impl Drop for TempMedia {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!("Failed to remove temporary media file: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn temp_media_keeps_the_original_extension() {
        let media = TempMedia::persist("clip.mp4", b"fake bytes").await.unwrap();
        assert!(media.file_name().ends_with(".mp4"));
        assert!(media.path().exists());
    }

    #[tokio::test]
    async fn temp_media_is_removed_on_drop() {
        let media = TempMedia::persist("thumb.png", b"fake bytes").await.unwrap();
        let path = media.path().to_path_buf();
        assert!(path.exists());

        drop(media);
        assert!(!path.exists());
    }

    #[test]
    #[serial_test::serial]
    fn storage_config_derives_public_url_from_bucket() {
        unsafe {
            std::env::remove_var("MEDIA_PUBLIC_BASE_URL");
            std::env::set_var("MEDIA_BUCKET_NAME", "clips-test");
        }

        let config = StorageConfig::from_env();
        assert_eq!(config.bucket, "clips-test");
        assert_eq!(config.public_base_url, "https://clips-test.s3.amazonaws.com");

        unsafe {
            std::env::remove_var("MEDIA_BUCKET_NAME");
        }
    }
}
