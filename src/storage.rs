//! Object storage for uploaded images.

use anyhow::{Context, Result};
use object_store::{
    gcp::GoogleCloudStorageBuilder, local::LocalFileSystem, memory::InMemory, path::Path,
    Attribute, ObjectStore, PutOptions,
};
use std::{sync::Arc, time::Duration};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::NailError;
use crate::predictor::Upload;

/// A bucket that serves its blobs at `{public_url_base}/{bucket}/{name}`.
pub(crate) struct BlobStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    public_url_base: String,
    timeout: Duration,
    /// Only GCS is asked to keep the content type; the other backends don't store attributes.
    keep_content_type: bool,
}

impl BlobStore {
    pub(crate) fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        public_url_base: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        BlobStore {
            store,
            bucket: bucket.into(),
            public_url_base: public_url_base.into(),
            timeout,
            keep_content_type: false,
        }
    }

    /// Build the store the config asks for.
    pub(crate) fn try_from_config(config: &StorageConfig) -> Result<Self> {
        let (store, keep_content_type): (Arc<dyn ObjectStore>, bool) = match &config.backend {
            StorageBackend::Gcs => {
                let gcs = GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(&config.bucket)
                    .build()
                    .with_context(|| format!("Failed to open GCS bucket {}", config.bucket))?;
                (Arc::new(gcs), true)
            }
            StorageBackend::Local(root) => {
                std::fs::create_dir_all(root)
                    .with_context(|| format!("Failed to create {}", root.display()))?;
                let local = LocalFileSystem::new_with_prefix(root)
                    .with_context(|| format!("Failed to open {}", root.display()))?;
                (Arc::new(local), false)
            }
            StorageBackend::Memory => (Arc::new(InMemory::new()), false),
        };

        Ok(BlobStore {
            keep_content_type,
            ..BlobStore::new(
                store,
                &config.bucket,
                &config.public_url_base,
                config.timeout,
            )
        })
    }

    pub(crate) fn public_url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.public_url_base, self.bucket, name)
    }

    /// Write `upload` under `name` and return its public URL.
    pub(crate) async fn put(&self, name: &str, upload: &Upload) -> Result<String, NailError> {
        let location = Path::from(name);

        let mut opts = PutOptions::default();
        if self.keep_content_type {
            if let Some(content_type) = &upload.content_type {
                opts.attributes
                    .insert(Attribute::ContentType, content_type.clone().into());
            }
        }

        let put = self
            .store
            .put_opts(&location, upload.bytes.clone().into(), opts);
        match tokio::time::timeout(self.timeout, put).await {
            Ok(result) => {
                result?;
            }
            Err(_) => return Err(NailError::StorageTimeout),
        }

        tracing::debug!("Stored blob {} ({} bytes)", name, upload.bytes.len());
        Ok(self.public_url(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[tokio::test]
    async fn put_writes_bytes_and_returns_public_url() {
        let memory = Arc::new(InMemory::new());
        let blobs = BlobStore::new(
            memory.clone(),
            "nail-bucket",
            "https://storage.googleapis.com",
            Duration::from_secs(5),
        );
        let upload = Upload {
            file_name: "nail.png".into(),
            content_type: Some("image/png".into()),
            bytes: Bytes::from_static(b"\x89PNG not really"),
        };

        let url = blobs.put("1700000000000-abcdef.png", &upload).await.unwrap();
        assert_eq!(
            url,
            "https://storage.googleapis.com/nail-bucket/1700000000000-abcdef.png"
        );

        let stored = memory
            .get(&Path::from("1700000000000-abcdef.png"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(stored, upload.bytes);
    }

    #[test]
    fn memory_backend_from_config() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            bucket: "uploads".into(),
            public_url_base: "http://localhost:3000".into(),
            timeout: Duration::from_secs(1),
        };
        let blobs = BlobStore::try_from_config(&config).unwrap();
        assert_eq!(blobs.public_url("a.jpg"), "http://localhost:3000/uploads/a.jpg");
    }
}
