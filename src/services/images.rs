use std::future::Future;
use std::sync::Arc;

use crate::services::encryption::{EncryptionError, EncryptionService};
use crate::services::prompt::ImagePayload;
use crate::services::storage::{ObjectStorage, StorageError};

/// The image-loading collaborator: resolves an opaque image key to the
/// uploaded visual payload.
pub trait ImageSource: Send + Sync {
    fn fetch(
        &self,
        image_key: &str,
    ) -> impl Future<Output = Result<ImagePayload, ImageSourceError>> + Send;
}

/// Production image source: encrypted object storage.
///
/// Uploads are encrypted at rest; this downloads, decrypts, and sniffs the
/// content type from the decrypted bytes.
pub struct StoredImageSource {
    storage: Arc<ObjectStorage>,
    encryption: Arc<EncryptionService>,
}

impl StoredImageSource {
    pub fn new(storage: Arc<ObjectStorage>, encryption: Arc<EncryptionService>) -> Self {
        Self {
            storage,
            encryption,
        }
    }
}

impl ImageSource for StoredImageSource {
    async fn fetch(&self, image_key: &str) -> Result<ImagePayload, ImageSourceError> {
        let encrypted = self.storage.download(image_key).await?;
        let data = self.encryption.decrypt(&encrypted)?;

        let format = image::guess_format(&data)?;

        Ok(ImagePayload {
            mime_type: format.to_mime_type().to_string(),
            data,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageSourceError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("decryption error: {0}")]
    Decrypt(#[from] EncryptionError),

    #[error("stored object is not a recognized image: {0}")]
    UnknownFormat(#[from] image::ImageError),
}
