use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{encryption::EncryptionService, queue::JobQueue, storage::ObjectStorage};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: Arc<ObjectStorage>,
    pub encryption: Arc<EncryptionService>,
    pub queue: Arc<JobQueue>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        storage: ObjectStorage,
        encryption: EncryptionService,
        queue: JobQueue,
    ) -> Self {
        Self {
            db,
            storage: Arc::new(storage),
            encryption: Arc::new(encryption),
            queue: Arc::new(queue),
        }
    }
}
