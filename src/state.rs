use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::db::DatabaseProxy;
use crate::services::email_provider::EmailService;
use crate::uploads::UploadStore;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db_proxy: Option<Arc<DatabaseProxy>>,
    email_service: Arc<EmailService>,
    upload_store: Arc<UploadStore>,
}

impl AppState {
    pub fn new(db_proxy: Option<Arc<DatabaseProxy>>, upload_store: UploadStore) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db_proxy,
            email_service: Arc::new(EmailService::from_env()),
            upload_store: Arc::new(upload_store),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    pub fn email_service(&self) -> Arc<EmailService> {
        Arc::clone(&self.email_service)
    }

    pub fn upload_store(&self) -> Arc<UploadStore> {
        Arc::clone(&self.upload_store)
    }
}
