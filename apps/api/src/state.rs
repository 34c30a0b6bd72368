use std::sync::Arc;

use crate::config::Config;
use crate::profile::storage::ResumeStorage;
use crate::profile::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Profile persistence. Postgres in production, in-memory for local runs and tests.
    pub profiles: Arc<dyn ProfileStore>,
    /// Original resume PDFs, kept for re-parsing.
    pub resumes: Arc<dyn ResumeStorage>,
    /// Used to fetch resumes by URL; carries the fetch timeout.
    pub http: reqwest::Client,
    pub config: Config,
}

#[cfg(test)]
impl AppState {
    /// In-memory state; the concrete stores are returned for inspection.
    pub fn for_tests() -> (
        Self,
        Arc<crate::profile::store::InMemoryProfileStore>,
        Arc<crate::profile::storage::InMemoryResumeStorage>,
    ) {
        use crate::config::StoreBackend;
        use crate::profile::storage::InMemoryResumeStorage;
        use crate::profile::store::InMemoryProfileStore;

        let config = Config {
            profile_store: StoreBackend::Memory,
            database_url: None,
            s3_bucket: "resumes-test".to_string(),
            s3_endpoint: "http://127.0.0.1:9".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            max_resume_bytes: 1024 * 1024,
            resume_fetch_timeout_secs: 1,
        };
        let profiles = Arc::new(InMemoryProfileStore::new());
        let resumes = Arc::new(InMemoryResumeStorage::new());
        let state = AppState {
            profiles: profiles.clone(),
            resumes: resumes.clone(),
            http: reqwest::Client::new(),
            config,
        };
        (state, profiles, resumes)
    }
}
