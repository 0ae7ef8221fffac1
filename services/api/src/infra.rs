use axum::Router;
use job_board::config::StorageConfig;
use job_board::error::AppError;
use job_board::workflows::hiring::{
    hiring_router, HiringService, InMemoryHiringRepository, InMemoryJobDirectory, JobId,
    JobStatus, JobSummary, LifecyclePolicy, SqliteHiringRepository, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Postings served by the in-process job directory until the job service is wired in.
pub(crate) fn seed_jobs() -> Vec<JobSummary> {
    let posting = |id: i64, title: &str, status: JobStatus, owner: i64| JobSummary {
        id: JobId(id),
        title: title.to_string(),
        status,
        posted_by_id: UserId(owner),
    };

    vec![
        posting(1, "Backend Engineer", JobStatus::Active, 100),
        posting(2, "Product Designer", JobStatus::Active, 100),
        posting(3, "Data Platform Lead", JobStatus::Active, 101),
        posting(4, "QA Analyst", JobStatus::Closed, 101),
    ]
}

/// Builds the hiring routes on top of the configured store.
///
/// With a database path the SQLite file backs both applications and the job directory, and the
/// seed postings are upserted on every start.
pub(crate) fn hiring_routes(
    storage: &StorageConfig,
    policy: LifecyclePolicy,
) -> Result<Router, AppError> {
    match &storage.database_path {
        Some(path) => {
            let repository = Arc::new(SqliteHiringRepository::open(path)?);
            for job in seed_jobs() {
                repository.upsert_job(&job)?;
            }
            info!(path = %path.display(), "hiring store backed by sqlite");
            let service = HiringService::with_policy(repository.clone(), repository, policy);
            Ok(hiring_router(Arc::new(service)))
        }
        None => {
            let repository = Arc::new(InMemoryHiringRepository::default());
            let directory = Arc::new(InMemoryJobDirectory::with_jobs(seed_jobs()));
            info!("hiring store kept in memory");
            let service = HiringService::with_policy(repository, directory, policy);
            Ok(hiring_router(Arc::new(service)))
        }
    }
}
