use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{JobId, JobStatus, JobSummary};

/// Read-only view of the job postings owned by the job directory.
pub trait JobDirectory: Send + Sync {
    fn job(&self, id: JobId) -> Result<Option<JobSummary>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("job directory unavailable: {0}")]
    Unavailable(String),
}

/// Process-local directory used by the API service and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryJobDirectory {
    jobs: Arc<Mutex<HashMap<JobId, JobSummary>>>,
}

impl InMemoryJobDirectory {
    pub fn with_jobs(jobs: impl IntoIterator<Item = JobSummary>) -> Self {
        let jobs = jobs.into_iter().map(|job| (job.id, job)).collect();
        Self {
            jobs: Arc::new(Mutex::new(jobs)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<JobId, JobSummary>>, DirectoryError> {
        self.jobs
            .lock()
            .map_err(|_| DirectoryError::Unavailable("directory lock poisoned".to_string()))
    }

    pub fn upsert(&self, job: JobSummary) -> Result<(), DirectoryError> {
        self.lock()?.insert(job.id, job);
        Ok(())
    }

    /// Marks a posting closed. Returns false when the job is unknown.
    pub fn close(&self, id: JobId) -> Result<bool, DirectoryError> {
        Ok(match self.lock()?.get_mut(&id) {
            Some(job) => {
                job.status = JobStatus::Closed;
                true
            }
            None => false,
        })
    }
}

impl JobDirectory for InMemoryJobDirectory {
    fn job(&self, id: JobId) -> Result<Option<JobSummary>, DirectoryError> {
        Ok(self.lock()?.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::hiring::domain::UserId;

    fn posting(id: i64) -> JobSummary {
        JobSummary {
            id: JobId(id),
            title: "Support Engineer".to_string(),
            status: JobStatus::Active,
            posted_by_id: UserId(5),
        }
    }

    #[test]
    fn close_reports_unknown_jobs() {
        let directory = InMemoryJobDirectory::with_jobs([posting(1)]);

        assert!(directory.close(JobId(1)).expect("close"));
        assert!(!directory.close(JobId(2)).expect("close"));
        assert_eq!(
            directory.job(JobId(1)).expect("lookup").map(|job| job.status),
            Some(JobStatus::Closed)
        );
    }

    #[test]
    fn poisoned_directory_rejects_writes() {
        let directory = InMemoryJobDirectory::default();
        let jobs = directory.jobs.clone();
        let outcome = std::thread::spawn(move || {
            let _guard = jobs.lock().expect("first lock succeeds");
            panic!("writer died while holding the lock");
        })
        .join();
        assert!(outcome.is_err());

        assert!(matches!(
            directory.upsert(posting(3)),
            Err(DirectoryError::Unavailable(_))
        ));
        assert!(matches!(
            directory.close(JobId(3)),
            Err(DirectoryError::Unavailable(_))
        ));
        assert!(directory.job(JobId(3)).is_err());
    }
}
