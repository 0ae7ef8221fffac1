use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::domain::{
    ApplicationDraft, ApplicationId, Interview, InterviewDraft, InterviewId, JobApplication, JobId,
    UserId,
};

/// Storage abstraction for applications and their interviews.
///
/// Every `modify_*`/`insert_interview` call is one atomic unit: the closure sees the current
/// rows, and its changes are committed only when it returns `Ok`. An `Err` from the closure
/// leaves storage untouched and is handed back to the caller as-is. `None` means the target
/// row does not exist.
pub trait HiringRepository: Send + Sync {
    /// Inserts a `pending` application. Fails with [`RepositoryError::Conflict`] when the
    /// `(job_id, applicant_id)` pair is already taken.
    fn insert_application(
        &self,
        draft: ApplicationDraft,
        now: DateTime<Utc>,
    ) -> Result<JobApplication, RepositoryError>;

    fn application(&self, id: ApplicationId) -> Result<Option<JobApplication>, RepositoryError>;

    fn application_exists(
        &self,
        job_id: JobId,
        applicant_id: UserId,
    ) -> Result<bool, RepositoryError>;

    /// Applications for a job, newest first.
    fn applications_for_job(&self, job_id: JobId) -> Result<Vec<JobApplication>, RepositoryError>;

    /// Applications submitted by an applicant, newest first.
    fn applications_for_applicant(
        &self,
        applicant_id: UserId,
    ) -> Result<Vec<JobApplication>, RepositoryError>;

    fn modify_application<E, F>(
        &self,
        id: ApplicationId,
        mutate: F,
    ) -> Result<Option<JobApplication>, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut JobApplication) -> Result<(), E>;

    /// Stores a new interview and lets `couple` adjust the parent application in the same
    /// unit of work.
    fn insert_interview<E, F>(
        &self,
        draft: InterviewDraft,
        now: DateTime<Utc>,
        couple: F,
    ) -> Result<Option<(Interview, JobApplication)>, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut JobApplication) -> Result<(), E>;

    fn modify_interview<E, F>(
        &self,
        id: InterviewId,
        mutate: F,
    ) -> Result<Option<(Interview, JobApplication)>, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut Interview, &mut JobApplication) -> Result<(), E>;

    fn interview(&self, id: InterviewId) -> Result<Option<Interview>, RepositoryError>;

    /// Interviews for an application ordered by `scheduled_at` ascending.
    fn interviews_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError>;

    /// Batched variant used when resolving application listings.
    fn interviews_for_applications(
        &self,
        ids: &[ApplicationId],
    ) -> Result<HashMap<ApplicationId, Vec<Interview>>, RepositoryError> {
        let mut grouped = HashMap::with_capacity(ids.len());
        for &id in ids {
            grouped.insert(id, self.interviews_for_application(id)?);
        }
        Ok(grouped)
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("stored row is malformed: {0}")]
    Corrupt(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
