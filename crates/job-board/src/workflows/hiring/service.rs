use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::directory::{DirectoryError, JobDirectory};
use super::domain::{
    ApplicationDraft, ApplicationId, ApplicationRequest, ApplicationStatus, Caller,
    InterviewId, JobApplication, JobId, JobStatus, JobSummary, ResolvedApplication, UserId,
};
use super::lifecycle::LifecyclePolicy;
use super::repository::{HiringRepository, RepositoryError};

/// Service composing the application repository, the job directory, and the lifecycle policy.
///
/// Offer negotiation and interview scheduling live in sibling modules as further `impl`
/// blocks on this type, since both mutate the same application rows.
pub struct HiringService<R, D> {
    pub(super) repository: Arc<R>,
    directory: Arc<D>,
    pub(super) policy: LifecyclePolicy,
}

impl<R, D> HiringService<R, D>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    pub fn new(repository: Arc<R>, directory: Arc<D>) -> Self {
        Self::with_policy(repository, directory, LifecyclePolicy::default())
    }

    pub fn with_policy(repository: Arc<R>, directory: Arc<D>, policy: LifecyclePolicy) -> Self {
        Self {
            repository,
            directory,
            policy,
        }
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    /// Submit an application on behalf of an applicant. The new record starts `pending`.
    pub fn apply(
        &self,
        caller: &Caller,
        request: ApplicationRequest,
    ) -> Result<JobApplication, HiringError> {
        if caller.is_supervisor {
            return Err(HiringError::Forbidden("employers cannot apply for jobs"));
        }

        if self.repository.application_exists(request.job_id, caller.id)? {
            warn!(job_id = %request.job_id, applicant_id = %caller.id, "duplicate application rejected");
            return Err(HiringError::DuplicateApplication);
        }

        let job = self.job(request.job_id)?;
        if job.status != JobStatus::Active {
            return Err(HiringError::JobNotAcceptingApplications);
        }

        let draft = ApplicationDraft {
            job_id: job.id,
            applicant_id: caller.id,
            cover_letter: request.cover_letter,
            resume_url: request.resume_url,
        };

        // The pair check above is advisory; the store's uniqueness constraint settles races.
        let application = self
            .repository
            .insert_application(draft, Utc::now())
            .map_err(|err| match err {
                RepositoryError::Conflict => HiringError::DuplicateApplication,
                other => HiringError::Repository(other),
            })?;

        info!(
            application_id = %application.id,
            job_id = %application.job_id,
            applicant_id = %application.applicant_id,
            "application submitted"
        );
        Ok(application)
    }

    /// Whether the applicant already holds an application for the job.
    pub fn has_applied(&self, job_id: JobId, applicant_id: UserId) -> Result<bool, HiringError> {
        Ok(self.repository.application_exists(job_id, applicant_id)?)
    }

    /// Employer status update taking the raw label from the presentation layer.
    pub fn update_status(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
        new_status: &str,
    ) -> Result<ResolvedApplication, HiringError> {
        let status = new_status
            .parse::<ApplicationStatus>()
            .map_err(|_| HiringError::InvalidStatus(new_status.to_string()))?;
        self.set_status(caller, application_id, status)
    }

    pub fn set_status(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ResolvedApplication, HiringError> {
        let (_, job) = self.owned_application(
            caller,
            application_id,
            "you can only update applications for jobs you posted",
        )?;

        let policy = self.policy;
        let mut previous = status;
        let updated = self
            .repository
            .modify_application(application_id, |application| -> Result<(), HiringError> {
                if !policy.permits_update(application.status, status) {
                    return Err(HiringError::IllegalTransition {
                        from: application.status,
                        to: status,
                    });
                }
                previous = application.status;
                application.transition(status, Utc::now());
                Ok(())
            })?
            .ok_or(HiringError::ApplicationNotFound(application_id))?;

        info!(
            application_id = %updated.id,
            from = %previous,
            to = %updated.status,
            "application status updated"
        );
        self.resolve_with_job(updated, job)
    }

    /// Single application, visible to the owning employer and the applicant.
    pub fn application(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
    ) -> Result<ResolvedApplication, HiringError> {
        let application = self.load(application_id)?;
        let job = self.ensure_participant(caller, &application)?;
        self.resolve_with_job(application, job)
    }

    /// Applications for a job, newest first. Only the employer who posted the job may list them.
    pub fn applications_for_job(
        &self,
        caller: &Caller,
        job_id: JobId,
    ) -> Result<Vec<ResolvedApplication>, HiringError> {
        let job = self.job(job_id)?;
        if !caller.is_supervisor || job.posted_by_id != caller.id {
            return Err(HiringError::Forbidden(
                "you can only view applications for jobs you posted",
            ));
        }

        let applications = self.repository.applications_for_job(job_id)?;
        debug!(%job_id, count = applications.len(), "listing applications for job");
        self.resolve(applications)
    }

    /// Applications submitted by an applicant, newest first.
    pub fn applications_for_applicant(
        &self,
        applicant_id: UserId,
    ) -> Result<Vec<ResolvedApplication>, HiringError> {
        let applications = self.repository.applications_for_applicant(applicant_id)?;
        debug!(%applicant_id, count = applications.len(), "listing applications for applicant");
        self.resolve(applications)
    }

    pub(super) fn job(&self, job_id: JobId) -> Result<JobSummary, HiringError> {
        self.directory
            .job(job_id)?
            .ok_or(HiringError::JobNotFound(job_id))
    }

    pub(super) fn load(&self, application_id: ApplicationId) -> Result<JobApplication, HiringError> {
        self.repository
            .application(application_id)?
            .ok_or(HiringError::ApplicationNotFound(application_id))
    }

    /// Loads an application and checks the caller posted its job.
    pub(super) fn owned_application(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
        denial: &'static str,
    ) -> Result<(JobApplication, JobSummary), HiringError> {
        let application = self.load(application_id)?;
        let job = self.job(application.job_id)?;
        if !caller.is_supervisor || job.posted_by_id != caller.id {
            warn!(%application_id, caller_id = %caller.id, "caller does not own the job");
            return Err(HiringError::Forbidden(denial));
        }
        Ok((application, job))
    }

    /// Owning employer or the application's own applicant.
    pub(super) fn ensure_participant(
        &self,
        caller: &Caller,
        application: &JobApplication,
    ) -> Result<JobSummary, HiringError> {
        let job = self.job(application.job_id)?;
        let is_owner = caller.is_supervisor && job.posted_by_id == caller.id;
        if is_owner || caller.id == application.applicant_id {
            Ok(job)
        } else {
            Err(HiringError::Forbidden(
                "you don't have permission to view this application",
            ))
        }
    }

    fn resolve_with_job(
        &self,
        application: JobApplication,
        job: JobSummary,
    ) -> Result<ResolvedApplication, HiringError> {
        let interviews = self.repository.interviews_for_application(application.id)?;
        Ok(ResolvedApplication {
            application,
            job,
            interviews,
        })
    }

    fn resolve(
        &self,
        applications: Vec<JobApplication>,
    ) -> Result<Vec<ResolvedApplication>, HiringError> {
        let ids: Vec<ApplicationId> = applications.iter().map(|application| application.id).collect();
        let mut interviews = self.repository.interviews_for_applications(&ids)?;
        let mut jobs: HashMap<JobId, JobSummary> = HashMap::new();

        applications
            .into_iter()
            .map(|application| -> Result<ResolvedApplication, HiringError> {
                let job = match jobs.get(&application.job_id) {
                    Some(job) => job.clone(),
                    None => {
                        let job = self.job(application.job_id)?;
                        jobs.insert(job.id, job.clone());
                        job
                    }
                };
                let interviews = interviews.remove(&application.id).unwrap_or_default();
                Ok(ResolvedApplication {
                    application,
                    job,
                    interviews,
                })
            })
            .collect()
    }
}

/// Error raised by the hiring workflow.
#[derive(Debug, thiserror::Error)]
pub enum HiringError {
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("interview {0} not found")]
    InterviewNotFound(InterviewId),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("you have already applied for this job")]
    DuplicateApplication,
    #[error("this job is no longer accepting applications")]
    JobNotAcceptingApplications,
    #[error("invalid status value '{0}'")]
    InvalidStatus(String),
    #[error("cannot move an application from {from} to {to}")]
    IllegalTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("no offer to respond to")]
    NoActiveOffer,
    #[error("offer has expired")]
    OfferExpired,
    #[error("interview duration must be at least one minute")]
    InvalidDuration,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
