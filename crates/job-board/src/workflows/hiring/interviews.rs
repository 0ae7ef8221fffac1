use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::directory::JobDirectory;
use super::domain::{
    ApplicationId, ApplicationStatus, Caller, Interview, InterviewDetails, InterviewDraft,
    InterviewId, InterviewPatch, InterviewStatus, JobApplication,
};
use super::lifecycle::LifecyclePolicy;
use super::repository::HiringRepository;
use super::service::{HiringError, HiringService};

/// Applies the interview-driven status write allowed by `policy`.
fn couple_status(
    policy: LifecyclePolicy,
    application: &mut JobApplication,
    target: ApplicationStatus,
    now: DateTime<Utc>,
) {
    match policy.coupled_status(application.status, target) {
        Some(status) => application.transition(status, now),
        None => debug!(
            application_id = %application.id,
            current = %application.status,
            skipped = %target,
            "interview event would regress application; status left as is"
        ),
    }
}

impl<R, D> HiringService<R, D>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    /// Schedule an interview and move the application to `interview_scheduled` in the same
    /// unit of work.
    pub fn schedule_interview(
        &self,
        caller: &Caller,
        draft: InterviewDraft,
    ) -> Result<Interview, HiringError> {
        if draft.duration_minutes == 0 {
            return Err(HiringError::InvalidDuration);
        }

        let application_id = draft.application_id;
        self.owned_application(
            caller,
            application_id,
            "only the employer who posted the job can schedule interviews",
        )?;

        let policy = self.policy;
        let now = Utc::now();
        let (interview, application) = self
            .repository
            .insert_interview(draft, now, |application| -> Result<(), HiringError> {
                couple_status(policy, application, ApplicationStatus::InterviewScheduled, now);
                Ok(())
            })?
            .ok_or(HiringError::ApplicationNotFound(application_id))?;

        info!(
            interview_id = %interview.id,
            %application_id,
            application_status = %application.status,
            scheduled_at = %interview.scheduled_at,
            "interview scheduled"
        );
        Ok(interview)
    }

    /// Partial update. Marking the interview `completed` moves the application to
    /// `interview_completed` atomically with the interview change.
    pub fn update_interview(
        &self,
        caller: &Caller,
        interview_id: InterviewId,
        patch: InterviewPatch,
    ) -> Result<Interview, HiringError> {
        if patch.duration_minutes == Some(0) {
            return Err(HiringError::InvalidDuration);
        }

        let existing = self
            .repository
            .interview(interview_id)?
            .ok_or(HiringError::InterviewNotFound(interview_id))?;
        self.owned_application(
            caller,
            existing.application_id,
            "only the employer who posted the job can update interviews",
        )?;

        let policy = self.policy;
        let now = Utc::now();
        let completes = patch.status == Some(InterviewStatus::Completed);
        let (interview, application) = self
            .repository
            .modify_interview(interview_id, |interview, application| -> Result<(), HiringError> {
                patch.apply_to(interview, now);
                if completes {
                    couple_status(policy, application, ApplicationStatus::InterviewCompleted, now);
                }
                Ok(())
            })?
            .ok_or(HiringError::InterviewNotFound(interview_id))?;

        info!(
            interview_id = %interview.id,
            interview_status = interview.status.label(),
            application_status = %application.status,
            "interview updated"
        );
        Ok(interview)
    }

    /// Interview with its parent application, for the owning employer or the applicant.
    pub fn interview(
        &self,
        caller: &Caller,
        interview_id: InterviewId,
    ) -> Result<InterviewDetails, HiringError> {
        let interview = self
            .repository
            .interview(interview_id)?
            .ok_or(HiringError::InterviewNotFound(interview_id))?;
        let application = self.load(interview.application_id)?;
        self.ensure_participant(caller, &application)?;
        Ok(InterviewDetails {
            interview,
            application,
        })
    }

    /// Interviews for an application in scheduled order.
    pub fn interviews_for_application(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
    ) -> Result<Vec<Interview>, HiringError> {
        let application = self.load(application_id)?;
        self.ensure_participant(caller, &application)?;
        Ok(self.repository.interviews_for_application(application_id)?)
    }
}
