use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::workflows::hiring::domain::{
    ApplicationDraft, ApplicationId, ApplicationRequest, ApplicationStatus, Caller, Interview,
    InterviewDraft, InterviewId, InterviewPatch, InterviewStatus, InterviewType, JobApplication,
    JobId, JobStatus, JobSummary, UserId,
};
use crate::workflows::hiring::repository::{HiringRepository, RepositoryError};
use crate::workflows::hiring::{
    hiring_router, HiringService, InMemoryHiringRepository, InMemoryJobDirectory,
    LifecyclePolicy, OfferTerms, SqliteHiringRepository, CALLER_ID_HEADER,
    CALLER_SUPERVISOR_HEADER,
};

pub(super) const EMPLOYER: Caller = Caller::employer(10);
pub(super) const OTHER_EMPLOYER: Caller = Caller::employer(11);
pub(super) const APPLICANT: Caller = Caller::applicant(20);
pub(super) const OTHER_APPLICANT: Caller = Caller::applicant(21);

pub(super) const ACTIVE_JOB: JobId = JobId(1);
pub(super) const CLOSED_JOB: JobId = JobId(2);
pub(super) const OTHER_EMPLOYER_JOB: JobId = JobId(3);
pub(super) const MISSING_JOB: JobId = JobId(99);

pub(super) fn jobs() -> Vec<JobSummary> {
    vec![
        JobSummary {
            id: ACTIVE_JOB,
            title: "Backend Engineer".to_string(),
            status: JobStatus::Active,
            posted_by_id: EMPLOYER.id,
        },
        JobSummary {
            id: CLOSED_JOB,
            title: "Data Analyst".to_string(),
            status: JobStatus::Closed,
            posted_by_id: EMPLOYER.id,
        },
        JobSummary {
            id: OTHER_EMPLOYER_JOB,
            title: "Site Reliability Engineer".to_string(),
            status: JobStatus::Active,
            posted_by_id: OTHER_EMPLOYER.id,
        },
    ]
}

pub(super) fn directory() -> Arc<InMemoryJobDirectory> {
    Arc::new(InMemoryJobDirectory::with_jobs(jobs()))
}

pub(super) type MemoryService = HiringService<InMemoryHiringRepository, InMemoryJobDirectory>;
pub(super) type SqliteService = HiringService<SqliteHiringRepository, InMemoryJobDirectory>;

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryHiringRepository>) {
    build_service_with_policy(LifecyclePolicy::default())
}

pub(super) fn build_service_with_policy(
    policy: LifecyclePolicy,
) -> (MemoryService, Arc<InMemoryHiringRepository>) {
    let repository = Arc::new(InMemoryHiringRepository::default());
    let service = HiringService::with_policy(repository.clone(), directory(), policy);
    (service, repository)
}

pub(super) fn build_sqlite_service() -> (SqliteService, Arc<SqliteHiringRepository>) {
    let repository =
        Arc::new(SqliteHiringRepository::open_in_memory().expect("sqlite opens in memory"));
    let service = HiringService::new(repository.clone(), directory());
    (service, repository)
}

pub(super) fn application_request(job_id: JobId) -> ApplicationRequest {
    ApplicationRequest {
        job_id,
        cover_letter: Some("I have shipped three payment platforms.".to_string()),
        resume_url: "https://files.example.com/resumes/20.pdf".to_string(),
    }
}

pub(super) fn submit<R>(service: &HiringService<R, InMemoryJobDirectory>) -> JobApplication
where
    R: HiringRepository + 'static,
{
    service
        .apply(&APPLICANT, application_request(ACTIVE_JOB))
        .expect("applicant can apply to active job")
}

pub(super) fn interview_draft(application_id: ApplicationId) -> InterviewDraft {
    InterviewDraft {
        application_id,
        scheduled_at: Utc::now() + Duration::days(3),
        duration_minutes: 45,
        interview_type: InterviewType::Technical,
        location: None,
        meeting_link: Some("https://meet.example.com/abc".to_string()),
        notes: None,
    }
}

pub(super) fn offer_terms(expiry: Option<DateTime<Utc>>) -> OfferTerms {
    OfferTerms {
        offer_details: "Full-time, remote, 25 days PTO".to_string(),
        offer_salary: Decimal::new(90000, 0),
        offer_expiry_date: expiry,
    }
}

pub(super) fn completed() -> InterviewPatch {
    InterviewPatch {
        status: Some(InterviewStatus::Completed),
        ..InterviewPatch::default()
    }
}

/// Walks an application from `pending` to `offer_accepted`, asserting each step.
pub(super) fn drive_happy_path<R>(service: &HiringService<R, InMemoryJobDirectory>)
where
    R: HiringRepository + 'static,
{
    let application = submit(service);
    assert_eq!(application.status, ApplicationStatus::Pending);

    let reviewed = service
        .update_status(&EMPLOYER, application.id, "under_review")
        .expect("owner can review");
    assert_eq!(reviewed.application.status, ApplicationStatus::UnderReview);

    let interview = service
        .schedule_interview(&EMPLOYER, interview_draft(application.id))
        .expect("interview scheduled");
    assert_eq!(interview.status, InterviewStatus::Scheduled);
    assert_eq!(
        status_of(service, application.id),
        ApplicationStatus::InterviewScheduled
    );

    service
        .update_interview(&EMPLOYER, interview.id, completed())
        .expect("interview completed");
    assert_eq!(
        status_of(service, application.id),
        ApplicationStatus::InterviewCompleted
    );

    let offered = service
        .extend_offer(
            &EMPLOYER,
            application.id,
            offer_terms(Some(Utc::now() + Duration::days(1))),
        )
        .expect("offer extended");
    assert_eq!(offered.status, ApplicationStatus::OfferExtended);
    assert_eq!(offered.offer_salary, Some(Decimal::new(90000, 0)));

    let accepted = service
        .respond_to_offer(&APPLICANT, application.id, true)
        .expect("offer accepted");
    assert_eq!(accepted.status, ApplicationStatus::OfferAccepted);
}

pub(super) fn status_of<R>(
    service: &HiringService<R, InMemoryJobDirectory>,
    id: ApplicationId,
) -> ApplicationStatus
where
    R: HiringRepository + 'static,
{
    service
        .application(&EMPLOYER, id)
        .expect("application visible to owner")
        .application
        .status
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    hiring_router(Arc::new(service))
}

pub(super) fn request_as(
    caller: Caller,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Request<axum::body::Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CALLER_ID_HEADER, caller.id.0.to_string())
        .header(CALLER_SUPERVISOR_HEADER, caller.is_supervisor.to_string());
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(
                serde_json::to_vec(&body).expect("json body"),
            ))
            .expect("request builds"),
        None => builder
            .body(axum::body::Body::empty())
            .expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

impl HiringRepository for UnavailableRepository {
    fn insert_application(
        &self,
        _draft: ApplicationDraft,
        _now: DateTime<Utc>,
    ) -> Result<JobApplication, RepositoryError> {
        Err(offline())
    }

    fn application(&self, _id: ApplicationId) -> Result<Option<JobApplication>, RepositoryError> {
        Err(offline())
    }

    fn application_exists(
        &self,
        _job_id: JobId,
        _applicant_id: UserId,
    ) -> Result<bool, RepositoryError> {
        Err(offline())
    }

    fn applications_for_job(
        &self,
        _job_id: JobId,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        Err(offline())
    }

    fn applications_for_applicant(
        &self,
        _applicant_id: UserId,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        Err(offline())
    }

    fn modify_application<E, F>(
        &self,
        _id: ApplicationId,
        _mutate: F,
    ) -> Result<Option<JobApplication>, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut JobApplication) -> Result<(), E>,
    {
        Err(offline().into())
    }

    fn insert_interview<E, F>(
        &self,
        _draft: InterviewDraft,
        _now: DateTime<Utc>,
        _couple: F,
    ) -> Result<Option<(Interview, JobApplication)>, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut JobApplication) -> Result<(), E>,
    {
        Err(offline().into())
    }

    fn modify_interview<E, F>(
        &self,
        _id: InterviewId,
        _mutate: F,
    ) -> Result<Option<(Interview, JobApplication)>, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut Interview, &mut JobApplication) -> Result<(), E>,
    {
        Err(offline().into())
    }

    fn interview(&self, _id: InterviewId) -> Result<Option<Interview>, RepositoryError> {
        Err(offline())
    }

    fn interviews_for_application(
        &self,
        _application_id: ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        Err(offline())
    }

    fn interviews_for_applications(
        &self,
        _ids: &[ApplicationId],
    ) -> Result<HashMap<ApplicationId, Vec<Interview>>, RepositoryError> {
        Err(offline())
    }
}
