use std::sync::Arc;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::directory::JobDirectory;
use super::domain::{
    ApplicationId, ApplicationRequest, Caller, Interview, InterviewDetails, InterviewDraft,
    InterviewId, InterviewPatch, JobApplication, JobId, ResolvedApplication, UserId,
};
use super::offers::OfferTerms;
use super::repository::HiringRepository;
use super::service::{HiringError, HiringService};

/// Header carrying the authenticated user id, set by the upstream identity provider.
pub const CALLER_ID_HEADER: &str = "x-caller-id";
/// Header carrying the caller's supervisor (employer) flag.
pub const CALLER_SUPERVISOR_HEADER: &str = "x-caller-supervisor";

type SharedService<R, D> = State<Arc<HiringService<R, D>>>;

/// Router builder exposing the application, offer, and interview endpoints.
pub fn hiring_router<R, D>(service: Arc<HiringService<R, D>>) -> Router
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(apply_handler::<R, D>))
        .route(
            "/api/v1/applications/mine",
            get(my_applications_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/job/:job_id",
            get(job_applications_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/check/:job_id",
            get(check_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(status_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id/offer",
            post(offer_handler::<R, D>),
        )
        .route(
            "/api/v1/applications/:application_id/offer/respond",
            post(respond_handler::<R, D>),
        )
        .route("/api/v1/interviews", post(schedule_handler::<R, D>))
        .route(
            "/api/v1/interviews/:interview_id",
            get(interview_handler::<R, D>).patch(update_interview_handler::<R, D>),
        )
        .route(
            "/api/v1/interviews/application/:application_id",
            get(application_interviews_handler::<R, D>),
        )
        .with_state(service)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.trim().to_ascii_lowercase())
        };

        let id = header(CALLER_ID_HEADER)
            .and_then(|raw| raw.parse::<i64>().ok())
            .ok_or_else(|| {
                let payload = json!({ "error": "missing or invalid caller identity" });
                (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
            })?;
        let is_supervisor = header(CALLER_SUPERVISOR_HEADER)
            .map(|raw| matches!(raw.as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(Caller {
            id: UserId(id),
            is_supervisor,
        })
    }
}

/// JSON body extractor whose rejections use the same `{"error": ...}` shape as
/// [`HiringError`] responses.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(body_rejection(rejection)),
        }
    }
}

fn body_rejection(rejection: JsonRejection) -> Response {
    let status = match rejection {
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    let payload = json!({ "error": rejection.body_text() });
    (status, Json(payload)).into_response()
}

impl HiringError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HiringError::JobNotFound(_)
            | HiringError::ApplicationNotFound(_)
            | HiringError::InterviewNotFound(_) => StatusCode::NOT_FOUND,
            HiringError::Forbidden(_) => StatusCode::FORBIDDEN,
            HiringError::DuplicateApplication
            | HiringError::JobNotAcceptingApplications
            | HiringError::InvalidStatus(_)
            | HiringError::IllegalTransition { .. }
            | HiringError::NoActiveOffer
            | HiringError::OfferExpired
            | HiringError::InvalidDuration => StatusCode::BAD_REQUEST,
            HiringError::Repository(_) | HiringError::Directory(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HiringError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "hiring operation failed");
        }
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OfferResponseRequest {
    pub accept: bool,
}

pub(crate) async fn apply_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    JsonBody(request): JsonBody<ApplicationRequest>,
) -> Result<(StatusCode, Json<JobApplication>), HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    let application = service.apply(&caller, request)?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn my_applications_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
) -> Result<Json<Vec<ResolvedApplication>>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    Ok(Json(service.applications_for_applicant(caller.id)?))
}

pub(crate) async fn job_applications_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    Path(job_id): Path<JobId>,
) -> Result<Json<Vec<ResolvedApplication>>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    Ok(Json(service.applications_for_job(&caller, job_id)?))
}

pub(crate) async fn check_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    Path(job_id): Path<JobId>,
) -> Result<Json<bool>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    if caller.is_supervisor {
        return Err(HiringError::Forbidden("employers cannot apply for jobs"));
    }
    Ok(Json(service.has_applied(job_id, caller.id)?))
}

pub(crate) async fn application_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    Path(application_id): Path<ApplicationId>,
) -> Result<Json<ResolvedApplication>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    Ok(Json(service.application(&caller, application_id)?))
}

pub(crate) async fn status_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    Path(application_id): Path<ApplicationId>,
    JsonBody(request): JsonBody<StatusUpdateRequest>,
) -> Result<Json<ResolvedApplication>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    if !caller.is_supervisor {
        return Err(HiringError::Forbidden(
            "only employers can update application status",
        ));
    }
    Ok(Json(service.update_status(
        &caller,
        application_id,
        &request.status,
    )?))
}

pub(crate) async fn offer_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    Path(application_id): Path<ApplicationId>,
    JsonBody(terms): JsonBody<OfferTerms>,
) -> Result<Json<JobApplication>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    Ok(Json(service.extend_offer(&caller, application_id, terms)?))
}

pub(crate) async fn respond_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    Path(application_id): Path<ApplicationId>,
    JsonBody(request): JsonBody<OfferResponseRequest>,
) -> Result<Json<JobApplication>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    Ok(Json(service.respond_to_offer(
        &caller,
        application_id,
        request.accept,
    )?))
}

pub(crate) async fn schedule_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    JsonBody(draft): JsonBody<InterviewDraft>,
) -> Result<(StatusCode, Json<Interview>), HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    let interview = service.schedule_interview(&caller, draft)?;
    Ok((StatusCode::CREATED, Json(interview)))
}

pub(crate) async fn interview_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    Path(interview_id): Path<InterviewId>,
) -> Result<Json<InterviewDetails>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    Ok(Json(service.interview(&caller, interview_id)?))
}

pub(crate) async fn update_interview_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    Path(interview_id): Path<InterviewId>,
    JsonBody(patch): JsonBody<InterviewPatch>,
) -> Result<Json<Interview>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    Ok(Json(service.update_interview(&caller, interview_id, patch)?))
}

pub(crate) async fn application_interviews_handler<R, D>(
    State(service): SharedService<R, D>,
    caller: Caller,
    Path(application_id): Path<ApplicationId>,
) -> Result<Json<Vec<Interview>>, HiringError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    Ok(Json(
        service.interviews_for_application(&caller, application_id)?,
    ))
}
