use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identifier!(
    /// Identifier of a stored job application.
    ApplicationId
);
identifier!(
    /// Identifier of a scheduled interview.
    InterviewId
);
identifier!(
    /// Identifier of a job posting owned by the job directory.
    JobId
);
identifier!(
    /// Identifier handed out by the identity provider for employers and applicants.
    UserId
);

/// Authenticated caller as resolved by the upstream identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
    pub is_supervisor: bool,
}

impl Caller {
    pub const fn employer(id: i64) -> Self {
        Self {
            id: UserId(id),
            is_supervisor: true,
        }
    }

    pub const fn applicant(id: i64) -> Self {
        Self {
            id: UserId(id),
            is_supervisor: false,
        }
    }
}

/// Whether a job posting still takes applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Closed,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            _ => Err(UnknownVariant(raw.to_string())),
        }
    }
}

/// The slice of a job posting the hiring workflow needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub status: JobStatus,
    pub posted_by_id: UserId,
}

/// Where an application stands in the hiring funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    InterviewScheduled,
    InterviewCompleted,
    OfferExtended,
    OfferAccepted,
    OfferDeclined,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::InterviewCompleted,
        ApplicationStatus::OfferExtended,
        ApplicationStatus::OfferAccepted,
        ApplicationStatus::OfferDeclined,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::InterviewCompleted => "interview_completed",
            ApplicationStatus::OfferExtended => "offer_extended",
            ApplicationStatus::OfferAccepted => "offer_accepted",
            ApplicationStatus::OfferDeclined => "offer_declined",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| UnknownVariant(raw.to_string()))
    }
}

/// Format of a scheduled interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    Technical,
    Behavioral,
    Hr,
    SystemDesign,
    CultureFit,
}

impl InterviewType {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewType::Technical => "technical",
            InterviewType::Behavioral => "behavioral",
            InterviewType::Hr => "hr",
            InterviewType::SystemDesign => "system_design",
            InterviewType::CultureFit => "culture_fit",
        }
    }
}

impl FromStr for InterviewType {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(Self::Technical),
            "behavioral" => Ok(Self::Behavioral),
            "hr" => Ok(Self::Hr),
            "system_design" => Ok(Self::SystemDesign),
            "culture_fit" => Ok(Self::CultureFit),
            _ => Err(UnknownVariant(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

impl InterviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
            InterviewStatus::Rescheduled => "rescheduled",
        }
    }
}

impl FromStr for InterviewStatus {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "rescheduled" => Ok(Self::Rescheduled),
            _ => Err(UnknownVariant(raw.to_string())),
        }
    }
}

/// Raised when a stored or submitted label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

/// A candidate's application to a single job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub applicant_id: UserId,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume_url: String,
    pub offer_details: Option<String>,
    pub offer_salary: Option<Decimal>,
    pub offer_expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobApplication {
    /// Records a status change and bumps `updated_at`.
    pub fn transition(&mut self, status: ApplicationStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

/// Body of an apply request; the applicant comes from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub job_id: JobId,
    #[serde(default)]
    pub cover_letter: Option<String>,
    pub resume_url: String,
}

/// Fully attributed application handed to a repository for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub job_id: JobId,
    pub applicant_id: UserId,
    pub cover_letter: Option<String>,
    pub resume_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub id: InterviewId,
    pub application_id: ApplicationId,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub interview_type: InterviewType,
    pub notes: Option<String>,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scheduling request for a new interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewDraft {
    pub application_id: ApplicationId,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub interview_type: InterviewType,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial interview update. Absent fields are left untouched; the optional text fields
/// distinguish absent (`None`) from an explicit `null` (`Some(None)`), which clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewPatch {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    #[serde(deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<Option<String>>,
    pub interview_type: Option<InterviewType>,
    #[serde(deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    pub status: Option<InterviewStatus>,
}

/// Only runs when the key is present, so a `null` value becomes `Some(None)`.
fn supplied<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl InterviewPatch {
    pub fn apply_to(self, interview: &mut Interview, now: DateTime<Utc>) {
        if let Some(scheduled_at) = self.scheduled_at {
            interview.scheduled_at = scheduled_at;
        }
        if let Some(duration) = self.duration_minutes {
            interview.duration_minutes = duration;
        }
        if let Some(location) = self.location {
            interview.location = location;
        }
        if let Some(link) = self.meeting_link {
            interview.meeting_link = link;
        }
        if let Some(kind) = self.interview_type {
            interview.interview_type = kind;
        }
        if let Some(notes) = self.notes {
            interview.notes = notes;
        }
        if let Some(status) = self.status {
            interview.status = status;
        }
        interview.updated_at = now;
    }
}

/// Application with its job and interviews attached for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedApplication {
    #[serde(flatten)]
    pub application: JobApplication,
    pub job: JobSummary,
    pub interviews: Vec<Interview>,
}

/// Interview together with its parent application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewDetails {
    #[serde(flatten)]
    pub interview: Interview,
    pub application: JobApplication,
}
