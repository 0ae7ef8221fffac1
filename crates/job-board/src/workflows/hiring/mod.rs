//! Hiring pipeline: application lifecycle, interview scheduling, and offer negotiation.
//!
//! The job directory and caller identity are external collaborators; this module trusts the
//! [`Caller`] it is handed and only reads job status and ownership through [`JobDirectory`].

pub mod directory;
pub mod domain;
pub mod interviews;
pub mod lifecycle;
pub mod offers;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use directory::{DirectoryError, InMemoryJobDirectory, JobDirectory};
pub use domain::{
    ApplicationId, ApplicationRequest, ApplicationStatus, Caller, Interview, InterviewDetails,
    InterviewDraft, InterviewId, InterviewPatch, InterviewStatus, InterviewType, JobApplication,
    JobId, JobStatus, JobSummary, ResolvedApplication, UserId,
};
pub use lifecycle::{InterviewStatusWrites, LifecyclePolicy, TransitionMode};
pub use offers::OfferTerms;
pub use repository::{HiringRepository, RepositoryError};
pub use router::{hiring_router, CALLER_ID_HEADER, CALLER_SUPERVISOR_HEADER};
pub use service::{HiringError, HiringService};
pub use store::{InMemoryHiringRepository, SqliteHiringRepository};
