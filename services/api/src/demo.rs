use crate::infra::seed_jobs;
use chrono::{Duration, Utc};
use clap::Args;
use job_board::error::AppError;
use job_board::workflows::hiring::{
    ApplicationRequest, Caller, HiringRepository, HiringService, InMemoryHiringRepository,
    InMemoryJobDirectory, InterviewDraft, InterviewPatch, InterviewStatus, InterviewType,
    JobDirectory, JobSummary, LifecyclePolicy, OfferTerms, SqliteHiringRepository,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Run against this SQLite file instead of an in-memory store.
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Enforce the transition table for employer status updates.
    #[arg(long)]
    pub(crate) strict: bool,
    /// Annual salary attached to the offer.
    #[arg(long, default_value = "95000")]
    pub(crate) salary: Decimal,
    /// Decline the offer instead of accepting it.
    #[arg(long)]
    pub(crate) decline: bool,
    /// Applicant id used for the walkthrough.
    #[arg(long, default_value_t = 900)]
    pub(crate) applicant: i64,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let policy = if args.strict {
        LifecyclePolicy::strict()
    } else {
        LifecyclePolicy::default()
    };

    let Some(job) = seed_jobs().into_iter().next() else {
        println!("No job postings available for the demo");
        return Ok(());
    };

    match &args.database {
        Some(path) => {
            let repository = Arc::new(SqliteHiringRepository::open(path)?);
            for posting in seed_jobs() {
                repository.upsert_job(&posting)?;
            }
            println!("Hiring pipeline demo (sqlite: {})", path.display());
            let service = HiringService::with_policy(repository.clone(), repository, policy);
            walk_pipeline(&service, &job, &args)
        }
        None => {
            let repository = Arc::new(InMemoryHiringRepository::default());
            let directory = Arc::new(InMemoryJobDirectory::with_jobs(seed_jobs()));
            println!("Hiring pipeline demo (in-memory store)");
            let service = HiringService::with_policy(repository, directory, policy);
            walk_pipeline(&service, &job, &args)
        }
    }
}

fn walk_pipeline<R, D>(
    service: &HiringService<R, D>,
    job: &JobSummary,
    args: &DemoArgs,
) -> Result<(), AppError>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    let employer = Caller {
        id: job.posted_by_id,
        is_supervisor: true,
    };
    let applicant = Caller::applicant(args.applicant);

    println!(
        "- Posting #{} '{}' owned by employer {}",
        job.id, job.title, employer.id
    );

    let application = service.apply(
        &applicant,
        ApplicationRequest {
            job_id: job.id,
            cover_letter: Some("Excited to build the hiring platform with you.".to_string()),
            resume_url: format!("https://files.example.com/resumes/{}.pdf", applicant.id),
        },
    )?;
    println!(
        "- Applicant {} submitted application {} -> {}",
        applicant.id, application.id, application.status
    );

    let reviewed = service.update_status(&employer, application.id, "under_review")?;
    println!("- Employer reviewed -> {}", reviewed.application.status);

    let interview = service.schedule_interview(
        &employer,
        InterviewDraft {
            application_id: application.id,
            scheduled_at: Utc::now() + Duration::days(2),
            duration_minutes: 60,
            interview_type: InterviewType::Technical,
            location: None,
            meeting_link: Some("https://meet.example.com/hiring-demo".to_string()),
            notes: None,
        },
    )?;
    println!(
        "- Interview {} ({}, {} min) booked for {}",
        interview.id,
        interview.interview_type.label(),
        interview.duration_minutes,
        interview.scheduled_at.format("%Y-%m-%d %H:%M UTC")
    );

    service.update_interview(
        &employer,
        interview.id,
        InterviewPatch {
            status: Some(InterviewStatus::Completed),
            notes: Some(Some("Solid fundamentals, clear communication".to_string())),
            ..InterviewPatch::default()
        },
    )?;
    let after_interview = service.application(&employer, application.id)?;
    println!(
        "- Interview completed -> {}",
        after_interview.application.status
    );

    let expiry = Utc::now() + Duration::days(7);
    let offered = service.extend_offer(
        &employer,
        application.id,
        OfferTerms {
            offer_details: format!("{} offer, hybrid schedule", job.title),
            offer_salary: args.salary,
            offer_expiry_date: Some(expiry),
        },
    )?;
    println!(
        "- Offer extended at {} (expires {}) -> {}",
        args.salary,
        expiry.format("%Y-%m-%d"),
        offered.status
    );

    let answered = service.respond_to_offer(&applicant, application.id, !args.decline)?;
    println!("- Applicant responded -> {}", answered.status);

    let pipeline = service.applications_for_job(&employer, job.id)?;
    println!("Pipeline for '{}':", job.title);
    for entry in &pipeline {
        println!(
            "  - application {} | applicant {} | {} | {} interview(s)",
            entry.application.id,
            entry.application.applicant_id,
            entry.application.status,
            entry.interviews.len()
        );
    }

    Ok(())
}
