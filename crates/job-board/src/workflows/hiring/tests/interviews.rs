use super::common::*;
use crate::workflows::hiring::domain::{
    ApplicationStatus, InterviewPatch, InterviewStatus, InterviewType,
};
use crate::workflows::hiring::{ApplicationId, HiringError, InterviewId, LifecyclePolicy};
use chrono::{Duration, Utc};

#[test]
fn scheduling_moves_application_to_interview_scheduled() {
    let (service, _) = build_service();
    let application = submit(&service);

    let interview = service
        .schedule_interview(&EMPLOYER, interview_draft(application.id))
        .expect("interview scheduled");

    assert_eq!(interview.application_id, application.id);
    assert_eq!(interview.status, InterviewStatus::Scheduled);
    assert_eq!(interview.duration_minutes, 45);
    assert_eq!(
        status_of(&service, application.id),
        ApplicationStatus::InterviewScheduled
    );
}

#[test]
fn legacy_scheduling_overwrites_later_statuses() {
    let (service, _) = build_service();
    let application = submit(&service);
    service
        .update_status(&EMPLOYER, application.id, "offer_accepted")
        .expect("lenient update");

    service
        .schedule_interview(&EMPLOYER, interview_draft(application.id))
        .expect("interview scheduled");

    assert_eq!(
        status_of(&service, application.id),
        ApplicationStatus::InterviewScheduled
    );
}

#[test]
fn forward_only_scheduling_keeps_later_statuses() {
    let (service, _) = build_service_with_policy(LifecyclePolicy::strict());
    let application = submit(&service);
    service
        .extend_offer(&EMPLOYER, application.id, offer_terms(None))
        .expect("offer extended");

    let interview = service
        .schedule_interview(&EMPLOYER, interview_draft(application.id))
        .expect("interview still stored");

    assert_eq!(interview.status, InterviewStatus::Scheduled);
    assert_eq!(
        status_of(&service, application.id),
        ApplicationStatus::OfferExtended
    );

    service
        .update_interview(&EMPLOYER, interview.id, completed())
        .expect("interview completed");
    assert_eq!(
        status_of(&service, application.id),
        ApplicationStatus::OfferExtended
    );
}

#[test]
fn scheduling_requires_existing_application_and_owner() {
    let (service, _) = build_service();
    let application = submit(&service);

    assert!(matches!(
        service.schedule_interview(&EMPLOYER, interview_draft(ApplicationId(404))),
        Err(HiringError::ApplicationNotFound(_))
    ));
    assert!(matches!(
        service.schedule_interview(&OTHER_EMPLOYER, interview_draft(application.id)),
        Err(HiringError::Forbidden(_))
    ));

    let mut zero = interview_draft(application.id);
    zero.duration_minutes = 0;
    assert!(matches!(
        service.schedule_interview(&EMPLOYER, zero),
        Err(HiringError::InvalidDuration)
    ));
    assert_eq!(
        status_of(&service, application.id),
        ApplicationStatus::Pending
    );
}

#[test]
fn partial_update_leaves_absent_fields_untouched() {
    let (service, _) = build_service();
    let application = submit(&service);
    let original = service
        .schedule_interview(&EMPLOYER, interview_draft(application.id))
        .expect("interview scheduled");

    let updated = service
        .update_interview(
            &EMPLOYER,
            original.id,
            InterviewPatch {
                location: Some(Some("HQ, room 4".to_string())),
                interview_type: Some(InterviewType::SystemDesign),
                ..InterviewPatch::default()
            },
        )
        .expect("interview updated");

    assert_eq!(updated.location.as_deref(), Some("HQ, room 4"));
    assert_eq!(updated.interview_type, InterviewType::SystemDesign);
    assert_eq!(updated.scheduled_at, original.scheduled_at);
    assert_eq!(updated.duration_minutes, original.duration_minutes);
    assert_eq!(updated.meeting_link, original.meeting_link);
    assert_eq!(updated.status, InterviewStatus::Scheduled);
    assert_eq!(
        status_of(&service, application.id),
        ApplicationStatus::InterviewScheduled
    );
}

#[test]
fn explicit_null_clears_optional_interview_fields() {
    let (service, _) = build_service();
    let application = submit(&service);
    let mut draft = interview_draft(application.id);
    draft.notes = Some("Bring a laptop".to_string());
    draft.location = Some("HQ lobby".to_string());
    let original = service
        .schedule_interview(&EMPLOYER, draft)
        .expect("interview scheduled");
    assert!(original.meeting_link.is_some());

    let patch: InterviewPatch =
        serde_json::from_str(r#"{"meeting_link": null, "notes": null}"#).expect("patch parses");
    assert_eq!(patch.meeting_link, Some(None));
    assert_eq!(patch.location, None);

    let updated = service
        .update_interview(&EMPLOYER, original.id, patch)
        .expect("interview updated");

    assert_eq!(updated.meeting_link, None);
    assert_eq!(updated.notes, None);
    assert_eq!(updated.location.as_deref(), Some("HQ lobby"));
    assert_eq!(updated.duration_minutes, original.duration_minutes);

    let details = service
        .interview(&EMPLOYER, original.id)
        .expect("owner sees interview");
    assert_eq!(details.interview.meeting_link, None);
}

#[test]
fn completing_an_interview_completes_the_application_stage() {
    let (service, _) = build_service();
    let application = submit(&service);
    let interview = service
        .schedule_interview(&EMPLOYER, interview_draft(application.id))
        .expect("interview scheduled");

    let updated = service
        .update_interview(&EMPLOYER, interview.id, completed())
        .expect("interview completed");

    assert_eq!(updated.status, InterviewStatus::Completed);
    assert_eq!(
        status_of(&service, application.id),
        ApplicationStatus::InterviewCompleted
    );
}

#[test]
fn legacy_completion_overwrites_even_accepted_offers() {
    let (service, _) = build_service();
    let application = submit(&service);
    let interview = service
        .schedule_interview(&EMPLOYER, interview_draft(application.id))
        .expect("interview scheduled");
    service
        .update_status(&EMPLOYER, application.id, "offer_accepted")
        .expect("lenient update");

    service
        .update_interview(&EMPLOYER, interview.id, completed())
        .expect("interview completed");

    assert_eq!(
        status_of(&service, application.id),
        ApplicationStatus::InterviewCompleted
    );
}

#[test]
fn cancelling_does_not_touch_application_status() {
    let (service, _) = build_service();
    let application = submit(&service);
    let interview = service
        .schedule_interview(&EMPLOYER, interview_draft(application.id))
        .expect("interview scheduled");

    let cancelled = service
        .update_interview(
            &EMPLOYER,
            interview.id,
            InterviewPatch {
                status: Some(InterviewStatus::Cancelled),
                ..InterviewPatch::default()
            },
        )
        .expect("interview cancelled");

    assert_eq!(cancelled.status, InterviewStatus::Cancelled);
    assert_eq!(
        status_of(&service, application.id),
        ApplicationStatus::InterviewScheduled
    );
}

#[test]
fn updating_missing_interview_is_not_found() {
    let (service, _) = build_service();

    assert!(matches!(
        service.update_interview(&EMPLOYER, InterviewId(404), completed()),
        Err(HiringError::InterviewNotFound(_))
    ));
}

#[test]
fn interviews_list_in_scheduled_order() {
    let (service, _) = build_service();
    let application = submit(&service);

    let mut later = interview_draft(application.id);
    later.scheduled_at = Utc::now() + Duration::days(10);
    let mut sooner = interview_draft(application.id);
    sooner.scheduled_at = Utc::now() + Duration::days(1);
    sooner.interview_type = InterviewType::Hr;

    let later = service
        .schedule_interview(&EMPLOYER, later)
        .expect("later scheduled");
    let sooner = service
        .schedule_interview(&EMPLOYER, sooner)
        .expect("sooner scheduled");

    let listed = service
        .interviews_for_application(&APPLICANT, application.id)
        .expect("applicant lists interviews");
    let ids: Vec<_> = listed.iter().map(|interview| interview.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);
}

#[test]
fn interview_details_are_limited_to_participants() {
    let (service, _) = build_service();
    let application = submit(&service);
    let interview = service
        .schedule_interview(&EMPLOYER, interview_draft(application.id))
        .expect("interview scheduled");

    let details = service
        .interview(&APPLICANT, interview.id)
        .expect("applicant sees interview");
    assert_eq!(details.application.id, application.id);
    assert_eq!(
        details.application.status,
        ApplicationStatus::InterviewScheduled
    );

    service
        .interview(&EMPLOYER, interview.id)
        .expect("owner sees interview");
    assert!(matches!(
        service.interview(&OTHER_APPLICANT, interview.id),
        Err(HiringError::Forbidden(_))
    ));
    assert!(matches!(
        service.interviews_for_application(&OTHER_EMPLOYER, application.id),
        Err(HiringError::Forbidden(_))
    ));
    assert!(matches!(
        service.interview(&EMPLOYER, InterviewId(404)),
        Err(HiringError::InterviewNotFound(_))
    ));
}
