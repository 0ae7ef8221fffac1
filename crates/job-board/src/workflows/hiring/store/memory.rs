use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::workflows::hiring::domain::{
    ApplicationDraft, ApplicationId, ApplicationStatus, Interview, InterviewDraft, InterviewId,
    InterviewStatus, JobApplication, JobId, UserId,
};
use crate::workflows::hiring::repository::{HiringRepository, RepositoryError};

#[derive(Debug, Default)]
struct Tables {
    applications: BTreeMap<ApplicationId, JobApplication>,
    interviews: BTreeMap<InterviewId, Interview>,
    pairs: HashSet<(JobId, UserId)>,
    last_application_id: i64,
    last_interview_id: i64,
}

/// Mutex-guarded repository. A single lock covers every table, so each call is atomic.
#[derive(Debug, Default, Clone)]
pub struct InMemoryHiringRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryHiringRepository {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository lock poisoned".to_string()))
    }

    pub fn application_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.applications.len())
    }
}

fn newest_first(mut applications: Vec<JobApplication>) -> Vec<JobApplication> {
    applications.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    applications
}

impl HiringRepository for InMemoryHiringRepository {
    fn insert_application(
        &self,
        draft: ApplicationDraft,
        now: DateTime<Utc>,
    ) -> Result<JobApplication, RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.pairs.insert((draft.job_id, draft.applicant_id)) {
            return Err(RepositoryError::Conflict);
        }

        tables.last_application_id += 1;
        let application = JobApplication {
            id: ApplicationId(tables.last_application_id),
            job_id: draft.job_id,
            applicant_id: draft.applicant_id,
            status: ApplicationStatus::Pending,
            cover_letter: draft.cover_letter,
            resume_url: draft.resume_url,
            offer_details: None,
            offer_salary: None,
            offer_expiry_date: None,
            created_at: now,
            updated_at: now,
        };
        tables
            .applications
            .insert(application.id, application.clone());
        Ok(application)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn application_exists(
        &self,
        job_id: JobId,
        applicant_id: UserId,
    ) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.pairs.contains(&(job_id, applicant_id)))
    }

    fn applications_for_job(&self, job_id: JobId) -> Result<Vec<JobApplication>, RepositoryError> {
        let tables = self.lock()?;
        let matching = tables
            .applications
            .values()
            .filter(|application| application.job_id == job_id)
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    fn applications_for_applicant(
        &self,
        applicant_id: UserId,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        let tables = self.lock()?;
        let matching = tables
            .applications
            .values()
            .filter(|application| application.applicant_id == applicant_id)
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    fn modify_application<E, F>(
        &self,
        id: ApplicationId,
        mutate: F,
    ) -> Result<Option<JobApplication>, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut JobApplication) -> Result<(), E>,
    {
        let mut tables = self.lock()?;
        let Some(current) = tables.applications.get(&id) else {
            return Ok(None);
        };

        let mut working = current.clone();
        mutate(&mut working)?;
        tables.applications.insert(id, working.clone());
        Ok(Some(working))
    }

    fn insert_interview<E, F>(
        &self,
        draft: InterviewDraft,
        now: DateTime<Utc>,
        couple: F,
    ) -> Result<Option<(Interview, JobApplication)>, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut JobApplication) -> Result<(), E>,
    {
        let mut tables = self.lock()?;
        let Some(parent) = tables.applications.get(&draft.application_id) else {
            return Ok(None);
        };

        let mut application = parent.clone();
        couple(&mut application)?;

        tables.last_interview_id += 1;
        let interview = Interview {
            id: InterviewId(tables.last_interview_id),
            application_id: draft.application_id,
            scheduled_at: draft.scheduled_at,
            duration_minutes: draft.duration_minutes,
            location: draft.location,
            meeting_link: draft.meeting_link,
            interview_type: draft.interview_type,
            notes: draft.notes,
            status: InterviewStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };

        tables.interviews.insert(interview.id, interview.clone());
        tables
            .applications
            .insert(application.id, application.clone());
        Ok(Some((interview, application)))
    }

    fn modify_interview<E, F>(
        &self,
        id: InterviewId,
        mutate: F,
    ) -> Result<Option<(Interview, JobApplication)>, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut Interview, &mut JobApplication) -> Result<(), E>,
    {
        let mut tables = self.lock()?;
        let Some(current) = tables.interviews.get(&id) else {
            return Ok(None);
        };
        let mut interview = current.clone();
        let mut application = tables
            .applications
            .get(&interview.application_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::Corrupt(format!("interview {id} has no parent application"))
            })?;

        mutate(&mut interview, &mut application)?;

        tables.interviews.insert(id, interview.clone());
        tables
            .applications
            .insert(application.id, application.clone());
        Ok(Some((interview, application)))
    }

    fn interview(&self, id: InterviewId) -> Result<Option<Interview>, RepositoryError> {
        Ok(self.lock()?.interviews.get(&id).cloned())
    }

    fn interviews_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        let tables = self.lock()?;
        let mut interviews: Vec<Interview> = tables
            .interviews
            .values()
            .filter(|interview| interview.application_id == application_id)
            .cloned()
            .collect();
        interviews.sort_by(scheduled_order);
        Ok(interviews)
    }

    fn interviews_for_applications(
        &self,
        ids: &[ApplicationId],
    ) -> Result<HashMap<ApplicationId, Vec<Interview>>, RepositoryError> {
        let tables = self.lock()?;
        let mut grouped: HashMap<ApplicationId, Vec<Interview>> =
            ids.iter().map(|&id| (id, Vec::new())).collect();
        for interview in tables.interviews.values() {
            if let Some(bucket) = grouped.get_mut(&interview.application_id) {
                bucket.push(interview.clone());
            }
        }
        for bucket in grouped.values_mut() {
            bucket.sort_by(scheduled_order);
        }
        Ok(grouped)
    }
}

fn scheduled_order(a: &Interview, b: &Interview) -> std::cmp::Ordering {
    a.scheduled_at
        .cmp(&b.scheduled_at)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poison(repository: &InMemoryHiringRepository) {
        let tables = repository.tables.clone();
        let outcome = std::thread::spawn(move || {
            let _guard = tables.lock().expect("first lock succeeds");
            panic!("writer died while holding the lock");
        })
        .join();
        assert!(outcome.is_err());
    }

    #[test]
    fn poisoned_lock_surfaces_as_unavailable() {
        let repository = InMemoryHiringRepository::default();
        assert_eq!(repository.application_count().expect("count"), 0);

        poison(&repository);

        assert!(matches!(
            repository.application_count(),
            Err(RepositoryError::Unavailable(_))
        ));
        assert!(matches!(
            repository.application_exists(JobId(1), UserId(1)),
            Err(RepositoryError::Unavailable(_))
        ));
    }
}
