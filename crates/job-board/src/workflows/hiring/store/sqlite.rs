use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior,
};
use rust_decimal::Decimal;

use crate::workflows::hiring::directory::{DirectoryError, JobDirectory};
use crate::workflows::hiring::domain::{
    ApplicationDraft, ApplicationId, ApplicationStatus, Interview, InterviewDraft, InterviewId,
    InterviewStatus, InterviewType, JobApplication, JobId, JobStatus, JobSummary, UserId,
};
use crate::workflows::hiring::repository::{HiringRepository, RepositoryError};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'closed')),
        posted_by_id INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS job_applications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        job_id INTEGER NOT NULL,
        applicant_id INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN (
            'pending', 'under_review', 'interview_scheduled', 'interview_completed',
            'offer_extended', 'offer_accepted', 'offer_declined', 'rejected'
        )),
        cover_letter TEXT,
        resume_url TEXT NOT NULL,
        offer_details TEXT,
        offer_salary TEXT,
        offer_expiry_date TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (job_id, applicant_id)
    );

    CREATE TABLE IF NOT EXISTS interviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        application_id INTEGER NOT NULL REFERENCES job_applications(id),
        scheduled_at TEXT NOT NULL,
        duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
        location TEXT,
        meeting_link TEXT,
        interview_type TEXT NOT NULL CHECK (interview_type IN (
            'technical', 'behavioral', 'hr', 'system_design', 'culture_fit'
        )),
        notes TEXT,
        status TEXT NOT NULL DEFAULT 'scheduled' CHECK (status IN (
            'scheduled', 'completed', 'cancelled', 'rescheduled'
        )),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_applications_job ON job_applications(job_id);
    CREATE INDEX IF NOT EXISTS idx_applications_applicant ON job_applications(applicant_id);
    CREATE INDEX IF NOT EXISTS idx_interviews_application ON interviews(application_id);
"#;

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, status, cover_letter, resume_url, \
     offer_details, offer_salary, offer_expiry_date, created_at, updated_at";

const INTERVIEW_COLUMNS: &str = "id, application_id, scheduled_at, duration_minutes, location, \
     meeting_link, interview_type, notes, status, created_at, updated_at";

/// SQLite-backed repository. The uniqueness constraint on `(job_id, applicant_id)` settles
/// concurrent duplicate applications, and every write runs in an immediate transaction.
pub struct SqliteHiringRepository {
    conn: Mutex<Connection>,
}

impl SqliteHiringRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, RepositoryError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection lock poisoned".to_string()))
    }

    /// Mirrors a posting from the job directory so the store can answer job lookups itself.
    pub fn upsert_job(&self, job: &JobSummary) -> Result<(), RepositoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO jobs (id, title, status, posted_by_id) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                status = excluded.status,
                posted_by_id = excluded.posted_by_id",
            params![job.id.0, job.title, job.status.label(), job.posted_by_id.0],
        )?;
        Ok(())
    }

    fn query_applications(
        &self,
        filter: &str,
        value: i64,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE {filter} = ?1
             ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([value], ApplicationRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ApplicationRow::into_domain).collect()
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                RepositoryError::Conflict
            }
            _ => RepositoryError::Unavailable(err.to_string()),
        }
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| RepositoryError::Corrupt(format!("timestamp '{raw}': {err}")))
}

fn parse_label<T>(raw: &str) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|err: T::Err| RepositoryError::Corrupt(err.to_string()))
}

struct ApplicationRow {
    id: i64,
    job_id: i64,
    applicant_id: i64,
    status: String,
    cover_letter: Option<String>,
    resume_url: String,
    offer_details: Option<String>,
    offer_salary: Option<String>,
    offer_expiry_date: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ApplicationRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            job_id: row.get(1)?,
            applicant_id: row.get(2)?,
            status: row.get(3)?,
            cover_letter: row.get(4)?,
            resume_url: row.get(5)?,
            offer_details: row.get(6)?,
            offer_salary: row.get(7)?,
            offer_expiry_date: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_domain(self) -> Result<JobApplication, RepositoryError> {
        let offer_salary = self
            .offer_salary
            .as_deref()
            .map(|raw| {
                Decimal::from_str(raw)
                    .map_err(|err| RepositoryError::Corrupt(format!("salary '{raw}': {err}")))
            })
            .transpose()?;

        Ok(JobApplication {
            id: ApplicationId(self.id),
            job_id: JobId(self.job_id),
            applicant_id: UserId(self.applicant_id),
            status: parse_label(&self.status)?,
            cover_letter: self.cover_letter,
            resume_url: self.resume_url,
            offer_details: self.offer_details,
            offer_salary,
            offer_expiry_date: self
                .offer_expiry_date
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct InterviewRow {
    id: i64,
    application_id: i64,
    scheduled_at: String,
    duration_minutes: u32,
    location: Option<String>,
    meeting_link: Option<String>,
    interview_type: String,
    notes: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl InterviewRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            application_id: row.get(1)?,
            scheduled_at: row.get(2)?,
            duration_minutes: row.get(3)?,
            location: row.get(4)?,
            meeting_link: row.get(5)?,
            interview_type: row.get(6)?,
            notes: row.get(7)?,
            status: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_domain(self) -> Result<Interview, RepositoryError> {
        Ok(Interview {
            id: InterviewId(self.id),
            application_id: ApplicationId(self.application_id),
            scheduled_at: parse_timestamp(&self.scheduled_at)?,
            duration_minutes: self.duration_minutes,
            location: self.location,
            meeting_link: self.meeting_link,
            interview_type: parse_label::<InterviewType>(&self.interview_type)?,
            notes: self.notes,
            status: parse_label::<InterviewStatus>(&self.status)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn load_application(
    conn: &Connection,
    id: ApplicationId,
) -> Result<Option<JobApplication>, RepositoryError> {
    let sql = format!("SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE id = ?1");
    conn.query_row(&sql, [id.0], ApplicationRow::read)
        .optional()?
        .map(ApplicationRow::into_domain)
        .transpose()
}

fn load_interview(conn: &Connection, id: InterviewId) -> Result<Option<Interview>, RepositoryError> {
    let sql = format!("SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = ?1");
    conn.query_row(&sql, [id.0], InterviewRow::read)
        .optional()?
        .map(InterviewRow::into_domain)
        .transpose()
}

/// Writes back the mutable columns; `job_id`, `applicant_id` and `created_at` never change.
fn store_application(
    conn: &Connection,
    application: &JobApplication,
) -> Result<(), RepositoryError> {
    conn.execute(
        "UPDATE job_applications SET
            status = ?2,
            cover_letter = ?3,
            resume_url = ?4,
            offer_details = ?5,
            offer_salary = ?6,
            offer_expiry_date = ?7,
            updated_at = ?8
         WHERE id = ?1",
        params![
            application.id.0,
            application.status.label(),
            application.cover_letter,
            application.resume_url,
            application.offer_details,
            application.offer_salary.map(|salary| salary.to_string()),
            application.offer_expiry_date.map(timestamp),
            timestamp(application.updated_at),
        ],
    )?;
    Ok(())
}

fn store_interview(conn: &Connection, interview: &Interview) -> Result<(), RepositoryError> {
    conn.execute(
        "UPDATE interviews SET
            scheduled_at = ?2,
            duration_minutes = ?3,
            location = ?4,
            meeting_link = ?5,
            interview_type = ?6,
            notes = ?7,
            status = ?8,
            updated_at = ?9
         WHERE id = ?1",
        params![
            interview.id.0,
            timestamp(interview.scheduled_at),
            interview.duration_minutes,
            interview.location,
            interview.meeting_link,
            interview.interview_type.label(),
            interview.notes,
            interview.status.label(),
            timestamp(interview.updated_at),
        ],
    )?;
    Ok(())
}

impl HiringRepository for SqliteHiringRepository {
    fn insert_application(
        &self,
        draft: ApplicationDraft,
        now: DateTime<Utc>,
    ) -> Result<JobApplication, RepositoryError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO job_applications
                (job_id, applicant_id, status, cover_letter, resume_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                draft.job_id.0,
                draft.applicant_id.0,
                ApplicationStatus::Pending.label(),
                draft.cover_letter,
                draft.resume_url,
                timestamp(now),
            ],
        )?;

        // Read back so the returned timestamps carry the stored precision.
        load_application(&conn, ApplicationId(conn.last_insert_rowid()))?
            .ok_or_else(|| RepositoryError::Corrupt("inserted application vanished".to_string()))
    }

    fn application(&self, id: ApplicationId) -> Result<Option<JobApplication>, RepositoryError> {
        let conn = self.lock()?;
        load_application(&conn, id)
    }

    fn application_exists(
        &self,
        job_id: JobId,
        applicant_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let conn = self.lock()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM job_applications WHERE job_id = ?1 AND applicant_id = ?2)",
            [job_id.0, applicant_id.0],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn applications_for_job(&self, job_id: JobId) -> Result<Vec<JobApplication>, RepositoryError> {
        self.query_applications("job_id", job_id.0)
    }

    fn applications_for_applicant(
        &self,
        applicant_id: UserId,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        self.query_applications("applicant_id", applicant_id.0)
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
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepositoryError::from)?;

        let Some(mut application) = load_application(&tx, id)? else {
            return Ok(None);
        };
        mutate(&mut application)?;
        store_application(&tx, &application)?;
        tx.commit().map_err(RepositoryError::from)?;
        Ok(Some(application))
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
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepositoryError::from)?;

        let Some(mut application) = load_application(&tx, draft.application_id)? else {
            return Ok(None);
        };
        couple(&mut application)?;
        store_application(&tx, &application)?;

        tx.execute(
            "INSERT INTO interviews
                (application_id, scheduled_at, duration_minutes, location, meeting_link,
                 interview_type, notes, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                draft.application_id.0,
                timestamp(draft.scheduled_at),
                draft.duration_minutes,
                draft.location,
                draft.meeting_link,
                draft.interview_type.label(),
                draft.notes,
                InterviewStatus::Scheduled.label(),
                timestamp(now),
            ],
        )
        .map_err(RepositoryError::from)?;

        let interview = load_interview(&tx, InterviewId(tx.last_insert_rowid()))?
            .ok_or_else(|| RepositoryError::Corrupt("inserted interview vanished".to_string()))?;
        let application = load_application(&tx, application.id)?.ok_or_else(|| {
            RepositoryError::Corrupt("parent application vanished".to_string())
        })?;
        tx.commit().map_err(RepositoryError::from)?;
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
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepositoryError::from)?;

        let Some(mut interview) = load_interview(&tx, id)? else {
            return Ok(None);
        };
        let mut application = load_application(&tx, interview.application_id)?.ok_or_else(|| {
            RepositoryError::Corrupt(format!("interview {id} has no parent application"))
        })?;

        mutate(&mut interview, &mut application)?;
        store_interview(&tx, &interview)?;
        store_application(&tx, &application)?;
        tx.commit().map_err(RepositoryError::from)?;
        Ok(Some((interview, application)))
    }

    fn interview(&self, id: InterviewId) -> Result<Option<Interview>, RepositoryError> {
        let conn = self.lock()?;
        load_interview(&conn, id)
    }

    fn interviews_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE application_id = ?1
             ORDER BY scheduled_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([application_id.0], InterviewRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(InterviewRow::into_domain).collect()
    }

    fn interviews_for_applications(
        &self,
        ids: &[ApplicationId],
    ) -> Result<HashMap<ApplicationId, Vec<Interview>>, RepositoryError> {
        let mut grouped: HashMap<ApplicationId, Vec<Interview>> =
            ids.iter().map(|&id| (id, Vec::new())).collect();
        if ids.is_empty() {
            return Ok(grouped);
        }

        let conn = self.lock()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE application_id IN ({placeholders})
             ORDER BY scheduled_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter().map(|id| id.0)), InterviewRow::read)?
            .collect::<Result<Vec<_>, _>>()?;

        for row in rows {
            let interview = row.into_domain()?;
            grouped
                .entry(interview.application_id)
                .or_default()
                .push(interview);
        }
        Ok(grouped)
    }
}

impl JobDirectory for SqliteHiringRepository {
    fn job(&self, id: JobId) -> Result<Option<JobSummary>, DirectoryError> {
        let conn = self
            .lock()
            .map_err(|err| DirectoryError::Unavailable(err.to_string()))?;
        let row = conn
            .query_row(
                "SELECT id, title, status, posted_by_id FROM jobs WHERE id = ?1",
                [id.0],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| DirectoryError::Unavailable(err.to_string()))?;

        row.map(|(id, title, status, posted_by_id)| {
            let status = status
                .parse::<JobStatus>()
                .map_err(|err| DirectoryError::Unavailable(err.to_string()))?;
            Ok(JobSummary {
                id: JobId(id),
                title,
                status,
                posted_by_id: UserId(posted_by_id),
            })
        })
        .transpose()
    }
}
