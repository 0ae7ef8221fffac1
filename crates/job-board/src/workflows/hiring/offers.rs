//! Offer negotiation: employers extend offers, applicants accept or decline them while
//! the offer window is open.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::directory::JobDirectory;
use super::domain::{ApplicationId, ApplicationStatus, Caller, JobApplication};
use super::repository::HiringRepository;
use super::service::{HiringError, HiringService};

/// Terms attached to an application when an offer is extended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTerms {
    pub offer_details: String,
    pub offer_salary: Decimal,
    #[serde(default)]
    pub offer_expiry_date: Option<DateTime<Utc>>,
}

impl<R, D> HiringService<R, D>
where
    R: HiringRepository + 'static,
    D: JobDirectory + 'static,
{
    /// Extend (or re-extend) an offer. Prior offer terms are overwritten and the status is
    /// forced to `offer_extended` whatever it was before.
    pub fn extend_offer(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
        terms: OfferTerms,
    ) -> Result<JobApplication, HiringError> {
        self.owned_application(
            caller,
            application_id,
            "you can only make offers for jobs you posted",
        )?;

        let updated = self
            .repository
            .modify_application(application_id, |application| -> Result<(), HiringError> {
                application.offer_details = Some(terms.offer_details);
                application.offer_salary = Some(terms.offer_salary);
                application.offer_expiry_date = terms.offer_expiry_date;
                application.transition(ApplicationStatus::OfferExtended, Utc::now());
                Ok(())
            })?
            .ok_or(HiringError::ApplicationNotFound(application_id))?;

        info!(
            application_id = %updated.id,
            salary = ?updated.offer_salary,
            expires = ?updated.offer_expiry_date,
            "offer extended"
        );
        Ok(updated)
    }

    pub fn respond_to_offer(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
        accept: bool,
    ) -> Result<JobApplication, HiringError> {
        self.respond_to_offer_at(caller, application_id, accept, Utc::now())
    }

    /// Accept or decline the open offer as of `now`. An expired offer is left untouched so
    /// the employer can extend a fresh one.
    pub fn respond_to_offer_at(
        &self,
        caller: &Caller,
        application_id: ApplicationId,
        accept: bool,
        now: DateTime<Utc>,
    ) -> Result<JobApplication, HiringError> {
        if caller.is_supervisor {
            return Err(HiringError::Forbidden("employers cannot respond to job offers"));
        }

        let updated = self
            .repository
            .modify_application(application_id, |application| -> Result<(), HiringError> {
                if application.applicant_id != caller.id {
                    return Err(HiringError::Forbidden(
                        "you can only respond to your own job offers",
                    ));
                }
                if application.status != ApplicationStatus::OfferExtended {
                    return Err(HiringError::NoActiveOffer);
                }
                if application
                    .offer_expiry_date
                    .is_some_and(|expiry| expiry < now)
                {
                    return Err(HiringError::OfferExpired);
                }

                let status = if accept {
                    ApplicationStatus::OfferAccepted
                } else {
                    ApplicationStatus::OfferDeclined
                };
                application.transition(status, now);
                Ok(())
            })
            .inspect_err(|err| {
                if matches!(err, HiringError::OfferExpired) {
                    warn!(%application_id, "response to expired offer rejected");
                }
            })?
            .ok_or(HiringError::ApplicationNotFound(application_id))?;

        info!(application_id = %updated.id, status = %updated.status, "offer answered");
        Ok(updated)
    }
}
