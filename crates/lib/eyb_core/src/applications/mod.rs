//! Application submission and recruiter review.
//!
//! Submission and state changes report plain success/failure: every
//! collaborator or storage problem is logged and collapses to `false`, and
//! never leaves a partial record behind.

pub mod queries;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, warn};
use uuid::Uuid;

use crate::censor::{AnonymizeRequest, Anonymizer};
use crate::db::StoreError;
use crate::ids::record_id;
use crate::models::application::{
    Application, ApplicationSubmission, CensoredCvView, CvView, NewApplication,
};
use crate::review::{ApplicationState, ReviewAction};

/// Storage seam for applications.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn insert_application(&self, application: &NewApplication) -> Result<(), StoreError>;

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>, StoreError>;

    /// Move `id` from `from` to `to` only if it is still in `from`.
    /// Returns whether a row changed.
    async fn compare_and_set_state(
        &self,
        id: Uuid,
        from: ApplicationState,
        to: ApplicationState,
    ) -> Result<bool, StoreError>;

    /// Applications for `job_id` in `state`, oldest first.
    async fn list_by_state(
        &self,
        job_id: Uuid,
        state: ApplicationState,
    ) -> Result<Vec<Application>, StoreError>;

    /// Whether the backing store answers.
    async fn ping(&self) -> bool;
}

/// A recruiter's request to move an application along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Legacy flag, interpreted against the current state.
    RequestRealCv(bool),
    /// Explicit action; illegal in the current state means failure.
    Action(ReviewAction),
}

/// Anonymize `submission` and store it as a new `Censored` application.
pub async fn submit_application(
    repo: &dyn ApplicationRepository,
    anonymizer: &dyn Anonymizer,
    submission: &ApplicationSubmission,
    job_id: Uuid,
    user_id: &str,
) -> bool {
    let request = AnonymizeRequest {
        cv_base64: STANDARD.encode(submission.cv.as_bytes()),
        first_name: submission.firstname.clone(),
        last_name: submission.lastname.clone(),
    };

    let censored = match anonymizer.anonymize(&request).await {
        Ok(markdown) => markdown,
        Err(e) => {
            warn!(%job_id, error = %e, "anonymization failed, submission rejected");
            return false;
        }
    };

    let application = NewApplication {
        id: record_id(),
        user_id: user_id.to_string(),
        job_id,
        original_cv: submission.cv.as_bytes().to_vec(),
        censored_cv: censored.into_bytes(),
        applicant: submission.applicant(),
    };

    match repo.insert_application(&application).await {
        Ok(()) => {
            info!(application_id = %application.id, %job_id, "application submitted");
            true
        }
        Err(e) => {
            warn!(%job_id, error = %e, "failed to store application");
            false
        }
    }
}

/// Advance an application through the review state machine.
///
/// Reads the current state, writes the next one conditionally on the state
/// read, then re-reads and reports whether the stored state is the intended
/// one. An unknown id, an illegal action or a concurrent change all yield
/// `false` without touching the row.
pub async fn change_application_state(
    repo: &dyn ApplicationRepository,
    application_id: Uuid,
    change: StateChange,
) -> bool {
    let current = match repo.find_application(application_id).await {
        Ok(Some(app)) => app.state,
        Ok(None) => {
            warn!(%application_id, "state change for unknown application");
            return false;
        }
        Err(e) => {
            warn!(%application_id, error = %e, "failed to load application");
            return false;
        }
    };

    let action = match change {
        StateChange::RequestRealCv(flag) => ReviewAction::from_request(current, flag),
        StateChange::Action(action) => action,
    };

    let next = match current.apply(action) {
        Ok(next) => next,
        Err(e) => {
            warn!(%application_id, error = %e, "rejected review action");
            return false;
        }
    };

    match repo
        .compare_and_set_state(application_id, current, next)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            warn!(%application_id, %current, "application changed concurrently");
            return false;
        }
        Err(e) => {
            warn!(%application_id, error = %e, "failed to update application state");
            return false;
        }
    }

    match repo.find_application(application_id).await {
        Ok(Some(app)) if app.state == next => {
            info!(%application_id, from = %current, to = %next, "application state changed");
            true
        }
        Ok(observed) => {
            warn!(
                %application_id,
                expected = %next,
                observed = ?observed.map(|a| a.state),
                "state change not observed"
            );
            false
        }
        Err(e) => {
            warn!(%application_id, error = %e, "failed to re-read application");
            false
        }
    }
}

/// Oldest application still awaiting a first look, censored.
pub async fn get_censored_application(
    repo: &dyn ApplicationRepository,
    job_id: Uuid,
) -> Result<Option<CensoredCvView>, StoreError> {
    let apps = repo.list_by_state(job_id, ApplicationState::Censored).await?;
    Ok(apps.first().map(CensoredCvView::from))
}

/// Applications seen censored and set aside.
pub async fn get_viewed_applications(
    repo: &dyn ApplicationRepository,
    job_id: Uuid,
) -> Result<Vec<CensoredCvView>, StoreError> {
    let apps = repo.list_by_state(job_id, ApplicationState::Viewed).await?;
    Ok(apps.iter().map(CensoredCvView::from).collect())
}

/// Applications whose real CV the recruiter asked for.
pub async fn get_uncensored_applications(
    repo: &dyn ApplicationRepository,
    job_id: Uuid,
) -> Result<Vec<CvView>, StoreError> {
    let apps = repo
        .list_by_state(job_id, ApplicationState::Uncensored)
        .await?;
    Ok(apps.iter().map(CvView::from).collect())
}

/// Shortlisted applications.
pub async fn get_candidate_applications(
    repo: &dyn ApplicationRepository,
    job_id: Uuid,
) -> Result<Vec<CvView>, StoreError> {
    let apps = repo
        .list_by_state(job_id, ApplicationState::Candidate)
        .await?;
    Ok(apps.iter().map(CvView::from).collect())
}
