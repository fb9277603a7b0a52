//! Application submission, review and read endpoints.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Query, State};
use eyb_core::applications::{
    StateChange, change_application_state, get_candidate_applications, get_censored_application,
    get_uncensored_applications, get_viewed_applications, submit_application,
};
use eyb_core::models::application::{ApplicationSubmission, CensoredCvView, CvView};
use eyb_core::review::ReviewAction;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ApiState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuery {
    pub job_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStateQuery {
    pub application_id: Option<String>,
    pub request_real_cv: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicationsQuery {
    pub job_id: Option<String>,
}

/// `POST /api/application?jobId=&userId=`: submit a CV for anonymization.
pub async fn submit_application_handler(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(q): Query<SubmitQuery>,
    body: Result<Json<ApplicationSubmission>, JsonRejection>,
) -> AppResult<Json<bool>> {
    let job_id = parse_uuid("jobId", q.job_id.as_deref())?;
    let user_id = q
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("userId is required".into()))?;

    if user_id != user.user_id() && !user.is_admin() {
        warn!(caller = %user.user_id(), "submission on behalf of another user");
        return Err(AppError::Forbidden(
            "Cannot submit an application for another user".into(),
        ));
    }

    let Json(submission) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let ok = submit_application(
        state.applications.as_ref(),
        state.anonymizer.as_ref(),
        &submission,
        job_id,
        &user_id,
    )
    .await;
    Ok(Json(ok))
}

/// `PUT /api/application?applicationId=&requestRealCv=` (or `&action=`).
pub async fn change_state_handler(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(q): Query<ChangeStateQuery>,
) -> AppResult<Json<bool>> {
    user.require_recruiter()?;
    let application_id = parse_uuid("applicationId", q.application_id.as_deref())?;

    let change = match (q.action.as_deref(), q.request_real_cv.as_deref()) {
        (Some(action), _) => StateChange::Action(
            action
                .parse::<ReviewAction>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
        ),
        (None, Some(flag)) => StateChange::RequestRealCv(parse_flag(flag)?),
        (None, None) => {
            return Err(AppError::Validation(
                "requestRealCv or action is required".into(),
            ));
        }
    };

    debug!(%application_id, ?change, reviewer = %user.user_id(), "state change requested");
    let ok = change_application_state(state.applications.as_ref(), application_id, change).await;
    Ok(Json(ok))
}

/// `GET /api/application/censored?jobId=`: oldest unseen application.
pub async fn censored_handler(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(q): Query<JobApplicationsQuery>,
) -> AppResult<Json<Option<CensoredCvView>>> {
    user.require_recruiter()?;
    let job_id = parse_uuid("jobId", q.job_id.as_deref())?;
    Ok(Json(
        get_censored_application(state.applications.as_ref(), job_id).await?,
    ))
}

/// `GET /api/application/viewed?jobId=`
pub async fn viewed_handler(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(q): Query<JobApplicationsQuery>,
) -> AppResult<Json<Vec<CensoredCvView>>> {
    user.require_recruiter()?;
    let job_id = parse_uuid("jobId", q.job_id.as_deref())?;
    Ok(Json(
        get_viewed_applications(state.applications.as_ref(), job_id).await?,
    ))
}

/// `GET /api/application/uncensored?jobId=`
pub async fn uncensored_handler(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(q): Query<JobApplicationsQuery>,
) -> AppResult<Json<Vec<CvView>>> {
    user.require_recruiter()?;
    let job_id = parse_uuid("jobId", q.job_id.as_deref())?;
    Ok(Json(
        get_uncensored_applications(state.applications.as_ref(), job_id).await?,
    ))
}

/// `GET /api/application/candidate?jobId=`
pub async fn candidate_handler(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(q): Query<JobApplicationsQuery>,
) -> AppResult<Json<Vec<CvView>>> {
    user.require_recruiter()?;
    let job_id = parse_uuid("jobId", q.job_id.as_deref())?;
    Ok(Json(
        get_candidate_applications(state.applications.as_ref(), job_id).await?,
    ))
}

/// Required UUID query parameter.
pub(crate) fn parse_uuid(name: &str, value: Option<&str>) -> AppResult<Uuid> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    Uuid::parse_str(value).map_err(|_| AppError::Validation(format!("{name} must be a UUID")))
}

/// `true` / `false`, case-insensitive. Anything else is a client error.
fn parse_flag(value: &str) -> AppResult<bool> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(AppError::Validation(format!(
            "requestRealCv must be true or false, got '{value}'"
        )))
    }
}
