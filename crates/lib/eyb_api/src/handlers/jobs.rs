//! Job posting endpoints.

use axum::Json;
use axum::extract::{Extension, Query, State};
use chrono::Utc;
use eyb_core::models::job::JobView;
use serde::Deserialize;

use crate::ApiState;
use crate::error::{AppError, AppResult};
use crate::handlers::applications::parse_uuid;
use crate::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterQuery {
    pub user_id: Option<String>,
}

/// `GET /api/job?jobId=`: one job, or `null`.
pub async fn get_job(
    State(state): State<ApiState>,
    Query(q): Query<JobQuery>,
) -> AppResult<Json<Option<JobView>>> {
    let job_id = parse_uuid("jobId", q.job_id.as_deref())?;
    Ok(Json(state.jobs.find_job(job_id).await?))
}

/// `GET /api/job/available`: jobs still open today.
pub async fn available_jobs(State(state): State<ApiState>) -> AppResult<Json<Vec<JobView>>> {
    let today = Utc::now().date_naive();
    Ok(Json(state.jobs.available_jobs(today).await?))
}

/// `GET /api/job/recruiter?userId=`: jobs posted by a recruiter.
pub async fn recruiter_jobs(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(q): Query<RecruiterQuery>,
) -> AppResult<Json<Vec<JobView>>> {
    user.require_recruiter()?;
    let user_id = q
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("userId is required".into()))?;
    Ok(Json(state.jobs.jobs_by_recruiter(&user_id).await?))
}
