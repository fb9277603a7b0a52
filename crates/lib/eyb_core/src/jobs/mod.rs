//! Job postings. Read-only from the API's point of view.

pub mod queries;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::job::JobView;

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Jobs still accepting applications on `today` (termination date
    /// inclusive), soonest deadline first.
    async fn available_jobs(&self, today: NaiveDate) -> Result<Vec<JobView>, StoreError>;

    async fn find_job(&self, id: Uuid) -> Result<Option<JobView>, StoreError>;

    /// Jobs posted by the recruiter whose authorization subject is `user_id`.
    async fn jobs_by_recruiter(&self, user_id: &str) -> Result<Vec<JobView>, StoreError>;
}
