//! Job posting database queries.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::JobRepository;
use crate::db::{PgStore, StoreError};
use crate::models::job::JobView;

const JOB_SELECT: &str = "SELECT j.id, j.title, c.name AS company, j.company_id, j.location, \
     j.extent, j.description, j.tags, j.date_of_termination \
     FROM job_postings j JOIN companies c ON c.id = j.company_id";

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    company: String,
    company_id: Uuid,
    location: String,
    extent: String,
    description: String,
    tags: Vec<String>,
    date_of_termination: NaiveDate,
}

impl From<JobRow> for JobView {
    fn from(row: JobRow) -> Self {
        JobView {
            id: row.id,
            title: row.title,
            company: row.company,
            company_id: row.company_id,
            location: row.location,
            extent: row.extent,
            description: row.description,
            tags: row.tags,
            date_of_termination: row.date_of_termination,
        }
    }
}

#[async_trait]
impl JobRepository for PgStore {
    async fn available_jobs(&self, today: NaiveDate) -> Result<Vec<JobView>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "{JOB_SELECT} WHERE j.date_of_termination >= $1 \
             ORDER BY j.date_of_termination ASC, j.title ASC"
        ))
        .bind(today)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(JobView::from).collect())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<JobView>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!("{JOB_SELECT} WHERE j.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(JobView::from))
    }

    async fn jobs_by_recruiter(&self, user_id: &str) -> Result<Vec<JobView>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "{JOB_SELECT} JOIN recruiters r ON r.id = j.recruiter_id \
             WHERE r.user_id = $1 ORDER BY j.date_of_termination DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(JobView::from).collect())
    }
}
