//! Application database queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ApplicationRepository;
use crate::db::{PgStore, StoreError};
use crate::models::application::{Applicant, Application, NewApplication};
use crate::review::ApplicationState;

const APPLICATION_COLUMNS: &str = "id, user_id, job_id, date_sent, original_cv, censored_cv, \
     state, firstname, lastname, phonenumber, mail";

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    user_id: String,
    job_id: Uuid,
    date_sent: DateTime<Utc>,
    original_cv: Vec<u8>,
    censored_cv: Vec<u8>,
    state: String,
    firstname: String,
    lastname: String,
    phonenumber: String,
    mail: String,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = StoreError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let state = row
            .state
            .parse::<ApplicationState>()
            .map_err(|e| StoreError::Corrupt(format!("application {}: {e}", row.id)))?;
        Ok(Application {
            id: row.id,
            user_id: row.user_id,
            job_id: row.job_id,
            date_sent: row.date_sent,
            original_cv: row.original_cv,
            censored_cv: row.censored_cv,
            state,
            applicant: Applicant {
                firstname: row.firstname,
                lastname: row.lastname,
                phonenumber: row.phonenumber,
                mail: row.mail,
            },
        })
    }
}

#[async_trait]
impl ApplicationRepository for PgStore {
    async fn insert_application(&self, app: &NewApplication) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO applications \
             (id, user_id, job_id, original_cv, censored_cv, state, \
              firstname, lastname, phonenumber, mail) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(app.id)
        .bind(&app.user_id)
        .bind(app.job_id)
        .bind(&app.original_cv)
        .bind(&app.censored_cv)
        .bind(ApplicationState::Censored.as_str())
        .bind(&app.applicant.firstname)
        .bind(&app.applicant.lastname)
        .bind(&app.applicant.phonenumber)
        .bind(&app.applicant.mail)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(Application::try_from).transpose()
    }

    async fn compare_and_set_state(
        &self,
        id: Uuid,
        from: ApplicationState,
        to: ApplicationState,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE applications SET state = $3 WHERE id = $1 AND state = $2")
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_by_state(
        &self,
        job_id: Uuid,
        state: ApplicationState,
    ) -> Result<Vec<Application>, StoreError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE job_id = $1 AND state = $2 ORDER BY date_sent ASC, id ASC"
        ))
        .bind(job_id)
        .bind(state.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(Application::try_from).collect()
    }

    async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool())
            .await
            .is_ok()
    }
}
