//! Shared fixtures for the router tests: in-memory repositories, a canned
//! anonymizer, and request helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{NaiveDate, Utc};
use eyb_api::config::ApiConfig;
use eyb_api::{ApiState, AuthState};
use eyb_core::applications::ApplicationRepository;
use eyb_core::auth::codes::MemoryCodeStore;
use eyb_core::auth::jwt::TokenIssuer;
use eyb_core::auth::registry::{FRONTEND_CLIENT_ID, Registry};
use eyb_core::censor::{AnonymizeRequest, Anonymizer, CensorError};
use eyb_core::db::StoreError;
use eyb_core::jobs::JobRepository;
use eyb_core::models::application::{Applicant, Application, NewApplication};
use eyb_core::models::auth::{Role, User};
use eyb_core::models::job::JobView;
use eyb_core::review::ApplicationState;
use tower::ServiceExt;
use uuid::Uuid;

pub const REDIRECT_URI: &str = "http://localhost:3000/auth/callback";

pub fn test_config() -> ApiConfig {
    ApiConfig::from_lookup(|key| match key {
        "AUTH_JWT_SECRET" => Some("integration-secret".into()),
        _ => None,
    })
    .expect("dev config")
}

pub fn auth_state(config: ApiConfig) -> AuthState {
    let registry = Registry::demo(FRONTEND_CLIENT_ID, REDIRECT_URI).expect("registry");
    AuthState::in_memory(config, registry, Arc::new(MemoryCodeStore::new()))
}

pub fn token_for(config: &ApiConfig, id: &str, role: Role) -> String {
    TokenIssuer::new(config.jwt_secret.as_bytes(), &config.issuer)
        .create_access_token(
            &User {
                id: id.into(),
                email: format!("{id}@example.com"),
                role,
            },
            FRONTEND_CLIENT_ID,
        )
        .expect("token")
}

pub async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.expect("request")
}

pub async fn json_body(resp: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

#[derive(Default)]
pub struct MemoryApplications {
    pub rows: Mutex<HashMap<Uuid, Application>>,
}

impl MemoryApplications {
    pub fn seed(&self, job_id: Uuid, state: ApplicationState) -> Uuid {
        let id = Uuid::now_v7();
        self.rows.lock().unwrap().insert(
            id,
            Application {
                id,
                user_id: "u1".into(),
                job_id,
                date_sent: Utc::now(),
                original_cv: b"Jane Doe, Rust engineer".to_vec(),
                censored_cv: b"[NAME], Rust engineer".to_vec(),
                state,
                applicant: Applicant {
                    firstname: "Jane".into(),
                    lastname: "Doe".into(),
                    phonenumber: "0700000000".into(),
                    mail: "jane@example.com".into(),
                },
            },
        );
        id
    }

    pub fn state_of(&self, id: Uuid) -> Option<ApplicationState> {
        self.rows.lock().unwrap().get(&id).map(|a| a.state)
    }
}

#[async_trait]
impl ApplicationRepository for MemoryApplications {
    async fn insert_application(&self, new: &NewApplication) -> Result<(), StoreError> {
        self.rows.lock().unwrap().insert(
            new.id,
            Application {
                id: new.id,
                user_id: new.user_id.clone(),
                job_id: new.job_id,
                date_sent: Utc::now(),
                original_cv: new.original_cv.clone(),
                censored_cv: new.censored_cv.clone(),
                state: ApplicationState::Censored,
                applicant: new.applicant.clone(),
            },
        );
        Ok(())
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn compare_and_set_state(
        &self,
        id: Uuid,
        from: ApplicationState,
        to: ApplicationState,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(app) if app.state == from => {
                app.state = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_state(
        &self,
        job_id: Uuid,
        state: ApplicationState,
    ) -> Result<Vec<Application>, StoreError> {
        let mut apps: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.job_id == job_id && a.state == state)
            .cloned()
            .collect();
        apps.sort_by_key(|a| (a.date_sent, a.id));
        Ok(apps)
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct MemoryJobs {
    pub jobs: Vec<JobView>,
    /// job id → recruiter user id
    pub owners: HashMap<Uuid, String>,
}

impl MemoryJobs {
    pub fn with_job(mut self, title: &str, closes: NaiveDate, owner: &str) -> Self {
        let id = Uuid::now_v7();
        self.jobs.push(JobView {
            id,
            title: title.into(),
            company: "Acme".into(),
            company_id: Uuid::nil(),
            location: "Stockholm".into(),
            extent: "Full-time".into(),
            description: String::new(),
            tags: vec!["rust".into()],
            date_of_termination: closes,
        });
        self.owners.insert(id, owner.into());
        self
    }
}

#[async_trait]
impl JobRepository for MemoryJobs {
    async fn available_jobs(&self, today: NaiveDate) -> Result<Vec<JobView>, StoreError> {
        Ok(self
            .jobs
            .iter()
            .filter(|j| j.date_of_termination >= today)
            .cloned()
            .collect())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<JobView>, StoreError> {
        Ok(self.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn jobs_by_recruiter(&self, user_id: &str) -> Result<Vec<JobView>, StoreError> {
        Ok(self
            .jobs
            .iter()
            .filter(|j| self.owners.get(&j.id).is_some_and(|o| o == user_id))
            .cloned()
            .collect())
    }
}

/// Anonymizer returning a fixed result.
pub struct CannedAnonymizer(pub Option<String>);

#[async_trait]
impl Anonymizer for CannedAnonymizer {
    async fn anonymize(&self, _request: &AnonymizeRequest) -> Result<String, CensorError> {
        self.0.clone().ok_or(CensorError::Timeout)
    }
}

pub fn api_state(
    config: ApiConfig,
    applications: Arc<MemoryApplications>,
    jobs: MemoryJobs,
    anonymizer: CannedAnonymizer,
) -> ApiState {
    let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), &config.issuer);
    ApiState {
        config,
        applications,
        jobs: Arc::new(jobs),
        anonymizer: Arc::new(anonymizer),
        tokens,
        http: reqwest::Client::new(),
    }
}
