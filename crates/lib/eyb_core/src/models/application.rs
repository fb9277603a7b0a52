//! Application domain models and the views handed to recruiters.
//!
//! CV payloads are stored as raw bytes and leave the service base64-encoded.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::review::ApplicationState;

/// Contact details supplied with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub mail: String,
}

/// Application as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: Uuid,
    pub user_id: String,
    pub job_id: Uuid,
    pub date_sent: DateTime<Utc>,
    pub original_cv: Vec<u8>,
    pub censored_cv: Vec<u8>,
    pub state: ApplicationState,
    pub applicant: Applicant,
}

/// A fully prepared row for insertion; always starts `Censored`.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub id: Uuid,
    pub user_id: String,
    pub job_id: Uuid,
    pub original_cv: Vec<u8>,
    pub censored_cv: Vec<u8>,
    pub applicant: Applicant,
}

/// Body of `POST /api/application`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSubmission {
    #[serde(rename = "CV")]
    pub cv: String,
    #[serde(rename = "Firstname")]
    pub firstname: String,
    #[serde(rename = "Lastname")]
    pub lastname: String,
    #[serde(rename = "Phonenumber")]
    pub phonenumber: String,
    #[serde(rename = "Mail")]
    pub mail: String,
}

impl ApplicationSubmission {
    pub fn applicant(&self) -> Applicant {
        Applicant {
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            phonenumber: self.phonenumber.clone(),
            mail: self.mail.clone(),
        }
    }
}

/// Censored view: no contact details, anonymized CV only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensoredCvView {
    pub id: Uuid,
    pub job_id: Uuid,
    pub date_sent: DateTime<Utc>,
    pub state: ApplicationState,
    /// Base64 of the anonymized CV.
    pub censored_cv: String,
}

impl From<&Application> for CensoredCvView {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id,
            job_id: app.job_id,
            date_sent: app.date_sent,
            state: app.state,
            censored_cv: STANDARD.encode(&app.censored_cv),
        }
    }
}

/// Uncensored view with applicant details and the original CV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvView {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: String,
    pub date_sent: DateTime<Utc>,
    pub state: ApplicationState,
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub mail: String,
    /// Base64 of the original CV.
    pub cv: String,
}

impl From<&Application> for CvView {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id,
            job_id: app.job_id,
            user_id: app.user_id.clone(),
            date_sent: app.date_sent,
            state: app.state,
            firstname: app.applicant.firstname.clone(),
            lastname: app.applicant.lastname.clone(),
            phonenumber: app.applicant.phonenumber.clone(),
            mail: app.applicant.mail.clone(),
            cv: STANDARD.encode(&app.original_cv),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Application {
        Application {
            id: Uuid::nil(),
            user_id: "u1".into(),
            job_id: Uuid::nil(),
            date_sent: Utc::now(),
            original_cv: b"Jane Doe, jane@example.com".to_vec(),
            censored_cv: b"[NAME], [EMAIL]".to_vec(),
            state: ApplicationState::Censored,
            applicant: Applicant {
                firstname: "Jane".into(),
                lastname: "Doe".into(),
                phonenumber: "0700000000".into(),
                mail: "jane@example.com".into(),
            },
        }
    }

    #[test]
    fn censored_view_carries_no_identity() {
        let view = CensoredCvView::from(&sample());
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("Jane"));
        assert!(!json.contains("jane@example.com"));
        assert_eq!(
            STANDARD.decode(view.censored_cv).unwrap(),
            b"[NAME], [EMAIL]"
        );
    }

    #[test]
    fn uncensored_view_exposes_original() {
        let view = CvView::from(&sample());
        assert_eq!(view.firstname, "Jane");
        assert_eq!(
            STANDARD.decode(view.cv).unwrap(),
            b"Jane Doe, jane@example.com"
        );
    }

    #[test]
    fn submission_uses_pascal_case_fields() {
        let body = r#"{"CV":"cv","Firstname":"A","Lastname":"B","Phonenumber":"1","Mail":"a@b.c"}"#;
        let submission: ApplicationSubmission = serde_json::from_str(body).unwrap();
        assert_eq!(submission.applicant().lastname, "B");
        assert_eq!(submission.cv, "cv");
    }

    #[test]
    fn submission_rejects_non_string_fields() {
        let body = r#"{"CV":42,"Firstname":"A","Lastname":"B","Phonenumber":"1","Mail":"a@b.c"}"#;
        assert!(serde_json::from_str::<ApplicationSubmission>(body).is_err());
    }
}
