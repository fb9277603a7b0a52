//! Job posting view model (job joined with its company).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job as displayed to applicants and recruiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: Uuid,
    pub title: String,
    /// Company name.
    pub company: String,
    pub company_id: Uuid,
    pub location: String,
    /// e.g. full-time, part-time.
    pub extent: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Last day applications are accepted.
    pub date_of_termination: NaiveDate,
}
