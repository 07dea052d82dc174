//! Handicap and course lookups against an external service. Nothing in the
//! scoring engine depends on this module.

pub mod credential;
pub mod ghin;
pub mod report;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use credential::{Credential, CredentialCache, TokenIssuer};
pub use ghin::{GhinClient, GhinLogin};
pub use report::{
    CourseDetailsReport, CourseSearchReport, HandicapReport, course_details_report,
    course_search_report, handicap_report,
};

#[derive(Error, Debug, Clone)]
pub enum LookupError {
    #[error("network error: {0}")]
    Network(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CourseSummary {
    pub course_id: i64,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// One course as the lookup service describes it. Missing fields fall back
/// to the service's own placeholders.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CourseDetails {
    #[serde(default = "empty_object")]
    pub facility: Value,
    #[serde(default = "empty_object")]
    pub season: Value,
    #[serde(default)]
    pub tee_sets: Vec<Value>,
    #[serde(default = "unknown_status")]
    pub course_status: String,
    #[serde(default = "unknown_city")]
    pub course_city: String,
    #[serde(default = "unknown_state")]
    pub course_state: String,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn unknown_status() -> String {
    "Status Unknown".to_string()
}

fn unknown_city() -> String {
    "City not available".to_string()
}

fn unknown_state() -> String {
    "State not available".to_string()
}

#[async_trait]
pub trait HandicapLookup: Send + Sync {
    async fn golfer_handicap(
        &self,
        ghin_id: &str,
        last_name: &str,
        state: &str,
    ) -> Result<Option<f64>, LookupError>;

    async fn search_courses(&self, name: &str) -> Result<Vec<CourseSummary>, LookupError>;

    async fn course_details(&self, course_id: i64) -> Result<CourseDetails, LookupError>;
}
