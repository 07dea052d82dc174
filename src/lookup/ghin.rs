use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error};

use super::credential::{Credential, CredentialCache, TokenIssuer};
use super::{CourseDetails, CourseSummary, HandicapLookup, LookupError};

pub const DEFAULT_BASE_URL: &str = "https://api2.ghin.com/api/v1";
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Deserialize)]
struct LoginResponse {
    golfer_user: Option<LoginUser>,
}

#[derive(Deserialize)]
struct LoginUser {
    golfer_user_token: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct GolferSearchResponse {
    #[serde(default)]
    pub golfers: Vec<Value>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CourseSearchResponse {
    #[serde(default)]
    pub courses: Vec<CourseRecord>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct CourseRecord {
    #[serde(rename = "CourseID")]
    pub course_id: i64,
    pub course_name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Logs in with admin credentials and issues day-long tokens.
pub struct GhinLogin {
    http: Client,
    base_url: String,
    user: String,
    password: String,
}

impl GhinLogin {
    pub fn new(http: Client, base_url: impl Into<String>, user: String, password: String) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            user,
            password,
        }
    }
}

#[async_trait]
impl TokenIssuer for GhinLogin {
    async fn issue(&self, now: DateTime<Utc>) -> Result<Credential, LookupError> {
        let response = self
            .http
            .post(format!("{}/golfer_login.json", self.base_url))
            .json(&json!({
                "token": "dummy token",
                "user": {
                    "password": self.password,
                    "email_or_ghin": self.user,
                    "remember_me": true
                }
            }))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            error!(status = %response.status(), "failed to get admin token");
            return Err(LookupError::Auth(format!("login returned {}", response.status())));
        }
        let body: LoginResponse = response.json().await?;
        let token = body
            .golfer_user
            .and_then(|u| u.golfer_user_token)
            .ok_or_else(|| LookupError::Auth("token not found in response".to_string()))?;
        Ok(Credential {
            token,
            expires_at: now + Duration::hours(TOKEN_TTL_HOURS),
        })
    }
}

/// GHIN handicap and course lookups.
pub struct GhinClient {
    http: Client,
    base_url: String,
    credentials: Arc<CredentialCache<GhinLogin>>,
}

impl GhinClient {
    pub fn new(http: Client, base_url: impl Into<String>, credentials: Arc<CredentialCache<GhinLogin>>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, LookupError> {
        let token = self.credentials.acquire().await?;
        let url = format!("{}/{path}", self.base_url);
        debug!(%url, "ghin request");
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.credentials.invalidate().await;
            return Err(LookupError::Auth("token rejected".to_string()));
        }
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// The handicap index of the golfer whose GHIN number matches exactly.
#[must_use]
pub fn select_handicap(response: &GolferSearchResponse, ghin_id: &str) -> Option<f64> {
    response
        .golfers
        .iter()
        .find(|golfer| match golfer.get("ghin") {
            Some(Value::Number(n)) => n.to_string() == ghin_id,
            Some(Value::String(s)) => s == ghin_id,
            _ => false,
        })
        .and_then(|golfer| match golfer.get("handicap_index") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
}

#[async_trait]
impl HandicapLookup for GhinClient {
    async fn golfer_handicap(
        &self,
        ghin_id: &str,
        last_name: &str,
        state: &str,
    ) -> Result<Option<f64>, LookupError> {
        let body = self
            .get_json(
                "golfers/search.json",
                &[
                    ("per_page", "50"),
                    ("page", "1"),
                    ("ghin_id", ghin_id),
                    ("last_name", last_name),
                    ("state", state),
                ],
            )
            .await?;
        let response: GolferSearchResponse = serde_json::from_value(body)?;
        Ok(select_handicap(&response, ghin_id))
    }

    async fn search_courses(&self, name: &str) -> Result<Vec<CourseSummary>, LookupError> {
        let body = self.get_json("courses/search.json", &[("name", name)]).await?;
        let response: CourseSearchResponse = serde_json::from_value(body)?;
        Ok(response
            .courses
            .into_iter()
            .map(|c| CourseSummary {
                course_id: c.course_id,
                name: c.course_name,
                city: c.city,
                state: c.state,
            })
            .collect())
    }

    async fn course_details(&self, course_id: i64) -> Result<CourseDetails, LookupError> {
        let body = self.get_json(&format!("courses/{course_id}.json"), &[]).await?;
        let details: CourseDetails = serde_json::from_value(body)?;
        debug!(course_id, status = %details.course_status, "course details");
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handicap_is_taken_from_the_exact_ghin_match() {
        let response: GolferSearchResponse = serde_json::from_value(json!({
            "golfers": [
                {"ghin": 1234, "last_name": "Smith", "state": "VA", "handicap_index": "14.2"},
                {"ghin": 12345, "last_name": "Smith", "state": "VA", "handicap_index": 3.1}
            ]
        }))
        .expect("fixture");
        assert_eq!(select_handicap(&response, "12345"), Some(3.1));
        assert_eq!(select_handicap(&response, "1234"), Some(14.2));
        assert_eq!(select_handicap(&response, "999"), None);
    }

    #[test]
    fn course_records_use_ghin_field_names() {
        let response: CourseSearchResponse = serde_json::from_value(json!({
            "courses": [
                {"CourseID": 77, "CourseName": "Pine Valley", "City": "Pine Valley", "State": "NJ", "FacilityID": 9}
            ]
        }))
        .expect("fixture");
        assert_eq!(response.courses.len(), 1);
        assert_eq!(response.courses[0].course_id, 77);
        assert_eq!(response.courses[0].state.as_deref(), Some("NJ"));
    }

    #[test]
    fn course_details_fill_in_missing_fields() {
        let details: CourseDetails = serde_json::from_value(json!({
            "Facility": {"FacilityName": "Pine Valley GC"},
            "TeeSets": [{"TeeSetRatingName": "Blue", "TotalYardage": 6765}],
            "CourseCity": "Pine Valley"
        }))
        .expect("fixture");
        assert_eq!(details.facility["FacilityName"], "Pine Valley GC");
        assert_eq!(details.season, json!({}));
        assert_eq!(details.tee_sets.len(), 1);
        assert_eq!(details.course_status, "Status Unknown");
        assert_eq!(details.course_city, "Pine Valley");
        assert_eq!(details.course_state, "State not available");
    }
}
