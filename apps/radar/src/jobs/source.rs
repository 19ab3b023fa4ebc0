use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

const RAPIDAPI_HOST: &str = "linkedin-api8.p.rapidapi.com";
const SEARCH_URL: &str = "https://linkedin-api8.p.rapidapi.com/search-jobs-v2";

pub const DEFAULT_DATE_POSTED: &str = "past24Hours";
pub const DEFAULT_SORT: &str = "mostRecent";

/// Search parameters forwarded to the job board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub keywords: String,
    pub location_id: String,
    pub date_posted: String,
    pub sort: String,
}

impl JobQuery {
    pub fn new(keywords: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location_id: location_id.into(),
            date_posted: DEFAULT_DATE_POSTED.to_string(),
            sort: DEFAULT_SORT.to_string(),
        }
    }

    /// Returns a copy with every non-blank override applied.
    pub fn with_overrides(&self, overrides: JobQueryOverrides) -> Self {
        fn pick(current: &str, value: Option<String>) -> String {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| current.to_string())
        }

        Self {
            keywords: pick(&self.keywords, overrides.keywords),
            location_id: pick(&self.location_id, overrides.location_id),
            date_posted: pick(&self.date_posted, overrides.date_posted),
            sort: pick(&self.sort, overrides.sort),
        }
    }
}

/// Body of `POST /fetch-jobs`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQueryOverrides {
    pub keywords: Option<String>,
    pub location_id: Option<String>,
    pub date_posted: Option<String>,
    pub sort: Option<String>,
}

/// One posting as returned by the job board. The upstream schema is loose:
/// `company` is sometimes an object, ids are sometimes numbers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJobPosting {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, alias = "postAt", deserialize_with = "lenient_text")]
    pub date_posted: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Vec<RawJobPosting>>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::Null | Value::Array(_) => String::new(),
    })
}

#[derive(Debug, Error)]
pub enum JobSourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("job search API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait JobSource: Send + Sync {
    async fn search(&self, query: &JobQuery) -> Result<Vec<RawJobPosting>, JobSourceError>;
}

/// LinkedIn job search through RapidAPI.
#[derive(Clone)]
pub struct RapidApiJobSource {
    client: Client,
    api_key: String,
}

impl RapidApiJobSource {
    pub fn new(api_key: String, timeout: Option<Duration>) -> Result<Self, JobSourceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            api_key,
        })
    }
}

#[async_trait]
impl JobSource for RapidApiJobSource {
    async fn search(&self, query: &JobQuery) -> Result<Vec<RawJobPosting>, JobSourceError> {
        let response = self
            .client
            .get(SEARCH_URL)
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .header("x-rapidapi-key", &self.api_key)
            .query(&[
                ("keywords", query.keywords.as_str()),
                ("locationId", query.location_id.as_str()),
                ("datePosted", query.date_posted.as_str()),
                ("sort", query.sort.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(JobSourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.data.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let base = JobQuery::new("Fullstack developer", "101282230");
        let query = base.with_overrides(JobQueryOverrides {
            keywords: Some("Rust engineer".into()),
            sort: Some("   ".into()),
            ..Default::default()
        });

        assert_eq!(query.keywords, "Rust engineer");
        assert_eq!(query.location_id, "101282230");
        assert_eq!(query.date_posted, DEFAULT_DATE_POSTED);
        assert_eq!(query.sort, DEFAULT_SORT);
    }

    #[test]
    fn test_overrides_body_is_camel_case() {
        let overrides: JobQueryOverrides =
            serde_json::from_value(json!({"locationId": "90000084", "datePosted": "pastWeek"}))
                .unwrap();
        assert_eq!(overrides.location_id.as_deref(), Some("90000084"));
        assert_eq!(overrides.date_posted.as_deref(), Some("pastWeek"));
        assert!(overrides.keywords.is_none());
    }

    #[test]
    fn test_search_response_tolerates_loose_postings() {
        let body: SearchResponse = serde_json::from_value(json!({
            "success": true,
            "data": [
                {
                    "id": 4012345678u64,
                    "title": "Backend Engineer",
                    "company": {"name": "Acme", "url": "https://acme.example"},
                    "location": "Berlin",
                    "postAt": "2024-10-01 09:00:00 +0000 UTC"
                },
                {"title": null}
            ]
        }))
        .unwrap();

        let postings = body.data.unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].id, "4012345678");
        assert_eq!(postings[0].company, "Acme");
        assert_eq!(postings[0].date_posted, "2024-10-01 09:00:00 +0000 UTC");
        assert_eq!(postings[0].description, "");
        assert_eq!(postings[1].title, "");
    }

    #[test]
    fn test_search_response_without_data_is_empty() {
        let body: SearchResponse = serde_json::from_value(json!({"message": "quota"})).unwrap();
        assert!(body.data.unwrap_or_default().is_empty());
    }
}
