//! reqwest implementations of the remote services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::retry::{retry, RetryPolicy};
use super::{ReviewBackend, SafetyAdvisor};
use crate::config::{BackendConfig, SafetyConfig};
use crate::error::{Error, Result};
use crate::model::{ReviewSubmission, SubmitReceipt};
use crate::reshape::{records_from_values, ReviewRecord};

const USER_AGENT: &str = concat!("safewander/", env!("CARGO_PKG_VERSION"));

/// A JSON-over-HTTP client rooted at one base URL.
#[derive(Debug, Clone)]
struct JsonClient {
    client: Client,
    base_url: String,
}

impl JsonClient {
    fn new(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = self.url(path);
        let operation = format!("GET {path}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| request_error(e, &operation))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(e, &operation))?;
        serde_json::from_slice(&body).map_err(|e| Error::decode("response body", e.to_string()))
    }
}

fn request_error(err: reqwest::Error, operation: &str) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            operation: operation.to_string(),
        }
    } else {
        Error::Http(err)
    }
}

/// The review backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: JsonClient,
    retry: RetryPolicy,
}

impl HttpBackend {
    /// Build a client for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            http: JsonClient::new(&config.url, config.timeout(), config.connect_timeout())?,
            retry,
        })
    }

    /// The base URL requests go to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }
}

#[async_trait]
impl ReviewBackend for HttpBackend {
    async fn list_reviews(&self) -> Result<Option<Vec<ReviewRecord>>> {
        let body = retry(&self.retry, "GET /reviews", || self.http.get("/reviews", &[])).await?;
        let records = reviews_array(body).map(records_from_values);
        match &records {
            Some(records) => debug!("Fetched {} review records", records.len()),
            None => warn!("No reviews found or unexpected response from {}", self.base_url()),
        }
        Ok(records)
    }

    async fn get_review(&self, id: i64) -> Result<ReviewRecord> {
        let path = format!("/reviews/{id}");
        let operation = format!("GET {path}");
        let body = retry(&self.retry, &operation, || self.http.get(&path, &[]))
            .await
            .map_err(|e| match e {
                Error::Status { status: 404, .. } => Error::NotFound { id },
                other => other,
            })?;

        let mut record = ReviewRecord::from_value(unwrap_review(body)?)
            .map_err(|e| Error::decode("review record", e.to_string()))?;
        if record.id.is_none() {
            record.id = Some(id);
        }
        Ok(record)
    }

    // Not retried in place: a POST that timed out may still have landed.
    // Callers park transient failures in the outbox instead.
    async fn submit_review(&self, submission: &ReviewSubmission) -> Result<SubmitReceipt> {
        let operation = "POST /submit-review";
        let url = self.http.url("/submit-review");
        let response = self
            .http
            .client
            .post(&url)
            .json(submission)
            .send()
            .await
            .map_err(|e| request_error(e, operation))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(e, operation))?;
        Ok(parse_receipt(&body))
    }
}

/// Take the `reviews` array out of a list response.
fn reviews_array(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Object(mut map) => match map.remove("reviews") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Accept both `{"review": {...}}` and a bare record.
fn unwrap_review(body: Value) -> Result<Value> {
    match body {
        Value::Object(mut map) => match map.remove("review") {
            Some(inner @ Value::Object(_)) => Ok(inner),
            // A bare record whose `review` is the narrative text.
            Some(text) => {
                map.insert("review".to_string(), text);
                Ok(Value::Object(map))
            }
            None => Ok(Value::Object(map)),
        },
        other => Err(Error::decode(
            "review record",
            format!("expected a JSON object, got {other}"),
        )),
    }
}

fn parse_receipt(body: &[u8]) -> SubmitReceipt {
    if body.iter().all(u8::is_ascii_whitespace) {
        return SubmitReceipt::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!("Ignoring unreadable submit response: {}", e);
        SubmitReceipt::default()
    })
}

/// The safety-review service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSafetyAdvisor {
    http: JsonClient,
    retry: RetryPolicy,
}

impl HttpSafetyAdvisor {
    /// Build a client for the service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &SafetyConfig, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            http: JsonClient::new(&config.api_url, config.timeout(), config.timeout())?,
            retry,
        })
    }
}

#[async_trait]
impl SafetyAdvisor for HttpSafetyAdvisor {
    async fn safety_reviews(&self, place_name: &str, location: &str) -> Result<Vec<String>> {
        let query = safety_query(place_name, location)?;
        let body = retry(&self.retry, "GET /safety-reviews", || {
            self.http.get("/safety-reviews", &query)
        })
        .await?;

        match body.get("reviews") {
            Some(Value::Array(items)) => Ok(items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()),
            _ => {
                warn!("Safety-review response for {} had no reviews", place_name);
                Ok(Vec::new())
            }
        }
    }
}

/// Query parameters for `/safety-reviews`, with blank values left out.
pub(crate) fn safety_query<'a>(
    place_name: &'a str,
    location: &'a str,
) -> Result<Vec<(&'static str, &'a str)>> {
    let place_name = place_name.trim();
    let location = location.trim();
    if place_name.is_empty() && location.is_empty() {
        return Err(Error::validation(
            "placeName",
            "a place name or a location is required",
        ));
    }

    let mut query = Vec::with_capacity(2);
    if !place_name.is_empty() {
        query.push(("placeName", place_name));
    }
    if !location.is_empty() {
        query.push(("location", location));
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_is_normalized() {
        let config = BackendConfig {
            url: "http://localhost:5000/".to_string(),
            ..BackendConfig::default()
        };
        let backend = HttpBackend::new(&config, RetryPolicy::none()).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:5000");
        assert_eq!(
            backend.http.url("/reviews"),
            "http://localhost:5000/reviews"
        );
    }

    #[test]
    fn test_reviews_array() {
        let items = reviews_array(json!({"reviews": [{"id": 1}, {"id": 2}]})).unwrap();
        assert_eq!(items.len(), 2);

        assert!(reviews_array(json!({"message": "ok"})).is_none());
        assert!(reviews_array(json!({"reviews": "none"})).is_none());
        assert!(reviews_array(json!([{"id": 1}])).is_none());
    }

    #[test]
    fn test_unwrap_wrapped_review() {
        let value = unwrap_review(json!({"review": {"id": 3, "placeName": "Cafe"}})).unwrap();
        assert_eq!(value["id"], 3);
    }

    #[test]
    fn test_unwrap_bare_review_keeps_text() {
        let value = unwrap_review(json!({"id": 3, "review": "Felt safe all evening."})).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["review"], "Felt safe all evening.");
    }

    #[test]
    fn test_unwrap_rejects_non_objects() {
        let err = unwrap_review(json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_parse_receipt() {
        assert_eq!(parse_receipt(b""), SubmitReceipt::default());
        assert_eq!(parse_receipt(b"  \n"), SubmitReceipt::default());
        assert_eq!(parse_receipt(b"Created"), SubmitReceipt::default());

        let receipt = parse_receipt(br#"{"id": 17, "message": "Review submitted"}"#);
        assert_eq!(receipt.id, Some(17));
        assert_eq!(receipt.message.as_deref(), Some("Review submitted"));
    }

    #[test]
    fn test_safety_query_omits_blanks() {
        assert_eq!(
            safety_query(" Senso-ji ", "").unwrap(),
            vec![("placeName", "Senso-ji")]
        );
        assert_eq!(
            safety_query("", "Asakusa").unwrap(),
            vec![("location", "Asakusa")]
        );
        assert_eq!(safety_query("A", "B").unwrap().len(), 2);
    }

    #[test]
    fn test_safety_query_requires_something() {
        let err = safety_query("  ", "").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation {
                field: "placeName",
                ..
            }
        ));
    }
}
