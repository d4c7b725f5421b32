//! hublex-remote — thin CRM API client.
//!
//! Implements [`hublex_core::api::CrmApi`] over the remote REST surface:
//! schema properties, the owner directory, and the object search endpoint.
//! Bearer-token auth, 401 and 429 mapped to their own error variants so
//! the core can tell auth failures from throttling.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use hublex_core::api::CrmApi;
use hublex_core::error::ApiError;
use hublex_core::types::{Filter, ObjectRecord, ObjectType, OwnerRecord, PropertyDescriptor};

/// The remote search endpoint rejects limits above this.
pub const MAX_SEARCH_LIMIT: usize = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the CRM REST API.
#[derive(Clone)]
pub struct CrmClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl CrmClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.as_u16() == 401 {
            return Err(ApiError::Unauthorized);
        }
        if status.as_u16() == 429 {
            return Err(ApiError::RateLimited);
        }
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(endpoint))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        self.check(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(self.url(endpoint))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        self.check(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ResultsEnvelope<T> {
    #[serde(default)]
    results: Vec<T>,
}

/// Build the search request body the remote expects: a single filter group,
/// optional display properties, and a clamped limit.
fn search_body(filters: &[Filter], properties: Option<&[String]>, limit: usize) -> serde_json::Value {
    let mut body = json!({
        "filterGroups": if filters.is_empty() {
            json!([])
        } else {
            json!([{ "filters": filters }])
        },
        "limit": limit.min(MAX_SEARCH_LIMIT),
    });
    if let Some(props) = properties {
        body["properties"] = json!(props);
    }
    body
}

impl CrmApi for CrmClient {
    async fn fetch_properties(
        &self,
        object_type: ObjectType,
    ) -> Result<Vec<PropertyDescriptor>, ApiError> {
        let envelope: ResultsEnvelope<PropertyDescriptor> = self
            .get_json(&format!("/crm/v3/properties/{object_type}"))
            .await?;
        tracing::debug!(%object_type, count = envelope.results.len(), "fetched schema properties");
        Ok(envelope.results)
    }

    async fn fetch_owners(&self) -> Result<Vec<OwnerRecord>, ApiError> {
        let envelope: ResultsEnvelope<OwnerRecord> = self.get_json("/crm/v3/owners").await?;
        tracing::debug!(count = envelope.results.len(), "fetched owner directory");
        Ok(envelope.results)
    }

    async fn search(
        &self,
        object_type: ObjectType,
        filters: &[Filter],
        properties: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<ObjectRecord>, ApiError> {
        let body = search_body(filters, properties, limit);
        let envelope: ResultsEnvelope<ObjectRecord> = self
            .post_json(&format!("/crm/v3/objects/{object_type}/search"), &body)
            .await?;
        Ok(envelope.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn search_body_clamps_limit_and_wraps_filters() {
        let filters = vec![Filter::eq("city", "Dallas")];
        let props = vec!["name".to_string(), "city".to_string()];
        let body = search_body(&filters, Some(&props), 5000);

        assert_eq!(body["limit"], 1000);
        assert_eq!(body["filterGroups"][0]["filters"][0]["propertyName"], "city");
        assert_eq!(body["properties"][0], "name");
    }

    #[test]
    fn empty_filters_produce_empty_filter_groups() {
        let body = search_body(&[], None, 10);
        assert_eq!(body["filterGroups"], json!([]));
        assert!(body.get("properties").is_none());
    }

    #[test]
    fn owner_envelope_decodes_remote_field_names() {
        let json = r#"{"results":[{"id":"123","firstName":"Tyler","lastName":"Beagley","email":"t@example.com"}]}"#;
        let envelope: ResultsEnvelope<OwnerRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.results[0].full_name(), "Tyler Beagley");
    }
}
