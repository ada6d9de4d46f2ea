// Marketplace REST adapter for statuses
// Endpoints mirror the mobile client: /api/status/users/, /api/status/{id}/view/,
// /api/status/{id}/ and /api/status/{id}/reply/

use async_trait::async_trait;
use log::{debug, error, warn};
use serde_json::{json, Value};
use std::time::Duration;

use super::{ReplySender, ServiceError, ServiceResult, StatusService};
use crate::models::{StatusCollection, StatusId, UserId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RestStatusService {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestStatusService {
    pub fn new(base_url: &str, token: Option<String>) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("statusreel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ServiceResult<reqwest::Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(message));
        }
        Err(ServiceError::Http { status: status.as_u16(), message })
    }
}

/// Decodes the feed; anything other than an array is treated as empty.
pub fn decode_feed(payload: Value) -> ServiceResult<Vec<StatusCollection>> {
    match payload {
        Value::Array(_) => {
            let mut feed: Vec<StatusCollection> =
                serde_json::from_value(payload).map_err(|e| ServiceError::Decode(e.to_string()))?;
            for collection in feed.iter_mut() {
                collection.sort_by_creation();
            }
            Ok(feed)
        }
        other => {
            warn!("Expected status feed array, got {}", json_kind(&other));
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl StatusService for RestStatusService {
    async fn fetch_feed(&self) -> ServiceResult<Vec<StatusCollection>> {
        let url = self.endpoint("api/status/users/");
        debug!("Fetching status feed from {}", url);
        let response = self.send(self.client.get(&url)).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        let feed = decode_feed(payload)?;
        debug!("Fetched {} status collections", feed.len());
        Ok(feed)
    }

    async fn record_view(&self, status_id: StatusId) -> ServiceResult<()> {
        let url = self.endpoint(&format!("api/status/{}/view/", status_id));
        self.send(self.client.post(&url)).await?;
        Ok(())
    }

    async fn delete_status(&self, status_id: StatusId) -> ServiceResult<()> {
        let url = self.endpoint(&format!("api/status/{}/", status_id));
        debug!("Deleting status {}", status_id);
        match self.send(self.client.delete(&url)).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to delete status {}: {}", status_id, e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl ReplySender for RestStatusService {
    async fn send_reply(&self, author_id: UserId, status_id: StatusId, text: &str) -> ServiceResult<()> {
        let url = self.endpoint(&format!("api/status/{}/reply/", status_id));
        let body = json!({ "text": text, "recipient": author_id });
        self.send(self.client.post(&url).json(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_with_single_slash() {
        let service = RestStatusService::new("http://192.168.8.101:8000/", None).unwrap();
        assert_eq!(
            service.endpoint("/api/status/4/view/"),
            "http://192.168.8.101:8000/api/status/4/view/"
        );
        assert_eq!(service.endpoint("api/status/users/"), "http://192.168.8.101:8000/api/status/users/");
    }

    #[test]
    fn test_decode_feed_non_array_is_empty() {
        let feed = decode_feed(json!({ "detail": "Authentication credentials were not provided." })).unwrap();
        assert!(feed.is_empty());
    }

    #[test]
    fn test_decode_feed_sorts_statuses_oldest_first() {
        let payload = json!([{
            "user": { "id": 3, "username": "kofi" },
            "statuses": [
                { "id": 9, "content": "later", "created_at": "2024-05-01T13:00:00Z" },
                { "id": 8, "content": "earlier", "created_at": "2024-05-01T12:00:00Z" }
            ],
            "unviewed_count": 1
        }]);
        let feed = decode_feed(payload).unwrap();
        assert_eq!(feed[0].statuses[0].id, 8);
        assert_eq!(feed[0].statuses[1].id, 9);
    }

    #[test]
    fn test_decode_feed_rejects_malformed_entries() {
        let payload = json!([{ "user": { "id": "not-a-number" } }]);
        assert!(matches!(decode_feed(payload), Err(ServiceError::Decode(_))));
    }
}
