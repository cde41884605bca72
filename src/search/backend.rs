use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::query::{SearchQuery, SearchResult};

const SEARCH_PATH: &str = "api/search/";
const MISSING_PERMISSIONS: &str = "missing permissions";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The request was superseded or aborted before it finished.
    #[error("search request was cancelled")]
    Cancelled,
    #[error("could not reach the archive server: {0}")]
    Transport(String),
    #[error("archive server rejected the search: {0}")]
    Backend(String),
    #[error("unexpected search response: {0}")]
    Decode(String),
    #[error("invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
}

impl SearchError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SearchError::Decode(e.to_string())
        } else {
            SearchError::Transport(e.to_string())
        }
    }
}

/// Executes one search. The returned future owns everything it needs so it
/// can be spawned and dropped independently of the caller.
pub trait SearchBackend {
    fn search(&self, query: &SearchQuery) -> BoxFuture<'static, Result<Vec<SearchResult>, SearchError>>;
}

/// Talks to the archive server's `api/search/` endpoint.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(server_url: &str, token: Option<String>) -> Result<Self, SearchError> {
        let endpoint = search_endpoint(server_url)?;
        debug!(%endpoint, authenticated = token.is_some(), "created HTTP search backend");

        Ok(Self {
            client: Client::new(),
            endpoint,
            token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn search_endpoint(server_url: &str) -> Result<Url, SearchError> {
    let invalid = |reason: String| SearchError::InvalidServerUrl {
        url: server_url.to_string(),
        reason,
    };

    // Without a trailing slash `join` would replace the last path segment.
    let base = if server_url.ends_with('/') {
        server_url.to_string()
    } else {
        format!("{server_url}/")
    };

    let base = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }
    base.join(SEARCH_PATH).map_err(|e| invalid(e.to_string()))
}

impl SearchBackend for HttpBackend {
    fn search(&self, query: &SearchQuery) -> BoxFuture<'static, Result<Vec<SearchResult>, SearchError>> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .json(query);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token:{token}"));
        }

        async move {
            let response = request.send().await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(SearchError::Backend(MISSING_PERMISSIONS.to_string()));
            }

            let body: Value = response.json().await?;
            parse_search_response(body)
        }
        .boxed()
    }
}

fn parse_search_response(body: Value) -> Result<Vec<SearchResult>, SearchError> {
    if let Some(error) = body.get("error") {
        let message = error
            .as_str()
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(SearchError::Backend(message));
    }

    serde_json::from_value(body).map_err(|e| SearchError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_with_and_without_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8000", None).unwrap();
        assert_eq!(backend.endpoint().as_str(), "http://localhost:8000/api/search/");

        let backend = HttpBackend::new("https://archive.example.org/browse/", None).unwrap();
        assert_eq!(
            backend.endpoint().as_str(),
            "https://archive.example.org/browse/api/search/"
        );
    }

    #[test]
    fn test_invalid_server_url() {
        assert!(matches!(
            HttpBackend::new("not a url", None),
            Err(SearchError::InvalidServerUrl { .. })
        ));
        assert!(matches!(
            HttpBackend::new("mailto:someone@example.org", None),
            Err(SearchError::InvalidServerUrl { .. })
        ));
    }

    #[test]
    fn test_parse_results() {
        let results = parse_search_response(json!([
            {"page": "account", "id": 1, "title": "@jane"},
            {"page": "account", "id": 2, "title": "@janet", "details": "Jane T."}
        ]))
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "@jane");
        assert_eq!(results[1].details.as_deref(), Some("Jane T."));
    }

    #[test]
    fn test_parse_error_object() {
        let err = parse_search_response(json!({"error": "missing token"})).unwrap_err();
        assert_eq!(err, SearchError::Backend("missing token".to_string()));
        assert!(!err.is_cancellation());
    }

    #[test]
    fn test_parse_unexpected_shape() {
        let err = parse_search_response(json!({"results": []})).unwrap_err();
        assert!(matches!(err, SearchError::Decode(_)));
    }

    #[test]
    fn test_only_cancelled_is_cancellation() {
        assert!(SearchError::Cancelled.is_cancellation());
        assert!(!SearchError::Transport("reset".to_string()).is_cancellation());
        assert!(!SearchError::Decode("eof".to_string()).is_cancellation());
    }
}
