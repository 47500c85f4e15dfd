// Shared HTTP transport configuration.
//
// The only HTTP traffic is the one-shot fetch of a remote facility
// document at startup; the live link is the websocket.

use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("vccs/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        Ok(reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?)
    }

    /// Fetch a JSON document, returning it untyped.
    ///
    /// Non-success statuses surface as [`Error::Transport`]; a body that is
    /// not JSON surfaces as [`Error::Decode`] with the raw text attached.
    pub async fn fetch_json(&self, url: &Url) -> Result<serde_json::Value, Error> {
        let client = self.build_client()?;
        tracing::debug!(url = %url, "fetching document");

        let body = client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        serde_json::from_str(&body).map_err(|e| Error::Decode {
            message: e.to_string(),
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_json_document() {
        let server = MockServer::start().await;
        let doc = json!({ "id": "ZOA", "name": "Oakland", "positions": [] });

        Mock::given(method("GET"))
            .and(path("/facilities.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&doc))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/facilities.json", server.uri())).unwrap();
        let fetched = TransportConfig::default().fetch_json(&url).await.unwrap();
        assert_eq!(fetched, doc);
    }

    #[tokio::test]
    async fn http_errors_are_transport_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.json", server.uri())).unwrap();
        let err = TransportConfig::default().fetch_json(&url).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn non_json_bodies_are_decode_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let err = TransportConfig::default().fetch_json(&url).await.unwrap_err();
        assert!(err.is_decode());
    }
}
