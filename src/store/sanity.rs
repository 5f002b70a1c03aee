//! HTTP client for the Sanity query and mutation APIs

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{groq, ContentStore, StoreError};
use crate::config::StoreConfig;
use crate::content::{NewComment, Post, PostPath, PostSummary};

/// Envelope of every query response
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// Content store backed by the Sanity HTTP API
pub struct SanityClient {
    client: reqwest::Client,
    api_url: String,
    dataset: String,
    token: Option<String>,
}

impl SanityClient {
    /// Create a client for the configured project and dataset
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("sanity-press/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    pub fn with_client(client: reqwest::Client, config: &StoreConfig) -> Self {
        Self {
            client,
            api_url: format!("{}/v{}", config.api_base(), config.api_version),
            dataset: config.dataset.clone(),
            token: config.token.clone(),
        }
    }

    /// Run a GROQ query and return its `result`
    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, String)],
    ) -> Result<T, StoreError> {
        let mut pairs: Vec<(String, String)> = vec![("query".to_string(), query.to_string())];
        for (name, value) in params {
            pairs.push((format!("${}", name), value.clone()));
        }

        let mut request = self
            .client
            .get(format!("{}/data/query/{}", self.api_url, self.dataset))
            .query(&pairs);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = Self::ensure_success(request.send().await?).await?;
        let body = response.text().await?;
        let parsed: QueryResponse<T> = serde_json::from_str(&body)?;
        Ok(parsed.result)
    }

    /// Return the response unchanged on 2xx, otherwise an [`StoreError::Api`]
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ContentStore for SanityClient {
    async fn post_paths(&self) -> Result<Vec<PostPath>, StoreError> {
        self.query(groq::POST_PATHS, &[]).await
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        self.query(groq::POST_BY_SLUG, &[("slug", groq::param(slug))])
            .await
    }

    async fn post_summaries(&self) -> Result<Vec<PostSummary>, StoreError> {
        self.query(groq::POST_SUMMARIES, &[]).await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<(), StoreError> {
        let token = self.token.as_ref().ok_or(StoreError::MissingToken)?;

        let body = serde_json::json!({
            "mutations": [{
                "create": {
                    "_type": "comment",
                    "post": {
                        "_type": "reference",
                        "_ref": comment.post_id,
                    },
                    "name": comment.name,
                    "email": comment.email,
                    "comment": comment.comment,
                    "approved": false,
                }
            }]
        });

        let response = self
            .client
            .post(format!("{}/data/mutate/{}", self.api_url, self.dataset))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        tracing::info!("Created pending comment on post {}", comment.post_id);
        Ok(())
    }
}
