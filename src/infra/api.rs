use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use crate::domain::engagement::{Comment, Reply};
use crate::domain::post::{FeedPage, Post};
use crate::session::Session;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server rejected request ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// The platform's content REST surface, as consumed by the engine.
///
/// One method per endpoint; implementations attach the bearer credential
/// where one is held. Like toggles and deletes acknowledge without a body.
#[async_trait]
pub trait BlogApi: Send + Sync {
    async fn search_posts(&self, search: &str, page: u32, limit: u32)
        -> Result<FeedPage, ApiError>;
    async fn get_post(&self, post_id: &str) -> Result<Post, ApiError>;
    async fn create_post(&self, title: &str, content: &str) -> Result<Post, ApiError>;
    async fn update_post(&self, post_id: &str, title: &str, content: &str)
        -> Result<Post, ApiError>;
    async fn toggle_post_like(&self, post_id: &str) -> Result<(), ApiError>;
    async fn delete_post(&self, post_id: &str) -> Result<(), ApiError>;

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, ApiError>;
    async fn create_comment(&self, post_id: &str, text: &str) -> Result<Comment, ApiError>;
    async fn create_reply(&self, comment_id: &str, text: &str) -> Result<Reply, ApiError>;
    async fn toggle_comment_like(&self, comment_id: &str) -> Result<(), ApiError>;
    async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError>;
    async fn delete_reply(&self, comment_id: &str, reply_id: &str) -> Result<(), ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// `BlogApi` over HTTP: reqwest against the configured base URL, bearer
/// credential taken from the shared session at request time.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
    session: Session,
}

impl HttpApi {
    pub fn new(config: &ClientConfig, session: Session) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| ApiError::Transport(format!("invalid endpoint {}: {}", path, err)))?;
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(status, response).await,
        })
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn fetch_ack(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.execute(builder).await?;
        Ok(())
    }
}

/// Prefers the server's `{"error": ...}` body, falls back to the raw body or
/// the status line when the shape is unexpected.
async fn error_message(status: StatusCode, response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
        return parsed.error;
    }
    if !body.is_empty() {
        return body;
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[async_trait]
impl BlogApi for HttpApi {
    async fn search_posts(
        &self,
        search: &str,
        page: u32,
        limit: u32,
    ) -> Result<FeedPage, ApiError> {
        let builder = self.request(Method::GET, "posts")?.query(&[
            ("search", search.to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ]);
        self.fetch_json(builder).await
    }

    async fn get_post(&self, post_id: &str) -> Result<Post, ApiError> {
        let builder = self.request(Method::GET, &format!("posts/{}", post_id))?;
        self.fetch_json(builder).await
    }

    async fn create_post(&self, title: &str, content: &str) -> Result<Post, ApiError> {
        let builder = self
            .request(Method::POST, "posts")?
            .json(&json!({ "title": title, "content": content }));
        self.fetch_json(builder).await
    }

    async fn update_post(
        &self,
        post_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Post, ApiError> {
        let builder = self
            .request(Method::PUT, &format!("posts/{}", post_id))?
            .json(&json!({ "title": title, "content": content }));
        self.fetch_json(builder).await
    }

    async fn toggle_post_like(&self, post_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::PUT, &format!("posts/{}/like", post_id))?;
        self.fetch_ack(builder).await
    }

    async fn delete_post(&self, post_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("posts/{}", post_id))?;
        self.fetch_ack(builder).await
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, ApiError> {
        let builder = self.request(Method::GET, &format!("comments/{}", post_id))?;
        self.fetch_json(builder).await
    }

    async fn create_comment(&self, post_id: &str, text: &str) -> Result<Comment, ApiError> {
        let builder = self
            .request(Method::POST, &format!("comments/{}", post_id))?
            .json(&json!({ "text": text }));
        self.fetch_json(builder).await
    }

    async fn create_reply(&self, comment_id: &str, text: &str) -> Result<Reply, ApiError> {
        let builder = self
            .request(Method::POST, &format!("comments/reply/{}", comment_id))?
            .json(&json!({ "text": text }));
        self.fetch_json(builder).await
    }

    async fn toggle_comment_like(&self, comment_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::PUT, &format!("comments/like/{}", comment_id))?;
        self.fetch_ack(builder).await
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("comments/{}", comment_id))?;
        self.fetch_ack(builder).await
    }

    async fn delete_reply(&self, comment_id: &str, reply_id: &str) -> Result<(), ApiError> {
        let builder = self.request(
            Method::DELETE,
            &format!("comments/{}/reply/{}", comment_id, reply_id),
        )?;
        self.fetch_ack(builder).await
    }
}
