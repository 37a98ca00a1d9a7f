//! Typed client for the site API.
//!
//! Queries go through a [`QueryCache`] and are retried with a
//! [`RetryPolicy`]; mutations are sent once and invalidate the cached
//! queries they affect.

mod cache;
mod retry;

pub use cache::{QueryCache, QueryKey, DEFAULT_STALE_TIME};
pub use retry::RetryPolicy;

use bytes::Bytes;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

use crate::api::chat::ChatTurn;
use crate::db::{Blog, ContactInput, Message, Order, OrderInput, PricingPlanResponse, ProjectResponse, SiteSettings};

/// Shown to the visitor when the assistant cannot answer
pub const CHAT_FAILED: &str = "Sorry, I couldn't reach the assistant. Please try again in a moment.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Chat(String),
}

impl ClientError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Transport failures, server errors and rate limiting are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_decode() && !e.is_builder(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

/// Message of an error body: the `{error: {message}}` envelope or a bare `{error: "..."}`
fn error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(error) => error.get("message")?.as_str().map(str::to_string),
        _ => None,
    }
}

/// Pricing comes back as a bare array or wrapped as `{plans: [...]}`
fn parse_plans(body: Value) -> Result<Vec<PricingPlanResponse>, ClientError> {
    let plans = match body {
        Value::Object(mut map) => map.remove("plans").unwrap_or(Value::Null),
        other => other,
    };
    from_value(plans)
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Take `field` out of a response object
fn take<T: DeserializeOwned>(mut body: Value, field: &str) -> Result<T, ClientError> {
    match body.get_mut(field) {
        Some(value) => from_value(value.take()),
        None => Err(ClientError::InvalidResponse(format!("missing `{}`", field))),
    }
}

/// Contact details of an order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

/// Body of `POST /api/orders`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OrderRequest(OrderInput);

impl OrderRequest {
    /// Order for `plan`; its id, name, price and currency are copied as they are
    pub fn for_plan(plan: &PricingPlanResponse, contact: OrderContact) -> Self {
        Self(OrderInput {
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            message: contact.message,
            plan_id: plan.id.clone(),
            plan: plan.name.clone(),
            price: plan.price,
            currency: plan.currency.clone(),
        })
    }

    pub fn input(&self) -> &OrderInput {
        &self.0
    }
}

pub struct SiteClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    cache: QueryCache,
    retry: RetryPolicy,
}

impl SiteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            cache: QueryCache::default(),
            retry: RetryPolicy::default(),
        })
    }

    /// Admin token for the `/api/admin` routes and uploads
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-success response into [`ClientError::Status`]
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| error_message(&body))
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("error").to_string()
                } else {
                    text
                }
            });
        Err(ClientError::status(status.as_u16(), message))
    }

    async fn fetch(&self, key: &QueryKey, missing_ok: bool) -> Result<Value, ClientError> {
        let request = self.http.get(self.url(key.path())).query(key.params());
        let response = self.authorized(request).send().await?;
        if missing_ok && response.status() == StatusCode::NOT_FOUND {
            return Ok(Value::Null);
        }
        Ok(Self::check(response).await?.json().await?)
    }

    /// Cached, retried GET. With `missing_ok` a 404 reads as `null`.
    async fn query(&self, key: QueryKey, missing_ok: bool) -> Result<Value, ClientError> {
        self.cache
            .get_or_fetch(&key, || self.retry.run(|| self.fetch(&key, missing_ok)))
            .await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ClientError> {
        let request = self.http.request(method, self.url(path)).json(body);
        let response = self.authorized(request).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<String, ClientError> {
        let response = self.http.get(self.url("/health")).send().await?;
        Ok(Self::check(response).await?.text().await?)
    }

    pub async fn projects(
        &self,
        category: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<ProjectResponse>, ClientError> {
        let key = QueryKey::new("/api/projects")
            .param_opt("category", category)
            .param_opt("limit", limit);
        take(self.query(key, false).await?, "projects")
    }

    /// `None` when no published project has this slug
    pub async fn project(&self, slug: &str) -> Result<Option<ProjectResponse>, ClientError> {
        let body = self.query(QueryKey::new(format!("/api/projects/{}", slug)), true).await?;
        if body.is_null() {
            return Ok(None);
        }
        take(body, "project").map(Some)
    }

    pub async fn blogs(&self) -> Result<Vec<Blog>, ClientError> {
        take(self.query(QueryKey::new("/api/blogs"), false).await?, "blogs")
    }

    pub async fn blog(&self, slug: &str) -> Result<Option<Blog>, ClientError> {
        let body = self.query(QueryKey::new(format!("/api/blogs/{}", slug)), true).await?;
        if body.is_null() {
            return Ok(None);
        }
        take(body, "blog").map(Some)
    }

    pub async fn pricing(&self) -> Result<Vec<PricingPlanResponse>, ClientError> {
        parse_plans(self.query(QueryKey::new("/api/pricing"), false).await?)
    }

    pub async fn settings(&self) -> Result<SiteSettings, ClientError> {
        from_value(self.query(QueryKey::new("/api/settings"), false).await?)
    }

    /// Admin: all orders, newest first
    pub async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        take(self.query(QueryKey::new("/api/admin/orders"), false).await?, "orders")
    }

    /// Admin: contact messages, newest first
    pub async fn messages(&self) -> Result<Vec<Message>, ClientError> {
        take(self.query(QueryKey::new("/api/admin/messages"), false).await?, "messages")
    }

    pub async fn submit_order(&self, order: &OrderRequest) -> Result<Order, ClientError> {
        let body = self.send_json(reqwest::Method::POST, "/api/orders", order).await?;
        self.cache.invalidate_prefix("/api/admin/orders");
        take(body, "order")
    }

    pub async fn submit_contact(&self, input: &ContactInput) -> Result<(), ClientError> {
        self.send_json(reqwest::Method::POST, "/api/contact", input).await?;
        self.cache.invalidate_prefix("/api/admin/messages");
        Ok(())
    }

    /// Upload a file from disk; returns its public URL
    pub async fn upload(&self, path: &Path) -> Result<String, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        self.upload_bytes(&file_name, Bytes::from(bytes)).await
    }

    pub async fn upload_bytes(&self, file_name: &str, bytes: Bytes) -> Result<String, ClientError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let part = multipart::Part::stream(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime.essence_str())?;
        let form = multipart::Form::new().part("file", part);

        let request = self.http.post(self.url("/api/upload")).multipart(form);
        let response = self.authorized(request).send().await?;
        let body: Value = Self::check(response).await?.json().await?;
        take(body, "url")
    }

    /// One chat exchange; `history` is the transcript before `message`
    pub async fn chat(&self, message: &str, history: &[ChatTurn]) -> Result<String, ClientError> {
        let body = self
            .send_json(
                reqwest::Method::POST,
                "/api/chat",
                &json!({ "message": message, "history": history }),
            )
            .await?;
        take(body, "response")
    }
}

/// In-memory chat transcript
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    transcript: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Send `message` with the transcript so far. The message stays in the
    /// transcript even when the exchange fails.
    pub async fn send(&mut self, client: &SiteClient, message: &str) -> Result<String, ClientError> {
        let history = self.transcript.clone();
        self.transcript.push(ChatTurn::user(message));
        match client.chat(message, &history).await {
            Ok(reply) => {
                self.transcript.push(ChatTurn::model(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat exchange failed");
                Err(ClientError::Chat(CHAT_FAILED.to_string()))
            }
        }
    }
}
