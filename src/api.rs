use crate::config::AppConfig;
use crate::forms::{AdminUserPatch, BotUserPatch, CreateBotForm, LoginRequest, NewAdminUser, NewBotUser};
use crate::knowledge::{KnowledgeBaseSettingsPatch, NewDocument};
use crate::models::{
    AdminUser, ApiError, ApiResponse, Bot, BotStatus, BotUser, DashboardStats, Document,
    IndexedUrl, KnowledgeBaseSettings, PaginatedResponse, UrlScope,
};
use crate::settings::BotPatch;
use crate::utils::find_char_boundary;
use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ── Wire types shared with the server ───────────────────────────────────

/// `page` / `limit` / `search` query of the list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(page: usize, limit: usize) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            search: None,
        }
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: AdminUser,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: BotStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBotRequest {
    pub bot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDocuments {
    pub files: Vec<NewDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddUrlRequest {
    pub url: String,
    #[serde(default)]
    pub scope: UrlScope,
}

// ── Client ──────────────────────────────────────────────────────────────

/// Typed client for the console's REST API.
///
/// Every call returns the `data` of the success envelope. Non-2xx replies are
/// turned into errors carrying the server's `error` message and `code`.
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ConsoleClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        Url::parse(base_url).with_context(|| format!("Invalid API base URL: {base_url}"))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.api_base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token sent with every following request.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Joins path segments onto the base URL. Each segment is percent-encoded,
    /// so an id can never add segments or a query of its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("API base URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let mut req = self.http.request(method, self.endpoint(segments)?);
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("Invalid bearer token format")?;
            req = req.header(AUTHORIZATION, value);
        }
        Ok(req)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req
            .send()
            .await
            .with_context(|| format!("HTTP error talking to {}", self.base_url))?;
        let status = resp.status();
        let body = resp.text().await.context("Failed to read API response")?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiError>(&body) {
                Ok(err) => anyhow!(
                    "{} ({}): {}",
                    status,
                    err.code.as_deref().unwrap_or("UNKNOWN"),
                    err.error
                ),
                Err(_) => anyhow!(
                    "{}: {}",
                    status,
                    &body[..find_char_boundary(&body, 500)]
                ),
            });
        }

        serde_json::from_str(&body).with_context(|| {
            format!(
                "Failed to parse API response. Raw body:\n{}",
                &body[..find_char_boundary(&body, 500)]
            )
        })
    }

    async fn data<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let envelope: ApiResponse<T> = self.send(req).await?;
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        self.data(self.request(Method::GET, path)?).await
    }

    async fn delete(&self, path: &[&str]) -> Result<()> {
        let _: ApiResponse<serde_json::Value> = self.send(self.request(Method::DELETE, path)?).await?;
        Ok(())
    }

    async fn with_body<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &[&str],
        body: &B,
    ) -> Result<T> {
        self.data(self.request(method, path)?.json(body)).await
    }

    async fn page<T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &ListQuery,
    ) -> Result<PaginatedResponse<T>> {
        self.send(self.request(Method::GET, path)?.query(query)).await
    }

    // ── Auth ────────────────────────────────────────────────────────────

    /// Signs in and keeps the returned token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AdminUser> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self.with_body(Method::POST, &["auth", "login"], &body).await?;
        self.token = Some(resp.token);
        Ok(resp.user)
    }

    pub async fn logout(&mut self) -> Result<()> {
        let _: ApiResponse<serde_json::Value> =
            self.send(self.request(Method::POST, &["auth", "logout"])?).await?;
        self.token = None;
        Ok(())
    }

    pub async fn me(&self) -> Result<AdminUser> {
        self.get(&["auth", "me"]).await
    }

    // ── Dashboard ───────────────────────────────────────────────────────

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.get(&["dashboard", "stats"]).await
    }

    // ── Bots ────────────────────────────────────────────────────────────

    pub async fn list_bots(&self, query: &ListQuery) -> Result<PaginatedResponse<Bot>> {
        self.page(&["bots"], query).await
    }

    pub async fn get_bot(&self, id: &str) -> Result<Bot> {
        self.get(&["bots", id]).await
    }

    pub async fn create_bot(&self, name: &str, description: &str) -> Result<Bot> {
        let body = CreateBotForm {
            name: name.to_string(),
            description: description.to_string(),
        };
        self.with_body(Method::POST, &["bots"], &body).await
    }

    pub async fn update_bot(&self, id: &str, patch: &BotPatch) -> Result<Bot> {
        self.with_body(Method::PUT, &["bots", id], patch).await
    }

    pub async fn delete_bot(&self, id: &str) -> Result<()> {
        self.delete(&["bots", id]).await
    }

    pub async fn set_bot_status(&self, id: &str, status: BotStatus) -> Result<Bot> {
        self.with_body(Method::PATCH, &["bots", id, "status"], &StatusUpdate { status })
            .await
    }

    // ── Bot users ───────────────────────────────────────────────────────

    pub async fn list_bot_users(&self, query: &ListQuery) -> Result<PaginatedResponse<BotUser>> {
        self.page(&["bot-users"], query).await
    }

    pub async fn get_bot_user(&self, id: &str) -> Result<BotUser> {
        self.get(&["bot-users", id]).await
    }

    pub async fn create_bot_user(&self, user: &NewBotUser) -> Result<BotUser> {
        self.with_body(Method::POST, &["bot-users"], user).await
    }

    pub async fn update_bot_user(&self, id: &str, patch: &BotUserPatch) -> Result<BotUser> {
        self.with_body(Method::PUT, &["bot-users", id], patch).await
    }

    pub async fn delete_bot_user(&self, id: &str) -> Result<()> {
        self.delete(&["bot-users", id]).await
    }

    pub async fn assign_bot(&self, user_id: &str, bot_id: &str) -> Result<BotUser> {
        let body = AssignBotRequest { bot_id: bot_id.to_string() };
        self.with_body(Method::POST, &["bot-users", user_id, "assign-bot"], &body)
            .await
    }

    pub async fn unassign_bot(&self, user_id: &str, bot_id: &str) -> Result<BotUser> {
        let body = AssignBotRequest { bot_id: bot_id.to_string() };
        self.with_body(Method::POST, &["bot-users", user_id, "unassign-bot"], &body)
            .await
    }

    // ── Knowledge base ──────────────────────────────────────────────────

    pub async fn list_documents(&self, bot_id: &str) -> Result<Vec<Document>> {
        self.get(&["bots", bot_id, "documents"]).await
    }

    /// Registers uploads by name and size; the server starts ingestion.
    pub async fn upload_documents(&self, bot_id: &str, files: Vec<NewDocument>) -> Result<Vec<Document>> {
        self.with_body(
            Method::POST,
            &["bots", bot_id, "documents"],
            &UploadDocuments { files },
        )
        .await
    }

    pub async fn delete_document(&self, bot_id: &str, doc_id: &str) -> Result<()> {
        self.delete(&["bots", bot_id, "documents", doc_id]).await
    }

    pub async fn list_urls(&self, bot_id: &str) -> Result<Vec<IndexedUrl>> {
        self.get(&["bots", bot_id, "urls"]).await
    }

    pub async fn add_url(&self, bot_id: &str, url: &str, scope: UrlScope) -> Result<IndexedUrl> {
        let body = AddUrlRequest { url: url.to_string(), scope };
        self.with_body(Method::POST, &["bots", bot_id, "urls"], &body).await
    }

    pub async fn delete_url(&self, bot_id: &str, url_id: &str) -> Result<()> {
        self.delete(&["bots", bot_id, "urls", url_id]).await
    }

    pub async fn knowledge_base_settings(&self, bot_id: &str) -> Result<KnowledgeBaseSettings> {
        self.get(&["bots", bot_id, "knowledge-base", "settings"]).await
    }

    pub async fn update_knowledge_base_settings(
        &self,
        bot_id: &str,
        patch: &KnowledgeBaseSettingsPatch,
    ) -> Result<KnowledgeBaseSettings> {
        self.with_body(
            Method::PUT,
            &["bots", bot_id, "knowledge-base", "settings"],
            patch,
        )
        .await
    }

    pub async fn reindex(&self, bot_id: &str) -> Result<KnowledgeBaseSettings> {
        self.data(self.request(Method::POST, &["bots", bot_id, "knowledge-base", "reindex"])?)
            .await
    }

    // ── Admin users ─────────────────────────────────────────────────────

    pub async fn list_admins(&self, query: &ListQuery) -> Result<PaginatedResponse<AdminUser>> {
        self.page(&["admin", "users"], query).await
    }

    pub async fn create_admin(&self, admin: &NewAdminUser) -> Result<AdminUser> {
        self.with_body(Method::POST, &["admin", "users"], admin).await
    }

    pub async fn update_admin(&self, id: &str, patch: &AdminUserPatch) -> Result<AdminUser> {
        self.with_body(Method::PUT, &["admin", "users", id], patch).await
    }

    pub async fn delete_admin(&self, id: &str) -> Result<()> {
        self.delete(&["admin", "users", id]).await
    }
}
