//! JSON handlers mounted under `/api`.
//!
//! Every success is wrapped in [`ApiResponse`] or [`PaginatedResponse`];
//! every failure is a [`ConsoleError`] rendered as the `ApiError` envelope.

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use super::extract::{ApiJson, ApiQuery};
use super::state::DashboardState;
use crate::api::{AddUrlRequest, AssignBotRequest, ListQuery, LoginResponse, StatusUpdate, UploadDocuments};
use crate::error::{ConsoleError, ConsoleResult};
use crate::filter::{api_limit, matches_query, paginate};
use crate::forms::{AdminUserPatch, BotUserPatch, CreateBotForm, LoginRequest, NewAdminUser, NewBotUser};
use crate::knowledge::{IngestionTarget, ItemKind, KnowledgeBaseSettingsPatch};
use crate::models::{
    AdminUser, ApiResponse, Bot, BotUser, DashboardStats, Document, IndexedUrl,
    KnowledgeBaseSettings, PaginatedResponse,
};
use crate::settings::BotPatch;

type ApiResult<T> = ConsoleResult<Json<ApiResponse<T>>>;

/// Recorded as `createdBy` when no admin is signed in.
const ANONYMOUS_OPERATOR: &str = "api";

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn paginated<T: Clone>(items: &[T], query: &ListQuery) -> Json<PaginatedResponse<T>> {
    let page = paginate(items, query.page.unwrap_or(1), api_limit(query.limit));
    Json(PaginatedResponse {
        success: true,
        data: page.items,
        pagination: page.pagination,
    })
}

// ── Auth ─────────────────────────────────────────────────────────────

pub async fn login(
    State(state): State<Arc<DashboardState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let result = state.store.write().await.login(&req, Utc::now());
    match result {
        Ok((user, token)) => {
            state.audit.applied("auth.login", &user.email);
            Ok(Json(ApiResponse::ok(LoginResponse { user, token })))
        }
        Err(err) => {
            state.audit.rejected("auth.login", &err.to_string());
            Err(err)
        }
    }
}

pub async fn logout(
    State(state): State<Arc<DashboardState>>,
    headers: HeaderMap,
) -> ApiResult<()> {
    let ended = match bearer_token(&headers) {
        Some(token) => state.store.write().await.logout(token),
        None => false,
    };
    let result = if ended { Ok(()) } else { Err(ConsoleError::Unauthorized) };
    state.audit_rejection("auth.logout", result)?;
    state.audit.applied("auth.logout", "session ended");
    Ok(Json(ApiResponse::with_message((), "Logged out")))
}

pub async fn me(State(state): State<Arc<DashboardState>>, headers: HeaderMap) -> ApiResult<AdminUser> {
    let token = bearer_token(&headers).ok_or(ConsoleError::Unauthorized)?;
    let store = state.store.read().await;
    Ok(Json(ApiResponse::ok(store.current_admin(token)?.clone())))
}

// ── Dashboard ────────────────────────────────────────────────────────

pub async fn dashboard_stats(State(state): State<Arc<DashboardState>>) -> Json<ApiResponse<DashboardStats>> {
    Json(ApiResponse::ok(state.store.read().await.stats()))
}

// ── Bots ─────────────────────────────────────────────────────────────

pub async fn list_bots(
    State(state): State<Arc<DashboardState>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Json<PaginatedResponse<Bot>> {
    let bots = state
        .store
        .read()
        .await
        .search_bots(query.search.as_deref().unwrap_or_default());
    paginated(&bots, &query)
}

pub async fn get_bot(State(state): State<Arc<DashboardState>>, Path(id): Path<String>) -> ApiResult<Bot> {
    Ok(Json(ApiResponse::ok(state.store.read().await.bot(&id)?.clone())))
}

pub async fn create_bot(
    State(state): State<Arc<DashboardState>>,
    headers: HeaderMap,
    ApiJson(form): ApiJson<CreateBotForm>,
) -> ConsoleResult<impl IntoResponse> {
    let mut store = state.store.write().await;
    let created_by = bearer_token(&headers)
        .and_then(|token| store.current_admin(token).ok())
        .map(|admin| admin.email.clone())
        .unwrap_or_else(|| ANONYMOUS_OPERATOR.to_string());
    let result = store.create_bot(form, &created_by, Utc::now());
    drop(store);

    match result {
        Ok(bot) => {
            state.audit.applied("bot.create", &bot.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::with_message(bot, "Bot created successfully!")),
            ))
        }
        Err(err) => {
            state.audit.rejected("bot.create", &err.to_string());
            Err(err)
        }
    }
}

pub async fn update_bot(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<BotPatch>,
) -> ApiResult<Bot> {
    let result = state.store.write().await.update_bot(&id, patch);
    match result {
        Ok(bot) => {
            state.audit.applied("bot.update", &bot.id);
            Ok(Json(ApiResponse::with_message(bot, "Bot configuration saved successfully!")))
        }
        Err(err) => {
            state.audit.rejected("bot.update", &err.to_string());
            Err(err)
        }
    }
}

pub async fn delete_bot(State(state): State<Arc<DashboardState>>, Path(id): Path<String>) -> ApiResult<()> {
    let result = state.store.write().await.delete_bot(&id);
    let bot = state.audit_rejection("bot.delete", result)?;
    state.previews.write().await.remove(&id);
    state.audit.applied("bot.delete", &bot.id);
    Ok(Json(ApiResponse::with_message((), format!("{} deleted", bot.name))))
}

pub async fn set_bot_status(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> ApiResult<Bot> {
    let result = state.store.write().await.set_bot_status(&id, update.status);
    let bot = state.audit_rejection("bot.status", result)?;
    state
        .audit
        .applied("bot.status", &format!("{} -> {}", bot.id, bot.status.label()));
    Ok(Json(ApiResponse::ok(bot)))
}

// ── Bot users ────────────────────────────────────────────────────────

pub async fn list_bot_users(
    State(state): State<Arc<DashboardState>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Json<PaginatedResponse<BotUser>> {
    let search = query.search.as_deref().unwrap_or_default();
    let users: Vec<BotUser> = state
        .store
        .read()
        .await
        .users()
        .iter()
        .filter(|u| matches_query(search, &[u.name.as_str(), u.email.as_str(), u.username.as_str()]))
        .cloned()
        .collect();
    paginated(&users, &query)
}

pub async fn get_bot_user(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> ApiResult<BotUser> {
    Ok(Json(ApiResponse::ok(state.store.read().await.user(&id)?.clone())))
}

pub async fn create_bot_user(
    State(state): State<Arc<DashboardState>>,
    ApiJson(req): ApiJson<NewBotUser>,
) -> ConsoleResult<impl IntoResponse> {
    let result = match req.validate() {
        Ok(draft) => state.store.write().await.create_user(draft, Utc::now()),
        Err(err) => Err(err),
    };
    match result {
        Ok(user) => {
            state.audit.applied("user.create", &user.email);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::with_message(user, "User created successfully!")),
            ))
        }
        Err(err) => {
            state.audit.rejected("user.create", &err.to_string());
            Err(err)
        }
    }
}

pub async fn update_bot_user(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<BotUserPatch>,
) -> ApiResult<BotUser> {
    let result = state.store.write().await.patch_user(&id, patch);
    match result {
        Ok(user) => {
            state.audit.applied("user.update", &user.email);
            Ok(Json(ApiResponse::with_message(user, "User updated successfully!")))
        }
        Err(err) => {
            state.audit.rejected("user.update", &err.to_string());
            Err(err)
        }
    }
}

pub async fn delete_bot_user(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let result = state.store.write().await.delete_user(&id);
    let user = state.audit_rejection("user.delete", result)?;
    state.audit.applied("user.delete", &user.email);
    Ok(Json(ApiResponse::with_message((), format!("{} deleted", user.name))))
}

pub async fn assign_bot(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AssignBotRequest>,
) -> ApiResult<BotUser> {
    let result = state.store.write().await.assign_bot(&id, &req.bot_id);
    let user = state.audit_rejection("user.assign", result)?;
    state.audit.applied("user.assign", &format!("{} + {}", user.email, req.bot_id));
    Ok(Json(ApiResponse::ok(user)))
}

pub async fn unassign_bot(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AssignBotRequest>,
) -> ApiResult<BotUser> {
    let result = state.store.write().await.unassign_bot(&id, &req.bot_id);
    let user = state.audit_rejection("user.unassign", result)?;
    state.audit.applied("user.unassign", &format!("{} - {}", user.email, req.bot_id));
    Ok(Json(ApiResponse::ok(user)))
}

// ── Knowledge base ───────────────────────────────────────────────────

pub async fn list_documents(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
) -> ApiResult<Vec<Document>> {
    let store = state.store.read().await;
    Ok(Json(ApiResponse::ok(store.knowledge(&bot_id)?.documents.clone())))
}

pub async fn upload_documents(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
    ApiJson(req): ApiJson<UploadDocuments>,
) -> ConsoleResult<impl IntoResponse> {
    let result = state
        .store
        .write()
        .await
        .add_documents(&bot_id, req.files, Utc::now());
    let added = state.audit_rejection("knowledge.upload", result)?;
    state
        .audit
        .applied("knowledge.upload", &format!("{}: {} file(s)", bot_id, added.len()));
    let targets = added
        .iter()
        .map(|doc| IngestionTarget { kind: ItemKind::Document, id: doc.id.clone() })
        .collect();
    state.schedule_ingestion(bot_id, targets);

    let message = format!("{} file(s) uploaded successfully!", added.len());
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(added, message))))
}

pub async fn delete_document(
    State(state): State<Arc<DashboardState>>,
    Path((bot_id, doc_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let result = state
        .store
        .write()
        .await
        .knowledge_mut(&bot_id)
        .and_then(|kb| kb.delete_document(&doc_id));
    let doc = state.audit_rejection("knowledge.delete", result)?;
    state
        .audit
        .applied("knowledge.delete", &format!("{}: document {}", bot_id, doc.name));
    Ok(Json(ApiResponse::with_message((), ItemKind::Document.deleted_message())))
}

pub async fn list_urls(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
) -> ApiResult<Vec<IndexedUrl>> {
    let store = state.store.read().await;
    Ok(Json(ApiResponse::ok(store.knowledge(&bot_id)?.urls.clone())))
}

pub async fn add_url(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
    ApiJson(req): ApiJson<AddUrlRequest>,
) -> ConsoleResult<impl IntoResponse> {
    let result = state
        .store
        .write()
        .await
        .add_url(&bot_id, &req.url, req.scope, Utc::now());
    let entry = state.audit_rejection("knowledge.url", result)?;
    state
        .audit
        .applied("knowledge.url", &format!("{}: {}", bot_id, entry.url));
    state.schedule_ingestion(
        bot_id,
        vec![IngestionTarget { kind: ItemKind::Url, id: entry.id.clone() }],
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(entry, "URL added successfully!")),
    ))
}

pub async fn delete_url(
    State(state): State<Arc<DashboardState>>,
    Path((bot_id, url_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let result = state
        .store
        .write()
        .await
        .knowledge_mut(&bot_id)
        .and_then(|kb| kb.delete_url(&url_id));
    let entry = state.audit_rejection("knowledge.delete", result)?;
    state
        .audit
        .applied("knowledge.delete", &format!("{}: url {}", bot_id, entry.url));
    Ok(Json(ApiResponse::with_message((), ItemKind::Url.deleted_message())))
}

pub async fn knowledge_settings(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
) -> ApiResult<KnowledgeBaseSettings> {
    let store = state.store.read().await;
    Ok(Json(ApiResponse::ok(store.knowledge(&bot_id)?.settings.clone())))
}

pub async fn update_knowledge_settings(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
    ApiJson(patch): ApiJson<KnowledgeBaseSettingsPatch>,
) -> ApiResult<KnowledgeBaseSettings> {
    let result = state
        .store
        .write()
        .await
        .knowledge_mut(&bot_id)
        .and_then(|kb| kb.update_settings(patch).cloned());
    let settings = state.audit_rejection("knowledge.settings", result)?;
    state.audit.applied("knowledge.settings", &bot_id);
    Ok(Json(ApiResponse::ok(settings)))
}

/// Starts a re-index; a second request while one runs is a conflict.
pub async fn reindex(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
) -> ApiResult<KnowledgeBaseSettings> {
    state.start_reindex(&bot_id).await?;
    let store = state.store.read().await;
    Ok(Json(ApiResponse::with_message(
        store.knowledge(&bot_id)?.settings.clone(),
        "Re-indexing started",
    )))
}

// ── Admin users ──────────────────────────────────────────────────────

pub async fn list_admins(
    State(state): State<Arc<DashboardState>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Json<PaginatedResponse<AdminUser>> {
    let search = query.search.as_deref().unwrap_or_default();
    let admins: Vec<AdminUser> = state
        .store
        .read()
        .await
        .admins()
        .iter()
        .filter(|a| matches_query(search, &[a.name.as_str(), a.email.as_str()]))
        .cloned()
        .collect();
    paginated(&admins, &query)
}

pub async fn create_admin(
    State(state): State<Arc<DashboardState>>,
    ApiJson(req): ApiJson<NewAdminUser>,
) -> ConsoleResult<impl IntoResponse> {
    let result = state.store.write().await.create_admin(req, Utc::now());
    let admin = state.audit_rejection("admin.create", result)?;
    state.audit.applied("admin.create", &admin.email);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(admin))))
}

pub async fn update_admin(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<AdminUserPatch>,
) -> ApiResult<AdminUser> {
    let result = state.store.write().await.update_admin(&id, patch);
    let admin = state.audit_rejection("admin.update", result)?;
    state.audit.applied("admin.update", &admin.email);
    Ok(Json(ApiResponse::ok(admin)))
}

pub async fn delete_admin(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let result = state.store.write().await.delete_admin(&id);
    let admin = state.audit_rejection("admin.delete", result)?;
    state.audit.applied("admin.delete", &admin.email);
    Ok(Json(ApiResponse::with_message((), format!("{} deleted", admin.name))))
}

/// Unknown `/api` paths answer with the JSON error envelope.
pub async fn not_found() -> ConsoleError {
    ConsoleError::not_found("endpoint", "requested path")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_paginated_envelope_uses_limit() {
        let items: Vec<u32> = (1..=25).collect();
        let query = ListQuery::page(3, 10);
        let Json(resp) = paginated(&items, &query);
        assert!(resp.success);
        assert_eq!(resp.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(resp.pagination.total_pages, 3);
        assert_eq!(resp.pagination.items_per_page, 10);
    }
}
