use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use super::state::{DashboardState, Notice};
use super::templates::{self, ConfigPage, ConfigTab, FormErrors, KnowledgeView, UsersPage};
use crate::error::ConsoleError;
use crate::filter::{page_size, UserFilter, UserFilterQuery};
use crate::forms::{CreateBotForm, UserForm};
use crate::knowledge::{IngestionTarget, ItemKind, KnowledgeBaseSettingsPatch, NewDocument};
use crate::models::{Language, UrlScope, UserStatus};
use crate::preview::{PreviewAction, PreviewEffect};
use crate::settings::BotConfigForm;

/// Recorded as `createdBy` for bots made from the dashboard.
const DASHBOARD_OPERATOR: &str = "dashboard";

/// Domain errors on HTML routes render the error page instead of JSON.
pub struct PageError(ConsoleError);

impl From<ConsoleError> for PageError {
    fn from(err: ConsoleError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        (status, templates::render_error(status.as_u16(), &self.0.to_string())).into_response()
    }
}

type PageResult = Result<Response, PageError>;

fn config_url(bot_id: &str, tab: ConfigTab) -> String {
    format!("/bots/{}/config?tab={}", bot_id, tab.code())
}

// ── GET / — dashboard overview ───────────────────────────────────────

pub async fn index(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let store = state.store.read().await;
    templates::render_index(
        state.take_notices(),
        store.stats(),
        store.bots(),
        state.audit.metrics(),
    )
}

// ── GET /bots — bot list with search ─────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BotsQuery {
    pub search: String,
    pub create: bool,
}

pub async fn bots_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<BotsQuery>,
) -> impl IntoResponse {
    let store = state.store.read().await;
    let bots = store.search_bots(&query.search);
    templates::render_bots(
        state.take_notices(),
        &query.search,
        &bots,
        store.bots().len(),
        query
            .create
            .then(|| (CreateBotForm::default(), FormErrors::default())),
    )
}

// ── POST /bots — create-bot dialog ───────────────────────────────────

pub async fn create_bot(
    State(state): State<Arc<DashboardState>>,
    Form(form): Form<CreateBotForm>,
) -> Response {
    let result = state
        .store
        .write()
        .await
        .create_bot(form.clone(), DASHBOARD_OPERATOR, Utc::now());
    match result {
        Ok(bot) => {
            state.audit.applied("bot.create", &bot.id);
            state.notify(Notice::success("Bot created successfully!"));
            Redirect::to("/bots").into_response()
        }
        Err(err) => {
            state.audit.rejected("bot.create", &err.to_string());
            let store = state.store.read().await;
            templates::render_bots(
                state.take_notices(),
                "",
                store.bots(),
                store.bots().len(),
                Some((form, FormErrors::from_error(&err))),
            )
            .into_response()
        }
    }
}

// ── POST /bots/:id/toggle and /bots/:id/delete ───────────────────────

pub async fn toggle_bot(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> PageResult {
    let result = state.store.write().await.toggle_bot_status(&id);
    let bot = state.audit_rejection("bot.status", result)?;
    state.audit.applied("bot.status", &format!("{} -> {}", bot.id, bot.status.label()));
    state.notify(Notice::success(format!("{} is now {}", bot.name, bot.status.label().to_lowercase())));
    Ok(Redirect::to("/bots").into_response())
}

pub async fn delete_bot(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> PageResult {
    let result = state.store.write().await.delete_bot(&id);
    let bot = state.audit_rejection("bot.delete", result)?;
    state.previews.write().await.remove(&id);
    state.audit.applied("bot.delete", &bot.id);
    state.notify(Notice::success(format!("{} deleted", bot.name)));
    Ok(Redirect::to("/bots").into_response())
}

// ── GET /bots/:id/config — tabbed configuration + live preview ───────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigQuery {
    pub tab: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl ConfigQuery {
    fn tab(&self) -> ConfigTab {
        ConfigTab::parse(self.tab.as_deref())
    }
}

async fn render_config(
    state: &Arc<DashboardState>,
    id: &str,
    query: &ConfigQuery,
    form: Option<BotConfigForm>,
    errors: FormErrors,
) -> PageResult {
    let widget = state.previews.read().await.get(id).cloned().unwrap_or_default();
    let store = state.store.read().await;
    let bot = store.bot(id)?;
    let per_page = query
        .per_page
        .and_then(page_size)
        .unwrap_or(state.config.default_page_size);
    let knowledge = KnowledgeView::new(store.knowledge(id)?, query.page.unwrap_or(1), per_page);
    let page = ConfigPage {
        bot,
        tab: query.tab(),
        form: form.unwrap_or_else(|| BotConfigForm::from_bot(bot)),
        errors,
        widget,
        knowledge,
    };
    Ok(templates::render_bot_config(state.take_notices(), page).into_response())
}

pub async fn bot_config(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    Query(query): Query<ConfigQuery>,
) -> PageResult {
    render_config(&state, &id, &query, None, FormErrors::default()).await
}

// ── POST /bots/:id/config — language toggle or save ──────────────────

pub async fn save_bot_config(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    Query(query): Query<ConfigQuery>,
    Form(mut form): Form<BotConfigForm>,
) -> PageResult {
    if let Some(code) = form.toggle_lang.take() {
        if let Some(lang) = Language::from_code(&code) {
            form.toggle_language(lang);
        }
        return render_config(&state, &id, &query, Some(form), FormErrors::default()).await;
    }

    let validated = form.validate();
    let (name, settings) = match validated {
        Ok(ok) => ok,
        Err(err) => {
            state.audit.rejected("bot.configure", &err.to_string());
            let errors = FormErrors::from_error(&err);
            return render_config(&state, &id, &query, Some(form), errors).await;
        }
    };

    let saved = state.store.write().await.save_bot_config(&id, name, settings);
    state.audit_rejection("bot.configure", saved)?;
    state.audit.applied("bot.configure", &id);
    state.notify(Notice::success("Bot configuration saved successfully!"));
    Ok(Redirect::to(&config_url(&id, query.tab())).into_response())
}

// ── POST /bots/:id/documents — multipart upload (names and sizes only) ─

pub async fn upload_documents(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> PageResult {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ConsoleError::invalid(format!("Malformed upload: {}", e)))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ConsoleError::invalid(format!("Malformed upload: {}", e)))?;
        files.push(NewDocument { name, size: bytes.len() as u64 });
    }

    let result = state.store.write().await.add_documents(&id, files, Utc::now());
    match state.audit_rejection("knowledge.upload", result) {
        Ok(added) => {
            state.audit.applied("knowledge.upload", &format!("{}: {} file(s)", id, added.len()));
            state.notify(Notice::success(format!("{} file(s) uploaded successfully!", added.len())));
            let targets = added
                .into_iter()
                .map(|doc| IngestionTarget { kind: ItemKind::Document, id: doc.id })
                .collect();
            state.schedule_ingestion(id.clone(), targets);
        }
        Err(err @ ConsoleError::NotFound { .. }) => return Err(err.into()),
        Err(err) => {
            state.notify(Notice::error(err.to_string()));
        }
    }
    Ok(Redirect::to(&config_url(&id, ConfigTab::Knowledge)).into_response())
}

// ── POST /bots/:id/urls ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddUrlForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub scope: String,
}

pub async fn add_url(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    Form(form): Form<AddUrlForm>,
) -> PageResult {
    let scope = UrlScope::from_code(&form.scope).unwrap_or_default();
    let result = state.store.write().await.add_url(&id, &form.url, scope, Utc::now());
    match state.audit_rejection("knowledge.url", result) {
        Ok(entry) => {
            state.audit.applied("knowledge.url", &format!("{}: {}", id, entry.url));
            state.notify(Notice::success("URL added successfully!"));
            state.schedule_ingestion(
                id.clone(),
                vec![IngestionTarget { kind: ItemKind::Url, id: entry.id }],
            );
        }
        Err(err @ ConsoleError::NotFound { .. }) => return Err(err.into()),
        Err(err) => {
            state.notify(Notice::error(err.to_string()));
        }
    }
    Ok(Redirect::to(&config_url(&id, ConfigTab::Knowledge)).into_response())
}

// ── POST /bots/:id/knowledge/delete[/confirm|/cancel] ────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteRequestForm {
    pub kind: String,
    pub id: String,
}

pub async fn request_delete(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
    Form(form): Form<DeleteRequestForm>,
) -> PageResult {
    let kind = ItemKind::parse(&form.kind)
        .ok_or_else(|| ConsoleError::invalid(format!("Unknown item type '{}'", form.kind)))?;
    let opened = state
        .store
        .write()
        .await
        .knowledge_mut(&bot_id)?
        .request_delete(kind, &form.id)
        .is_some();
    if !opened {
        state.notify(Notice::error(format!("{} '{}' no longer exists", kind.label(), form.id)));
    }
    Ok(Redirect::to(&config_url(&bot_id, ConfigTab::Knowledge)).into_response())
}

pub async fn confirm_delete(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
) -> PageResult {
    let result = state
        .store
        .write()
        .await
        .knowledge_mut(&bot_id)
        .map(|kb| kb.confirm_delete());
    let removed = state.audit_rejection("knowledge.delete", result)?;
    if let Some(pending) = removed {
        state.audit.applied(
            "knowledge.delete",
            &format!("{}: {} {}", bot_id, pending.item_type.label(), pending.item_name),
        );
        state.notify(Notice::success(pending.item_type.deleted_message()));
    }
    Ok(Redirect::to(&config_url(&bot_id, ConfigTab::Knowledge)).into_response())
}

pub async fn cancel_delete(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
) -> PageResult {
    state.store.write().await.knowledge_mut(&bot_id)?.cancel_delete();
    Ok(Redirect::to(&config_url(&bot_id, ConfigTab::Knowledge)).into_response())
}

// ── POST /bots/:id/knowledge/settings and /reindex ───────────────────

#[derive(Debug, Deserialize)]
pub struct KnowledgeSettingsForm {
    #[serde(default)]
    pub auto_index_enabled: bool,
    #[serde(default)]
    pub chunk_size: String,
    #[serde(default)]
    pub chunk_overlap: String,
}

pub async fn update_knowledge_settings(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
    Form(form): Form<KnowledgeSettingsForm>,
) -> PageResult {
    let parse = |field: &str, raw: &str| {
        raw.trim()
            .parse::<u32>()
            .map_err(|_| ConsoleError::invalid(format!("{} must be a whole number", field)))
    };
    let patch = parse("Chunk size", &form.chunk_size).and_then(|chunk_size| {
        Ok(KnowledgeBaseSettingsPatch {
            auto_index_enabled: Some(form.auto_index_enabled),
            chunk_size: Some(chunk_size),
            chunk_overlap: Some(parse("Chunk overlap", &form.chunk_overlap)?),
        })
    });

    let result = match patch {
        Ok(patch) => state
            .store
            .write()
            .await
            .knowledge_mut(&bot_id)
            .and_then(|kb| kb.update_settings(patch).map(|_| ())),
        Err(err) => Err(err),
    };
    match state.audit_rejection("knowledge.settings", result) {
        Ok(()) => {
            state.audit.applied("knowledge.settings", &bot_id);
            state.notify(Notice::success("Knowledge base settings saved"));
        }
        Err(err @ ConsoleError::NotFound { .. }) => return Err(err.into()),
        Err(err) => {
            let message = err
                .field_errors()
                .and_then(|fields| fields.values().next().cloned())
                .unwrap_or_else(|| err.to_string());
            state.notify(Notice::error(message));
        }
    }
    Ok(Redirect::to(&config_url(&bot_id, ConfigTab::Knowledge)).into_response())
}

pub async fn reindex(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
) -> PageResult {
    match state.start_reindex(&bot_id).await {
        Ok(()) => state.notify(Notice::info("Re-indexing started")),
        Err(err @ ConsoleError::NotFound { .. }) => return Err(err.into()),
        Err(err) => state.notify(Notice::error(err.to_string())),
    }
    Ok(Redirect::to(&config_url(&bot_id, ConfigTab::Knowledge)).into_response())
}

// ── POST /bots/:id/preview — widget interactions ─────────────────────

#[derive(Debug, Deserialize)]
pub struct PreviewForm {
    pub action: String,
    #[serde(default)]
    pub text: String,
}

pub async fn preview_action(
    State(state): State<Arc<DashboardState>>,
    Path(bot_id): Path<String>,
    Query(query): Query<ConfigQuery>,
    Form(form): Form<PreviewForm>,
) -> PageResult {
    state.store.read().await.bot(&bot_id)?;
    let action = PreviewAction::parse(&form.action, form.text)
        .ok_or_else(|| ConsoleError::invalid(format!("Unknown preview action '{}'", form.action)))?;

    let effect = state
        .previews
        .write()
        .await
        .entry(bot_id.clone())
        .or_default()
        .apply(action);
    match effect {
        PreviewEffect::None => {}
        PreviewEffect::Notice(message) => state.notify(Notice::success(message)),
        PreviewEffect::Info(message) => state.notify(Notice::info(message)),
        PreviewEffect::StartVoiceTimer { ticket } => {
            state.notify(Notice::success("Voice input started"));
            state.schedule_voice_capture(bot_id.clone(), ticket);
        }
    }
    Ok(Redirect::to(&config_url(&bot_id, query.tab())).into_response())
}

// ── GET /users — user list with filters ──────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UsersQuery {
    pub search: String,
    pub status: String,
    pub role: String,
    pub bot: String,
    pub create: bool,
}

impl UsersQuery {
    fn filter_query(&self) -> UserFilterQuery {
        UserFilterQuery {
            search: self.search.clone(),
            status: self.status.clone(),
            role: self.role.clone(),
            bot: self.bot.clone(),
        }
    }
}

async fn render_users(
    state: &Arc<DashboardState>,
    filter: &UserFilterQuery,
    create: Option<(UserForm, FormErrors)>,
) -> Response {
    let store = state.store.read().await;
    let users = store.filter_users(&UserFilter::from_query(filter));
    let bot_choices = store.bot_choices();
    templates::render_users(
        state.take_notices(),
        UsersPage {
            filter,
            users: &users,
            total_users: store.users().len(),
            bot_choices: &bot_choices,
            create,
        },
    )
    .into_response()
}

pub async fn users_page(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<UsersQuery>,
) -> Response {
    let create = query
        .create
        .then(|| (UserForm::default(), FormErrors::default()));
    render_users(&state, &query.filter_query(), create).await
}

// ── POST /users — create-user dialog ─────────────────────────────────

pub async fn create_user(
    State(state): State<Arc<DashboardState>>,
    Form(mut form): Form<UserForm>,
) -> Response {
    let filter = UserFilterQuery::default();
    if form.apply_picker_action() {
        return render_users(&state, &filter, Some((form, FormErrors::default()))).await;
    }

    let result = match form.validate(true) {
        Ok(draft) => state.store.write().await.create_user(draft, Utc::now()),
        Err(err) => Err(err),
    };
    match result {
        Ok(user) => {
            state.audit.applied("user.create", &user.email);
            state.notify(Notice::success("User created successfully!"));
            Redirect::to("/users").into_response()
        }
        Err(err) => {
            state.audit.rejected("user.create", &err.to_string());
            form.password.clear();
            let errors = FormErrors::from_error(&err);
            render_users(&state, &filter, Some((form, errors))).await
        }
    }
}

// ── GET/POST /users/:id/edit ─────────────────────────────────────────

pub async fn edit_user_page(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> PageResult {
    let store = state.store.read().await;
    let user = store.user(&id)?;
    let (first_name, last_name) = user.split_name();
    let form = UserForm {
        first_name,
        last_name,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.code().to_string(),
        bots: user.assigned_bots.join(","),
        active: user.status == UserStatus::Active,
        ..Default::default()
    };
    Ok(templates::render_user_edit(
        state.take_notices(),
        &id,
        form,
        &store.bot_choices(),
        FormErrors::default(),
    )
    .into_response())
}

pub async fn update_user(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
    Form(mut form): Form<UserForm>,
) -> PageResult {
    let render = |state: &Arc<DashboardState>, form: UserForm, errors: FormErrors, choices: Vec<(String, String)>| {
        templates::render_user_edit(state.take_notices(), &id, form, &choices, errors).into_response()
    };

    if form.apply_picker_action() {
        let choices = {
            let store = state.store.read().await;
            store.user(&id)?;
            store.bot_choices()
        };
        return Ok(render(&state, form, FormErrors::default(), choices));
    }

    let result = match form.validate(false) {
        Ok(draft) => state.store.write().await.replace_user(&id, draft),
        Err(err) => Err(err),
    };
    match state.audit_rejection("user.update", result) {
        Ok(user) => {
            state.audit.applied("user.update", &user.email);
            state.notify(Notice::success("User updated successfully!"));
            Ok(Redirect::to("/users").into_response())
        }
        Err(err @ ConsoleError::NotFound { kind: "user", .. }) => Err(err.into()),
        Err(err) => {
            form.password.clear();
            let choices = state.store.read().await.bot_choices();
            Ok(render(&state, form, FormErrors::from_error(&err), choices))
        }
    }
}

pub async fn delete_user(
    State(state): State<Arc<DashboardState>>,
    Path(id): Path<String>,
) -> PageResult {
    let result = state.store.write().await.delete_user(&id);
    let user = state.audit_rejection("user.delete", result)?;
    state.audit.applied("user.delete", &user.email);
    state.notify(Notice::success(format!("{} deleted", user.name)));
    Ok(Redirect::to("/users").into_response())
}

/// Fallback for unknown HTML routes.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, templates::render_error(404, "Page not found"))
}
