use askama::Template;
use axum::response::Html;

use super::state::Notice;
use crate::error::{ConsoleError, FieldErrors};
use crate::filter::{Page, PAGE_SIZES};
use crate::forms::{BotSelection, CreateBotForm, UserForm};
use crate::knowledge::{KnowledgeBase, PendingDelete};
use crate::logger::ActivityMetrics;
use crate::models::{
    Bot, BotPosition, BotUser, DashboardStats, Document, IndexedUrl, Language, PersonaStyle,
    UrlScope, UserRole,
};
use crate::preview::{PreviewState, WidgetPreview};
use crate::settings::{char_counter, language_codes, BotConfigForm, DESCRIPTION_MAX_CHARS, NAME_MAX_CHARS};
use crate::utils::{format_size_mb, format_timestamp, initials, preview_text};

// ── View models ──────────────────────────────────────────────────────

pub struct BotRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: &'static str,
    pub active: bool,
    pub created_at: String,
    pub conversations: u64,
}

impl BotRow {
    pub fn from_bot(bot: &Bot) -> Self {
        Self {
            id: bot.id.clone(),
            name: bot.name.clone(),
            description: preview_text(&bot.description, 120),
            status: bot.status.label(),
            active: bot.status.is_active(),
            created_at: format_timestamp(&bot.created_at),
            conversations: bot.total_conversations,
        }
    }
}

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub initials: String,
    pub email: String,
    pub role: &'static str,
    pub status: &'static str,
    pub active: bool,
    pub joined: String,
    pub bots: Vec<String>,
}

impl UserRow {
    pub fn from_user(user: &BotUser, bot_choices: &[(String, String)]) -> Self {
        let bots = user
            .assigned_bots
            .iter()
            .map(|id| {
                bot_choices
                    .iter()
                    .find(|(bot_id, _)| bot_id == id)
                    .map(|(_, name)| name.clone())
                    .unwrap_or_else(|| id.clone())
            })
            .collect();
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            initials: initials(&user.name),
            email: user.email.clone(),
            role: user.role.label(),
            status: user.status.code(),
            active: user.status == crate::models::UserStatus::Active,
            joined: user.joined_date.format("%Y-%m-%d").to_string(),
            bots,
        }
    }
}

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub hint: String,
    pub selected: bool,
}

impl SelectOption {
    fn new(value: &str, label: &str, selected: bool) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            hint: String::new(),
            selected,
        }
    }
}

/// Assignment picker state: assigned and still-available bots.
pub struct BotPicker {
    pub value: String,
    pub summary: String,
    pub assigned: Vec<SelectOption>,
    pub available: Vec<SelectOption>,
}

impl BotPicker {
    pub fn new(selected: &[String], bot_choices: &[(String, String)]) -> Self {
        let selection = BotSelection::new(selected.to_vec());
        let (assigned, available) = selection.partition(bot_choices);
        let to_options = |pairs: Vec<&(String, String)>| {
            pairs
                .into_iter()
                .map(|(id, name)| SelectOption::new(id, name, false))
                .collect()
        };
        Self {
            value: selection.ids().join(","),
            summary: selection.summary(bot_choices),
            assigned: to_options(assigned),
            available: to_options(available),
        }
    }
}

pub struct TabLink {
    pub code: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTab {
    Basic,
    Behavior,
    Appearance,
    Knowledge,
}

impl ConfigTab {
    pub const ALL: [ConfigTab; 4] = [
        ConfigTab::Basic,
        ConfigTab::Behavior,
        ConfigTab::Appearance,
        ConfigTab::Knowledge,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Behavior => "behavior",
            Self::Appearance => "appearance",
            Self::Knowledge => "knowledge",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Basic => "Basic Settings",
            Self::Behavior => "Behavior",
            Self::Appearance => "Appearance",
            Self::Knowledge => "Knowledge Base",
        }
    }

    /// Unknown or missing tabs open the basic settings.
    pub fn parse(value: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|tab| Some(tab.code()) == value)
            .unwrap_or(Self::Basic)
    }
}

pub struct DocumentRow {
    pub id: String,
    pub name: String,
    pub uploaded: String,
    pub size: String,
    pub status: &'static str,
    pub badge: &'static str,
}

impl DocumentRow {
    fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            uploaded: format_timestamp(&doc.upload_date),
            size: format_size_mb(doc.size),
            status: doc.status.label(),
            badge: doc.status.badge_class(),
        }
    }
}

pub struct UrlRow {
    pub id: String,
    pub url: String,
    pub scope: &'static str,
    pub added: String,
    pub status: &'static str,
    pub badge: &'static str,
}

impl UrlRow {
    fn from_url(entry: &IndexedUrl) -> Self {
        Self {
            id: entry.id.clone(),
            url: entry.url.clone(),
            scope: entry.scope.label(),
            added: format_timestamp(&entry.added_date),
            status: entry.status.label(),
            badge: entry.status.badge_class(),
        }
    }
}

/// Knowledge-base tab: paginated documents, URLs, delete confirmation and settings.
pub struct KnowledgeView {
    pub documents: Vec<DocumentRow>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub per_page: usize,
    pub first_index: usize,
    pub last_index: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: usize,
    pub next_page: usize,
    pub page_sizes: Vec<SelectOption>,
    pub urls: Vec<UrlRow>,
    pub scopes: Vec<SelectOption>,
    pub has_pending: bool,
    pub pending_kind: String,
    pub pending_label: &'static str,
    pub pending_id: String,
    pub pending_name: String,
    pub auto_index_enabled: bool,
    pub chunk_size: u32,
    pub chunk_overlap: u32,
    pub last_reindex: String,
    pub reindexing: bool,
}

impl KnowledgeView {
    pub fn new(kb: &KnowledgeBase, page: usize, per_page: usize) -> Self {
        let docs: Page<Document> = kb.documents_page(page, per_page);
        let pending: Option<&PendingDelete> = kb.pending_delete();
        Self {
            documents: docs.items.iter().map(DocumentRow::from_document).collect(),
            current_page: docs.pagination.current_page,
            total_pages: docs.pagination.total_pages,
            total_items: docs.pagination.total_items,
            per_page: docs.pagination.items_per_page,
            first_index: docs.first_index(),
            last_index: docs.last_index(),
            has_previous: docs.has_previous(),
            has_next: docs.has_next(),
            previous_page: docs.previous_page(),
            next_page: docs.next_page(),
            page_sizes: PAGE_SIZES
                .iter()
                .map(|size| SelectOption::new(&size.to_string(), &size.to_string(), *size == per_page))
                .collect(),
            urls: kb.urls.iter().map(UrlRow::from_url).collect(),
            scopes: UrlScope::ALL
                .iter()
                .map(|scope| SelectOption::new(scope.code(), scope.label(), *scope == UrlScope::default()))
                .collect(),
            has_pending: pending.is_some(),
            pending_kind: pending.map(|p| p.item_type.label().to_string()).unwrap_or_default(),
            pending_label: match pending.map(|p| p.item_type) {
                Some(crate::knowledge::ItemKind::Url) => "URL",
                _ => "document",
            },
            pending_id: pending.map(|p| p.item_id.clone()).unwrap_or_default(),
            pending_name: pending.map(|p| p.item_name.clone()).unwrap_or_default(),
            auto_index_enabled: kb.settings.auto_index_enabled,
            chunk_size: kb.settings.chunk_size,
            chunk_overlap: kb.settings.chunk_overlap,
            last_reindex: kb
                .settings
                .last_reindex_date
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_else(|| "Never".to_string()),
            reindexing: kb.reindexing,
        }
    }
}

/// Error text per form field, empty when the field is fine.
#[derive(Default)]
pub struct FormErrors {
    pub general: String,
    fields: FieldErrors,
}

impl FormErrors {
    pub fn from_error(err: &ConsoleError) -> Self {
        match err.field_errors() {
            Some(fields) => Self {
                general: err.to_string(),
                fields: fields.clone(),
            },
            None => Self {
                general: err.to_string(),
                fields: FieldErrors::new(),
            },
        }
    }

    pub fn field(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn any(&self) -> bool {
        !self.general.is_empty()
    }
}

// ── Askama Templates ─────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub active_nav: &'static str,
    pub notices: Vec<Notice>,
    pub stats: DashboardStats,
    pub bots: Vec<BotRow>,
    pub activity: ActivityMetrics,
    pub rejection_rate: String,
}

#[derive(Template)]
#[template(path = "bots.html")]
pub struct BotsTemplate {
    pub active_nav: &'static str,
    pub notices: Vec<Notice>,
    pub search: String,
    pub bots: Vec<BotRow>,
    pub total_bots: usize,
    pub show_create: bool,
    pub form: CreateBotForm,
    pub errors: FormErrors,
    pub name_counter: String,
    pub description_counter: String,
}

#[derive(Template)]
#[template(path = "bot_config.html")]
pub struct BotConfigTemplate {
    pub active_nav: &'static str,
    pub notices: Vec<Notice>,
    pub bot_id: String,
    pub bot_status: &'static str,
    pub tab: &'static str,
    pub tabs: Vec<TabLink>,
    pub form: BotConfigForm,
    pub errors: FormErrors,
    pub name_counter: String,
    pub prompt_counter: String,
    pub language_codes: String,
    pub language_display: String,
    pub languages: Vec<SelectOption>,
    pub personas: Vec<SelectOption>,
    pub positions: Vec<SelectOption>,
    pub preview: WidgetPreview,
    pub widget: PreviewState,
    pub placeholder: &'static str,
    pub knowledge: KnowledgeView,
}

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub active_nav: &'static str,
    pub notices: Vec<Notice>,
    pub search: String,
    pub status_filter: String,
    pub role_filter: String,
    pub bot_filter: String,
    pub roles: Vec<SelectOption>,
    pub bot_options: Vec<SelectOption>,
    pub users: Vec<UserRow>,
    pub total_users: usize,
    pub show_create: bool,
    pub form: UserForm,
    pub picker: BotPicker,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "user_edit.html")]
pub struct UserEditTemplate {
    pub active_nav: &'static str,
    pub notices: Vec<Notice>,
    pub user_id: String,
    pub initials: String,
    pub form: UserForm,
    pub roles: Vec<SelectOption>,
    pub picker: BotPicker,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub active_nav: &'static str,
    pub notices: Vec<Notice>,
    pub status: u16,
    pub message: String,
}

// ── Render helpers (called from routes.rs) ───────────────────────────

fn render_page<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!(error = %e, "template render failed");
        format!("<h1>Template error: {}</h1>", crate::utils::html_escape(&e.to_string()))
    }))
}

pub fn render_index(
    notices: Vec<Notice>,
    stats: DashboardStats,
    bots: &[Bot],
    activity: ActivityMetrics,
) -> Html<String> {
    let template = IndexTemplate {
        active_nav: "home",
        notices,
        stats,
        bots: bots.iter().map(BotRow::from_bot).collect(),
        rejection_rate: format!("{:.1}%", activity.rejection_rate()),
        activity,
    };
    render_page(&template)
}

pub fn render_bots(
    notices: Vec<Notice>,
    search: &str,
    bots: &[Bot],
    total_bots: usize,
    create: Option<(CreateBotForm, FormErrors)>,
) -> Html<String> {
    let show_create = create.is_some();
    let (form, errors) = create.unwrap_or_default();
    let template = BotsTemplate {
        active_nav: "bots",
        notices,
        search: search.to_string(),
        bots: bots.iter().map(BotRow::from_bot).collect(),
        total_bots,
        show_create,
        name_counter: char_counter(&form.name, NAME_MAX_CHARS),
        description_counter: char_counter(&form.description, DESCRIPTION_MAX_CHARS),
        form,
        errors,
    };
    render_page(&template)
}

pub struct ConfigPage<'a> {
    pub bot: &'a Bot,
    pub tab: ConfigTab,
    pub form: BotConfigForm,
    pub errors: FormErrors,
    pub widget: PreviewState,
    pub knowledge: KnowledgeView,
}

pub fn render_bot_config(notices: Vec<Notice>, page: ConfigPage<'_>) -> Html<String> {
    let ConfigPage { bot, tab, form, errors, widget, knowledge } = page;
    // The preview follows the form while it validates, the saved bot otherwise.
    let (preview_name, preview_settings) = form
        .validate()
        .unwrap_or_else(|_| (bot.name.clone(), bot.settings.clone()));
    let template = BotConfigTemplate {
        active_nav: "bots",
        notices,
        bot_id: bot.id.clone(),
        bot_status: bot.status.label(),
        tab: tab.code(),
        tabs: ConfigTab::ALL
            .iter()
            .map(|t| TabLink { code: t.code(), label: t.label(), active: *t == tab })
            .collect(),
        name_counter: form.name_counter(),
        prompt_counter: form.system_prompt_counter(),
        language_codes: language_codes(&form.supported_languages),
        language_display: form.language_display(),
        languages: Language::ALL
            .iter()
            .map(|l| SelectOption::new(l.code(), l.label(), form.supported_languages.contains(l)))
            .collect(),
        personas: PersonaStyle::ALL
            .iter()
            .map(|p| SelectOption {
                hint: p.description().to_string(),
                ..SelectOption::new(p.code(), p.label(), form.persona_style == p.code())
            })
            .collect(),
        positions: BotPosition::ALL
            .iter()
            .map(|p| SelectOption::new(p.code(), p.label(), form.bot_position == p.code()))
            .collect(),
        preview: WidgetPreview::derive(&preview_name, &preview_settings),
        placeholder: widget.input_placeholder(),
        widget,
        form,
        errors,
        knowledge,
    };
    render_page(&template)
}

pub fn role_options(selected: &str) -> Vec<SelectOption> {
    UserRole::ALL
        .iter()
        .map(|r| SelectOption::new(r.code(), r.label(), UserRole::parse(selected) == Some(*r)))
        .collect()
}

pub struct UsersPage<'a> {
    pub filter: &'a crate::filter::UserFilterQuery,
    pub users: &'a [BotUser],
    pub total_users: usize,
    pub bot_choices: &'a [(String, String)],
    pub create: Option<(UserForm, FormErrors)>,
}

pub fn render_users(notices: Vec<Notice>, page: UsersPage<'_>) -> Html<String> {
    let show_create = page.create.is_some();
    let (form, errors) = page.create.unwrap_or_default();
    let template = UsersTemplate {
        active_nav: "users",
        notices,
        search: page.filter.search.clone(),
        status_filter: page.filter.status.clone(),
        role_filter: page.filter.role.clone(),
        bot_filter: page.filter.bot.clone(),
        roles: role_options(&page.filter.role),
        bot_options: page
            .bot_choices
            .iter()
            .map(|(id, name)| SelectOption::new(id, name, *id == page.filter.bot))
            .collect(),
        users: page
            .users
            .iter()
            .map(|u| UserRow::from_user(u, page.bot_choices))
            .collect(),
        total_users: page.total_users,
        show_create,
        picker: BotPicker::new(&form.selected_bots(), page.bot_choices),
        form,
        errors,
    };
    render_page(&template)
}

pub fn render_user_edit(
    notices: Vec<Notice>,
    user_id: &str,
    form: UserForm,
    bot_choices: &[(String, String)],
    errors: FormErrors,
) -> Html<String> {
    let template = UserEditTemplate {
        active_nav: "users",
        notices,
        user_id: user_id.to_string(),
        initials: initials(&format!("{} {}", form.first_name, form.last_name)),
        roles: role_options(&form.role),
        picker: BotPicker::new(&form.selected_bots(), bot_choices),
        form,
        errors,
    };
    render_page(&template)
}

pub fn render_error(status: u16, message: &str) -> Html<String> {
    let template = ErrorTemplate {
        active_nav: "",
        notices: Vec::new(),
        status,
        message: message.to_string(),
    };
    render_page(&template)
}
