//! Entities managed by the console and the JSON envelopes of the REST contract.
//!
//! Field names serialize as camelCase and enum values as kebab/lowercase so
//! the payloads match what the dashboard front end and API clients expect.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Bots ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Active,
    Inactive,
    Draft,
}

impl BotStatus {
    pub fn is_active(&self) -> bool {
        *self == Self::Active
    }

    /// Status after flipping the list switch. Drafts go live on first toggle.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive | Self::Draft => Self::Active,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Draft => "Draft",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ar,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Ar];

    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ar => "Arabic",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaStyle {
    Professional,
    Technical,
    Friendly,
    Creative,
}

impl PersonaStyle {
    pub const ALL: [PersonaStyle; 4] = [
        PersonaStyle::Professional,
        PersonaStyle::Technical,
        PersonaStyle::Friendly,
        PersonaStyle::Creative,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Technical => "technical",
            Self::Friendly => "friendly",
            Self::Creative => "creative",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Professional => "Professional",
            Self::Technical => "Technical",
            Self::Friendly => "Friendly",
            Self::Creative => "Creative",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Professional => "Formal and business-like",
            Self::Technical => "Detailed and precise",
            Self::Friendly => "Warm and approachable",
            Self::Creative => "Innovative and expressive",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BotPosition {
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl BotPosition {
    pub const ALL: [BotPosition; 4] = [
        BotPosition::BottomRight,
        BotPosition::BottomLeft,
        BotPosition::TopRight,
        BotPosition::TopLeft,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
            Self::TopRight => "top-right",
            Self::TopLeft => "top-left",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BottomRight => "Bottom Right",
            Self::BottomLeft => "Bottom Left",
            Self::TopRight => "Top Right",
            Self::TopLeft => "Top Left",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pos| pos.code() == code)
    }
}

/// Per-bot behavior and appearance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotSettings {
    pub welcome_message: String,
    pub idle_timeout: u32,
    pub voice_search_enabled: bool,
    pub feedback_enabled: bool,
    pub stream_chat_enabled: bool,
    pub suggestions_enabled: bool,
    pub supported_languages: Vec<Language>,
    pub system_prompt: String,
    pub persona_style: PersonaStyle,
    pub conversation_memory: bool,
    pub fallback_message: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub bot_position: BotPosition,
    pub welcome_popup_text: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            welcome_message: String::new(),
            idle_timeout: 30,
            voice_search_enabled: true,
            feedback_enabled: false,
            stream_chat_enabled: false,
            suggestions_enabled: false,
            supported_languages: vec![Language::En],
            system_prompt: String::new(),
            persona_style: PersonaStyle::Professional,
            conversation_memory: true,
            fallback_message: "I'm sorry, I don't understand...".to_string(),
            primary_color: "#3B82F6".to_string(),
            secondary_color: "#10B981".to_string(),
            bot_position: BotPosition::BottomRight,
            welcome_popup_text: "Hi there! How can I assist you today?".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: BotStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub total_conversations: u64,
    pub avg_response_ms: u64,
    pub settings: BotSettings,
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Role of a user who works with bots through the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Administrator,
    Editor,
    Viewer,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Administrator, UserRole::Editor, UserRole::Viewer];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::Editor => "Editor",
            Self::Viewer => "Viewer",
        }
    }

    /// Case-insensitive lookup by code or label.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|role| role.code() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub joined_date: NaiveDate,
    pub assigned_bots: Vec<String>,
    pub last_active: Option<DateTime<Utc>>,
    pub total_interactions: u64,
}

impl BotUser {
    /// First name and the remainder, split on the first space.
    pub fn split_name(&self) -> (String, String) {
        let mut words = self.name.split(' ');
        let first = words.next().unwrap_or_default().to_string();
        let last = words.collect::<Vec<_>>().join(" ");
        (first, last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    User,
}

/// Operator account of the console itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub status: UserStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ── Knowledge base ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    Completed,
    Processing,
    Failed,
}

impl IngestionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Processing => "Processing",
            Self::Failed => "Failed",
        }
    }

    pub fn badge_class(&self) -> &'static str {
        match self {
            Self::Completed => "bg-green-100 text-green-700",
            Self::Processing => "bg-yellow-100 text-yellow-700",
            Self::Failed => "bg-red-100 text-red-700",
        }
    }
}

/// Crawl scope of an indexed URL; a new entry covers the entire site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlScope {
    #[serde(alias = "single-page")]
    OnlyThisPage,
    SecondLevelPages,
    #[default]
    EntireSite,
}

impl UrlScope {
    pub const ALL: [UrlScope; 3] = [
        UrlScope::OnlyThisPage,
        UrlScope::SecondLevelPages,
        UrlScope::EntireSite,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::OnlyThisPage => "only-this-page",
            Self::SecondLevelPages => "second-level-pages",
            Self::EntireSite => "entire-site",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OnlyThisPage => "Only this page",
            Self::SecondLevelPages => "Second level pages",
            Self::EntireSite => "Entire site",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        if code == "single-page" {
            return Some(Self::OnlyThisPage);
        }
        Self::ALL.into_iter().find(|scope| scope.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub bot_id: String,
    pub name: String,
    pub upload_date: DateTime<Utc>,
    pub size: u64,
    pub status: IngestionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedUrl {
    pub id: String,
    pub bot_id: String,
    pub url: String,
    pub scope: UrlScope,
    pub added_date: DateTime<Utc>,
    pub status: IngestionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseSettings {
    pub auto_index_enabled: bool,
    pub chunk_size: u32,
    pub chunk_overlap: u32,
    pub last_reindex_date: Option<DateTime<Utc>>,
}

impl Default for KnowledgeBaseSettings {
    fn default() -> Self {
        Self {
            auto_index_enabled: false,
            chunk_size: 512,
            chunk_overlap: 50,
            last_reindex_date: None,
        }
    }
}

// ── Dashboard & envelopes ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_bots: usize,
    pub active_bots: usize,
    pub total_users: usize,
    pub total_conversations: u64,
    pub avg_response_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_settings_defaults() {
        let settings = BotSettings::default();
        assert_eq!(settings.idle_timeout, 30);
        assert!(settings.voice_search_enabled);
        assert!(!settings.feedback_enabled);
        assert_eq!(settings.supported_languages, vec![Language::En]);
        assert_eq!(settings.persona_style, PersonaStyle::Professional);
        assert_eq!(settings.primary_color, "#3B82F6");
        assert_eq!(settings.bot_position, BotPosition::BottomRight);
    }

    #[test]
    fn test_partial_settings_deserialize() {
        let json = r##"{"primaryColor": "#000000", "botPosition": "top-left"}"##;
        let settings: BotSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.primary_color, "#000000");
        assert_eq!(settings.bot_position, BotPosition::TopLeft);
        assert_eq!(settings.secondary_color, "#10B981");
    }

    #[test]
    fn test_url_scope_accepts_contract_alias() {
        let scope: UrlScope = serde_json::from_str("\"single-page\"").unwrap();
        assert_eq!(scope, UrlScope::OnlyThisPage);
        assert_eq!(UrlScope::from_code("single-page"), Some(UrlScope::OnlyThisPage));
        assert_eq!(
            serde_json::to_string(&UrlScope::SecondLevelPages).unwrap(),
            "\"second-level-pages\""
        );
    }

    #[test]
    fn test_bot_status_toggle() {
        assert_eq!(BotStatus::Active.toggled(), BotStatus::Inactive);
        assert_eq!(BotStatus::Inactive.toggled(), BotStatus::Active);
        assert_eq!(BotStatus::Draft.toggled(), BotStatus::Active);
    }

    #[test]
    fn test_user_role_parse_is_case_insensitive() {
        assert_eq!(UserRole::parse("Administrator"), Some(UserRole::Administrator));
        assert_eq!(UserRole::parse(" viewer "), Some(UserRole::Viewer));
        assert_eq!(UserRole::parse("owner"), None);
    }

    #[test]
    fn test_split_name() {
        let user = BotUser {
            id: "1".into(),
            name: "Mary Ann Smith".into(),
            username: "mary".into(),
            email: "mary@example.com".into(),
            role: UserRole::Editor,
            status: UserStatus::Active,
            joined_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            assigned_bots: vec![],
            last_active: None,
            total_interactions: 0,
        };
        assert_eq!(user.split_name(), ("Mary".to_string(), "Ann Smith".to_string()));
    }

    #[test]
    fn test_api_response_omits_missing_message() {
        let json = serde_json::to_string(&ApiResponse::ok(1)).unwrap();
        assert_eq!(json, r#"{"success":true,"data":1}"#);
    }
}
