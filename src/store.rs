//! In-memory state behind both the dashboard and the REST API.
//!
//! `ConsoleStore` is plain data with synchronous operations; callers wrap it
//! in a lock. Every mutation validates first and leaves the store untouched
//! on error.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{ConsoleError, ConsoleResult};
use crate::filter::{filter_bots, UserFilter};
use crate::forms::{
    default_username, AdminUserPatch, BotSelection, BotUserPatch, CreateBotForm, LoginRequest,
    NewAdminUser, UserDraft,
};
use crate::knowledge::{KnowledgeBase, NewDocument};
use crate::models::{
    AdminRole, AdminUser, Bot, BotSettings, BotStatus, BotUser, DashboardStats, Document,
    IndexedUrl, IngestionStatus, KnowledgeBaseSettings, UrlScope, UserRole, UserStatus,
};
use crate::settings::BotPatch;
use crate::utils::slugify;

#[derive(Debug, Default)]
pub struct ConsoleStore {
    bots: Vec<Bot>,
    users: Vec<BotUser>,
    admins: Vec<AdminUser>,
    knowledge: HashMap<String, KnowledgeBase>,
    /// Bearer token -> admin id.
    sessions: HashMap<String, String>,
}

impl ConsoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Bots ─────────────────────────────────────────────────────────

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn search_bots(&self, query: &str) -> Vec<Bot> {
        filter_bots(&self.bots, query).into_iter().cloned().collect()
    }

    pub fn bot(&self, id: &str) -> ConsoleResult<&Bot> {
        self.bots
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| ConsoleError::not_found("bot", id))
    }

    fn bot_mut(&mut self, id: &str) -> ConsoleResult<&mut Bot> {
        self.bots
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ConsoleError::not_found("bot", id))
    }

    pub fn bot_exists(&self, id: &str) -> bool {
        self.bots.iter().any(|b| b.id == id)
    }

    /// `(id, name)` pairs for assignment pickers and filters.
    pub fn bot_choices(&self) -> Vec<(String, String)> {
        self.bots
            .iter()
            .map(|b| (b.id.clone(), b.name.clone()))
            .collect()
    }

    fn unique_bot_id(&self, name: &str) -> String {
        let base = slugify(name);
        if !self.bot_exists(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !self.bot_exists(candidate))
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// New bots start inactive with default settings and an empty knowledge base.
    pub fn create_bot(
        &mut self,
        form: CreateBotForm,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> ConsoleResult<Bot> {
        form.validate()?;
        let name = form.name.trim().to_string();
        let bot = Bot {
            id: self.unique_bot_id(&name),
            name,
            description: form.description,
            status: BotStatus::Inactive,
            created_by: created_by.to_string(),
            created_at: now,
            total_conversations: 0,
            avg_response_ms: 0,
            settings: BotSettings::default(),
        };
        self.knowledge
            .insert(bot.id.clone(), KnowledgeBase::default());
        self.bots.push(bot.clone());
        Ok(bot)
    }

    pub fn update_bot(&mut self, id: &str, patch: BotPatch) -> ConsoleResult<Bot> {
        let bot = self.bot_mut(id)?;
        patch.apply_to(bot)?;
        Ok(bot.clone())
    }

    /// Stores a validated configuration form.
    pub fn save_bot_config(
        &mut self,
        id: &str,
        name: String,
        settings: BotSettings,
    ) -> ConsoleResult<Bot> {
        let bot = self.bot_mut(id)?;
        bot.name = name;
        bot.settings = settings;
        Ok(bot.clone())
    }

    pub fn set_bot_status(&mut self, id: &str, status: BotStatus) -> ConsoleResult<Bot> {
        let bot = self.bot_mut(id)?;
        bot.status = status;
        Ok(bot.clone())
    }

    pub fn toggle_bot_status(&mut self, id: &str) -> ConsoleResult<Bot> {
        let bot = self.bot_mut(id)?;
        bot.status = bot.status.toggled();
        Ok(bot.clone())
    }

    /// Removes the bot, its knowledge base, and every assignment that named it.
    pub fn delete_bot(&mut self, id: &str) -> ConsoleResult<Bot> {
        let pos = self
            .bots
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| ConsoleError::not_found("bot", id))?;
        let bot = self.bots.remove(pos);
        self.knowledge.remove(id);
        for user in &mut self.users {
            user.assigned_bots.retain(|b| b != id);
        }
        Ok(bot)
    }

    // ── Bot users ────────────────────────────────────────────────────

    pub fn users(&self) -> &[BotUser] {
        &self.users
    }

    pub fn filter_users(&self, filter: &UserFilter) -> Vec<BotUser> {
        filter.apply(&self.users).into_iter().cloned().collect()
    }

    pub fn user(&self, id: &str) -> ConsoleResult<&BotUser> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| ConsoleError::not_found("user", id))
    }

    fn user_mut(&mut self, id: &str) -> ConsoleResult<&mut BotUser> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ConsoleError::not_found("user", id))
    }

    fn check_bot_refs(&self, ids: &[String]) -> ConsoleResult<()> {
        let unknown: Vec<&str> = ids
            .iter()
            .filter(|id| !self.bot_exists(id))
            .map(String::as_str)
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ConsoleError::invalid(format!(
                "Unknown bot(s): {}",
                unknown.join(", ")
            )))
        }
    }

    fn check_user_email(&self, email: &str, except_id: Option<&str>) -> ConsoleResult<()> {
        let taken = self.users.iter().any(|u| {
            u.email.eq_ignore_ascii_case(email) && Some(u.id.as_str()) != except_id
        });
        if taken {
            Err(ConsoleError::Conflict(format!(
                "A user with email '{}' already exists",
                email
            )))
        } else {
            Ok(())
        }
    }

    pub fn create_user(&mut self, draft: UserDraft, now: DateTime<Utc>) -> ConsoleResult<BotUser> {
        self.check_bot_refs(&draft.assigned_bots)?;
        self.check_user_email(&draft.email, None)?;
        let user = BotUser {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            username: draft.username,
            email: draft.email,
            role: draft.role,
            status: draft.status,
            joined_date: now.date_naive(),
            assigned_bots: draft.assigned_bots,
            last_active: None,
            total_interactions: 0,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    /// Replaces the editable fields with a validated edit form.
    pub fn replace_user(&mut self, id: &str, draft: UserDraft) -> ConsoleResult<BotUser> {
        self.user(id)?;
        self.check_bot_refs(&draft.assigned_bots)?;
        self.check_user_email(&draft.email, Some(id))?;
        let user = self.user_mut(id)?;
        user.name = draft.name;
        user.username = draft.username;
        user.email = draft.email;
        user.role = draft.role;
        user.status = draft.status;
        user.assigned_bots = draft.assigned_bots;
        Ok(user.clone())
    }

    pub fn patch_user(&mut self, id: &str, patch: BotUserPatch) -> ConsoleResult<BotUser> {
        self.user(id)?;
        patch.validate()?;
        if let Some(bots) = &patch.assigned_bots {
            self.check_bot_refs(bots)?;
        }
        let email = patch.email.as_deref().map(str::trim);
        if let Some(email) = email {
            self.check_user_email(email, Some(id))?;
        }
        let email = email.map(str::to_string);
        let user = self.user_mut(id)?;
        if let Some(name) = patch.name {
            user.name = name.trim().to_string();
        }
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(status) = patch.status {
            user.status = status;
        }
        if let Some(bots) = patch.assigned_bots {
            user.assigned_bots = BotSelection::new(bots).ids().to_vec();
        }
        Ok(user.clone())
    }

    pub fn delete_user(&mut self, id: &str) -> ConsoleResult<BotUser> {
        let pos = self
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| ConsoleError::not_found("user", id))?;
        Ok(self.users.remove(pos))
    }

    /// Adds the bot when not yet assigned.
    pub fn assign_bot(&mut self, user_id: &str, bot_id: &str) -> ConsoleResult<BotUser> {
        self.bot(bot_id)?;
        let user = self.user_mut(user_id)?;
        if !user.assigned_bots.iter().any(|b| b == bot_id) {
            user.assigned_bots.push(bot_id.to_string());
        }
        Ok(user.clone())
    }

    pub fn unassign_bot(&mut self, user_id: &str, bot_id: &str) -> ConsoleResult<BotUser> {
        let user = self.user_mut(user_id)?;
        user.assigned_bots.retain(|b| b != bot_id);
        Ok(user.clone())
    }

    // ── Admin users & auth stub ──────────────────────────────────────

    pub fn admins(&self) -> &[AdminUser] {
        &self.admins
    }

    fn check_admin_email(&self, email: &str, except_id: Option<&str>) -> ConsoleResult<()> {
        let taken = self.admins.iter().any(|a| {
            a.email.eq_ignore_ascii_case(email) && Some(a.id.as_str()) != except_id
        });
        if taken {
            Err(ConsoleError::Conflict(format!(
                "An admin with email '{}' already exists",
                email
            )))
        } else {
            Ok(())
        }
    }

    pub fn create_admin(&mut self, req: NewAdminUser, now: DateTime<Utc>) -> ConsoleResult<AdminUser> {
        let role = req.validate()?;
        self.check_admin_email(req.email.trim(), None)?;
        let admin = AdminUser {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            role,
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
        };
        self.admins.push(admin.clone());
        Ok(admin)
    }

    pub fn update_admin(&mut self, id: &str, patch: AdminUserPatch) -> ConsoleResult<AdminUser> {
        patch.validate()?;
        if !self.admins.iter().any(|a| a.id == id) {
            return Err(ConsoleError::not_found("admin user", id));
        }
        if let Some(email) = &patch.email {
            self.check_admin_email(email.trim(), Some(id))?;
        }
        let admin = self
            .admins
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ConsoleError::not_found("admin user", id))?;
        if let Some(name) = patch.name {
            admin.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            admin.email = email.trim().to_string();
        }
        if let Some(role) = patch.role {
            admin.role = role;
        }
        if let Some(status) = patch.status {
            admin.status = status;
        }
        Ok(admin.clone())
    }

    /// Also ends every session of that admin.
    pub fn delete_admin(&mut self, id: &str) -> ConsoleResult<AdminUser> {
        let pos = self
            .admins
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| ConsoleError::not_found("admin user", id))?;
        self.sessions.retain(|_, admin_id| admin_id != id);
        Ok(self.admins.remove(pos))
    }

    /// Stub login: any non-empty password for an active admin's email.
    pub fn login(&mut self, req: &LoginRequest, now: DateTime<Utc>) -> ConsoleResult<(AdminUser, String)> {
        if req.password.is_empty() {
            return Err(ConsoleError::Unauthorized);
        }
        let admin = self
            .admins
            .iter_mut()
            .find(|a| a.email.eq_ignore_ascii_case(req.email.trim()) && a.status == UserStatus::Active)
            .ok_or(ConsoleError::Unauthorized)?;
        admin.last_login = Some(now);
        let admin = admin.clone();
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), admin.id.clone());
        Ok((admin, token))
    }

    pub fn logout(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn current_admin(&self, token: &str) -> ConsoleResult<&AdminUser> {
        let admin_id = self.sessions.get(token).ok_or(ConsoleError::Unauthorized)?;
        self.admins
            .iter()
            .find(|a| &a.id == admin_id)
            .ok_or(ConsoleError::Unauthorized)
    }

    // ── Knowledge base ───────────────────────────────────────────────

    pub fn knowledge(&self, bot_id: &str) -> ConsoleResult<&KnowledgeBase> {
        self.knowledge
            .get(bot_id)
            .ok_or_else(|| ConsoleError::not_found("bot", bot_id))
    }

    pub fn knowledge_mut(&mut self, bot_id: &str) -> ConsoleResult<&mut KnowledgeBase> {
        self.knowledge
            .get_mut(bot_id)
            .ok_or_else(|| ConsoleError::not_found("bot", bot_id))
    }

    pub fn knowledge_bases(&self) -> impl Iterator<Item = (&String, &KnowledgeBase)> {
        self.knowledge.iter()
    }

    // ── Dashboard ────────────────────────────────────────────────────

    pub fn stats(&self) -> DashboardStats {
        let total_conversations: u64 = self.bots.iter().map(|b| b.total_conversations).sum();
        let weighted_ms: u64 = self
            .bots
            .iter()
            .map(|b| b.total_conversations * b.avg_response_ms)
            .sum();
        let avg_ms = if total_conversations == 0 {
            0.0
        } else {
            weighted_ms as f64 / total_conversations as f64
        };
        DashboardStats {
            total_bots: self.bots.len(),
            active_bots: self.bots.iter().filter(|b| b.status.is_active()).count(),
            total_users: self.users.len(),
            total_conversations,
            avg_response_time: format!("{:.1}s", avg_ms / 1000.0),
        }
    }

    // ── Demo data ────────────────────────────────────────────────────

    /// The bots, users and knowledge base the console ships with for demos.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        let created = seed_time(2025, 1, 20, 9, 0);

        let seed_bots = [
            ("coding-bot-01", "CodingBot 01", "A comprehensive coding assistant bot designed to help developers with code completion, debugging, and best practices across multiple programming languages.", BotStatus::Active, 1240, 1200),
            ("virtual-assistant", "Virtual Assistant", "A versatile virtual assistant for general inquiries and support tasks.", BotStatus::Active, 860, 900),
            ("customer-support", "Customer Support Bot", "Answers order, billing and account questions for customers.", BotStatus::Inactive, 0, 0),
            ("sales-assistant", "Sales Assistant", "Qualifies leads and answers product and pricing questions.", BotStatus::Inactive, 0, 0),
            ("technical-support", "Technical Support Bot", "Walks users through troubleshooting steps for common issues.", BotStatus::Draft, 0, 0),
        ];
        for (id, name, description, status, conversations, avg_ms) in seed_bots {
            store.bots.push(Bot {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                status,
                created_by: "admin@example.com".to_string(),
                created_at: created,
                total_conversations: conversations,
                avg_response_ms: avg_ms,
                settings: BotSettings::default(),
            });
            store
                .knowledge
                .insert(id.to_string(), KnowledgeBase::new(KnowledgeBaseSettings::default()));
        }

        let seed_users = [
            ("John Doe", "john.doe@example.com", UserRole::Administrator, (2024, 1, 15), UserStatus::Active, &["virtual-assistant", "customer-support"][..]),
            ("Jane Smith", "jane.smith@example.com", UserRole::Editor, (2024, 2, 20), UserStatus::Active, &["sales-assistant", "technical-support", "coding-bot-01"][..]),
            ("Mike Johnson", "mike.j@example.com", UserRole::Viewer, (2024, 3, 10), UserStatus::Inactive, &["virtual-assistant"][..]),
        ];
        for (i, (name, email, role, (y, m, d), status, bots)) in seed_users.into_iter().enumerate() {
            store.users.push(BotUser {
                id: (i + 1).to_string(),
                name: name.to_string(),
                username: default_username(email),
                email: email.to_string(),
                role,
                status,
                joined_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
                assigned_bots: bots.iter().map(|b| b.to_string()).collect(),
                last_active: None,
                total_interactions: 0,
            });
        }

        store.admins.push(AdminUser {
            id: "admin".to_string(),
            name: "Admin User".to_string(),
            email: "admin@example.com".to_string(),
            role: AdminRole::Admin,
            status: UserStatus::Active,
            last_login: None,
            created_at: created,
        });

        if let Some(kb) = store.knowledge.get_mut("coding-bot-01") {
            let day = |h, min| seed_time(2025, 1, 28, h, min);
            let docs = [
                ("Product_Guide.pdf", 2_048_000, day(10, 30), IngestionStatus::Completed),
                ("FAQ_Document.docx", 512_000, day(11, 15), IngestionStatus::Completed),
                ("Technical_Specs.txt", 256_000, day(12, 0), IngestionStatus::Processing),
            ];
            for (name, size, uploaded, status) in docs {
                kb.documents.push(Document {
                    id: Uuid::new_v4().to_string(),
                    bot_id: "coding-bot-01".to_string(),
                    name: name.to_string(),
                    upload_date: uploaded,
                    size,
                    status,
                });
            }
            let urls = [
                ("https://example.com/docs", UrlScope::EntireSite, day(10, 0)),
                ("https://help.example.com", UrlScope::SecondLevelPages, day(11, 30)),
            ];
            for (url, scope, added) in urls {
                kb.urls.push(IndexedUrl {
                    id: Uuid::new_v4().to_string(),
                    bot_id: "coding-bot-01".to_string(),
                    url: url.to_string(),
                    scope,
                    added_date: added,
                    status: IngestionStatus::Completed,
                });
            }
        }

        store
    }

    /// Convenience used by the upload handlers.
    pub fn add_documents(
        &mut self,
        bot_id: &str,
        files: Vec<NewDocument>,
        now: DateTime<Utc>,
    ) -> ConsoleResult<Vec<Document>> {
        self.knowledge_mut(bot_id)?.add_documents(bot_id, files, now)
    }

    pub fn add_url(
        &mut self,
        bot_id: &str,
        url: &str,
        scope: UrlScope,
        now: DateTime<Utc>,
    ) -> ConsoleResult<IndexedUrl> {
        self.knowledge_mut(bot_id)?.add_url(bot_id, url, scope, now)
    }
}

fn seed_time(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::UserForm;

    fn draft(email: &str, bots: &[&str]) -> UserDraft {
        UserDraft {
            name: "Test User".into(),
            username: "test".into(),
            email: email.into(),
            role: UserRole::Viewer,
            status: UserStatus::Active,
            assigned_bots: bots.iter().map(|b| b.to_string()).collect(),
        }
    }

    #[test]
    fn test_seed_matches_demo_data() {
        let store = ConsoleStore::seeded();
        assert_eq!(store.bots().len(), 5);
        assert_eq!(store.users().len(), 3);
        let kb = store.knowledge("coding-bot-01").unwrap();
        assert_eq!(kb.documents.len(), 3);
        assert_eq!(kb.urls.len(), 2);
        assert_eq!(kb.processing_targets().len(), 1);
        // Every seeded assignment points at a seeded bot.
        for user in store.users() {
            for bot in &user.assigned_bots {
                assert!(store.bot_exists(bot), "dangling assignment {bot}");
            }
        }
    }

    #[test]
    fn test_create_bot_slug_ids_are_unique() {
        let mut store = ConsoleStore::new();
        let now = Utc::now();
        let form = || CreateBotForm { name: "Help Desk".into(), description: String::new() };
        let first = store.create_bot(form(), "admin", now).unwrap();
        let second = store.create_bot(form(), "admin", now).unwrap();
        let third = store.create_bot(form(), "admin", now).unwrap();
        assert_eq!(first.id, "help-desk");
        assert_eq!(second.id, "help-desk-2");
        assert_eq!(third.id, "help-desk-3");
        assert_eq!(first.status, BotStatus::Inactive);
        assert!(store.knowledge("help-desk-2").is_ok());
    }

    #[test]
    fn test_create_bot_validation_leaves_store_untouched() {
        let mut store = ConsoleStore::new();
        let form = CreateBotForm { name: String::new(), description: String::new() };
        assert!(store.create_bot(form, "admin", Utc::now()).is_err());
        assert!(store.bots().is_empty());
    }

    #[test]
    fn test_search_bots() {
        let store = ConsoleStore::seeded();
        let hits = store.search_bots("VERSATILE");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "virtual-assistant");
        assert_eq!(store.search_bots("").len(), 5);
    }

    #[test]
    fn test_toggle_and_stats() {
        let mut store = ConsoleStore::seeded();
        assert_eq!(store.stats().active_bots, 2);
        store.toggle_bot_status("coding-bot-01").unwrap();
        let stats = store.stats();
        assert_eq!(stats.active_bots, 1);
        assert_eq!(stats.total_conversations, 2100);
        assert_eq!(stats.avg_response_time, "1.1s");
        assert!(store.toggle_bot_status("nope").is_err());
    }

    #[test]
    fn test_delete_bot_removes_assignments() {
        let mut store = ConsoleStore::seeded();
        store.delete_bot("virtual-assistant").unwrap();
        assert!(store.knowledge("virtual-assistant").is_err());
        assert!(store
            .users()
            .iter()
            .all(|u| !u.assigned_bots.contains(&"virtual-assistant".to_string())));
    }

    #[test]
    fn test_user_assignments_must_reference_bots() {
        let mut store = ConsoleStore::seeded();
        let err = store
            .create_user(draft("new@example.com", &["ghost-bot"]), Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("ghost-bot"));
        assert!(store.assign_bot("1", "ghost-bot").is_err());
        let user = store
            .create_user(draft("new@example.com", &["coding-bot-01"]), Utc::now())
            .unwrap();
        assert_eq!(user.assigned_bots, vec!["coding-bot-01"]);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let mut store = ConsoleStore::seeded();
        let err = store
            .create_user(draft("JOHN.DOE@example.com", &["coding-bot-01"]), Utc::now())
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Conflict(_)));
        // Keeping one's own email is fine.
        let form = UserForm {
            first_name: "John".into(),
            last_name: "Doe".into(),
            username: "john.doe".into(),
            email: "john.doe@example.com".into(),
            role: "administrator".into(),
            bots: "virtual-assistant".into(),
            active: true,
            ..Default::default()
        };
        let user = store.replace_user("1", form.validate(false).unwrap()).unwrap();
        assert_eq!(user.assigned_bots, vec!["virtual-assistant"]);
    }

    #[test]
    fn test_patch_email_is_trimmed_before_conflict_check() {
        let mut store = ConsoleStore::seeded();
        let patch = BotUserPatch {
            email: Some(" john.doe@example.com".into()),
            ..Default::default()
        };
        let err = store.patch_user("2", patch).unwrap_err();
        assert!(matches!(err, ConsoleError::Conflict(_)));
        assert_eq!(
            store.users().iter().filter(|u| u.email == "john.doe@example.com").count(),
            1
        );

        let patch = BotUserPatch {
            email: Some("  jane.new@example.com ".into()),
            ..Default::default()
        };
        let user = store.patch_user("2", patch).unwrap();
        assert_eq!(user.email, "jane.new@example.com");
    }

    #[test]
    fn test_update_admin_email_conflicts() {
        let mut store = ConsoleStore::seeded();
        let req = NewAdminUser {
            name: "Ops".into(),
            email: "ops@example.com".into(),
            role: "admin".into(),
            password: "secret".into(),
        };
        let ops = store.create_admin(req, Utc::now()).unwrap();

        let patch = AdminUserPatch {
            email: Some("ADMIN@example.com".into()),
            ..Default::default()
        };
        let err = store.update_admin(&ops.id, patch).unwrap_err();
        assert!(matches!(err, ConsoleError::Conflict(_)));
        let same = store
            .admins()
            .iter()
            .filter(|a| a.email.eq_ignore_ascii_case("admin@example.com"))
            .count();
        assert_eq!(same, 1);

        // Re-saving one's own email in another case is fine.
        let patch = AdminUserPatch {
            email: Some("OPS@example.com".into()),
            ..Default::default()
        };
        assert_eq!(store.update_admin(&ops.id, patch).unwrap().email, "OPS@example.com");
    }

    #[test]
    fn test_assign_is_idempotent_and_unassign_removes() {
        let mut store = ConsoleStore::seeded();
        store.assign_bot("3", "coding-bot-01").unwrap();
        let user = store.assign_bot("3", "coding-bot-01").unwrap();
        assert_eq!(user.assigned_bots, vec!["virtual-assistant", "coding-bot-01"]);
        let user = store.unassign_bot("3", "virtual-assistant").unwrap();
        assert_eq!(user.assigned_bots, vec!["coding-bot-01"]);
    }

    #[test]
    fn test_login_stub_and_sessions() {
        let mut store = ConsoleStore::seeded();
        let bad = LoginRequest { email: "admin@example.com".into(), password: String::new() };
        assert!(matches!(store.login(&bad, Utc::now()), Err(ConsoleError::Unauthorized)));

        let req = LoginRequest { email: "Admin@Example.com".into(), password: "x".into() };
        let (admin, token) = store.login(&req, Utc::now()).unwrap();
        assert!(admin.last_login.is_some());
        assert_eq!(store.current_admin(&token).unwrap().id, "admin");

        assert!(store.logout(&token));
        assert!(store.current_admin(&token).is_err());
        assert!(!store.logout(&token));
    }

    #[test]
    fn test_delete_admin_ends_sessions() {
        let mut store = ConsoleStore::seeded();
        let req = LoginRequest { email: "admin@example.com".into(), password: "x".into() };
        let (_, token) = store.login(&req, Utc::now()).unwrap();
        store.delete_admin("admin").unwrap();
        assert!(store.current_admin(&token).is_err());
    }

    #[test]
    fn test_save_bot_config_persists() {
        let mut store = ConsoleStore::seeded();
        let mut settings = BotSettings::default();
        settings.welcome_message = "Welcome!".into();
        store
            .save_bot_config("coding-bot-01", "CodingBot 02".into(), settings.clone())
            .unwrap();
        let bot = store.bot("coding-bot-01").unwrap();
        assert_eq!(bot.name, "CodingBot 02");
        assert_eq!(bot.settings, settings);
    }
}
