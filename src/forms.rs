//! Create/edit payloads for bots and users, and the bot assignment picker.

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, ConsoleResult, FieldErrors};
use crate::models::{AdminRole, UserRole, UserStatus};
use crate::settings::{validate_bot_name, validate_description};
use crate::utils::is_valid_email;

const REQUIRED_FIELDS: &str = "Please fill in all required fields";

/// Body of the create-bot dialog and of `POST /bots`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateBotForm {
    pub name: String,
    pub description: String,
}

impl CreateBotForm {
    pub fn validate(&self) -> ConsoleResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(msg) = validate_bot_name(&self.name) {
            errors.insert("name", msg);
        }
        if let Some(msg) = validate_description(&self.description) {
            errors.insert("description", msg);
        }
        ConsoleError::check_fields("Invalid bot", errors)
    }
}

/// A validated user, ready for the store to check bot references.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub assigned_bots: Vec<String>,
}

/// Create-user dialog and edit-user screen. `bots` is a comma-separated id list
/// maintained by the assignment picker.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub bots: String,
    #[serde(default)]
    pub active: bool,
    /// Set when an assign button submitted the form.
    #[serde(default)]
    pub assign_bot: Option<String>,
    /// Set when an unassign button submitted the form.
    #[serde(default)]
    pub unassign_bot: Option<String>,
}

impl UserForm {
    pub fn selected_bots(&self) -> Vec<String> {
        split_ids(&self.bots)
    }

    /// Applies a pending assign/unassign click. Returns true when one was handled.
    pub fn apply_picker_action(&mut self) -> bool {
        let mut selection = BotSelection::new(self.selected_bots());
        let handled = if let Some(id) = self.assign_bot.take() {
            selection.assign(&id);
            true
        } else if let Some(id) = self.unassign_bot.take() {
            selection.unassign(&id);
            true
        } else {
            false
        };
        self.bots = selection.ids().join(",");
        handled
    }

    /// `require_password` is true when creating; editing leaves the password optional.
    pub fn validate(&self, require_password: bool) -> ConsoleResult<UserDraft> {
        let required = [
            &self.first_name,
            &self.last_name,
            &self.username,
            &self.email,
            &self.role,
        ];
        let bots = self.selected_bots();
        if required.iter().any(|v| v.trim().is_empty())
            || (require_password && self.password.is_empty())
            || bots.is_empty()
        {
            return Err(ConsoleError::invalid(REQUIRED_FIELDS));
        }

        let mut errors = FieldErrors::new();
        if !is_valid_email(&self.email) {
            errors.insert("email", "Please enter a valid email address".to_string());
        }
        let role = UserRole::parse(&self.role);
        if role.is_none() {
            errors.insert("role", format!("Unknown role '{}'", self.role));
        }
        ConsoleError::check_fields("Invalid user", errors)?;

        Ok(UserDraft {
            name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            role: role.unwrap_or(UserRole::Viewer),
            status: if self.active || require_password {
                UserStatus::Active
            } else {
                UserStatus::Inactive
            },
            assigned_bots: bots,
        })
    }
}

/// `POST /bot-users` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBotUser {
    pub name: String,
    pub email: String,
    pub assigned_bots: Vec<String>,
    pub username: Option<String>,
    pub role: Option<UserRole>,
}

impl NewBotUser {
    pub fn validate(self) -> ConsoleResult<UserDraft> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name", "Name is required".to_string());
        }
        if !is_valid_email(&self.email) {
            errors.insert("email", "Please enter a valid email address".to_string());
        }
        ConsoleError::check_fields("Invalid user", errors)?;

        let username = self
            .username
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| default_username(&self.email));
        Ok(UserDraft {
            name: self.name.trim().to_string(),
            username,
            email: self.email.trim().to_string(),
            role: self.role.unwrap_or(UserRole::Viewer),
            status: UserStatus::Active,
            assigned_bots: dedup_ids(self.assigned_bots),
        })
    }
}

/// `PUT /bot-users/:id` body. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotUserPatch {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub assigned_bots: Option<Vec<String>>,
}

impl BotUserPatch {
    pub fn validate(&self) -> ConsoleResult<()> {
        let mut errors = FieldErrors::new();
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            errors.insert("name", "Name is required".to_string());
        }
        if self.email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            errors.insert("email", "Please enter a valid email address".to_string());
        }
        ConsoleError::check_fields("Invalid user update", errors)
    }
}

/// Local part of an email address.
pub fn default_username(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

pub fn split_ids(raw: &str) -> Vec<String> {
    dedup_ids(
        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Assigned bot ids in assignment order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BotSelection {
    ids: Vec<String>,
}

impl BotSelection {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids: dedup_ids(ids) }
    }

    pub fn assign(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    pub fn unassign(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// "2 of 5 bots assigned", counting only ids present in `available`.
    pub fn summary(&self, available: &[(String, String)]) -> String {
        let assigned = available.iter().filter(|(id, _)| self.contains(id)).count();
        format!("{} of {} bots assigned", assigned, available.len())
    }

    /// Splits `(id, name)` pairs into (assigned, still available).
    pub fn partition<'a>(
        &self,
        available: &'a [(String, String)],
    ) -> (Vec<&'a (String, String)>, Vec<&'a (String, String)>) {
        available.iter().partition(|(id, _)| self.contains(id))
    }
}

/// `POST /admin/users` body. The password is checked for presence only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAdminUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub password: String,
}

impl NewAdminUser {
    pub fn validate(&self) -> ConsoleResult<AdminRole> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name", "Name is required".to_string());
        }
        if !is_valid_email(&self.email) {
            errors.insert("email", "Please enter a valid email address".to_string());
        }
        if self.password.is_empty() {
            errors.insert("password", "Password is required".to_string());
        }
        let role = parse_admin_role(&self.role);
        if role.is_none() {
            errors.insert("role", format!("Unknown role '{}'", self.role));
        }
        ConsoleError::check_fields("Invalid admin user", errors)?;
        Ok(role.unwrap_or(AdminRole::User))
    }
}

/// `PUT /admin/users/:id` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminUserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<AdminRole>,
    pub status: Option<UserStatus>,
}

impl AdminUserPatch {
    pub fn validate(&self) -> ConsoleResult<()> {
        let mut errors = FieldErrors::new();
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            errors.insert("name", "Name is required".to_string());
        }
        if self.email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            errors.insert("email", "Please enter a valid email address".to_string());
        }
        ConsoleError::check_fields("Invalid admin update", errors)
    }
}

fn parse_admin_role(value: &str) -> Option<AdminRole> {
    match value.trim().to_lowercase().as_str() {
        "admin" => Some(AdminRole::Admin),
        "user" => Some(AdminRole::User),
        _ => None,
    }
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
