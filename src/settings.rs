//! Bot configuration form state: the basic, behavior and appearance tabs.
//!
//! The form keeps raw strings for numeric inputs so a bad value can be shown
//! back to the operator alongside the error, and only becomes a
//! [`BotSettings`] after [`BotConfigForm::validate`].

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, ConsoleResult, FieldErrors};
use crate::models::{Bot, BotPosition, BotSettings, Language, PersonaStyle};
use crate::utils::is_hex_color;

pub const NAME_MAX_CHARS: usize = 30;
pub const DESCRIPTION_MAX_CHARS: usize = 300;

/// Submitted configuration form.
///
/// Every field defaults individually so an unchecked checkbox (absent from
/// the body) reads as `false` rather than the setting's default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BotConfigForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub welcome_message: String,
    #[serde(default)]
    pub idle_timeout: String,
    #[serde(default)]
    pub voice_search_enabled: bool,
    #[serde(default)]
    pub feedback_enabled: bool,
    #[serde(default)]
    pub stream_chat_enabled: bool,
    #[serde(default)]
    pub suggestions_enabled: bool,
    /// Comma-separated language codes in selection order.
    #[serde(default, deserialize_with = "language_list")]
    pub supported_languages: Vec<Language>,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub persona_style: String,
    #[serde(default)]
    pub conversation_memory: bool,
    #[serde(default)]
    pub fallback_message: String,
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub secondary_color: String,
    #[serde(default)]
    pub bot_position: String,
    #[serde(default)]
    pub welcome_popup_text: String,
    /// Set when a language toggle button submitted the form instead of Save.
    #[serde(default)]
    pub toggle_lang: Option<String>,
}

fn language_list<'de, D>(deserializer: D) -> Result<Vec<Language>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_language_list(&raw))
}

/// Unknown codes are dropped.
pub fn parse_language_list(raw: &str) -> Vec<Language> {
    raw.split(',')
        .filter_map(|code| Language::from_code(code.trim()))
        .collect()
}

pub fn language_codes(languages: &[Language]) -> String {
    languages
        .iter()
        .map(Language::code)
        .collect::<Vec<_>>()
        .join(",")
}

impl Default for BotConfigForm {
    fn default() -> Self {
        Self::from_settings("", &BotSettings::default())
    }
}

impl BotConfigForm {
    pub fn from_settings(name: &str, settings: &BotSettings) -> Self {
        Self {
            name: name.to_string(),
            welcome_message: settings.welcome_message.clone(),
            idle_timeout: settings.idle_timeout.to_string(),
            voice_search_enabled: settings.voice_search_enabled,
            feedback_enabled: settings.feedback_enabled,
            stream_chat_enabled: settings.stream_chat_enabled,
            suggestions_enabled: settings.suggestions_enabled,
            supported_languages: settings.supported_languages.clone(),
            system_prompt: settings.system_prompt.clone(),
            persona_style: settings.persona_style.code().to_string(),
            conversation_memory: settings.conversation_memory,
            fallback_message: settings.fallback_message.clone(),
            primary_color: settings.primary_color.clone(),
            secondary_color: settings.secondary_color.clone(),
            bot_position: settings.bot_position.code().to_string(),
            welcome_popup_text: settings.welcome_popup_text.clone(),
            toggle_lang: None,
        }
    }

    pub fn from_bot(bot: &Bot) -> Self {
        Self::from_settings(&bot.name, &bot.settings)
    }

    /// Adds `lang` when absent, removes it when present.
    pub fn toggle_language(&mut self, lang: Language) {
        if let Some(pos) = self.supported_languages.iter().position(|l| *l == lang) {
            self.supported_languages.remove(pos);
        } else {
            self.supported_languages.push(lang);
        }
    }

    pub fn language_display(&self) -> String {
        language_display(&self.supported_languages)
    }

    pub fn name_counter(&self) -> String {
        char_counter(&self.name, NAME_MAX_CHARS)
    }

    pub fn system_prompt_counter(&self) -> String {
        format!("{} characters", self.system_prompt.chars().count())
    }

    /// Checks every field and builds the settings. Errors are keyed by field.
    pub fn validate(&self) -> ConsoleResult<(String, BotSettings)> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if let Some(msg) = validate_bot_name(name) {
            errors.insert("name", msg);
        }

        let idle_timeout = match self.idle_timeout.trim().parse::<u32>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                errors.insert("idleTimeout", "Idle timeout must be a positive number of seconds".to_string());
                0
            }
        };

        let persona_style = PersonaStyle::from_code(&self.persona_style).unwrap_or_else(|| {
            errors.insert("personaStyle", format!("Unknown persona style '{}'", self.persona_style));
            PersonaStyle::Professional
        });

        let bot_position = BotPosition::from_code(&self.bot_position).unwrap_or_else(|| {
            errors.insert("botPosition", format!("Unknown position '{}'", self.bot_position));
            BotPosition::BottomRight
        });

        if !is_hex_color(&self.primary_color) {
            errors.insert("primaryColor", "Colors must be in #RRGGBB form".to_string());
        }
        if !is_hex_color(&self.secondary_color) {
            errors.insert("secondaryColor", "Colors must be in #RRGGBB form".to_string());
        }

        ConsoleError::check_fields("Invalid bot configuration", errors)?;

        let mut languages = Vec::with_capacity(self.supported_languages.len());
        for lang in &self.supported_languages {
            if !languages.contains(lang) {
                languages.push(*lang);
            }
        }

        let settings = BotSettings {
            welcome_message: self.welcome_message.clone(),
            idle_timeout,
            voice_search_enabled: self.voice_search_enabled,
            feedback_enabled: self.feedback_enabled,
            stream_chat_enabled: self.stream_chat_enabled,
            suggestions_enabled: self.suggestions_enabled,
            supported_languages: languages,
            system_prompt: self.system_prompt.clone(),
            persona_style,
            conversation_memory: self.conversation_memory,
            fallback_message: self.fallback_message.clone(),
            primary_color: self.primary_color.clone(),
            secondary_color: self.secondary_color.clone(),
            bot_position,
            welcome_popup_text: self.welcome_popup_text.clone(),
        };
        Ok((name.to_string(), settings))
    }
}

pub fn validate_bot_name(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        Some("Bot name is required".to_string())
    } else if name.chars().count() > NAME_MAX_CHARS {
        Some(format!("Bot name must be {} characters or less", NAME_MAX_CHARS))
    } else {
        None
    }
}

pub fn validate_description(description: &str) -> Option<String> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        Some(format!(
            "Description must be {} characters or less",
            DESCRIPTION_MAX_CHARS
        ))
    } else {
        None
    }
}

/// `"12/30"` style counter shown under capped inputs.
pub fn char_counter(value: &str, max: usize) -> String {
    format!("{}/{}", value.chars().count(), max)
}

pub fn language_display(languages: &[Language]) -> String {
    if languages.is_empty() {
        return "Select languages".to_string();
    }
    languages
        .iter()
        .map(Language::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Partial update accepted by `PUT /bots/:id`. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<crate::models::BotStatus>,
    pub welcome_message: Option<String>,
    pub idle_timeout: Option<u32>,
    pub voice_search_enabled: Option<bool>,
    pub feedback_enabled: Option<bool>,
    pub stream_chat_enabled: Option<bool>,
    pub suggestions_enabled: Option<bool>,
    pub supported_languages: Option<Vec<Language>>,
    pub system_prompt: Option<String>,
    pub persona_style: Option<PersonaStyle>,
    pub conversation_memory: Option<bool>,
    pub fallback_message: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub bot_position: Option<BotPosition>,
    pub welcome_popup_text: Option<String>,
}

impl BotPatch {
    /// Validates the patch against the current bot and applies it in place.
    /// Nothing is changed when any field is rejected.
    pub fn apply_to(self, bot: &mut Bot) -> ConsoleResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            if let Some(msg) = validate_bot_name(name) {
                errors.insert("name", msg);
            }
        }
        if let Some(description) = &self.description {
            if let Some(msg) = validate_description(description) {
                errors.insert("description", msg);
            }
        }
        if self.idle_timeout == Some(0) {
            errors.insert("idleTimeout", "Idle timeout must be a positive number of seconds".to_string());
        }
        for (field, color) in [("primaryColor", &self.primary_color), ("secondaryColor", &self.secondary_color)] {
            if let Some(color) = color {
                if !is_hex_color(color) {
                    errors.insert(field, "Colors must be in #RRGGBB form".to_string());
                }
            }
        }
        ConsoleError::check_fields("Invalid bot update", errors)?;

        let settings = &mut bot.settings;
        if let Some(name) = self.name {
            bot.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            bot.description = description;
        }
        if let Some(status) = self.status {
            bot.status = status;
        }
        if let Some(v) = self.welcome_message {
            settings.welcome_message = v;
        }
        if let Some(v) = self.idle_timeout {
            settings.idle_timeout = v;
        }
        if let Some(v) = self.voice_search_enabled {
            settings.voice_search_enabled = v;
        }
        if let Some(v) = self.feedback_enabled {
            settings.feedback_enabled = v;
        }
        if let Some(v) = self.stream_chat_enabled {
            settings.stream_chat_enabled = v;
        }
        if let Some(v) = self.suggestions_enabled {
            settings.suggestions_enabled = v;
        }
        if let Some(v) = self.supported_languages {
            settings.supported_languages = v;
        }
        if let Some(v) = self.system_prompt {
            settings.system_prompt = v;
        }
        if let Some(v) = self.persona_style {
            settings.persona_style = v;
        }
        if let Some(v) = self.conversation_memory {
            settings.conversation_memory = v;
        }
        if let Some(v) = self.fallback_message {
            settings.fallback_message = v;
        }
        if let Some(v) = self.primary_color {
            settings.primary_color = v;
        }
        if let Some(v) = self.secondary_color {
            settings.secondary_color = v;
        }
        if let Some(v) = self.bot_position {
            settings.bot_position = v;
        }
        if let Some(v) = self.welcome_popup_text {
            settings.welcome_popup_text = v;
        }
        Ok(())
    }
}
