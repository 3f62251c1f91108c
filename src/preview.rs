//! Live preview of the chat widget.
//!
//! [`WidgetPreview`] is derived from the current settings on every render.
//! [`PreviewState`] holds the interactive bits of the mock (open/minimized,
//! feedback form, voice capture) for one bot.

use crate::models::{BotPosition, BotSettings};
use crate::utils::initials;

pub const SUGGESTED_QUESTIONS: [&str; 3] = [
    "What are your business hours?",
    "How can I track my order?",
    "Tell me about your services",
];

/// Transcript produced by the simulated voice capture.
pub const VOICE_TRANSCRIPT: &str = "What are your business hours?";

const FALLBACK_INITIALS: &str = "CB";

/// Everything the preview pane needs, already resolved to display values.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetPreview {
    pub bot_name: String,
    pub avatar: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub header_background: String,
    pub top_border: String,
    pub position_classes: &'static str,
    pub welcome_popup_text: String,
    pub welcome_message: String,
    pub suggestions: Vec<&'static str>,
    pub show_voice_button: bool,
    pub show_feedback_buttons: bool,
}

pub fn avatar_initials(name: &str) -> String {
    let letters = initials(name);
    if letters.is_empty() {
        FALLBACK_INITIALS.to_string()
    } else {
        letters
    }
}

pub fn position_classes(position: BotPosition) -> &'static str {
    match position {
        BotPosition::BottomRight => "items-end justify-end",
        BotPosition::BottomLeft => "items-end justify-start",
        BotPosition::TopRight => "items-start justify-end",
        BotPosition::TopLeft => "items-start justify-start",
    }
}

impl WidgetPreview {
    pub fn derive(bot_name: &str, settings: &BotSettings) -> Self {
        Self {
            bot_name: bot_name.to_string(),
            avatar: avatar_initials(bot_name),
            primary_color: settings.primary_color.clone(),
            secondary_color: settings.secondary_color.clone(),
            header_background: format!(
                "linear-gradient(135deg, {}, {})",
                settings.primary_color, settings.secondary_color
            ),
            top_border: format!("4px solid {}", settings.primary_color),
            position_classes: position_classes(settings.bot_position),
            welcome_popup_text: settings.welcome_popup_text.clone(),
            welcome_message: settings.welcome_message.clone(),
            suggestions: if settings.suggestions_enabled {
                SUGGESTED_QUESTIONS.to_vec()
            } else {
                Vec::new()
            },
            show_voice_button: settings.voice_search_enabled,
            show_feedback_buttons: settings.feedback_enabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Positive,
    Negative,
}

/// Operator interactions with the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewAction {
    OpenChat,
    Minimize,
    /// Close button: hides the chat and asks for feedback.
    Close,
    Type(String),
    ToggleVoice,
    Feedback(FeedbackKind),
    WrittenFeedback(String),
    DismissFeedback,
}

impl PreviewAction {
    /// Maps a submitted preview button (`action`, optional `text`) to an action.
    pub fn parse(action: &str, text: String) -> Option<Self> {
        Some(match action {
            "open" => Self::OpenChat,
            "minimize" => Self::Minimize,
            "close" => Self::Close,
            "type" => Self::Type(text),
            "voice" => Self::ToggleVoice,
            "thumbs_up" => Self::Feedback(FeedbackKind::Positive),
            "thumbs_down" => Self::Feedback(FeedbackKind::Negative),
            "feedback" => Self::WrittenFeedback(text),
            "dismiss" => Self::DismissFeedback,
            _ => return None,
        })
    }
}

/// What the dashboard must do after an action besides re-rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewEffect {
    None,
    /// Show a success notice to the operator.
    Notice(&'static str),
    /// Show an informational notice.
    Info(&'static str),
    /// Listening started: schedule [`PreviewState::finish_voice_capture`] with this ticket.
    StartVoiceTimer { ticket: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewState {
    pub chat_open: bool,
    pub show_feedback_form: bool,
    pub chat_message: String,
    pub listening: bool,
    pub written_feedback: String,
    voice_ticket: u64,
}

impl Default for PreviewState {
    fn default() -> Self {
        Self {
            chat_open: true,
            show_feedback_form: false,
            chat_message: String::new(),
            listening: false,
            written_feedback: String::new(),
            voice_ticket: 0,
        }
    }
}

impl PreviewState {
    pub fn input_placeholder(&self) -> &'static str {
        if self.listening {
            "Listening..."
        } else {
            "Type your message..."
        }
    }

    pub fn apply(&mut self, action: PreviewAction) -> PreviewEffect {
        match action {
            PreviewAction::OpenChat => {
                self.chat_open = true;
                self.show_feedback_form = false;
                PreviewEffect::None
            }
            PreviewAction::Minimize => {
                self.chat_open = false;
                PreviewEffect::None
            }
            PreviewAction::Close => {
                self.chat_open = false;
                self.show_feedback_form = true;
                PreviewEffect::None
            }
            PreviewAction::Type(text) => {
                if !self.listening {
                    self.chat_message = text;
                }
                PreviewEffect::None
            }
            PreviewAction::ToggleVoice => {
                // A new ticket invalidates any timer still pending for the old capture.
                self.voice_ticket += 1;
                if self.listening {
                    self.listening = false;
                    PreviewEffect::Info("Voice input stopped")
                } else {
                    self.listening = true;
                    PreviewEffect::StartVoiceTimer {
                        ticket: self.voice_ticket,
                    }
                }
            }
            PreviewAction::Feedback(kind) => {
                self.show_feedback_form = false;
                PreviewEffect::Notice(match kind {
                    FeedbackKind::Positive => "Thank you for your positive feedback!",
                    FeedbackKind::Negative => "Thank you for your feedback!",
                })
            }
            PreviewAction::WrittenFeedback(text) => {
                if text.trim().is_empty() {
                    return PreviewEffect::None;
                }
                self.written_feedback.clear();
                self.show_feedback_form = false;
                PreviewEffect::Notice("Thank you for your feedback!")
            }
            PreviewAction::DismissFeedback => {
                self.show_feedback_form = false;
                PreviewEffect::None
            }
        }
    }

    /// Timer callback. Stale tickets (capture stopped or restarted) do nothing.
    pub fn finish_voice_capture(&mut self, ticket: u64) -> bool {
        if !self.listening || ticket != self.voice_ticket {
            return false;
        }
        self.listening = false;
        self.chat_message = VOICE_TRANSCRIPT.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_fallback() {
        assert_eq!(avatar_initials("CodingBot 01"), "C0");
        assert_eq!(avatar_initials("virtual assistant"), "VA");
        assert_eq!(avatar_initials(""), "CB");
    }

    #[test]
    fn test_derive_from_settings() {
        let mut settings = BotSettings::default();
        settings.bot_position = BotPosition::TopLeft;
        settings.suggestions_enabled = true;
        settings.voice_search_enabled = false;

        let preview = WidgetPreview::derive("Helper Bot", &settings);
        assert_eq!(preview.avatar, "HB");
        assert_eq!(preview.header_background, "linear-gradient(135deg, #3B82F6, #10B981)");
        assert_eq!(preview.top_border, "4px solid #3B82F6");
        assert_eq!(preview.position_classes, "items-start justify-start");
        assert_eq!(preview.suggestions.len(), 3);
        assert!(!preview.show_voice_button);
        assert!(!preview.show_feedback_buttons);
    }

    #[test]
    fn test_suggestions_hidden_when_disabled() {
        let preview = WidgetPreview::derive("Bot", &BotSettings::default());
        assert!(preview.suggestions.is_empty());
    }

    #[test]
    fn test_close_opens_feedback_form() {
        let mut state = PreviewState::default();
        assert!(state.chat_open);
        state.apply(PreviewAction::Close);
        assert!(!state.chat_open);
        assert!(state.show_feedback_form);
        let effect = state.apply(PreviewAction::Feedback(FeedbackKind::Positive));
        assert_eq!(effect, PreviewEffect::Notice("Thank you for your positive feedback!"));
        assert!(!state.show_feedback_form);
    }

    #[test]
    fn test_voice_capture_completes() {
        let mut state = PreviewState::default();
        let effect = state.apply(PreviewAction::ToggleVoice);
        let PreviewEffect::StartVoiceTimer { ticket } = effect else {
            panic!("expected a timer, got {effect:?}");
        };
        assert!(state.listening);
        assert_eq!(state.input_placeholder(), "Listening...");

        // Typing is ignored while listening.
        state.apply(PreviewAction::Type("hello".into()));
        assert!(state.chat_message.is_empty());

        assert!(state.finish_voice_capture(ticket));
        assert!(!state.listening);
        assert_eq!(state.chat_message, VOICE_TRANSCRIPT);
    }

    #[test]
    fn test_stopped_capture_ignores_late_timer() {
        let mut state = PreviewState::default();
        let PreviewEffect::StartVoiceTimer { ticket } = state.apply(PreviewAction::ToggleVoice) else {
            panic!("expected a timer");
        };
        assert_eq!(state.apply(PreviewAction::ToggleVoice), PreviewEffect::Info("Voice input stopped"));
        assert!(!state.finish_voice_capture(ticket));
        assert!(state.chat_message.is_empty());
    }

    #[test]
    fn test_restarted_capture_ignores_old_ticket() {
        let mut state = PreviewState::default();
        let PreviewEffect::StartVoiceTimer { ticket: old } = state.apply(PreviewAction::ToggleVoice) else {
            panic!("expected a timer");
        };
        state.apply(PreviewAction::ToggleVoice);
        let PreviewEffect::StartVoiceTimer { ticket: new } = state.apply(PreviewAction::ToggleVoice) else {
            panic!("expected a timer");
        };
        assert!(!state.finish_voice_capture(old));
        assert!(state.listening);
        assert!(state.finish_voice_capture(new));
    }

    #[test]
    fn test_parse_form_actions() {
        assert_eq!(PreviewAction::parse("voice", String::new()), Some(PreviewAction::ToggleVoice));
        assert_eq!(
            PreviewAction::parse("type", "hi".into()),
            Some(PreviewAction::Type("hi".into()))
        );
        assert_eq!(PreviewAction::parse("explode", String::new()), None);
    }

    #[test]
    fn test_blank_written_feedback_is_ignored() {
        let mut state = PreviewState::default();
        state.apply(PreviewAction::Close);
        assert_eq!(state.apply(PreviewAction::WrittenFeedback("  ".into())), PreviewEffect::None);
        assert!(state.show_feedback_form);
    }
}
