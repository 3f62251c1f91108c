use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

use crate::config::AppConfig;
use crate::error::ConsoleResult;
use crate::knowledge::{IngestionTarget, ItemKind};
use crate::logger::AuditLog;
use crate::models::IngestionStatus;
use crate::preview::{PreviewState, VOICE_TRANSCRIPT};
use crate::store::ConsoleStore;

/// Flash notices kept for the next page render.
const MAX_PENDING_NOTICES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Toast-style message shown after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    /// CSS classes of the toast.
    pub fn css(&self) -> &'static str {
        match self.level {
            NoticeLevel::Success => "bg-green-50 border-green-300 text-green-800",
            NoticeLevel::Info => "bg-blue-50 border-blue-300 text-blue-800",
            NoticeLevel::Error => "bg-red-50 border-red-300 text-red-800",
        }
    }
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleEvent {
    Notice(Notice),
    IngestionSettled {
        bot_id: String,
        kind: ItemKind,
        id: String,
        status: IngestionStatus,
    },
    ReindexFinished {
        bot_id: String,
        settled: usize,
    },
    VoiceCaptured {
        bot_id: String,
        transcript: String,
    },
}

/// Shared state behind the dashboard and the REST API.
pub struct DashboardState {
    pub config: AppConfig,
    pub store: RwLock<ConsoleStore>,
    pub audit: AuditLog,
    pub event_tx: broadcast::Sender<ConsoleEvent>,
    /// Preview widget state per bot id.
    pub previews: RwLock<HashMap<String, PreviewState>>,
    notices: Mutex<VecDeque<Notice>>,
}

impl DashboardState {
    pub fn new(config: AppConfig, store: ConsoleStore, audit: AuditLog) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(256);
        Arc::new(Self {
            config,
            store: RwLock::new(store),
            audit,
            event_tx,
            previews: RwLock::new(HashMap::new()),
            notices: Mutex::new(VecDeque::new()),
        })
    }

    /// Broadcast an event to all connected WebSocket clients.
    /// Silently drops the event if no one is listening.
    pub fn broadcast(&self, event: ConsoleEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Queues a notice for the next page render and pushes it to subscribers.
    pub fn notify(&self, notice: Notice) {
        if let Ok(mut queue) = self.notices.lock() {
            if queue.len() == MAX_PENDING_NOTICES {
                queue.pop_front();
            }
            queue.push_back(notice.clone());
        }
        self.broadcast(ConsoleEvent::Notice(notice));
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    /// Records a refused action in the audit log and hands the result back.
    pub fn audit_rejection<T>(&self, action: &str, result: ConsoleResult<T>) -> ConsoleResult<T> {
        if let Err(err) = &result {
            self.audit.rejected(action, &err.to_string());
        }
        result
    }

    /// Settles the given items after the ingestion delay. Items deleted in
    /// the meantime are skipped.
    pub fn schedule_ingestion(self: &Arc<Self>, bot_id: String, targets: Vec<IngestionTarget>) {
        if targets.is_empty() {
            return;
        }
        let state = Arc::clone(self);
        let delay = Duration::from_millis(self.config.ingestion_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let settled: Vec<(IngestionTarget, IngestionStatus)> = {
                let mut store = state.store.write().await;
                let Ok(kb) = store.knowledge_mut(&bot_id) else {
                    return;
                };
                targets
                    .into_iter()
                    .filter_map(|target| kb.resolve(&target).map(|status| (target, status)))
                    .collect()
            };
            for (target, status) in settled {
                tracing::info!(bot = %bot_id, kind = target.kind.label(), id = %target.id, status = status.label(), "ingestion settled");
                state.broadcast(ConsoleEvent::IngestionSettled {
                    bot_id: bot_id.clone(),
                    kind: target.kind,
                    id: target.id,
                    status,
                });
            }
        });
    }

    /// Resets every item of the bot's knowledge base to processing and
    /// settles them after the re-index delay.
    pub async fn start_reindex(self: &Arc<Self>, bot_id: &str) -> ConsoleResult<()> {
        let started = self
            .store
            .write()
            .await
            .knowledge_mut(bot_id)
            .and_then(|kb| kb.start_reindex());
        self.audit_rejection("knowledge.reindex", started)?;
        self.audit.applied("knowledge.reindex", bot_id);

        let state = Arc::clone(self);
        let bot_id = bot_id.to_string();
        let delay = Duration::from_millis(self.config.reindex_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let settled = {
                let mut store = state.store.write().await;
                match store.knowledge_mut(&bot_id) {
                    Ok(kb) => kb.finish_reindex(Utc::now()),
                    Err(_) => return,
                }
            };
            tracing::info!(bot = %bot_id, settled, "re-index finished");
            state.broadcast(ConsoleEvent::ReindexFinished { bot_id, settled });
            state.notify(Notice::success("Re-indexing completed successfully!"));
        });
        Ok(())
    }

    /// Completes a voice capture after the capture delay unless it was
    /// stopped or restarted in the meantime.
    pub fn schedule_voice_capture(self: &Arc<Self>, bot_id: String, ticket: u64) {
        let state = Arc::clone(self);
        let delay = Duration::from_millis(self.config.voice_capture_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let captured = state
                .previews
                .write()
                .await
                .get_mut(&bot_id)
                .is_some_and(|preview| preview.finish_voice_capture(ticket));
            if captured {
                state.broadcast(ConsoleEvent::VoiceCaptured {
                    bot_id,
                    transcript: VOICE_TRANSCRIPT.to_string(),
                });
                state.notify(Notice::success("Voice input captured"));
            }
        });
    }

    /// Schedules ingestion for everything still processing, e.g. seeded items.
    pub async fn resume_pending_ingestion(self: &Arc<Self>) {
        let pending: Vec<(String, Vec<IngestionTarget>)> = {
            let store = self.store.read().await;
            store
                .knowledge_bases()
                .map(|(bot_id, kb)| (bot_id.clone(), kb.processing_targets()))
                .filter(|(_, targets)| !targets.is_empty())
                .collect()
        };
        for (bot_id, targets) in pending {
            self.schedule_ingestion(bot_id, targets);
        }
    }
}
