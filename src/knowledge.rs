//! Per-bot knowledge base: uploaded documents, indexed URLs, chunking
//! settings and the simulated ingestion lifecycle.
//!
//! New items enter as `processing`. The ingestion job (scheduled by the
//! dashboard layer) later calls [`KnowledgeBase::resolve`] which settles each
//! item to `completed` or `failed`. Deletion is two-step through
//! [`KnowledgeBase::request_delete`] and [`KnowledgeBase::confirm_delete`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{ConsoleError, ConsoleResult, FieldErrors};
use crate::filter::{paginate, Page};
use crate::models::{Document, IndexedUrl, IngestionStatus, KnowledgeBaseSettings, UrlScope};

/// Upload types accepted by the documents picker.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Document,
    Url,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Url => "url",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "document" => Some(Self::Document),
            "url" => Some(Self::Url),
            _ => None,
        }
    }

    pub fn deleted_message(&self) -> &'static str {
        match self {
            Self::Document => "Document deleted successfully!",
            Self::Url => "URL deleted successfully!",
        }
    }
}

/// Reference to one item awaiting ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionTarget {
    pub kind: ItemKind,
    pub id: String,
}

/// Deletion awaiting operator confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDelete {
    pub item_type: ItemKind,
    pub item_id: String,
    pub item_name: String,
}

/// Metadata of one uploaded file. Contents are not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgeBaseSettingsPatch {
    pub auto_index_enabled: Option<bool>,
    pub chunk_size: Option<u32>,
    pub chunk_overlap: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pub documents: Vec<Document>,
    pub urls: Vec<IndexedUrl>,
    pub settings: KnowledgeBaseSettings,
    pub reindexing: bool,
    pending_delete: Option<PendingDelete>,
}

/// Terminal status of a document once ingested: accepted types complete.
pub fn document_outcome(name: &str) -> IngestionStatus {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        IngestionStatus::Completed
    } else {
        IngestionStatus::Failed
    }
}

/// Terminal status of a URL once crawled: absolute http(s) URLs complete.
pub fn url_outcome(raw: &str) -> IngestionStatus {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
            IngestionStatus::Completed
        }
        _ => IngestionStatus::Failed,
    }
}

impl KnowledgeBase {
    pub fn new(settings: KnowledgeBaseSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Appends every file as `processing`. Returns the new entries in upload order.
    pub fn add_documents(
        &mut self,
        bot_id: &str,
        files: Vec<NewDocument>,
        now: DateTime<Utc>,
    ) -> ConsoleResult<Vec<Document>> {
        if files.is_empty() {
            return Err(ConsoleError::invalid("Please choose at least one file"));
        }
        if files.iter().any(|f| f.name.trim().is_empty()) {
            return Err(ConsoleError::invalid("Uploaded files must have a name"));
        }

        let added: Vec<Document> = files
            .into_iter()
            .map(|file| Document {
                id: Uuid::new_v4().to_string(),
                bot_id: bot_id.to_string(),
                name: file.name.trim().to_string(),
                upload_date: now,
                size: file.size,
                status: IngestionStatus::Processing,
            })
            .collect();
        self.documents.extend(added.iter().cloned());
        Ok(added)
    }

    /// Only emptiness is checked here; well-formedness decides the ingestion outcome.
    pub fn add_url(
        &mut self,
        bot_id: &str,
        url: &str,
        scope: UrlScope,
        now: DateTime<Utc>,
    ) -> ConsoleResult<IndexedUrl> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ConsoleError::invalid("Please enter a valid URL"));
        }
        let entry = IndexedUrl {
            id: Uuid::new_v4().to_string(),
            bot_id: bot_id.to_string(),
            url: url.to_string(),
            scope,
            added_date: now,
            status: IngestionStatus::Processing,
        };
        self.urls.push(entry.clone());
        Ok(entry)
    }

    pub fn documents_page(&self, page: usize, per_page: usize) -> Page<Document> {
        paginate(&self.documents, page, per_page)
    }

    fn item_name(&self, kind: ItemKind, id: &str) -> Option<String> {
        match kind {
            ItemKind::Document => self
                .documents
                .iter()
                .find(|d| d.id == id)
                .map(|d| d.name.clone()),
            ItemKind::Url => self.urls.iter().find(|u| u.id == id).map(|u| u.url.clone()),
        }
    }

    /// Opens a confirmation for the item. Unknown ids open nothing.
    pub fn request_delete(&mut self, kind: ItemKind, id: &str) -> Option<&PendingDelete> {
        let name = self.item_name(kind, id)?;
        self.pending_delete = Some(PendingDelete {
            item_type: kind,
            item_id: id.to_string(),
            item_name: name,
        });
        self.pending_delete.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Removes exactly the item named by the open confirmation and closes it.
    pub fn confirm_delete(&mut self) -> Option<PendingDelete> {
        let pending = self.pending_delete.take()?;
        let removed = match pending.item_type {
            ItemKind::Document => self.delete_document(&pending.item_id).is_ok(),
            ItemKind::Url => self.delete_url(&pending.item_id).is_ok(),
        };
        removed.then_some(pending)
    }

    pub fn delete_document(&mut self, id: &str) -> ConsoleResult<Document> {
        let pos = self
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| ConsoleError::not_found("document", id))?;
        self.clear_pending_for(ItemKind::Document, id);
        Ok(self.documents.remove(pos))
    }

    pub fn delete_url(&mut self, id: &str) -> ConsoleResult<IndexedUrl> {
        let pos = self
            .urls
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| ConsoleError::not_found("url", id))?;
        self.clear_pending_for(ItemKind::Url, id);
        Ok(self.urls.remove(pos))
    }

    fn clear_pending_for(&mut self, kind: ItemKind, id: &str) {
        if self
            .pending_delete
            .as_ref()
            .is_some_and(|p| p.item_type == kind && p.item_id == id)
        {
            self.pending_delete = None;
        }
    }

    /// Settles one `processing` item. Returns the new status, or `None` when the
    /// item is gone or already settled.
    pub fn resolve(&mut self, target: &IngestionTarget) -> Option<IngestionStatus> {
        match target.kind {
            ItemKind::Document => {
                let doc = self
                    .documents
                    .iter_mut()
                    .find(|d| d.id == target.id && d.status == IngestionStatus::Processing)?;
                doc.status = document_outcome(&doc.name);
                Some(doc.status)
            }
            ItemKind::Url => {
                let entry = self
                    .urls
                    .iter_mut()
                    .find(|u| u.id == target.id && u.status == IngestionStatus::Processing)?;
                entry.status = url_outcome(&entry.url);
                Some(entry.status)
            }
        }
    }

    /// Every item currently waiting on ingestion.
    pub fn processing_targets(&self) -> Vec<IngestionTarget> {
        let docs = self
            .documents
            .iter()
            .filter(|d| d.status == IngestionStatus::Processing)
            .map(|d| IngestionTarget {
                kind: ItemKind::Document,
                id: d.id.clone(),
            });
        let urls = self
            .urls
            .iter()
            .filter(|u| u.status == IngestionStatus::Processing)
            .map(|u| IngestionTarget {
                kind: ItemKind::Url,
                id: u.id.clone(),
            });
        docs.chain(urls).collect()
    }

    /// Puts every item back to `processing`. Rejected while a re-index runs.
    pub fn start_reindex(&mut self) -> ConsoleResult<()> {
        if self.reindexing {
            return Err(ConsoleError::Conflict(
                "Re-indexing is already in progress".to_string(),
            ));
        }
        self.reindexing = true;
        for doc in &mut self.documents {
            doc.status = IngestionStatus::Processing;
        }
        for entry in &mut self.urls {
            entry.status = IngestionStatus::Processing;
        }
        Ok(())
    }

    /// Settles everything still processing and stamps the re-index date.
    pub fn finish_reindex(&mut self, now: DateTime<Utc>) -> usize {
        let targets = self.processing_targets();
        let settled = targets
            .iter()
            .filter(|t| self.resolve(t).is_some())
            .count();
        self.reindexing = false;
        self.settings.last_reindex_date = Some(now);
        settled
    }

    pub fn update_settings(
        &mut self,
        patch: KnowledgeBaseSettingsPatch,
    ) -> ConsoleResult<&KnowledgeBaseSettings> {
        let chunk_size = patch.chunk_size.unwrap_or(self.settings.chunk_size);
        let chunk_overlap = patch.chunk_overlap.unwrap_or(self.settings.chunk_overlap);

        let mut errors = FieldErrors::new();
        if chunk_size == 0 {
            errors.insert("chunkSize", "Chunk size must be greater than zero".to_string());
        }
        if chunk_overlap >= chunk_size {
            errors.insert("chunkOverlap", "Chunk overlap must be smaller than the chunk size".to_string());
        }
        ConsoleError::check_fields("Invalid knowledge base settings", errors)?;

        if let Some(enabled) = patch.auto_index_enabled {
            self.settings.auto_index_enabled = enabled;
        }
        self.settings.chunk_size = chunk_size;
        self.settings.chunk_overlap = chunk_overlap;
        Ok(&self.settings)
    }
}
