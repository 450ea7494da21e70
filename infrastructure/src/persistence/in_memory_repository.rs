// ./infrastructure/src/persistence/in_memory_repository.rs
use application::{ApplicationError, DocumentRepository};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use domain::{Document, DocumentId, SearchRequest};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    // Document ID -> Document
    store: Arc<DashMap<DocumentId, Arc<Document>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Claims an id that no stored document uses yet and inserts under it.
    fn insert_with_fresh_id(&self, mut document: Document) -> Document {
        loop {
            match self.store.entry(DocumentId::generate()) {
                Entry::Vacant(slot) => {
                    document.id = Some(slot.key().clone());
                    slot.insert(Arc::new(document.clone()));
                    return document;
                }
                Entry::Occupied(taken) => {
                    warn!(doc_id = %taken.key(), "Generated id already in use, retrying");
                }
            }
        }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    #[instrument(skip(self, document))]
    async fn save(&self, document: Document) -> Result<Document, ApplicationError> {
        let Some(id) = document.assigned_id().cloned() else {
            let saved = self.insert_with_fresh_id(document);
            debug!(doc_id = ?saved.id, "Inserted new document into in-memory store");
            return Ok(saved);
        };

        // Full replace; unknown ids are accepted as new entries
        let replaced = self
            .store
            .insert(id.clone(), Arc::new(document.clone()))
            .is_some();
        debug!(doc_id = %id, replaced, "Upserted document in in-memory store");
        Ok(document)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, ApplicationError> {
        debug!(doc_id = %id, "Getting document from in-memory store");
        if id.is_empty() {
            return Ok(None);
        }
        let doc = self.store.get(id).map(|doc_ref| (**doc_ref).clone());
        Ok(doc)
    }

    #[instrument(skip(self, request))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, ApplicationError> {
        debug!(stored = self.store.len(), "Scanning in-memory store");
        let hits = self
            .store
            .iter()
            .filter(|entry| request.matches(entry.value()))
            .map(|entry| (**entry.value()).clone())
            .collect();
        Ok(hits)
    }
}
