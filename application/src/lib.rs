use async_trait::async_trait;
use domain::{Document, SearchRequest};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Search failed: {source}")]
    SearchError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

// --- Infrastructure Interfaces (Traits) ---

/// Interface for storing, looking up and filtering documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Upserts a document. Assigns a fresh id when none is set and returns
    /// the stored value. A set but unknown id is inserted, not rejected.
    async fn save(&self, document: Document) -> Result<Document, ApplicationError>;
    /// Exact-match lookup. Blank or unknown ids yield `None`.
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, ApplicationError>;
    /// Returns every stored document accepted by `request`, in no particular order.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, ApplicationError>;
}

// --- Response Models (DTOs) ---

#[derive(Serialize, Debug)]
pub struct SearchResponse {
    /// Documents matching every filter of the request.
    pub hits: Vec<Document>,
    /// Number of matching documents.
    pub nb_hits: usize,
    /// Time taken by the search operation in milliseconds.
    pub processing_time_ms: u128,
}

impl SearchResponse {
    fn empty() -> Self {
        Self {
            hits: Vec::new(),
            nb_hits: 0,
            processing_time_ms: 0,
        }
    }
}

// --- Application Services (Use Cases) ---

/// Service responsible for upserting and fetching documents.
pub struct DocumentService {
    doc_repo: Arc<dyn DocumentRepository>,
}

impl DocumentService {
    pub fn new(doc_repo: Arc<dyn DocumentRepository>) -> Self {
        Self { doc_repo }
    }

    #[instrument(skip(self, document), fields(has_id = document.assigned_id().is_some()))]
    pub async fn save_document(&self, document: Document) -> Result<Document, ApplicationError> {
        info!("Attempting to save document");

        match self.doc_repo.save(document).await {
            Ok(saved) => {
                info!(doc_id = ?saved.assigned_id(), "Document saved successfully");
                Ok(saved)
            }
            Err(e) => {
                error!("Failed to save document to repository: {}", e);
                Err(ApplicationError::InfrastructureError(format!(
                    "Repository save failed: {}",
                    e
                )))
            }
        }
    }

    #[instrument(skip(self), fields(doc_id = %id))]
    pub async fn get_document(&self, id: &str) -> Result<Option<Document>, ApplicationError> {
        info!("Attempting to retrieve document");

        let document = self.doc_repo.find_by_id(id).await.map_err(|e| {
            error!(doc_id = %id, "Failed to look up document: {}", e);
            ApplicationError::InfrastructureError(format!("Repository lookup failed: {}", e))
        })?;
        if document.is_none() {
            debug!(doc_id = %id, "Document not found");
        }
        Ok(document)
    }
}

/// Service responsible for filtering stored documents.
pub struct SearchService {
    doc_repo: Arc<dyn DocumentRepository>,
}

impl SearchService {
    pub fn new(doc_repo: Arc<dyn DocumentRepository>) -> Self {
        Self { doc_repo }
    }

    /// A missing request yields an empty response rather than an error.
    #[instrument(skip(self, request), fields(has_request = request.is_some()))]
    pub async fn search_documents(
        &self,
        request: Option<SearchRequest>,
    ) -> Result<SearchResponse, ApplicationError> {
        let Some(request) = request else {
            warn!("Received null search request, returning no hits");
            return Ok(SearchResponse::empty());
        };
        info!(
            title_prefixes = request.title_prefixes.len(),
            contains_contents = request.contains_contents.len(),
            author_ids = request.author_ids.len(),
            created_from = ?request.created_from,
            created_to = ?request.created_to,
            "Attempting to search documents"
        );

        let start_time = Instant::now();
        match self.doc_repo.search(&request).await {
            Ok(hits) => {
                let processing_time_ms = start_time.elapsed().as_millis();
                info!(
                    total_hits = hits.len(),
                    time_ms = processing_time_ms,
                    "Search successful"
                );
                Ok(SearchResponse {
                    nb_hits: hits.len(),
                    hits,
                    processing_time_ms,
                })
            }
            Err(e) => {
                error!(
                    time_ms = start_time.elapsed().as_millis(),
                    "Search failed: {}", e
                );
                Err(ApplicationError::SearchError {
                    source: Box::new(e),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DocumentId;
    use std::sync::Mutex;

    /// Vec-backed repository, enough to exercise the services.
    #[derive(Default)]
    struct VecRepository {
        documents: Mutex<Vec<Document>>,
        search_calls: Mutex<usize>,
    }

    #[async_trait]
    impl DocumentRepository for VecRepository {
        async fn save(&self, mut document: Document) -> Result<Document, ApplicationError> {
            let mut documents = self.documents.lock().unwrap();
            let id = match document.assigned_id() {
                Some(id) => id.clone(),
                None => DocumentId::generate(),
            };
            documents.retain(|doc| doc.id.as_ref() != Some(&id));
            document.id = Some(id);
            documents.push(document.clone());
            Ok(document)
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Document>, ApplicationError> {
            let documents = self.documents.lock().unwrap();
            Ok(documents
                .iter()
                .find(|doc| doc.assigned_id().map(DocumentId::as_str) == Some(id))
                .cloned())
        }

        async fn search(
            &self,
            request: &SearchRequest,
        ) -> Result<Vec<Document>, ApplicationError> {
            *self.search_calls.lock().unwrap() += 1;
            let documents = self.documents.lock().unwrap();
            Ok(documents
                .iter()
                .filter(|doc| request.matches(doc))
                .cloned()
                .collect())
        }
    }

    struct BrokenRepository;

    #[async_trait]
    impl DocumentRepository for BrokenRepository {
        async fn save(&self, _document: Document) -> Result<Document, ApplicationError> {
            Err(ApplicationError::InfrastructureError("store offline".to_string()))
        }

        async fn find_by_id(&self, _id: &str) -> Result<Option<Document>, ApplicationError> {
            Err(ApplicationError::InfrastructureError("store offline".to_string()))
        }

        async fn search(
            &self,
            _request: &SearchRequest,
        ) -> Result<Vec<Document>, ApplicationError> {
            Err(ApplicationError::InfrastructureError("store offline".to_string()))
        }
    }

    fn titled(title: &str) -> Document {
        Document {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn save_then_get_round_trips_through_service() {
        let repo = Arc::new(VecRepository::default());
        let service = DocumentService::new(repo);

        let saved = service.save_document(titled("Report Q1")).await.unwrap();
        let id = saved.assigned_id().expect("id assigned").clone();

        let found = service.get_document(id.as_str()).await.unwrap();
        assert_eq!(found, Some(saved));
        assert_eq!(service.get_document("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn null_search_request_skips_repository() {
        let repo = Arc::new(VecRepository::default());
        let documents = DocumentService::new(repo.clone());
        let search = SearchService::new(repo.clone());
        documents.save_document(titled("Report Q1")).await.unwrap();

        let response = search.search_documents(None).await.unwrap();
        assert!(response.hits.is_empty());
        assert_eq!(response.nb_hits, 0);
        assert_eq!(*repo.search_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn search_reports_hit_count() {
        let repo = Arc::new(VecRepository::default());
        let documents = DocumentService::new(repo.clone());
        let search = SearchService::new(repo);
        documents.save_document(titled("Report Q1")).await.unwrap();
        documents.save_document(titled("Report Q2")).await.unwrap();
        documents.save_document(titled("Summary")).await.unwrap();

        let response = search
            .search_documents(Some(SearchRequest {
                title_prefixes: vec!["Rep".to_string()],
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(response.nb_hits, 2);
        assert_eq!(response.hits.len(), 2);
    }

    #[tokio::test]
    async fn repository_failures_are_wrapped() {
        let repo: Arc<dyn DocumentRepository> = Arc::new(BrokenRepository);
        let documents = DocumentService::new(repo.clone());
        let search = SearchService::new(repo);

        assert!(matches!(
            documents.save_document(Document::default()).await,
            Err(ApplicationError::InfrastructureError(msg)) if msg.contains("save failed")
        ));
        assert!(matches!(
            documents.get_document("x").await,
            Err(ApplicationError::InfrastructureError(_))
        ));
        assert!(matches!(
            search.search_documents(Some(SearchRequest::default())).await,
            Err(ApplicationError::SearchError { .. })
        ));
    }
}
