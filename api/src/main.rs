// ./api/src/main.rs
mod config;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use application::{ApplicationError, DocumentService, SearchService};
use config::ServerConfig;
use domain::{Document, SearchRequest};
use infrastructure::InMemoryDocumentRepository;

#[derive(Clone)]
struct AppState {
    document_service: Arc<DocumentService>,
    search_service: Arc<SearchService>,
}

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let config = ServerConfig::from_env();

    // --- Dependency Injection ---
    let document_repository = Arc::new(InMemoryDocumentRepository::new());
    info!("In-memory document repository initialized.");

    let app_state = AppState {
        document_service: Arc::new(DocumentService::new(document_repository.clone())),
        search_service: Arc::new(SearchService::new(document_repository)),
    };
    info!("Application services initialized.");

    let app = router(app_state);

    // --- Server Startup ---
    let addr = config.socket_addr();
    info!("Server starting on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/documents", post(save_document_handler))
        .route("/documents/search", post(search_documents_handler))
        .route("/documents/:doc_id", get(get_document_handler))
        .with_state(state)
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

/// Handler for upserting a document (POST /documents).
async fn save_document_handler(
    State(state): State<AppState>,
    Json(payload): Json<Document>,
) -> Response {
    let is_new = payload.assigned_id().is_none();
    info!(is_new, "Received request to save document");
    match state.document_service.save_document(payload).await {
        Ok(saved) => {
            let status = if is_new {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, JsonResponse(saved)).into_response()
        }
        Err(e) => {
            error!("Failed to save document via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for fetching a document (GET /documents/:doc_id).
async fn get_document_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Response {
    info!(doc_id = %doc_id, "Received request to get document");
    let result = state
        .document_service
        .get_document(&doc_id)
        .await
        .and_then(|found| found.ok_or_else(|| ApplicationError::NotFound(doc_id.clone())));
    match result {
        Ok(document) => (StatusCode::OK, JsonResponse(document)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for filtering documents (POST /documents/search). A JSON `null`
/// body is a null request and yields no hits.
async fn search_documents_handler(
    State(state): State<AppState>,
    Json(request): Json<Option<SearchRequest>>,
) -> Response {
    info!(
        has_request = request.is_some(),
        "Received search request via POST"
    );
    match state.search_service.search_documents(request).await {
        Ok(response) => {
            info!(
                "Search completed successfully via handler, {} total hits",
                response.nb_hits
            );
            (StatusCode::OK, JsonResponse(response)).into_response()
        }
        Err(e) => {
            error!("Failed to search documents via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Maps ApplicationError to an HTTP status code and response body.
fn map_application_error_to_response(err: ApplicationError) -> Response {
    let (status, body) = match err {
        ApplicationError::NotFound(id) => {
            warn!(doc_id = %id, "Document not found");
            (
                StatusCode::NOT_FOUND,
                format!("Document '{}' not found", id),
            )
        }
        ApplicationError::SearchError { source } => {
            error!("Search error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Search failed".to_string(),
            )
        }
        ApplicationError::InfrastructureError(msg) => {
            error!("Underlying infrastructure error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            )
        }
    };
    (status, body).into_response()
}
