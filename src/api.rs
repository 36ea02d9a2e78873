use crate::document::Document;
use crate::engine::{SearchEngine, ServiceStats};
use crate::index::{DocId, Index};
use crate::tokenizer;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ========== Request/Response Types ==========

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub q: String,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: DocId,
    pub source: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total_results: usize,
    pub page: usize,
    pub elapsed_ms: f64,
    pub cached: bool,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub doc_length: usize,
    pub unique_terms: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub documents: usize,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(message.to_string())),
    )
        .into_response()
}

// ========== Error Handling ==========

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = format!("{:#}", self.0);
        tracing::error!("API error: {}", message);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(message)),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ========== Presentation Helpers ==========

const SNIPPET_LENGTH: usize = 200;
const SNIPPET_LEAD: usize = 50;

/// First non-empty line of the document, or a placeholder.
fn title_for(text: &str, doc_id: DocId) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Document {}", doc_id))
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// A window of the text around the earliest query-term occurrence, with
/// ellipses where it is cut. Works on char positions so multi-byte text
/// never splits mid-character.
fn extract_snippet(text: &str, query: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let lower: Vec<char> = chars
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect();

    let best_pos = query
        .split_whitespace()
        .filter_map(|term| {
            let needle: Vec<char> = term.to_lowercase().chars().collect();
            find_chars(&lower, &needle)
        })
        .min();

    let (start, end) = match best_pos {
        Some(pos) => {
            let start = pos.saturating_sub(SNIPPET_LEAD);
            let end = (pos + SNIPPET_LENGTH - SNIPPET_LEAD).min(chars.len());
            (start, end)
        }
        None => (0, SNIPPET_LENGTH.min(chars.len())),
    };

    let mut snippet: String = chars[start..end].iter().collect();
    if start > 0 {
        snippet = format!("...{}", snippet);
    }
    if end < chars.len() {
        snippet.push_str("...");
    }
    snippet
}

// ========== Handlers ==========

async fn health_check(State(engine): State<Arc<SearchEngine>>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        documents: engine.snapshot().doc_count(),
    }))
}

async fn search_documents(
    State(engine): State<Arc<SearchEngine>>,
    Query(req): Query<SearchRequest>,
) -> Result<Response, AppError> {
    if req.q.trim().is_empty() {
        return Ok(bad_request("Query 'q' must be non-empty"));
    }

    let page = req.page.unwrap_or(1).max(1);
    let limit = req.limit.unwrap_or(10).clamp(1, 100);

    let outcome = engine.search(&req.q);
    let total_results = outcome.results.len();

    let start = (page - 1) * limit;
    // resolve titles/snippets from the snapshot the results were scored
    // against, not whatever index is published by now
    let index = &outcome.snapshot;
    let results: Vec<SearchHit> = outcome
        .results
        .iter()
        .skip(start)
        .take(limit)
        .map(|scored| {
            let text = index.text(scored.doc_id).unwrap_or("");
            SearchHit {
                id: scored.doc_id,
                source: index.source(scored.doc_id).unwrap_or("").to_string(),
                title: title_for(text, scored.doc_id),
                snippet: extract_snippet(text, &req.q),
                score: scored.score,
            }
        })
        .collect();

    let response = SearchResponse {
        results,
        total_results,
        page,
        elapsed_ms: outcome.elapsed.as_secs_f64() * 1000.0,
        cached: outcome.was_cached,
    };

    Ok(Json(ApiResponse::success(response)).into_response())
}

/// Replace the corpus with a single ad-hoc plain-text document. The body is
/// the already-extracted text; binary formats must be converted upstream.
async fn upload_document(
    State(engine): State<Arc<SearchEngine>>,
    Query(params): Query<UploadParams>,
    body: String,
) -> Result<Response, AppError> {
    if body.trim().is_empty() {
        return Ok(bad_request(
            "Document is empty or contains no extractable text",
        ));
    }

    let doc_length = body.chars().count();
    let unique_terms = tokenizer::term_frequencies(&body).len();
    let source = params.title.unwrap_or_else(|| "uploaded".to_string());

    let index = Index::build(vec![Document::new(source, body)]);
    engine.replace_index(index);

    Ok(Json(ApiResponse::success(UploadResponse {
        status: "loaded".to_string(),
        doc_length,
        unique_terms,
    }))
    .into_response())
}

async fn get_stats(
    State(engine): State<Arc<SearchEngine>>,
) -> Result<Json<ApiResponse<ServiceStats>>, AppError> {
    Ok(Json(ApiResponse::success(engine.stats())))
}

// ========== Router ==========

pub fn create_router(engine: Arc<SearchEngine>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/search", get(search_documents))
        .route("/documents", post(upload_document))
        .route("/stats", get(get_stats))
        .with_state(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_for() {
        assert_eq!(title_for("\n\n  Heading\nbody", 3), "Heading");
        assert_eq!(title_for("   \n \n", 3), "Document 3");
    }

    #[test]
    fn test_snippet_centers_on_first_match() {
        let text = format!("{} needle and more text after it", "padding ".repeat(30));
        let snippet = extract_snippet(&text, "needle");
        assert!(snippet.starts_with("..."));
        assert!(snippet.contains("needle"));
    }

    #[test]
    fn test_snippet_without_match_is_prefix() {
        let snippet = extract_snippet("short document text", "zebra");
        assert_eq!(snippet, "short document text");
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let text = "héllo wörld ".repeat(40);
        // must not panic on multi-byte chars
        let snippet = extract_snippet(&text, "wörld");
        assert!(snippet.contains("wörld"));
    }
}
