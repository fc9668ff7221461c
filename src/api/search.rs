//! Search API endpoints.

use axum::{
    extract::{Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};

use super::{store_failure, success, ApiResult};
use crate::auth::CurrentUser;
use crate::models::{ContentType, SavedContent};
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string. Empty lists everything.
    #[serde(default)]
    pub q: String,
    /// Restrict to one content type (`all` for no restriction).
    #[serde(default, rename = "type")]
    pub content_type: Option<String>,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Search result with content and metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Single search result item.
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub content: SavedContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// GET /api/search - Search the caller's saved content.
pub async fn search_contents(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let limit = params.limit.min(MAX_SEARCH_LIMIT);
    let content_type = ContentType::parse_filter(params.content_type.as_deref())?;
    let owner = &current.user.id;

    let results = if params.q.trim().is_empty() {
        // No search term: everything matches, newest first.
        state
            .repo
            .list_contents(owner, content_type)
            .await
            .map_err(store_failure("load saved content"))?
            .into_iter()
            .skip(params.offset)
            .take(limit)
            .map(|content| SearchResultItem {
                content,
                score: None,
            })
            .collect()
    } else {
        let hits = state
            .search
            .search(owner, &params.q, content_type, limit, params.offset)
            .map_err(store_failure("search saved content"))?;

        // Fetch full content for each hit
        let mut results = Vec::new();
        for hit in hits {
            let content = state
                .repo
                .get_content(owner, &hit.content_id)
                .await
                .map_err(store_failure("load search results"))?;
            match content {
                Some(content) => results.push(SearchResultItem {
                    content,
                    score: Some(hit.score),
                }),
                // Deleted since it was indexed
                None => tracing::debug!(content_id = %hit.content_id, "Skipping stale search hit"),
            }
        }
        results
    };

    let total = results.len();

    success(SearchResponse {
        results,
        total,
        limit,
        offset: params.offset,
    })
}
