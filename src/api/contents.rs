//! Saved content endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use super::{store_failure, success, ApiResult};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{ContentKind, ContentType, NewContent, SaveContentRequest, SavedContent};
use crate::AppState;

/// Query parameters for listing content.
#[derive(Debug, Deserialize)]
pub struct ListContentsQuery {
    #[serde(default, rename = "type")]
    pub content_type: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a save request into the fields to store.
fn validate_save(request: &SaveContentRequest) -> Result<NewContent, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("Content is required".to_string()));
    }
    let platform = non_empty(Some(request.platform.as_str()))
        .ok_or_else(|| AppError::Validation("Platform is required".to_string()))?;

    let kind = request
        .kind
        .as_deref()
        .map(ContentKind::parse)
        .transpose()?;
    let content_type = match (kind, request.content_type) {
        (Some(kind), _) => kind.saved_type(),
        (None, Some(content_type)) => content_type,
        (None, None) => {
            return Err(AppError::Validation(
                "Either kind or type is required".to_string(),
            ))
        }
    };

    let title = non_empty(request.title.as_deref())
        .or_else(|| non_empty(request.prompt.as_deref()))
        .unwrap_or_else(|| match kind {
            Some(kind) => kind.label().to_string(),
            None => format!("Saved {}", content_type.as_str()),
        });

    Ok(NewContent {
        title,
        content: request.content.clone(),
        platform,
        content_type,
    })
}

/// GET /api/contents - List the caller's saved content, newest first.
pub async fn list_contents(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListContentsQuery>,
) -> ApiResult<Vec<SavedContent>> {
    let content_type = ContentType::parse_filter(params.content_type.as_deref())?;

    let contents = state
        .repo
        .list_contents(&current.user.id, content_type)
        .await
        .map_err(store_failure("load saved content"))?;
    success(contents)
}

/// POST /api/contents - Save generated content.
pub async fn save_content(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<SaveContentRequest>,
) -> ApiResult<SavedContent> {
    let new_content = validate_save(&request)?;

    let saved = state
        .repo
        .create_content(&current.user.id, &new_content)
        .await
        .map_err(store_failure("save content"))?;

    if let Err(e) = state.search.index_content(&saved).await {
        tracing::warn!("Failed to index content: {}", e);
    }

    success(saved)
}

/// GET /api/contents/{id} - Get one saved item.
pub async fn get_content(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<SavedContent> {
    match state
        .repo
        .get_content(&current.user.id, &id)
        .await
        .map_err(store_failure("load content"))?
    {
        Some(content) => success(content),
        None => Err(AppError::NotFound(format!("Content {} not found", id))),
    }
}

/// DELETE /api/contents/{id} - Delete one saved item.
pub async fn delete_content(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state
        .repo
        .delete_content(&current.user.id, &id)
        .await
        .map_err(store_failure("delete content"))?;

    if let Err(e) = state.search.remove_content(&id).await {
        tracing::warn!("Failed to remove content from index: {}", e);
    }

    success(())
}
