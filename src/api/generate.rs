//! Generation endpoints.

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use super::{success, ApiResult};
use crate::auth::CurrentUser;
use crate::models::{
    ContentKind, GenerateRequest, GenerateResponse, GenerationStatus, KindInfo, TrendsQuery,
    TrendsResponse,
};
use crate::{prompt, trends, AppState};

/// GET /api/kinds - Describe the content kinds on offer.
pub async fn list_kinds() -> ApiResult<Vec<KindInfo>> {
    success(ContentKind::ALL.into_iter().map(KindInfo::from).collect())
}

/// GET /api/generate/status - Whether generation is available.
pub async fn generation_status(State(state): State<AppState>) -> ApiResult<GenerationStatus> {
    let generation_enabled = state.generator.is_configured();
    let warning = (!generation_enabled)
        .then(|| state.config.credential_warning())
        .flatten()
        .map(str::to_string);

    success(GenerationStatus {
        generation_enabled,
        warning,
    })
}

fn platform_or_default(kind: ContentKind, platform: Option<&str>) -> String {
    match platform.map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => kind.platforms()[0].to_string(),
    }
}

/// POST /api/generate - Generate content for a kind, platform and prompt.
pub async fn generate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<GenerateResponse> {
    let kind = ContentKind::parse(&request.kind)?;
    let platform = platform_or_default(kind, request.platform.as_deref());
    let instruction = prompt::build(kind, &platform, &request.prompt)?;

    tracing::info!(
        user_id = %current.user.id,
        kind = kind.as_str(),
        %platform,
        "Generating content"
    );
    let content = state.generator.generate(&instruction).await?;

    success(GenerateResponse {
        kind,
        platform,
        prompt: request.prompt,
        content,
    })
}

/// GET /api/trends - Generate and parse a trending digest.
pub async fn get_trends(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<TrendsQuery>,
) -> ApiResult<TrendsResponse> {
    let kind = ContentKind::Trending;
    let platform = platform_or_default(kind, params.platform.as_deref());
    let focus = params.focus.unwrap_or_default();
    let instruction = prompt::build(kind, &platform, &focus)?;

    tracing::info!(user_id = %current.user.id, %platform, "Fetching trends");
    let raw = state.generator.generate(&instruction).await?;

    let parsed = trends::parse_trends(&raw);
    if parsed.is_empty() {
        tracing::info!("Trending digest contained no recognizable trends");
    }

    success(TrendsResponse {
        platform,
        trends: parsed,
        raw,
    })
}
