//! Tool endpoint handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecentPostsRequest {
    pub did: String,
}

#[derive(Debug, Serialize)]
pub struct RecentPostsResponse {
    pub posts: String,
}

#[derive(Debug, Deserialize)]
pub struct TopLevelPostRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct WhitewindPostRequest {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct WhitewindPostResponse {
    pub url: String,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(e.body_text()))
}

/// POST /tools/recent-posts
pub async fn recent_posts(
    State(state): State<AppState>,
    _auth: Authenticated,
    payload: Result<Json<RecentPostsRequest>, JsonRejection>,
) -> Result<Json<RecentPostsResponse>, AppError> {
    let request = body(payload)?;
    let posts = state.tools.recent_posts(&request.did).await?;
    Ok(Json(RecentPostsResponse { posts }))
}

/// POST /tools/create-top-level-post
pub async fn create_top_level_post(
    State(state): State<AppState>,
    _auth: Authenticated,
    payload: Result<Json<TopLevelPostRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let request = body(payload)?;
    let published = state.tools.create_top_level_post(&request.text).await?;
    tracing::info!(posts = published.len(), "created top-level post");
    Ok(StatusCode::OK)
}

/// POST /tools/create-whitewind-post
pub async fn create_whitewind_post(
    State(state): State<AppState>,
    _auth: Authenticated,
    payload: Result<Json<WhitewindPostRequest>, JsonRejection>,
) -> Result<Json<WhitewindPostResponse>, AppError> {
    let request = body(payload)?;
    let url = state
        .tools
        .create_blog_post(&request.title, &request.text)
        .await?;
    tracing::info!(%url, "created blog post");
    Ok(Json(WhitewindPostResponse { url }))
}
