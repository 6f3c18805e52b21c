use axum::{
    extract::{Path, State},
    Json,
};
use health_data::HealthSnapshot;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, MEMORY_LIST_LIMIT};

#[derive(Debug, Default, Deserialize)]
pub struct InitializeRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub user_id: String,
    pub message: String,
    pub status: &'static str,
    pub health_data: HealthSnapshot,
}

#[derive(Debug, Serialize)]
pub struct MemoryValue {
    pub content: String,
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MemoryItem {
    pub key: String,
    pub value: MemoryValue,
    pub score: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct MemoriesResponse {
    pub user_id: String,
    pub memories: Vec<MemoryItem>,
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub message: String,
    pub deleted_memories: usize,
    pub deleted_turns: u64,
}

pub async fn initialize_user(
    State(state): State<AppState>,
    Json(req): Json<InitializeRequest>,
) -> Result<Json<InitializeResponse>, ApiError> {
    let user_id = req.user_id.trim().to_string();
    if user_id.is_empty() {
        return Err(ApiError::bad_request("user_id is required"));
    }
    let initialized = state.agent.initialize_user(&user_id).await?;
    Ok(Json(InitializeResponse {
        message: format!("User {} initialized with health data.", user_id),
        user_id,
        status: "success",
        health_data: initialized.snapshot,
    }))
}

pub async fn get_memories(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MemoriesResponse>, ApiError> {
    let memories = state
        .agent
        .list_memories(&user_id, MEMORY_LIST_LIMIT)
        .await?
        .into_iter()
        .map(|entry| MemoryItem {
            key: entry.id.to_string(),
            value: MemoryValue {
                content: entry.content,
                context: entry.context,
            },
            score: None,
        })
        .collect();
    Ok(Json(MemoriesResponse { user_id, memories }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    let deletion = state.agent.delete_user(&user_id).await?;
    Ok(Json(DeleteUserResponse {
        message: format!("User {} deleted successfully", user_id),
        deleted_memories: deletion.deleted_memories,
        deleted_turns: deletion.deleted_turns,
    }))
}
