use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    /// 当前用作中间跳的 token
    pub base_tokens: Vec<String>,
}

/// 健康检查
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        base_tokens: state
            .session
            .base_tokens()
            .iter()
            .map(|t| t.symbol.clone())
            .collect(),
    })
}
