//! # GET /stats

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use emptybox_types::StatsResponse;

use crate::config::GatewayState;
use crate::error::GatewayError;

/// GET /stats: バケット内のオブジェクト数を返す。
///
/// 署名付きPUT方式では一覧取得を実装していないため常に0になる。
pub async fn handle_stats(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<StatsResponse>, GatewayError> {
    let file_count = state.store.count().await.inspect_err(|e| {
        tracing::info!(error = %e, "オブジェクト数の取得に失敗");
    })?;

    Ok(Json(StatsResponse { file_count }))
}
