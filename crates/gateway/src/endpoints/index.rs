//! # GET /

use std::sync::Arc;

use axum::extract::State;
use axum::response::Redirect;

use crate::config::GatewayState;

/// GET /: 設定されたメインサイトへ恒久リダイレクト（308）する。
pub async fn handle_index(State(state): State<Arc<GatewayState>>) -> Redirect {
    Redirect::permanent(&state.site_url)
}
