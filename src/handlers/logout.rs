use axum::Json;
use serde::Serialize;

/// ログアウトレスポンス
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// ログアウトハンドラー
///
/// POST /auth/logout
///
/// サーバー側にセッションは無いため常に成功する。
/// 発行済みトークンは有効期限まで有効なまま（クライアント側で破棄する）。
pub async fn logout() -> Json<LogoutResponse> {
    tracing::info!("ログアウト");
    Json(LogoutResponse {
        message: "ログアウトしました".to_string(),
    })
}
