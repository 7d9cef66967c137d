use axum::{Json, extract::State};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// === リセットコード発行 ===

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[garde(email)]
    pub email: String,
}

/// POST /auth/forgot-password
///
/// 6桁のリセットコードをメールで送信（有効期限15分）
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    request.validate()?;

    state.auth_service.forgot_password(&request.email).await?;

    Ok(Json(MessageResponse {
        message: "パスワードリセットコードをメールで送信しました".to_string(),
    }))
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[garde(email)]
    pub email: String,
    #[garde(pattern(r"^[0-9]{6}$"))]
    pub token: String,
    #[garde(length(min = 8, max = 128))]
    pub new_password: String,
}

/// POST /auth/reset-password
///
/// # Security
/// - token, new_password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    request.validate()?;

    state
        .auth_service
        .reset_password(&request.email, &request.token, &request.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "パスワードが更新されました".to_string(),
    }))
}
