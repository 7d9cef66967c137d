use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::repositories::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("メールアドレスまたはパスワードが正しくありません")]
    InvalidCredentials,

    #[error("認証が必要です: {0}")]
    Unauthenticated(String),

    #[error("無効または期限切れのトークンです")]
    InvalidToken,

    #[error("このメールアドレスは既に使用されています")]
    EmailAlreadyExists,

    #[error("無効または期限切れのリセットコードです")]
    InvalidOrExpiredResetToken,

    #[error("現在のパスワードが必要です")]
    MissingCurrentPassword,

    #[error("現在のパスワードが正しくありません")]
    IncorrectPassword,

    #[error("自分自身のアカウントは削除できません")]
    SelfDeleteForbidden,

    #[error("この操作を行う権限がありません")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("メール送信に失敗しました")]
    EmailSendFailed,

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// クライアント向けの安定したエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::EmailAlreadyExists => "EMAIL_TAKEN",
            Self::InvalidOrExpiredResetToken => "INVALID_OR_EXPIRED_TOKEN",
            Self::MissingCurrentPassword => "MISSING_CURRENT_PASSWORD",
            Self::IncorrectPassword => "INCORRECT_PASSWORD",
            Self::SelfDeleteForbidden => "SELF_DELETE_FORBIDDEN",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::EmailSendFailed => "EMAIL_SEND_FAILED",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::EmailAlreadyExists
            | Self::InvalidOrExpiredResetToken
            | Self::MissingCurrentPassword
            | Self::IncorrectPassword => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthenticated(_) | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::SelfDeleteForbidden | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::EmailSendFailed | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation => Self::EmailAlreadyExists,
            StoreError::Database(e) => Self::Database(e),
        }
    }
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        Self::Validation(report.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                "内部エラーが発生しました".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                "内部エラーが発生しました".to_string()
            }
            Self::Unauthenticated(reason) => {
                tracing::debug!(reason = %reason, "認証ゲートで拒否");
                "認証が必要です".to_string()
            }
            other => other.to_string(),
        };

        (
            self.status(),
            Json(ErrorResponse {
                error: message,
                code: self.code(),
            }),
        )
            .into_response()
    }
}
