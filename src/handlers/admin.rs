use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::handlers::register::{RegisterResponse, not_blank};
use crate::middleware::Identity;
use crate::models::{Role, User};
use crate::services::auth::Registration;
use crate::state::AppState;

// === ユーザー作成 ===

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[garde(length(chars, min = 1, max = 100), custom(not_blank))]
    pub username: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 8, max = 128))]
    pub password: String,
    /// 省略時は一般ユーザー
    #[garde(skip)]
    pub role: Option<Role>,
}

/// POST /auth/admin/users（要管理者）
pub async fn create_user(
    State(state): State<AppState>,
    identity: Identity,
    AppJson(request): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    request.validate()?;

    let user_id = state
        .auth_service
        .register(Registration {
            username: request.username,
            email: request.email,
            password: request.password,
            role: request.role.unwrap_or(Role::User),
        })
        .await?;

    tracing::info!(actor_id = %identity.id, user_id = %user_id, "管理者によるユーザー作成");
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

// === ユーザー一覧 ===

/// 一覧に返すユーザー情報（ハッシュ類は含めない）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

/// GET /auth/admin/users（要管理者）
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>, AppError> {
    let users = state.auth_service.list_users().await?;
    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserSummary::from).collect(),
    }))
}

// === ユーザー削除 ===

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub message: String,
}

/// DELETE /auth/admin/users/{id}（要管理者）
///
/// 自分自身は削除できない
pub async fn delete_user(
    State(state): State<AppState>,
    identity: Identity,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<DeleteUserResponse>, AppError> {
    state.auth_service.delete_user(identity.id, user_id).await?;

    Ok(Json(DeleteUserResponse {
        message: "ユーザーを削除しました".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_role_defaults_to_none() {
        let request: CreateUserRequest = serde_json::from_str(
            r#"{"username":"staff","email":"staff@example.com","password":"password123"}"#,
        )
        .unwrap();
        assert!(request.role.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_user_rejects_unknown_role() {
        let result: Result<CreateUserRequest, _> = serde_json::from_str(
            r#"{"username":"staff","email":"staff@example.com","password":"password123","role":"root"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_user_summary_has_no_secrets() {
        let now = OffsetDateTime::now_utc();
        let summary = UserSummary::from(User {
            id: Uuid::new_v4(),
            username: "staff".to_string(),
            email: "staff@example.com".to_string(),
            role: Role::User,
            password_hash: "$argon2id$secret".to_string(),
            reset_token_hash: Some("$argon2id$reset".to_string()),
            reset_token_expires_at: Some(now),
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("createdAt"));
    }
}
