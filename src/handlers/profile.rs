use axum::{Json, extract::State};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::handlers::register::not_blank;
use crate::middleware::Identity;
use crate::services::auth::ProfileUpdate;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[garde(length(chars, min = 1, max = 100))]
    pub username: Option<String>,
    #[garde(email)]
    pub email: Option<String>,
    #[garde(skip)]
    pub current_password: Option<String>,
    #[garde(length(min = 8, max = 128))]
    pub new_password: Option<String>,
}

impl UpdateProfileRequest {
    fn validate_username(&self) -> Result<(), AppError> {
        if let Some(username) = &self.username
            && not_blank(username, &()).is_err()
        {
            return Err(AppError::Validation(
                "ユーザー名は空白のみにできません".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
}

/// POST /auth/profile（要認証）
///
/// パスワード変更には現在のパスワードが必要
pub async fn update_profile(
    State(state): State<AppState>,
    identity: Identity,
    AppJson(request): AppJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    request.validate()?;
    request.validate_username()?;

    let user = state
        .auth_service
        .update_profile(
            identity.id,
            ProfileUpdate {
                username: request.username,
                email: request.email,
                current_password: request.current_password,
                new_password: request.new_password,
            },
        )
        .await?;

    Ok(Json(ProfileResponse {
        username: user.username,
        email: user.email,
    }))
}
