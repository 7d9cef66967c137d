//! 認証ゲート
//!
//! 保護されたルートでは `Authorization: Bearer <token>` を検証し、
//! 検証済みの `Identity` をリクエストの extensions に格納する。

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;
use crate::services::{Claims, TokenService};

/// 認証済みユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("identity not attached".to_string()))
    }
}

/// `Bearer <token>` からトークンを取り出す（スキームは大文字小文字を区別しない）
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Bearerトークン必須のミドルウェア
pub async fn require_auth(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("non-ascii Authorization header".to_string()))?;

    let token = parse_bearer(header)
        .ok_or_else(|| AppError::Unauthenticated("invalid auth scheme".to_string()))?;

    let claims = tokens
        .verify(token)
        .inspect_err(|_| tracing::warn!("無効または期限切れのトークン"))?;

    request.extensions_mut().insert(Identity::from(claims));
    Ok(next.run(request).await)
}

/// 管理者権限必須のミドルウェア（require_auth の内側で使う）
pub async fn require_admin(
    identity: Identity,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !identity.role.is_admin() {
        tracing::warn!(user_id = %identity.id, "管理者権限なし");
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}
