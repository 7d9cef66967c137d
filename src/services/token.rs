use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Role, User};

/// JWTペイロード
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    /// 発行時刻（unix秒）
    pub iat: i64,
    /// 有効期限（unix秒）。exp 以降は無効
    pub exp: i64,
}

/// Bearerトークンの発行・検証（HS256）
///
/// 失効リストは持たない。シークレットを変更すると発行済みトークンは全て無効になる
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "JWT secret must not be empty"
            )));
        }
        if ttl <= Duration::ZERO {
            return Err(AppError::Internal(anyhow::anyhow!(
                "JWT ttl must be positive"
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        self.issue_at(user, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, user: &User, now: OffsetDateTime) -> Result<String, AppError> {
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = ?e, "JWT署名エラー");
            AppError::Internal(anyhow::anyhow!("jwt encode error"))
        })?;
        tracing::debug!(user_id = %user.id, "JWT発行");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// 署名・形式・有効期限を検証
    ///
    /// 有効期限は猶予なしで判定する（now == exp は拒否）
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT検証失敗");
                AppError::InvalidToken
            })?
            .claims;

        if now.unix_timestamp() >= claims.exp {
            tracing::debug!(user_id = %claims.id, "JWT期限切れ");
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            username: "jiro".to_string(),
            email: "jiro@example.com".to_string(),
            role,
            password_hash: String::new(),
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Duration::hours(24)).expect("token service")
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("dev-secret");
        let user = user(Role::Admin);
        let token = tokens.issue(&user).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.id, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_expiry_boundary_rejected() {
        let tokens = service("dev-secret");
        let issued_at = OffsetDateTime::now_utc();
        let token = tokens.issue_at(&user(Role::User), issued_at).unwrap();

        let just_before = issued_at + Duration::hours(24) - Duration::seconds(1);
        assert!(tokens.verify_at(&token, just_before).is_ok());

        let at_exp = issued_at + Duration::hours(24);
        assert!(matches!(
            tokens.verify_at(&token, at_exp),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service("old-secret").issue(&user(Role::User)).unwrap();
        let err = service("rotated-secret").verify(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let tokens = service("dev-secret");
        assert!(matches!(tokens.verify("not.a.jwt"), Err(AppError::InvalidToken)));
        assert!(matches!(tokens.verify(""), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = service("dev-secret");
        let token = tokens.issue(&user(Role::User)).unwrap();
        let forged = service("attacker").issue(&user(Role::Admin)).unwrap();

        // 署名はそのままでペイロードだけ管理者のものに差し替える
        let header = token.split('.').next().unwrap();
        let signature = token.split('.').nth(2).unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();
        let tampered = format!("{header}.{forged_payload}.{signature}");
        assert!(matches!(tokens.verify(&tampered), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenService::new("", Duration::hours(24)).is_err());
    }
}
