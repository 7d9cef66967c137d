use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// ユーザーの権限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// ユーザーレコード
///
/// reset_token_hash と reset_token_expires_at は常に両方セットか両方 NULL
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub reset_token_hash: Option<String>,
    #[serde(skip)]
    pub reset_token_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// 有効なリセットコードのハッシュ（期限切れ・未発行なら None）
    pub fn active_reset_token(&self, now: OffsetDateTime) -> Option<&str> {
        match (&self.reset_token_hash, self.reset_token_expires_at) {
            (Some(hash), Some(expires_at)) if now < expires_at => Some(hash.as_str()),
            _ => None,
        }
    }
}

/// ユーザー作成時の入力
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// プロフィール更新内容（None のフィールドは変更しない）
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn user_with_reset(hash: Option<&str>, expires_at: Option<OffsetDateTime>) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            username: "taro".to_string(),
            email: "taro@example.com".to_string(),
            role: Role::User,
            password_hash: "$argon2id$dummy".to_string(),
            reset_token_hash: hash.map(str::to_string),
            reset_token_expires_at: expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_active_reset_token_within_expiry() {
        let now = OffsetDateTime::now_utc();
        let user = user_with_reset(Some("hash"), Some(now + Duration::minutes(15)));
        assert_eq!(user.active_reset_token(now), Some("hash"));
    }

    #[test]
    fn test_active_reset_token_rejects_boundary_and_past() {
        let now = OffsetDateTime::now_utc();
        let at_boundary = user_with_reset(Some("hash"), Some(now));
        assert_eq!(at_boundary.active_reset_token(now), None);

        let past = user_with_reset(Some("hash"), Some(now - Duration::seconds(1)));
        assert_eq!(past.active_reset_token(now), None);
    }

    #[test]
    fn test_active_reset_token_absent() {
        let user = user_with_reset(None, None);
        assert_eq!(user.active_reset_token(OffsetDateTime::now_utc()), None);
    }

    #[test]
    fn test_serialization_hides_secrets() {
        let now = OffsetDateTime::now_utc();
        let user = user_with_reset(Some("reset-hash"), Some(now));
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("reset-hash"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
