pub mod contact;
pub mod memory;
pub mod user;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{Contact, NewContact, NewUser, ProfileChanges, User};

pub use contact::PgContactStore;
pub use memory::{MemoryContactStore, MemoryUserStore};
pub use user::PgUserStore;

/// ストア層のエラー
///
/// 呼び出し側（サービス層）で `AppError` に変換する
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("一意制約違反")]
    UniqueViolation,

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),
}

/// ユーザーの永続化
///
/// メールアドレスの一意性はストア側で保証し、違反時は `StoreError::UniqueViolation` を返す
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// 作成日時の昇順
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// 対象が存在しない場合は `Ok(None)`
    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError>;

    /// リセットコードのハッシュと有効期限を同時に保存
    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError>;

    /// パスワードを更新し、リセットコードを同時に消去
    ///
    /// 保存中のコードハッシュが `expected_token_hash` と一致し、かつ期限内の場合のみ更新する。
    /// 更新した場合 true（同じコードで同時に呼ばれても true になるのは一度だけ）
    async fn complete_password_reset(
        &self,
        id: Uuid,
        expected_token_hash: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError>;

    /// 削除した場合 true
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// お問い合わせの永続化
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create(&self, contact: NewContact) -> Result<Contact, StoreError>;

    /// 新しい順
    async fn list(&self) -> Result<Vec<Contact>, StoreError>;
}
