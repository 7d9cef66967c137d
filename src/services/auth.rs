use std::sync::Arc;

use rand::Rng;
use rand::rngs::OsRng;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, ProfileChanges, Role, User};
use crate::repositories::UserStore;
use crate::services::email::EmailService;
use crate::services::password::PasswordHasher;
use crate::services::token::TokenService;

/// メールアドレスを正規化（前後の空白除去・小文字化）
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 6桁の数字リセットコードを生成（OSの暗号論的乱数）
pub fn generate_reset_code() -> String {
    format!("{:06}", OsRng.gen_range(0..1_000_000u32))
}

/// アカウント作成の入力
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// プロフィール更新の入力
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// 認証サービス
///
/// 登録・ログイン・パスワードリセット・プロフィール更新・管理者によるユーザー管理
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
    email_service: EmailService,
    reset_code_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        tokens: TokenService,
        email_service: EmailService,
        reset_code_ttl: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            email_service,
            reset_code_ttl,
        }
    }

    /// アカウントを作成し、IDを返す
    ///
    /// # Security
    /// パスワードはログに出力しない
    pub async fn register(&self, registration: Registration) -> Result<Uuid, AppError> {
        let email = normalize_email(&registration.email);

        if self.users.find_by_email(&email).await?.is_some() {
            tracing::warn!(email = %email, "登録失敗: メールアドレス重複");
            return Err(AppError::EmailAlreadyExists);
        }

        let password_hash = self.hasher.hash(&registration.password)?;

        // 同時登録で負けた場合はストアの一意制約から EmailAlreadyExists になる
        let user = self
            .users
            .create(NewUser {
                username: registration.username.trim().to_string(),
                email,
                password_hash,
                role: registration.role,
            })
            .await?;

        tracing::info!(user_id = %user.id, email = %user.email, role = ?user.role, "ユーザー登録成功");
        Ok(user.id)
    }

    /// ユーザー認証を行いトークンを発行
    ///
    /// タイミング攻撃対策: ユーザーが存在しない場合もダミーのパスワード検証を実行
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize_email(email);

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                self.hasher.verify_dummy(password);
                tracing::warn!(email = %email, "認証失敗: ユーザー不在");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::warn!(email = %email, "認証失敗: パスワード不一致");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "ログイン成功");
        Ok(token)
    }

    /// リセットコードを発行してメール送信
    ///
    /// メール送信に失敗しても保存済みのコードは有効なまま残る
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email);

        let user = self.users.find_by_email(&email).await?.ok_or_else(|| {
            tracing::info!(email = %email, "パスワードリセット: ユーザー不在");
            AppError::NotFound("ユーザーが見つかりません".to_string())
        })?;

        let code = generate_reset_code();
        let code_hash = self.hasher.hash(&code)?;
        let expires_at = OffsetDateTime::now_utc() + self.reset_code_ttl;

        self.users
            .set_reset_token(user.id, &code_hash, expires_at)
            .await?;
        tracing::info!(user_id = %user.id, "リセットコード発行");

        self.email_service
            .send_password_reset_code(&user.email, &code, self.reset_code_ttl.whole_minutes())
            .await
    }

    /// リセットコードを検証してパスワードを更新
    ///
    /// 検証に失敗した場合は状態を一切変更しない
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::warn!(email = %email, "パスワードリセット失敗: ユーザー不在");
            return Err(AppError::InvalidOrExpiredResetToken);
        };

        let Some(code_hash) = user.active_reset_token(OffsetDateTime::now_utc()) else {
            tracing::warn!(user_id = %user.id, "パスワードリセット失敗: コード未発行または期限切れ");
            return Err(AppError::InvalidOrExpiredResetToken);
        };

        if !self.hasher.verify(code, code_hash) {
            tracing::warn!(user_id = %user.id, "パスワードリセット失敗: コード不一致");
            return Err(AppError::InvalidOrExpiredResetToken);
        }

        let password_hash = self.hasher.hash(new_password)?;

        // 検証したコードが残っている場合のみ更新（同じコードの同時使用は一方だけ成功）
        let consumed = self
            .users
            .complete_password_reset(user.id, code_hash, &password_hash)
            .await?;
        if !consumed {
            tracing::warn!(user_id = %user.id, "パスワードリセット失敗: コード使用済み");
            return Err(AppError::InvalidOrExpiredResetToken);
        }

        tracing::info!(user_id = %user.id, "パスワードリセット完了");
        Ok(())
    }

    /// ログイン中ユーザーのプロフィールを更新
    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("ユーザーが見つかりません".to_string()))?;

        let mut changes = ProfileChanges {
            username: update.username.map(|u| u.trim().to_string()),
            ..Default::default()
        };

        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if email != user.email {
                if let Some(owner) = self.users.find_by_email(&email).await?
                    && owner.id != user.id
                {
                    tracing::warn!(user_id = %user.id, email = %email, "プロフィール更新失敗: メールアドレス重複");
                    return Err(AppError::EmailAlreadyExists);
                }
                changes.email = Some(email);
            }
        }

        if let Some(new_password) = update.new_password {
            let current = update
                .current_password
                .ok_or(AppError::MissingCurrentPassword)?;
            if !self.hasher.verify(&current, &user.password_hash) {
                tracing::warn!(user_id = %user.id, "プロフィール更新失敗: 現在のパスワード不一致");
                return Err(AppError::IncorrectPassword);
            }
            changes.password_hash = Some(self.hasher.hash(&new_password)?);
        }

        if changes.is_empty() {
            return Ok(user);
        }

        let updated = self
            .users
            .update_profile(user.id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("ユーザーが見つかりません".to_string()))?;

        tracing::info!(user_id = %updated.id, "プロフィール更新");
        Ok(updated)
    }

    /// 全ユーザー一覧（管理者用）
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.list().await?)
    }

    /// ユーザー削除（管理者用）
    ///
    /// 自分自身の削除は対象の存在有無に関わらず拒否する
    pub async fn delete_user(&self, actor_id: Uuid, target_id: Uuid) -> Result<(), AppError> {
        if actor_id == target_id {
            tracing::warn!(user_id = %actor_id, "自分自身の削除を拒否");
            return Err(AppError::SelfDeleteForbidden);
        }

        if !self.users.delete(target_id).await? {
            return Err(AppError::NotFound("ユーザーが見つかりません".to_string()));
        }

        tracing::info!(actor_id = %actor_id, target_id = %target_id, "ユーザー削除");
        Ok(())
    }

    /// 初期管理者を作成（既に存在する場合は何もしない）
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        if let Some(existing) = self.users.find_by_email(&email).await? {
            if !existing.role.is_admin() {
                tracing::warn!(email = %email, "初期管理者のメールアドレスが一般ユーザーとして登録済み");
            }
            return Ok(());
        }

        let username = email
            .split('@')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("admin")
            .to_string();

        match self
            .register(Registration {
                username,
                email: email.clone(),
                password: password.to_string(),
                role: Role::Admin,
            })
            .await
        {
            // 他インスタンスが先に作成した場合
            Ok(_) | Err(AppError::EmailAlreadyExists) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
