use std::sync::Arc;

use axum::extract::FromRef;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use time::Duration;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{ContactStore, PgContactStore, PgUserStore, UserStore};
use crate::services::{
    AuthService, ContactService, EmailService, Mailer, Notifier, PasswordHasher, TokenService,
};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// トークン検証（認証ゲートで使用）
    pub token_service: TokenService,
    /// 認証サービス
    pub auth_service: AuthService,
    /// お問い合わせサービス
    pub contact_service: ContactService,
    /// 非同期通知ワーカー（終了時に shutdown する）
    pub notifier: Notifier,
}

impl AppState {
    /// PostgreSQL ストアで AppState を作成
    pub fn new(db_pool: PgPool, mailer: Arc<dyn Mailer>, config: Config) -> Result<Self, AppError> {
        let users = Arc::new(PgUserStore::new(db_pool.clone()));
        let contacts = Arc::new(PgContactStore::new(db_pool));
        Self::from_parts(users, contacts, mailer, PasswordHasher::new()?, config)
    }

    /// 任意のストア・メーラーで AppState を作成
    pub fn from_parts(
        users: Arc<dyn UserStore>,
        contacts: Arc<dyn ContactStore>,
        mailer: Arc<dyn Mailer>,
        hasher: PasswordHasher,
        config: Config,
    ) -> Result<Self, AppError> {
        let token_service = TokenService::new(
            config.jwt_secret.expose_secret(),
            Duration::seconds(config.jwt_ttl_secs),
        )?;

        let auth_service = AuthService::new(
            users,
            hasher,
            token_service.clone(),
            EmailService::new(mailer.clone()),
            Duration::seconds(config.password_reset_code_ttl_secs),
        );

        let notifier = Notifier::spawn(mailer);
        let contact_service = ContactService::new(
            contacts,
            notifier.clone(),
            config.contact_notification_to.clone(),
        );

        Ok(Self {
            token_service,
            auth_service,
            contact_service,
            notifier,
        })
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.token_service.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MemoryContactStore, MemoryUserStore};
    use crate::services::MemoryMailer;
    use secrecy::SecretBox;

    fn config(jwt_secret: &str) -> Config {
        Config {
            database_url: SecretBox::new(Box::new("postgres://unused".to_string())),
            database_max_connections: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: SecretBox::new(Box::new(jwt_secret.to_string())),
            jwt_ttl_secs: 60,
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from_address: None,
            password_reset_code_ttl_secs: 900,
            contact_notification_to: Some("sales@example.com".to_string()),
            admin_email: None,
            admin_password: None,
        }
    }

    fn build(
        jwt_secret: &str,
        mailer: Arc<MemoryMailer>,
    ) -> Result<AppState, AppError> {
        AppState::from_parts(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryContactStore::new()),
            mailer,
            PasswordHasher::with_cost(8, 1, 1)?,
            config(jwt_secret),
        )
    }

    #[tokio::test]
    async fn test_from_parts_rejects_empty_jwt_secret() {
        assert!(build("", Arc::new(MemoryMailer::new())).is_err());
    }

    #[tokio::test]
    async fn test_from_parts_routes_contact_notification_from_config() {
        let mailer = Arc::new(MemoryMailer::new());
        let state = build("state-secret", mailer.clone()).unwrap();

        state
            .contact_service
            .submit(crate::models::NewContact {
                kind: crate::models::InquiryKind::Contact,
                name: "山田".to_string(),
                email: "yamada@example.com".to_string(),
                phone: None,
                company: None,
                subject: None,
                message: "資料をください".to_string(),
            })
            .await
            .unwrap();
        state.notifier.shutdown().await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "sales@example.com");
    }
}
