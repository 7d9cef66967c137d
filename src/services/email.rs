use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Contact, InquiryKind};

/// 送信するメール（プレーンテキスト）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// メール送信の抽象
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// ログ出力のみのメーラー（SMTP未設定時）
///
/// 本文にはリセットコードが含まれるため出力しない
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "メール送信（開発モード、実際には送信しない）"
        );
        Ok(())
    }
}

/// 送信内容をメモリに保持するメーラー（テスト用）
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に送信失敗するメーラー
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("smtp unavailable");
        }
        match self.sent.lock() {
            Ok(mut sent) => sent.push(email),
            Err(poisoned) => poisoned.into_inner().push(email),
        }
        Ok(())
    }
}

#[cfg(feature = "email")]
pub use smtp::SmtpMailer;

#[cfg(feature = "email")]
mod smtp {
    use async_trait::async_trait;
    use lettre::message::header::ContentType;
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
    use secrecy::ExposeSecret;

    use super::{Mailer, OutgoingEmail};
    use crate::config::Config;

    /// SMTP（STARTTLS）メーラー
    ///
    /// コネクションはトランスポート内部のプールで再利用される
    pub struct SmtpMailer {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: lettre::message::Mailbox,
    }

    impl SmtpMailer {
        /// SMTP設定が揃っていない場合は `Ok(None)`
        pub fn from_config(config: &Config) -> anyhow::Result<Option<Self>> {
            let (Some(host), Some(username), Some(password), Some(from)) = (
                &config.smtp_host,
                &config.smtp_username,
                &config.smtp_password,
                &config.smtp_from_address,
            ) else {
                return Ok(None);
            };

            let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
                .port(config.smtp_port)
                .credentials(Credentials::new(
                    username.expose_secret().clone(),
                    password.expose_secret().clone(),
                ))
                .build();

            Ok(Some(Self {
                transport,
                from: from.parse()?,
            }))
        }
    }

    #[async_trait]
    impl Mailer for SmtpMailer {
        async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
            let message = Message::builder()
                .from(self.from.clone())
                .to(email.to.parse()?)
                .subject(email.subject)
                .header(ContentType::TEXT_PLAIN)
                .body(email.body)?;

            self.transport.send(message).await?;
            Ok(())
        }
    }
}

/// メール本文の組み立てと送信
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// パスワードリセットコードを送信（送信完了まで待つ）
    ///
    /// # Security
    /// コード（平文）はログに出力しない
    pub async fn send_password_reset_code(
        &self,
        to: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), AppError> {
        let email = password_reset_email(to, code, ttl_minutes);
        self.mailer.send(email).await.map_err(|e| {
            tracing::error!(error = ?e, to = %to, "パスワードリセットメールの送信に失敗");
            AppError::EmailSendFailed
        })?;

        tracing::info!(to = %to, "パスワードリセットメール送信完了");
        Ok(())
    }
}

fn password_reset_email(to: &str, code: &str, ttl_minutes: i64) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "パスワードリセットコード".to_string(),
        body: format!(
            "パスワードリセットのリクエストを受け付けました。\n\n\
             リセットコード: {code}\n\n\
             このコードの有効期限は{ttl_minutes}分です。\n\
             心当たりがない場合はこのメールを破棄してください。\n"
        ),
    }
}

/// お問い合わせ通知メール（種別で件名を切り替える）
pub fn contact_notification_email(to: &str, contact: &Contact) -> OutgoingEmail {
    let subject = contact.subject.as_deref().unwrap_or("（件名なし）");
    let label = match contact.kind {
        InquiryKind::Contact => "お問い合わせ",
        InquiryKind::Investment => "投資に関するお問い合わせ",
    };
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("{label}: {subject}"),
        body: format!(
            "お名前: {}\nメール: {}\n電話番号: {}\n会社名: {}\n\n{}\n",
            contact.name,
            contact.email,
            contact.phone.as_deref().unwrap_or("-"),
            contact.company.as_deref().unwrap_or("-"),
            contact.message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_code_email_contains_code() {
        let mailer = Arc::new(MemoryMailer::new());
        let service = EmailService::new(mailer.clone());

        service
            .send_password_reset_code("user@example.com", "042917", 15)
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "user@example.com");
        assert!(sent[0].body.contains("042917"));
        assert!(sent[0].body.contains("15分"));
    }

    #[test]
    fn test_investment_notification_subject() {
        let contact = Contact {
            id: uuid::Uuid::new_v4(),
            kind: InquiryKind::Investment,
            name: "田中".to_string(),
            email: "tanaka@example.com".to_string(),
            phone: None,
            company: Some("田中キャピタル".to_string()),
            subject: Some("シリーズA".to_string()),
            message: "資料をお願いします".to_string(),
            created_at: time::OffsetDateTime::now_utc(),
        };

        let email = contact_notification_email("ir@example.com", &contact);
        assert_eq!(email.subject, "投資に関するお問い合わせ: シリーズA");
        assert!(email.body.contains("会社名: 田中キャピタル"));
    }

    #[tokio::test]
    async fn test_send_failure_maps_to_email_send_failed() {
        let service = EmailService::new(Arc::new(MemoryMailer::failing()));
        let err = service
            .send_password_reset_code("user@example.com", "123456", 15)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailSendFailed));
    }
}
