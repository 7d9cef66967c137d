use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Contact, NewContact};
use crate::repositories::ContactStore;
use crate::services::email::contact_notification_email;
use crate::services::notifier::Notifier;

/// お問い合わせ受付
#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn ContactStore>,
    notifier: Notifier,
    notify_to: Option<String>,
}

impl ContactService {
    pub fn new(store: Arc<dyn ContactStore>, notifier: Notifier, notify_to: Option<String>) -> Self {
        Self {
            store,
            notifier,
            notify_to,
        }
    }

    /// 保存後に担当者へ通知（通知の成否はレスポンスに影響しない）
    pub async fn submit(&self, contact: NewContact) -> Result<Contact, AppError> {
        let contact = self.store.create(contact).await?;
        tracing::info!(contact_id = %contact.id, kind = ?contact.kind, "お問い合わせ受付");

        if let Some(to) = &self.notify_to {
            self.notifier
                .notify(contact_notification_email(to, &contact));
        }

        Ok(contact)
    }

    pub async fn list(&self) -> Result<Vec<Contact>, AppError> {
        Ok(self.store.list().await?)
    }
}
