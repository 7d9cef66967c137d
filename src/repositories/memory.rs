//! インメモリ実装（テスト・ローカル確認用）
//!
//! PostgreSQL 実装と同じ制約（メール一意性、リセットコードの同時更新）を守る

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContactStore, StoreError, UserStore};
use crate::models::{Contact, NewContact, NewUser, ProfileChanges, User};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_in_use(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if email_in_use(&users, &user.email, None) {
            return Err(StoreError::UniqueViolation);
        }

        let now = OffsetDateTime::now_utc();
        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            role: user.role,
            password_hash: user.password_hash,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email
            && email_in_use(&users, email, Some(id))
        {
            return Err(StoreError::UniqueViolation);
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.reset_token_hash = Some(token_hash.to_string());
            user.reset_token_expires_at = Some(expires_at);
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        id: Uuid,
        expected_token_hash: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let now = OffsetDateTime::now_utc();
        let Some(user) = users.get_mut(&id) else {
            return Ok(false);
        };
        if user.active_reset_token(now) != Some(expected_token_hash) {
            return Ok(false);
        }

        user.password_hash = password_hash.to_string();
        user.reset_token_hash = None;
        user.reset_token_expires_at = None;
        user.updated_at = now;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryContactStore {
    contacts: RwLock<Vec<Contact>>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn create(&self, contact: NewContact) -> Result<Contact, StoreError> {
        let record = Contact {
            id: Uuid::new_v4(),
            kind: contact.kind,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            company: contact.company,
            subject: contact.subject,
            message: contact.message,
            created_at: OffsetDateTime::now_utc(),
        };
        self.contacts.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<Contact>, StoreError> {
        let mut contacts = self.contacts.read().await.clone();
        contacts.reverse();
        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "hanako".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@example.com")).await.unwrap();
        let err = store.create(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_email_of_other_user() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@example.com")).await.unwrap();
        let b = store.create(new_user("b@example.com")).await.unwrap();

        let err = store
            .update_profile(
                b.id,
                ProfileChanges {
                    email: Some("a@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));

        // 自分自身のメールアドレスへの更新は許可
        let updated = store
            .update_profile(
                b.id,
                ProfileChanges {
                    email: Some("b@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_some());
    }

    #[tokio::test]
    async fn test_complete_password_reset_clears_both_fields() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();
        let expires_at = OffsetDateTime::now_utc() + time::Duration::minutes(15);
        store
            .set_reset_token(user.id, "code-hash", expires_at)
            .await
            .unwrap();

        assert!(
            store
                .complete_password_reset(user.id, "code-hash", "new-hash")
                .await
                .unwrap()
        );

        let user = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.password_hash, "new-hash");
        assert!(user.reset_token_hash.is_none());
        assert!(user.reset_token_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_complete_password_reset_consumes_code_once() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();
        let expires_at = OffsetDateTime::now_utc() + time::Duration::minutes(15);
        store
            .set_reset_token(user.id, "code-hash", expires_at)
            .await
            .unwrap();

        assert!(
            store
                .complete_password_reset(user.id, "code-hash", "first")
                .await
                .unwrap()
        );
        assert!(
            !store
                .complete_password_reset(user.id, "code-hash", "second")
                .await
                .unwrap()
        );

        let user = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.password_hash, "first");
    }

    #[tokio::test]
    async fn test_complete_password_reset_rejects_replaced_or_expired_code() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();
        let now = OffsetDateTime::now_utc();

        store
            .set_reset_token(user.id, "newer-hash", now + time::Duration::minutes(15))
            .await
            .unwrap();
        assert!(
            !store
                .complete_password_reset(user.id, "older-hash", "new-hash")
                .await
                .unwrap()
        );

        store
            .set_reset_token(user.id, "expired-hash", now - time::Duration::seconds(1))
            .await
            .unwrap();
        assert!(
            !store
                .complete_password_reset(user.id, "expired-hash", "new-hash")
                .await
                .unwrap()
        );

        let user = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let store = MemoryUserStore::new();
        assert!(!store.delete(Uuid::new_v4()).await.unwrap());
    }
}
